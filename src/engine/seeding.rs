//! Derivation of every random seed of a run from a single master seed.
//!
//! With a master seed `m` and `N` virtual processes:
//! - the host generators, one per virtual process, are seeded with `m, ..., m + N - 1`,
//! - the global generator of the engine is seeded with `m + N`,
//! - the per-process generators of the engine are seeded with `m + N + 1, ..., m + 2N`.
//!
//! No seed is shared between two generators, so runs with the same master seed and the same
//! number of virtual processes are identical.
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::ops::Range;

use crate::engine::Engine;
use crate::error::PipelineError;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SeedPlan {
    master_seed: u64,
    num_virtual_procs: usize,
}

impl SeedPlan {
    /// Create the plan for `num_virtual_procs` virtual processes.
    /// The function returns an error if there is no virtual process or the seeds overflow.
    pub fn build(master_seed: u64, num_virtual_procs: usize) -> Result<Self, PipelineError> {
        if num_virtual_procs == 0 {
            return Err(PipelineError::InvalidParameter(
                "at least one virtual process is required".to_string(),
            ));
        }
        (num_virtual_procs as u64)
            .checked_mul(2)
            .and_then(|n| n.checked_add(1))
            .and_then(|n| master_seed.checked_add(n))
            .ok_or_else(|| {
                PipelineError::InvalidParameter(format!(
                    "master seed {} is too large for {} virtual processes",
                    master_seed, num_virtual_procs
                ))
            })?;
        Ok(SeedPlan {
            master_seed,
            num_virtual_procs,
        })
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn num_virtual_procs(&self) -> usize {
        self.num_virtual_procs
    }

    /// Seeds of the host generators, indexed by virtual process.
    pub fn host_seeds(&self) -> Range<u64> {
        self.master_seed..self.master_seed + self.num_virtual_procs as u64
    }

    pub fn grng_seed(&self) -> u64 {
        self.master_seed + self.num_virtual_procs as u64
    }

    /// Seeds of the engine generators, indexed by virtual process.
    pub fn rng_seeds(&self) -> Vec<u64> {
        let first = self.grng_seed() + 1;
        (first..first + self.num_virtual_procs as u64).collect()
    }

    /// One host generator per virtual process, indexed by virtual process.
    pub fn host_generators(&self) -> Vec<ChaCha8Rng> {
        self.host_seeds().map(ChaCha8Rng::seed_from_u64).collect()
    }

    /// Pass the engine seeds to the engine.
    pub fn apply<E: Engine + ?Sized>(&self, engine: &mut E) -> Result<(), PipelineError> {
        if engine.num_virtual_procs() != self.num_virtual_procs {
            return Err(PipelineError::Engine(format!(
                "seeds planned for {} virtual processes but the engine runs {}",
                self.num_virtual_procs,
                engine.num_virtual_procs()
            )));
        }
        engine.seed(self.grng_seed(), &self.rng_seeds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use rand::Rng;

    #[test]
    fn test_seed_layout() {
        let plan = SeedPlan::build(12, 4).unwrap();
        assert_eq!(plan.host_seeds().collect::<Vec<u64>>(), vec![12, 13, 14, 15]);
        assert_eq!(plan.grng_seed(), 16);
        assert_eq!(plan.rng_seeds(), vec![17, 18, 19, 20]);

        let plan = SeedPlan::build(0, 1).unwrap();
        assert_eq!(plan.host_seeds().collect::<Vec<u64>>(), vec![0]);
        assert_eq!(plan.grng_seed(), 1);
        assert_eq!(plan.rng_seeds(), vec![2]);
    }

    #[test]
    fn test_seeds_are_distinct() {
        let plan = SeedPlan::build(7, 8).unwrap();
        let seeds: Vec<u64> = plan
            .host_seeds()
            .chain(std::iter::once(plan.grng_seed()))
            .chain(plan.rng_seeds())
            .collect();
        assert_eq!(seeds.len(), 17);
        assert!(seeds.iter().all_unique());
    }

    #[test]
    fn test_host_generators() {
        let plan = SeedPlan::build(3, 2).unwrap();
        let mut rngs = plan.host_generators();
        assert_eq!(rngs.len(), 2);

        let mut expected = ChaCha8Rng::seed_from_u64(4);
        assert_eq!(rngs[1].gen::<u64>(), expected.gen::<u64>());
    }

    #[test]
    fn test_invalid_plan() {
        assert!(SeedPlan::build(0, 0).is_err());
        assert!(SeedPlan::build(u64::MAX - 2, 2).is_err());
    }
}
