//! Spike related structures.
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::PipelineError;

/// The spikes of one recorded population, stored as two parallel arrays of sender ids and times.
///
/// All ids lie within `[min_id, max_id]`, which also defines the population size.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawPopulationSpikes")]
pub struct PopulationSpikes {
    population: String,
    min_id: u64,
    max_id: u64,
    ids: Vec<u64>,
    times: Vec<f64>,
}

/// Unchecked mirror of [`PopulationSpikes`], used to validate deserialized data.
#[derive(Deserialize)]
struct RawPopulationSpikes {
    population: String,
    min_id: u64,
    max_id: u64,
    ids: Vec<u64>,
    times: Vec<f64>,
}

impl TryFrom<RawPopulationSpikes> for PopulationSpikes {
    type Error = PipelineError;

    fn try_from(raw: RawPopulationSpikes) -> Result<Self, Self::Error> {
        PopulationSpikes::build(raw.population, raw.min_id, raw.max_id, raw.ids, raw.times)
    }
}

impl PopulationSpikes {
    /// Create the spikes of a population from parallel id and time arrays.
    /// The function returns an error if the bounds are inverted or span more than `usize::MAX`
    /// neurons, if the arrays differ in length, or if some id lies outside the bounds.
    pub fn build(
        population: impl Into<String>,
        min_id: u64,
        max_id: u64,
        ids: Vec<u64>,
        times: Vec<f64>,
    ) -> Result<Self, PipelineError> {
        let population = population.into();
        if min_id > max_id {
            return Err(PipelineError::InvalidParameter(format!(
                "population {} has inverted id bounds [{}, {}]",
                population, min_id, max_id
            )));
        }
        if (max_id - min_id)
            .checked_add(1)
            .and_then(|size| usize::try_from(size).ok())
            .is_none()
        {
            return Err(PipelineError::InvalidParameter(format!(
                "population {} has too many neurons [{}, {}]",
                population, min_id, max_id
            )));
        }
        if ids.len() != times.len() {
            return Err(PipelineError::ShapeMismatch(format!(
                "population {} has {} ids but {} times",
                population,
                ids.len(),
                times.len()
            )));
        }
        if let Some(id) = ids.iter().find(|&&id| id < min_id || id > max_id) {
            return Err(PipelineError::OutOfBounds(format!(
                "neuron {} does not belong to population {} [{}, {}]",
                id, population, min_id, max_id
            )));
        }

        Ok(PopulationSpikes {
            population,
            min_id,
            max_id,
            ids,
            times,
        })
    }

    pub fn population(&self) -> &str {
        &self.population
    }

    pub fn min_id(&self) -> u64 {
        self.min_id
    }

    pub fn max_id(&self) -> u64 {
        self.max_id
    }

    /// The number of neurons in the population, i.e., `max_id - min_id + 1`.
    pub fn size(&self) -> usize {
        (self.max_id - self.min_id + 1) as usize
    }

    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// The total number of recorded spikes.
    pub fn num_spikes(&self) -> usize {
        self.times.len()
    }
}

/// Save the spikes of all populations to a JSON file.
pub fn save_spikes<P: AsRef<Path>>(
    spikes: &[PopulationSpikes],
    path: P,
) -> Result<(), PipelineError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, spikes)?;
    writer.flush()?;
    Ok(())
}

/// Load the spikes of all populations from a JSON file.
pub fn load_spikes<P: AsRef<Path>>(path: P) -> Result<Vec<PopulationSpikes>, PipelineError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_population_spikes() {
        let spikes = PopulationSpikes::build("L23E", 1, 10, vec![1, 5, 10], vec![0.1, 0.2, 0.3])
            .unwrap();
        assert_eq!(spikes.size(), 10);
        assert_eq!(spikes.num_spikes(), 3);
        assert_eq!(spikes.ids(), &[1, 5, 10]);
        assert_eq!(spikes.times(), &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_build_population_spikes_invalid() {
        assert!(matches!(
            PopulationSpikes::build("E", 10, 1, vec![], vec![]),
            Err(PipelineError::InvalidParameter(_))
        ));
        assert!(matches!(
            PopulationSpikes::build("E", 1, 10, vec![1, 2], vec![0.1]),
            Err(PipelineError::ShapeMismatch(_))
        ));
        assert!(matches!(
            PopulationSpikes::build("E", 1, 10, vec![11], vec![0.1]),
            Err(PipelineError::OutOfBounds(_))
        ));
        assert!(matches!(
            PopulationSpikes::build("E", 2, 10, vec![1], vec![0.1]),
            Err(PipelineError::OutOfBounds(_))
        ));
    }

    #[test]
    fn test_deserialize_rejects_out_of_bounds() {
        let json = r#"{"population":"E","min_id":1,"max_id":2,"ids":[3],"times":[1.0]}"#;
        assert!(serde_json::from_str::<PopulationSpikes>(json).is_err());

        let json = r#"{"population":"E","min_id":1,"max_id":2,"ids":[2],"times":[1.0]}"#;
        let spikes: PopulationSpikes = serde_json::from_str(json).unwrap();
        assert_eq!(spikes.ids(), &[2]);
    }

    #[test]
    fn test_full_id_range_rejected() {
        assert!(matches!(
            PopulationSpikes::build("E", 0, u64::MAX, vec![], vec![]),
            Err(PipelineError::InvalidParameter(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spikes.json");
        let json = format!(
            r#"[{{"population":"E","min_id":0,"max_id":{},"ids":[],"times":[]}}]"#,
            u64::MAX
        );
        std::fs::write(&path, json).unwrap();
        assert!(matches!(
            load_spikes(&path),
            Err(PipelineError::Serialization(_))
        ));
    }

    #[test]
    fn test_save_load_spikes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spikes.json");
        let spikes = vec![
            PopulationSpikes::build("E", 1, 4, vec![1, 3], vec![0.5, 1.5]).unwrap(),
            PopulationSpikes::build("I", 5, 5, vec![], vec![]).unwrap(),
        ];
        save_spikes(&spikes, &path).unwrap();
        assert_eq!(load_spikes(&path).unwrap(), spikes);
    }
}
