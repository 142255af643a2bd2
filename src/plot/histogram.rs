//! Histograms with automatically chosen bins.
//!
//! The bin width is the smaller of the Sturges and Freedman-Diaconis estimates (the latter only
//! when the interquartile range is positive), the same rule as NumPy's `bins='auto'`.

/// Counts of values in equal-width bins.
#[derive(Debug, PartialEq, Clone)]
pub struct Histogram {
    /// `num_bins + 1` increasing bin edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin the finite values of `data`.
    pub fn auto(data: &[f64]) -> Self {
        let mut values: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
        if values.len() < data.len() {
            log::debug!("Ignoring {} non-finite values", data.len() - values.len());
        }
        values.sort_by(f64::total_cmp);

        let (first, last) = match (values.first(), values.last()) {
            (Some(&first), Some(&last)) if first < last => (first, last),
            (Some(&value), _) => (value - 0.5, value + 0.5),
            _ => (0.0, 1.0),
        };

        let width = auto_bin_width(&values);
        let num_bins = if width > 0.0 {
            (((last - first) / width).ceil() as usize).max(1)
        } else {
            1
        };

        let edges: Vec<f64> = (0..=num_bins)
            .map(|i| first + (last - first) * i as f64 / num_bins as f64)
            .collect();
        let mut counts = vec![0; num_bins];
        for &x in &values {
            let i = ((x - first) / (last - first) * num_bins as f64).floor() as usize;
            counts[i.min(num_bins - 1)] += 1;
        }
        Histogram { edges, counts }
    }

    pub fn num_bins(&self) -> usize {
        self.counts.len()
    }

    /// The bins as `(left edge, right edge, count)`.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.edges
            .windows(2)
            .zip(&self.counts)
            .map(|(edges, &count)| (edges[0], edges[1], count))
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Linear interpolation between the closest ranks of sorted values.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let position = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (position - lower as f64) * (sorted[upper] - sorted[lower])
}

/// Bin width for sorted finite values, zero when the values do not spread.
fn auto_bin_width(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let ptp = sorted[n - 1] - sorted[0];
    let sturges = ptp / ((n as f64).log2() + 1.0);
    let iqr = percentile(sorted, 75.0) - percentile(sorted, 25.0);
    let freedman_diaconis = 2.0 * iqr * (n as f64).powf(-1.0 / 3.0);
    if freedman_diaconis > 0.0 {
        freedman_diaconis.min(sturges)
    } else {
        sturges
    }
}
