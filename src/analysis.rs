//! Error and cost analysis over decoded slices
//!
//! Consumers of the decoder compare sampled time averages against a
//! benchmark value. Reference values are always passed in explicitly through
//! [`ReferenceValues`]; this module keeps no global constants beyond the
//! presets it exposes as constructors.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use trueno::Vector;

use crate::layout::Quantity;
use crate::matrix::SliceMatrix;

/// Errors from the analysis helpers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Invalid reference value for {quantity}: {value} (must be finite and non-zero)")]
    InvalidReference { quantity: Quantity, value: f64 },

    #[error("No reference value configured for {0}")]
    MissingReference(Quantity),
}

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Kuramoto-Sivashinsky u_avg over ten independent 10,000 time unit runs
const KS_MEAN_RUNS: [f64; 10] = [
    0.0018818840459220148,
    -0.011219975404049096,
    -0.004816261673434899,
    -0.002976887442750134,
    -0.025288413208007465,
    -0.005227249709331662,
    0.018257675164853628,
    0.018838370047328863,
    0.005525429394945893,
    0.008241928430672067,
];

/// Kuramoto-Sivashinsky u2_avg over the same ten runs
const KS_SECOND_MOMENT_RUNS: [f64; 10] = [
    1.6315534828404672,
    1.6216373674692772,
    1.6178435053154652,
    1.621090661713772,
    1.6210155072715462,
    1.6192508263269854,
    1.6252937515380332,
    1.6258290072155706,
    1.626548122250598,
    1.623464990885767,
];

/// Lorenz z_avg benchmark (Kehlet and Logg), rounded to f64
const LORENZ_Z_AVG: f64 = 23.484_682_069_515_607;

/// Named benchmark reference sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePreset {
    /// Lorenz system z_avg (Kehlet and Logg)
    Lorenz,
    /// Kuramoto-Sivashinsky u_avg and u2_avg ensemble averages
    Ks,
}

impl ReferencePreset {
    /// Reference values of this preset
    pub fn values(self) -> ReferenceValues {
        match self {
            ReferencePreset::Lorenz => ReferenceValues::lorenz(),
            ReferencePreset::Ks => ReferenceValues::kuramoto_sivashinsky(),
        }
    }
}

/// Benchmark values that percent errors are measured against
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ReferenceValues {
    /// Reference time average of the solution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    /// Reference time average of the squared solution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_moment: Option<f64>,
}

impl ReferenceValues {
    /// Lorenz system benchmark: z_avg only
    pub fn lorenz() -> Self {
        Self {
            mean: Some(LORENZ_Z_AVG),
            second_moment: None,
        }
    }

    /// Kuramoto-Sivashinsky benchmark: ensemble averages of the reference runs
    pub fn kuramoto_sivashinsky() -> Self {
        Self {
            mean: Some(mean(&KS_MEAN_RUNS)),
            second_moment: Some(mean(&KS_SECOND_MOMENT_RUNS)),
        }
    }

    /// Set the mean reference
    pub fn with_mean(mut self, value: f64) -> Self {
        self.mean = Some(value);
        self
    }

    /// Set the second-moment reference
    pub fn with_second_moment(mut self, value: f64) -> Self {
        self.second_moment = Some(value);
        self
    }

    /// Reference for `quantity`; CPU time never has one
    pub fn get(&self, quantity: Quantity) -> Option<f64> {
        match quantity {
            Quantity::Mean => self.mean,
            Quantity::SecondMoment => self.second_moment,
            Quantity::CpuTime => None,
        }
    }

    /// True when no reference is configured
    pub fn is_empty(&self) -> bool {
        self.mean.is_none() && self.second_moment.is_none()
    }
}

/// Element-wise `|x - reference| * 100 / |reference|`
pub fn percent_error(values: &SliceMatrix, quantity: Quantity, reference: f64) -> Result<SliceMatrix> {
    if !reference.is_finite() || reference == 0.0 {
        return Err(AnalysisError::InvalidReference {
            quantity,
            value: reference,
        });
    }
    let scale = 100.0 / reference.abs();
    Ok(values.map(|x| (x - reference).abs() * scale))
}

/// Percent error of `values` against the configured reference for `quantity`
pub fn percent_error_for(
    values: &SliceMatrix,
    quantity: Quantity,
    references: &ReferenceValues,
) -> Result<SliceMatrix> {
    let reference = references
        .get(quantity)
        .ok_or(AnalysisError::MissingReference(quantity))?;
    percent_error(values, quantity, reference)
}

/// Five-number summary plus mean and standard deviation of one column.
///
/// Summaries are display statistics and are computed in `f32` with trueno;
/// the decoded samples and percent errors stay `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub min: f32,
    pub q1: f32,
    pub median: f32,
    pub q3: f32,
    pub max: f32,
    pub mean: f32,
    /// Population standard deviation
    pub std: f32,
}

impl ColumnSummary {
    /// Summarize a set of samples. Returns `None` for empty input.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let samples: Vec<f32> = samples.iter().map(|&x| x as f32).collect();
        let v = Vector::from_slice(&samples);

        let mut sorted = samples.clone();
        sorted.sort_by(f32::total_cmp);

        Some(Self {
            min: v.min().unwrap_or(0.0),
            q1: percentile(&sorted, 25.0),
            median: percentile(&sorted, 50.0),
            q3: percentile(&sorted, 75.0),
            max: v.max().unwrap_or(0.0),
            mean: v.mean().unwrap_or(0.0),
            std: v.stddev().unwrap_or(0.0),
        })
    }
}

/// Summary of every varying column of `values`
pub fn summarize_columns(values: &SliceMatrix) -> Vec<ColumnSummary> {
    (0..values.varying())
        .filter_map(|v| ColumnSummary::from_samples(&values.column(v)))
        .collect()
}

/// Sample mean of every varying column (average CPU time per parameter or period)
pub fn column_means(values: &SliceMatrix) -> Vec<f32> {
    (0..values.varying())
        .map(|v| {
            let column: Vec<f32> = values.column(v).iter().map(|&x| x as f32).collect();
            Vector::from_slice(&column).mean().unwrap_or(0.0)
        })
        .collect()
}

/// Mean in f64; the reference ensembles need full precision
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Linear-interpolated percentile of already sorted data
fn percentile(sorted_data: &[f32], percentile: f32) -> f32 {
    if sorted_data.is_empty() {
        return 0.0;
    }
    if sorted_data.len() == 1 {
        return sorted_data[0];
    }

    let index = (percentile / 100.0) * (sorted_data.len() - 1) as f32;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted_data[lower]
    } else {
        let weight = index - lower as f32;
        sorted_data[lower] * (1.0 - weight) + sorted_data[upper] * weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_ks_preset_matches_ensemble_average() {
        let refs = ReferenceValues::kuramoto_sivashinsky();
        assert!((refs.mean.unwrap() - -0.0005583809760580947).abs() < 1e-15);
        assert!((refs.second_moment.unwrap() - 1.6233402479935237).abs() < 1e-12);
    }

    #[test]
    fn test_lorenz_preset() {
        let refs = ReferenceValues::lorenz();
        assert!(approx(refs.mean.unwrap(), 23.48468206951560755));
        assert!(refs.second_moment.is_none());
        assert!(refs.get(Quantity::CpuTime).is_none());
    }

    #[test]
    fn test_percent_error() {
        let values = SliceMatrix::from_vec(1, 3, vec![2.0, 2.2, 1.5]).unwrap();
        let err = percent_error(&values, Quantity::Mean, 2.0).unwrap();
        assert!(approx(err.get(0, 0).unwrap(), 0.0));
        assert!(approx(err.get(0, 1).unwrap(), 10.0));
        assert!(approx(err.get(0, 2).unwrap(), 25.0));
    }

    #[test]
    fn test_percent_error_negative_reference_is_positive() {
        let values = SliceMatrix::from_vec(1, 1, vec![-1.5]).unwrap();
        let err = percent_error(&values, Quantity::Mean, -1.0).unwrap();
        assert!(approx(err.get(0, 0).unwrap(), 50.0));
    }

    #[test]
    fn test_percent_error_rejects_zero_reference() {
        let values = SliceMatrix::from_vec(1, 1, vec![1.0]).unwrap();
        assert!(matches!(
            percent_error(&values, Quantity::Mean, 0.0),
            Err(AnalysisError::InvalidReference { .. })
        ));
        assert!(percent_error(&values, Quantity::Mean, f64::NAN).is_err());
    }

    #[test]
    fn test_percent_error_for_missing_reference() {
        let values = SliceMatrix::from_vec(1, 1, vec![1.0]).unwrap();
        let err = percent_error_for(&values, Quantity::SecondMoment, &ReferenceValues::lorenz()).unwrap_err();
        assert_eq!(err, AnalysisError::MissingReference(Quantity::SecondMoment));
    }

    #[test]
    fn test_column_summary() {
        let summary = ColumnSummary::from_samples(&[4.0, 1.0, 3.0, 2.0, 5.0]).unwrap();
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.q1, 2.0);
        assert_eq!(summary.median, 3.0);
        assert_eq!(summary.q3, 4.0);
        assert_eq!(summary.max, 5.0);
        assert!((summary.mean - 3.0).abs() < 1e-6);
        assert!((summary.std - 2.0_f32.sqrt()).abs() < 1e-5);

        assert!(ColumnSummary::from_samples(&[]).is_none());
    }

    #[test]
    fn test_interpolated_median() {
        let summary = ColumnSummary::from_samples(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(summary.median, 2.5);
    }

    #[test]
    fn test_summarize_and_means() {
        // samples x varying = 2 x 2
        let values = SliceMatrix::from_vec(2, 2, vec![1.0, 10.0, 3.0, 30.0]).unwrap();
        let summaries = summarize_columns(&values);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[1].median, 20.0);
        assert_eq!(column_means(&values), vec![2.0, 20.0]);
    }

    #[test]
    fn test_summary_std_is_population() {
        // trueno divides by n: mean 5, variance 20 / 4
        let summary = ColumnSummary::from_samples(&[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert!((summary.std - 5.0_f32.sqrt()).abs() < 1e-5);
        assert_eq!(summary.min, 2.0);
        assert_eq!(summary.max, 8.0);
    }

    #[test]
    fn test_presets_resolve_to_constructors() {
        assert_eq!(ReferencePreset::Lorenz.values(), ReferenceValues::lorenz());
        assert_eq!(ReferencePreset::Ks.values(), ReferenceValues::kuramoto_sivashinsky());
        let parsed: ReferencePreset = serde_json::from_str("\"ks\"").unwrap();
        assert_eq!(parsed, ReferencePreset::Ks);
    }
}
