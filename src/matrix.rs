//! Dense slice matrices
//!
//! Decoded payloads are laid out with the sample axis first and the varying
//! index (parameter or period) second, the orientation box/line plots of the
//! convergence studies consume directly.

use serde::Serialize;

/// Owned `(samples, varying)` matrix stored row-major
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceMatrix {
    samples: usize,
    varying: usize,
    data: Vec<f64>,
}

impl SliceMatrix {
    /// Wrap row-major data. Returns `None` if the length does not match the shape.
    pub fn from_vec(samples: usize, varying: usize, data: Vec<f64>) -> Option<Self> {
        (data.len() == samples * varying).then_some(Self {
            samples,
            varying,
            data,
        })
    }

    /// Build from a closure evaluated at every `(sample, varying)` cell
    pub fn from_fn(samples: usize, varying: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(samples * varying);
        for s in 0..samples {
            for v in 0..varying {
                data.push(f(s, v));
            }
        }
        Self {
            samples,
            varying,
            data,
        }
    }

    /// `(samples, varying)`
    pub fn shape(&self) -> (usize, usize) {
        (self.samples, self.varying)
    }

    /// Length of the sample axis
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Length of the varying axis
    pub fn varying(&self) -> usize {
        self.varying
    }

    /// Value at `(sample, varying)`
    pub fn get(&self, sample: usize, varying: usize) -> Option<f64> {
        if sample < self.samples && varying < self.varying {
            Some(self.data[sample * self.varying + varying])
        } else {
            None
        }
    }

    /// All samples for one varying index
    pub fn column(&self, varying: usize) -> Vec<f64> {
        if varying >= self.varying {
            return Vec::new();
        }
        self.data
            .iter()
            .skip(varying)
            .step_by(self.varying)
            .copied()
            .collect()
    }

    /// One sample across every varying index
    pub fn sample_row(&self, sample: usize) -> &[f64] {
        let start = sample * self.varying;
        &self.data[start..start + self.varying]
    }

    /// Element-wise map into a new matrix of the same shape
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            samples: self.samples,
            varying: self.varying,
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    /// Drop the first `n` varying columns
    pub fn skip_varying(&self, n: usize) -> Self {
        let n = n.min(self.varying);
        let varying = self.varying - n;
        Self::from_fn(self.samples, varying, |s, v| self.data[s * self.varying + v + n])
    }

    /// Row-major backing data
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_matrix() -> SliceMatrix {
        // 2 samples x 3 varying
        SliceMatrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()
    }

    #[test]
    fn test_shape_and_get() {
        let m = sample_matrix();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.get(1, 0), Some(4.0));
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.get(0, 3), None);
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(SliceMatrix::from_vec(2, 2, vec![0.0; 3]).is_none());
    }

    #[test]
    fn test_column_and_row() {
        let m = sample_matrix();
        assert_eq!(m.column(1), vec![2.0, 5.0]);
        assert!(m.column(3).is_empty());
        assert_eq!(m.sample_row(1), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_skip_varying() {
        let m = sample_matrix().skip_varying(1);
        assert_eq!(m.shape(), (2, 2));
        assert_eq!(m.as_slice(), &[2.0, 3.0, 5.0, 6.0]);

        let empty = sample_matrix().skip_varying(10);
        assert_eq!(empty.shape(), (2, 0));
    }

    #[test]
    fn test_map() {
        let m = sample_matrix().map(|x| x * 10.0);
        assert_eq!(m.get(1, 2), Some(60.0));
    }
}
