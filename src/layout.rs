//! Block layout descriptors for statistics tables
//!
//! A statistics file stacks `K` blocks of `P*T` rows each. Block 0 carries
//! the discretization parameter (dx or dt) in column 0; every later block
//! carries one payload quantity. Within a block the `P` rows of period `t`
//! are contiguous and the periods follow one another.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decoder::{DecodeError, Result};

/// Payload quantity stored in one block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    /// Time average of the solution (u_avg, z_avg)
    Mean,
    /// Time average of the squared solution (u2_avg)
    SecondMoment,
    /// Wall-clock CPU time of the run
    CpuTime,
}

impl Quantity {
    /// Short name used in reports
    pub fn name(self) -> &'static str {
        match self {
            Quantity::Mean => "mean",
            Quantity::SecondMoment => "second_moment",
            Quantity::CpuTime => "cputime",
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which blocks a statistics file carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BlockLayout {
    /// Spatially discretized PDE runs: parameter, mean, second moment, CPU time
    Pde,
    /// ODE runs: parameter, mean, CPU time
    Ode,
}

impl BlockLayout {
    /// Payload blocks in file order (block 1 onward)
    pub fn payload(self) -> &'static [Quantity] {
        match self {
            BlockLayout::Pde => &[Quantity::Mean, Quantity::SecondMoment, Quantity::CpuTime],
            BlockLayout::Ode => &[Quantity::Mean, Quantity::CpuTime],
        }
    }

    /// Total block count K, including the parameter block
    pub fn block_count(self) -> usize {
        self.payload().len() + 1
    }
}

impl fmt::Display for BlockLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockLayout::Pde => f.write_str("pde"),
            BlockLayout::Ode => f.write_str("ode"),
        }
    }
}

/// Shape of a statistics file: `P` parameters, `T` periods, and the block layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Layout {
    parameters: usize,
    periods: usize,
    blocks: BlockLayout,
}

impl Layout {
    /// Create a layout, rejecting zero parameter or period counts
    pub fn new(parameters: usize, periods: usize, blocks: BlockLayout) -> Result<Self> {
        if parameters == 0 {
            return Err(DecodeError::invalid("parameters", parameters, "must be positive"));
        }
        if periods == 0 {
            return Err(DecodeError::invalid("periods", periods, "must be positive"));
        }
        let rows = parameters
            .checked_mul(periods)
            .and_then(|n| n.checked_mul(blocks.block_count()));
        if rows.is_none() {
            return Err(DecodeError::invalid("periods", periods, "row count overflows usize"));
        }
        Ok(Self {
            parameters,
            periods,
            blocks,
        })
    }

    /// Number of discretization parameter values (P)
    pub fn parameters(&self) -> usize {
        self.parameters
    }

    /// Number of integration periods (T)
    pub fn periods(&self) -> usize {
        self.periods
    }

    /// Block layout tag
    pub fn blocks(&self) -> BlockLayout {
        self.blocks
    }

    /// Rows per block (`P*T`)
    pub fn block_rows(&self) -> usize {
        self.parameters * self.periods
    }

    /// Rows the whole file must have (`K*P*T`)
    pub fn expected_rows(&self) -> usize {
        self.blocks.block_count() * self.block_rows()
    }

    /// Row holding `(block, parameter, period)`.
    ///
    /// Every row the decoder reads goes through this formula.
    #[inline]
    pub fn row(&self, block: usize, parameter: usize, period: usize) -> usize {
        block * self.block_rows() + period * self.parameters + parameter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_counts() {
        assert_eq!(BlockLayout::Pde.block_count(), 4);
        assert_eq!(BlockLayout::Ode.block_count(), 3);
        assert_eq!(BlockLayout::Ode.payload(), &[Quantity::Mean, Quantity::CpuTime]);
    }

    #[test]
    fn test_expected_rows() {
        let layout = Layout::new(5, 3, BlockLayout::Pde).unwrap();
        assert_eq!(layout.block_rows(), 15);
        assert_eq!(layout.expected_rows(), 60);

        let layout = Layout::new(5, 3, BlockLayout::Ode).unwrap();
        assert_eq!(layout.expected_rows(), 45);
    }

    #[test]
    fn test_row_formula() {
        let layout = Layout::new(2, 2, BlockLayout::Ode).unwrap();
        // block 1, period 1 starts at row 6
        assert_eq!(layout.row(1, 0, 1), 6);
        assert_eq!(layout.row(1, 1, 1), 7);
        // stride P between periods for a fixed parameter
        assert_eq!(layout.row(2, 0, 0), 8);
        assert_eq!(layout.row(2, 0, 1), 10);
    }

    #[test]
    fn test_zero_counts_rejected() {
        let err = Layout::new(0, 3, BlockLayout::Pde).unwrap_err();
        assert!(err.to_string().contains("parameters"));

        let err = Layout::new(3, 0, BlockLayout::Pde).unwrap_err();
        assert!(err.to_string().contains("periods"));
    }

    #[test]
    fn test_overflowing_layout_rejected() {
        let err = Layout::new(usize::MAX / 2, 3, BlockLayout::Ode).unwrap_err();
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn test_layout_serde_names() {
        assert_eq!(serde_json::to_string(&BlockLayout::Ode).unwrap(), "\"ode\"");
        assert_eq!(
            serde_json::to_string(&Quantity::SecondMoment).unwrap(),
            "\"second_moment\""
        );
        let parsed: BlockLayout = serde_json::from_str("\"pde\"").unwrap();
        assert_eq!(parsed, BlockLayout::Pde);
    }
}
