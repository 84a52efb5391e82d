//! Block table decoder
//!
//! Recovers the logical `(parameter, period, sample)` cube from a flat
//! statistics table and projects it two ways:
//!
//! - [`decode_by_period`]: fix the integration period, vary the parameter
//! - [`decode_by_parameter`]: fix the parameter, vary the integration period
//!
//! Every call validates the index, then the row count (`K*P*T`), then the
//! repeated parameter column, before any payload row is read. No partial
//! result is ever returned.

use serde::Serialize;
use thiserror::Error;

use crate::layout::{Layout, Quantity};
use crate::matrix::SliceMatrix;
use crate::table::RawTable;

/// Errors raised while decoding a statistics table
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Invalid {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: usize,
        reason: String,
    },

    #[error(
        "Layout mismatch in {source_name}: P={parameters}, T={periods}, K={blocks} \
         expects {expected} rows, file has {actual}"
    )]
    LayoutMismatch {
        source_name: String,
        parameters: usize,
        periods: usize,
        blocks: usize,
        expected: usize,
        actual: usize,
    },

    #[error(
        "Inconsistent parameter column in {source_name}: parameter {parameter_index} \
         is {expected} for period 0 but {found} for period {period_index}"
    )]
    InconsistentParameterColumn {
        source_name: String,
        parameter_index: usize,
        period_index: usize,
        expected: f64,
        found: f64,
    },
}

impl DecodeError {
    pub(crate) fn invalid(name: &'static str, value: usize, reason: impl Into<String>) -> Self {
        DecodeError::InvalidParameter {
            name,
            value,
            reason: reason.into(),
        }
    }

    fn out_of_range(name: &'static str, value: usize, bound: usize) -> Self {
        Self::invalid(name, value, format!("must be >= 0 and < {bound}"))
    }
}

/// Result type for decode operations
pub type Result<T> = std::result::Result<T, DecodeError>;

/// One payload block projected onto the varying axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantitySlice {
    pub quantity: Quantity,
    pub values: SliceMatrix,
}

/// All parameter values at one fixed period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSlice {
    pub source: String,
    pub layout: Layout,
    pub period_index: usize,
    /// Parameter values (dx or dt), one per varying column
    pub parameters: Vec<f64>,
    /// Payload blocks in file order, each shaped `(samples, P)`
    pub blocks: Vec<QuantitySlice>,
}

/// All periods at one fixed parameter value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSlice {
    pub source: String,
    pub layout: Layout,
    pub parameter_index: usize,
    /// The fixed parameter value
    pub parameter: f64,
    /// Payload blocks in file order, each shaped `(samples, T)`
    pub blocks: Vec<QuantitySlice>,
}

fn find(blocks: &[QuantitySlice], quantity: Quantity) -> Option<&SliceMatrix> {
    blocks
        .iter()
        .find(|b| b.quantity == quantity)
        .map(|b| &b.values)
}

impl ParameterSlice {
    /// Payload for `quantity`, `None` if the layout does not carry it
    pub fn quantity(&self, quantity: Quantity) -> Option<&SliceMatrix> {
        find(&self.blocks, quantity)
    }

    /// Drop the first `n` parameter columns (e.g. an unstable coarsest step)
    pub fn skip_parameters(&self, n: usize) -> Result<Self> {
        if n >= self.parameters.len() {
            return Err(DecodeError::out_of_range("skip_parameters", n, self.parameters.len()));
        }
        Ok(Self {
            source: self.source.clone(),
            layout: self.layout,
            period_index: self.period_index,
            parameters: self.parameters[n..].to_vec(),
            blocks: self
                .blocks
                .iter()
                .map(|b| QuantitySlice {
                    quantity: b.quantity,
                    values: b.values.skip_varying(n),
                })
                .collect(),
        })
    }
}

impl PeriodSlice {
    /// Payload for `quantity`, `None` if the layout does not carry it
    pub fn quantity(&self, quantity: Quantity) -> Option<&SliceMatrix> {
        find(&self.blocks, quantity)
    }
}

/// The index held fixed by a projection
#[derive(Debug, Clone, Copy)]
enum Fixed {
    Period(usize),
    Parameter(usize),
}

/// Reject tables whose row count does not match `K*P*T`
fn check_shape(table: &RawTable, layout: &Layout) -> Result<()> {
    let expected = layout.expected_rows();
    if table.rows() != expected {
        return Err(DecodeError::LayoutMismatch {
            source_name: table.source().to_string(),
            parameters: layout.parameters(),
            periods: layout.periods(),
            blocks: layout.blocks().block_count(),
            expected,
            actual: table.rows(),
        });
    }
    Ok(())
}

/// Parameter values must repeat identically in every period of block 0
fn check_parameter_column(table: &RawTable, layout: &Layout) -> Result<()> {
    for p in 0..layout.parameters() {
        let expected = table.row(layout.row(0, p, 0))[0];
        for t in 1..layout.periods() {
            let found = table.row(layout.row(0, p, t))[0];
            let same = found == expected || (found.is_nan() && expected.is_nan());
            if !same {
                return Err(DecodeError::InconsistentParameterColumn {
                    source_name: table.source().to_string(),
                    parameter_index: p,
                    period_index: t,
                    expected,
                    found,
                });
            }
        }
    }
    Ok(())
}

/// Gather each payload block along the varying axis
fn gather(table: &RawTable, layout: &Layout, fixed: Fixed) -> Vec<QuantitySlice> {
    let varying = match fixed {
        Fixed::Period(_) => layout.parameters(),
        Fixed::Parameter(_) => layout.periods(),
    };

    layout
        .blocks()
        .payload()
        .iter()
        .enumerate()
        .map(|(i, &quantity)| {
            let block = i + 1;
            let rows: Vec<usize> = (0..varying)
                .map(|v| match fixed {
                    Fixed::Period(t) => layout.row(block, v, t),
                    Fixed::Parameter(p) => layout.row(block, p, v),
                })
                .collect();
            let values = SliceMatrix::from_fn(table.cols(), varying, |s, v| table.row(rows[v])[s]);
            QuantitySlice { quantity, values }
        })
        .collect()
}

/// Extract every parameter value for the integration period `period_index`.
///
/// Returns the parameter vector (block 0, column 0, first `P` rows) plus one
/// `(samples, P)` matrix per payload block.
pub fn decode_by_period(table: &RawTable, layout: &Layout, period_index: usize) -> Result<ParameterSlice> {
    if period_index >= layout.periods() {
        return Err(DecodeError::out_of_range("period_index", period_index, layout.periods()));
    }
    check_shape(table, layout)?;
    check_parameter_column(table, layout)?;

    tracing::debug!(
        source = table.source(),
        layout = %layout.blocks(),
        parameters = layout.parameters(),
        periods = layout.periods(),
        period_index,
        "decoding by period"
    );

    let parameters = (0..layout.parameters())
        .map(|p| table.row(layout.row(0, p, 0))[0])
        .collect();

    Ok(ParameterSlice {
        source: table.source().to_string(),
        layout: *layout,
        period_index,
        parameters,
        blocks: gather(table, layout, Fixed::Period(period_index)),
    })
}

/// Extract every integration period for the parameter at `param_index`.
///
/// Payload rows are gathered with a stride of `P` rows, giving one
/// `(samples, T)` matrix per payload block.
pub fn decode_by_parameter(table: &RawTable, layout: &Layout, param_index: usize) -> Result<PeriodSlice> {
    if param_index >= layout.parameters() {
        return Err(DecodeError::out_of_range("param_index", param_index, layout.parameters()));
    }
    check_shape(table, layout)?;
    check_parameter_column(table, layout)?;

    tracing::debug!(
        source = table.source(),
        layout = %layout.blocks(),
        parameters = layout.parameters(),
        periods = layout.periods(),
        param_index,
        "decoding by parameter"
    );

    Ok(PeriodSlice {
        source: table.source().to_string(),
        layout: *layout,
        parameter_index: param_index,
        parameter: table.row(layout.row(0, param_index, 0))[0],
        blocks: gather(table, layout, Fixed::Parameter(param_index)),
    })
}
