//! Report building and rendering
//!
//! A [`Report`] is what the CLI prints for one decoded file: the varying axis
//! values, each payload quantity (raw samples or per-column summaries), and
//! percent-error blocks for every quantity that has a reference value. In
//! cost mode the quantity blocks are replaced by error-versus-CPU-time rows.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fmt::{self, Write as _};

use crate::analysis::{column_means, percent_error_for, summarize_columns, ColumnSummary, ReferenceValues};
use crate::decoder::{decode_by_parameter, decode_by_period, QuantitySlice};
use crate::layout::{BlockLayout, Layout, Quantity};
use crate::matrix::SliceMatrix;
use crate::table::RawTable;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

/// Which index a report holds fixed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Fix the integration period, vary the parameter
    Period,
    /// Fix the parameter, vary the integration period
    Parameter,
}

impl Axis {
    /// The axis that varies when `self` is fixed
    pub fn varying(self) -> Axis {
        match self {
            Axis::Period => Axis::Parameter,
            Axis::Parameter => Axis::Period,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Period => f.pad("period"),
            Axis::Parameter => f.pad("parameter"),
        }
    }
}

/// Knobs shared by every report in one run
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// References for percent-error blocks
    pub references: ReferenceValues,
    /// Emit per-column summaries instead of raw samples
    pub summary: bool,
    /// Emit median percent error against mean CPU time instead of quantity blocks
    pub cost: bool,
}

/// Per-file knobs: which parameter columns to keep and how to label periods
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SliceOptions {
    /// Leading parameter columns to drop from parameter slices
    pub skip_parameters: usize,
    /// Length of each integration period, used as the period axis values
    pub period_lengths: Option<Vec<f64>>,
}

impl SliceOptions {
    /// Check the period lengths against `layout`
    pub fn check(&self, layout: &Layout) -> Result<()> {
        if let Some(lengths) = &self.period_lengths {
            if lengths.len() != layout.periods() {
                bail!(
                    "period_lengths has {} values but the layout has {} periods",
                    lengths.len(),
                    layout.periods()
                );
            }
            if let Some(bad) = lengths.iter().find(|l| !l.is_finite() || **l <= 0.0) {
                bail!("Invalid period length {bad}: must be finite and positive");
            }
        }
        Ok(())
    }
}

/// Payload of one quantity block
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QuantityData {
    /// Samples grouped by varying index: `columns[v][s]`
    Samples { columns: Vec<Vec<f64>> },
    /// One summary per varying index
    Summary { summary: Vec<ColumnSummary> },
}

/// One named block in a report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantityReport {
    /// Quantity name, with a `_percent_error` suffix for derived blocks
    pub name: String,
    #[serde(flatten)]
    pub data: QuantityData,
}

/// Cost of one varying index: accuracy reached against CPU time spent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostRow {
    /// Percent-error block the median comes from
    pub quantity: String,
    /// Parameter value, period length or period index
    pub varying: f64,
    pub median_percent_error: f32,
    pub mean_cputime: f32,
}

/// Decoded view of one statistics file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub label: String,
    pub source: String,
    pub layout: BlockLayout,
    pub fixed_axis: Axis,
    pub fixed_index: usize,
    /// Parameter value held fixed (period slices only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_parameter: Option<f64>,
    /// Length of the period held fixed, when period lengths are configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_period_length: Option<f64>,
    pub varying_axis: Axis,
    /// Parameter values, or period lengths (indices when none are configured)
    pub varying: Vec<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub quantities: Vec<QuantityReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<Vec<CostRow>>,
}

fn quantity_data(values: &SliceMatrix, summary: bool) -> QuantityData {
    if summary {
        QuantityData::Summary {
            summary: summarize_columns(values),
        }
    } else {
        QuantityData::Samples {
            columns: (0..values.varying()).map(|v| values.column(v)).collect(),
        }
    }
}

fn with_reference<'a>(
    blocks: &'a [QuantitySlice],
    references: &'a ReferenceValues,
) -> impl Iterator<Item = &'a QuantitySlice> {
    blocks.iter().filter(move |block| references.get(block.quantity).is_some())
}

fn quantity_reports(blocks: &[QuantitySlice], options: &ReportOptions) -> Result<Vec<QuantityReport>> {
    let mut reports = Vec::with_capacity(blocks.len() * 2);
    for block in blocks {
        reports.push(QuantityReport {
            name: block.quantity.name().to_string(),
            data: quantity_data(&block.values, options.summary),
        });
    }
    for block in with_reference(blocks, &options.references) {
        let errors = percent_error_for(&block.values, block.quantity, &options.references)?;
        reports.push(QuantityReport {
            name: format!("{}_percent_error", block.quantity.name()),
            data: quantity_data(&errors, options.summary),
        });
    }
    Ok(reports)
}

fn cost_rows(varying: &[f64], blocks: &[QuantitySlice], references: &ReferenceValues) -> Result<Vec<CostRow>> {
    let cputime = blocks
        .iter()
        .find(|block| block.quantity == Quantity::CpuTime)
        .context("Cost view needs a cputime block")?;
    let mean_cputime = column_means(&cputime.values);

    let mut rows = Vec::new();
    for block in with_reference(blocks, references) {
        let errors = percent_error_for(&block.values, block.quantity, references)?;
        let name = format!("{}_percent_error", block.quantity.name());
        for ((value, summary), cpu) in varying.iter().zip(summarize_columns(&errors)).zip(&mean_cputime) {
            rows.push(CostRow {
                quantity: name.clone(),
                varying: *value,
                median_percent_error: summary.median,
                mean_cputime: *cpu,
            });
        }
    }

    if rows.is_empty() {
        bail!("Cost view needs a reference value (--reference-mean, --reference-second-moment or --reference-preset)");
    }
    Ok(rows)
}

/// Decode `table` along `axis` and build a report.
///
/// `slice.skip_parameters` only applies when the period is fixed.
pub fn build_report(
    label: &str,
    table: &RawTable,
    layout: &Layout,
    axis: Axis,
    index: usize,
    slice: &SliceOptions,
    options: &ReportOptions,
) -> Result<Report> {
    slice.check(layout)?;

    let (source, fixed_parameter, fixed_period_length, varying, blocks) = match axis {
        Axis::Period => {
            let mut decoded = decode_by_period(table, layout, index)?;
            if slice.skip_parameters > 0 {
                tracing::warn!(
                    label,
                    skip_parameters = slice.skip_parameters,
                    "dropping leading parameter columns from report"
                );
                decoded = decoded.skip_parameters(slice.skip_parameters)?;
            }
            let length = slice
                .period_lengths
                .as_ref()
                .and_then(|lengths| lengths.get(index).copied());
            (decoded.source, None, length, decoded.parameters, decoded.blocks)
        }
        Axis::Parameter => {
            let decoded = decode_by_parameter(table, layout, index)?;
            let varying = slice
                .period_lengths
                .clone()
                .unwrap_or_else(|| (0..layout.periods()).map(|t| t as f64).collect());
            (decoded.source, Some(decoded.parameter), None, varying, decoded.blocks)
        }
    };

    let (quantities, cost) = if options.cost {
        let rows = cost_rows(&varying, &blocks, &options.references)
            .with_context(|| format!("Failed to analyze {label}"))?;
        (Vec::new(), Some(rows))
    } else {
        let quantities =
            quantity_reports(&blocks, options).with_context(|| format!("Failed to analyze {label}"))?;
        (quantities, None)
    };

    Ok(Report {
        label: label.to_string(),
        source,
        layout: layout.blocks(),
        fixed_axis: axis,
        fixed_index: index,
        fixed_parameter,
        fixed_period_length,
        varying_axis: axis.varying(),
        varying,
        quantities,
        cost,
    })
}

/// Render reports in `format`
pub fn render(reports: &[Report], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(reports)),
        OutputFormat::Json => render_json(reports),
        OutputFormat::Csv => Ok(render_csv(reports)),
    }
}

/// Pretty-printed JSON array of reports
pub fn render_json(reports: &[Report]) -> Result<String> {
    serde_json::to_string_pretty(reports).context("Failed to serialize reports")
}

/// Aligned plain-text tables
pub fn render_text(reports: &[Report]) -> String {
    let mut out = String::new();
    for report in reports {
        let _ = writeln!(out, "=== {} ({}) ===", report.label, report.source);
        let _ = write!(
            out,
            "layout: {}, fixed {} {}",
            report.layout, report.fixed_axis, report.fixed_index
        );
        if let Some(value) = report.fixed_parameter {
            let _ = write!(out, " (value {})", value);
        }
        if let Some(length) = report.fixed_period_length {
            let _ = write!(out, " (length {})", length);
        }
        let _ = writeln!(out, ", varying {}", report.varying_axis);

        if let Some(rows) = &report.cost {
            let _ = writeln!(out, "[cost]");
            let _ = writeln!(
                out,
                "{:>14} {:>28} {:>14} {:>14}",
                report.varying_axis, "error", "median %", "mean cputime"
            );
            for row in rows {
                let _ = writeln!(
                    out,
                    "{:>14} {:>28} {:>14.4e} {:>14.4e}",
                    row.varying, row.quantity, row.median_percent_error, row.mean_cputime
                );
            }
        }

        for quantity in &report.quantities {
            let _ = writeln!(out, "[{}]", quantity.name);
            match &quantity.data {
                QuantityData::Samples { columns } => {
                    for (value, column) in report.varying.iter().zip(columns) {
                        let _ = write!(out, "{:>14}", value);
                        for sample in column {
                            let _ = write!(out, " {:>14.6e}", sample);
                        }
                        out.push('\n');
                    }
                }
                QuantityData::Summary { summary } => {
                    let _ = writeln!(
                        out,
                        "{:>14} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
                        report.varying_axis, "min", "q1", "median", "q3", "max", "mean", "std"
                    );
                    for (value, s) in report.varying.iter().zip(summary) {
                        let _ = writeln!(
                            out,
                            "{:>14} {:>12.4e} {:>12.4e} {:>12.4e} {:>12.4e} {:>12.4e} {:>12.4e} {:>12.4e}",
                            value, s.min, s.q1, s.median, s.q3, s.max, s.mean, s.std
                        );
                    }
                }
            }
        }
        out.push('\n');
    }
    out
}

/// Escape CSV field (handle commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CsvMode {
    Samples,
    Summary,
    Cost,
}

fn csv_mode(reports: &[Report]) -> CsvMode {
    match reports.first() {
        Some(report) if report.cost.is_some() => CsvMode::Cost,
        Some(report) => match report.quantities.first().map(|q| &q.data) {
            Some(QuantityData::Summary { .. }) => CsvMode::Summary,
            _ => CsvMode::Samples,
        },
        None => CsvMode::Samples,
    }
}

/// Long-format CSV.
///
/// Raw samples: `label,quantity,varying,sample,value`. Summaries:
/// `label,quantity,varying,min,q1,median,q3,max,mean,std`. Cost rows:
/// `label,quantity,varying,median_percent_error,mean_cputime`. The header
/// follows the first report's mode.
pub fn render_csv(reports: &[Report]) -> String {
    let mut out = String::new();
    out.push_str(match csv_mode(reports) {
        CsvMode::Samples => "label,quantity,varying,sample,value\n",
        CsvMode::Summary => "label,quantity,varying,min,q1,median,q3,max,mean,std\n",
        CsvMode::Cost => "label,quantity,varying,median_percent_error,mean_cputime\n",
    });

    for report in reports {
        let label = escape_field(&report.label);
        for quantity in &report.quantities {
            match &quantity.data {
                QuantityData::Samples { columns } => {
                    for (value, column) in report.varying.iter().zip(columns) {
                        for (s, sample) in column.iter().enumerate() {
                            let _ = writeln!(out, "{},{},{},{},{}", label, quantity.name, value, s, sample);
                        }
                    }
                }
                QuantityData::Summary { summary } => {
                    for (value, s) in report.varying.iter().zip(summary) {
                        let _ = writeln!(
                            out,
                            "{},{},{},{},{},{},{},{},{},{}",
                            label, quantity.name, value, s.min, s.q1, s.median, s.q3, s.max, s.mean, s.std
                        );
                    }
                }
            }
        }
        for row in report.cost.iter().flatten() {
            let _ = writeln!(
                out,
                "{},{},{},{},{}",
                label, row.quantity, row.varying, row.median_percent_error, row.mean_cputime
            );
        }
    }
    out
}
