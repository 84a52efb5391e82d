//! CLI argument parsing for convstat

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::analysis::{ReferencePreset, ReferenceValues};
use crate::layout::BlockLayout;
use crate::output::{Axis, OutputFormat, ReportOptions, SliceOptions};

#[derive(Parser, Debug)]
#[command(name = "convstat")]
#[command(version)]
#[command(about = "Decode convergence study statistics files into parameter and period slices", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Print per-column summaries (min, quartiles, max, mean, std) instead of raw samples
    #[arg(long = "summary", global = true)]
    pub summary: bool,

    /// Print median percent error against mean CPU time per varying index
    #[arg(long = "cost", global = true, conflicts_with = "summary")]
    pub cost: bool,

    /// Built-in benchmark references (replaces the study's references)
    #[arg(long = "reference-preset", value_enum, value_name = "PRESET", global = true)]
    pub reference_preset: Option<ReferencePreset>,

    /// Reference value for the mean block; enables percent-error output
    #[arg(long = "reference-mean", value_name = "VALUE", global = true)]
    pub reference_mean: Option<f64>,

    /// Reference value for the second-moment block; enables percent-error output
    #[arg(long = "reference-second-moment", value_name = "VALUE", global = true)]
    pub reference_second_moment: Option<f64>,

    /// Enable debug tracing output (to stderr)
    #[arg(long = "debug", global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fix one integration period and list every parameter value
    ByPeriod(FileArgs),
    /// Fix one parameter value and list every integration period
    ByParameter(FileArgs),
    /// Decode every file of a TOML study description
    Study(StudyArgs),
}

/// Arguments for decoding a single statistics file
#[derive(Args, Debug)]
pub struct FileArgs {
    /// Statistics file to decode
    pub file: PathBuf,

    /// Block layout of the file
    #[arg(long = "layout", value_enum)]
    pub layout: BlockLayout,

    /// Number of discretization parameter values (P)
    #[arg(short = 'P', long = "parameters", value_name = "N")]
    pub parameters: usize,

    /// Number of integration periods (T)
    #[arg(short = 'T', long = "periods", value_name = "N")]
    pub periods: usize,

    /// Index held fixed (period for by-period, parameter for by-parameter)
    #[arg(short = 'i', long = "index", value_name = "I", default_value = "0")]
    pub index: usize,

    /// Drop the first N parameter columns (by-period only)
    #[arg(long = "skip-parameters", value_name = "N", default_value = "0")]
    pub skip_parameters: usize,

    /// Comma-separated length of each integration period, e.g. 40,400,4000
    #[arg(long = "period-lengths", value_name = "LEN", value_delimiter = ',')]
    pub period_lengths: Vec<f64>,
}

impl FileArgs {
    /// Slice options given on the command line
    pub fn slice_options(&self) -> SliceOptions {
        SliceOptions {
            skip_parameters: self.skip_parameters,
            period_lengths: (!self.period_lengths.is_empty()).then(|| self.period_lengths.clone()),
        }
    }
}

/// Arguments for decoding a study
#[derive(Args, Debug)]
pub struct StudyArgs {
    /// TOML study description
    pub config: PathBuf,

    /// Which index to hold fixed
    #[arg(long = "by", value_enum, default_value = "period")]
    pub by: Axis,

    /// Index held fixed
    #[arg(short = 'i', long = "index", value_name = "I", default_value = "0")]
    pub index: usize,
}

impl Cli {
    /// References given on the command line, layered over `base`.
    ///
    /// A preset replaces `base`; explicit values override both.
    pub fn references(&self, base: ReferenceValues) -> ReferenceValues {
        let mut refs = self.reference_preset.map_or(base, ReferencePreset::values);
        if let Some(value) = self.reference_mean {
            refs = refs.with_mean(value);
        }
        if let Some(value) = self.reference_second_moment {
            refs = refs.with_second_moment(value);
        }
        refs
    }

    /// Report options for this invocation
    pub fn report_options(&self, base: ReferenceValues) -> ReportOptions {
        ReportOptions {
            references: self.references(base),
            summary: self.summary,
            cost: self.cost,
        }
    }
}
