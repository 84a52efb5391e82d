//! Study configuration files
//!
//! A study groups several statistics files that share a layout (for example
//! the 2nd, 4th and 6th order runs of one experiment) together with the
//! reference values used for percent error. Relative file paths resolve
//! against the directory holding the configuration.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::{ReferencePreset, ReferenceValues};
use crate::layout::{BlockLayout, Layout};
use crate::output::SliceOptions;
use crate::table::RawTable;

/// The `[references]` table: an optional preset with explicit overrides
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceSection {
    /// Built-in benchmark values applied first
    #[serde(default)]
    pub preset: Option<ReferencePreset>,
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default)]
    pub second_moment: Option<f64>,
}

impl ReferenceSection {
    /// Preset values overlaid with the explicit ones
    pub fn resolve(&self) -> ReferenceValues {
        let mut refs = self.preset.map(ReferencePreset::values).unwrap_or_default();
        if let Some(value) = self.mean {
            refs = refs.with_mean(value);
        }
        if let Some(value) = self.second_moment {
            refs = refs.with_second_moment(value);
        }
        refs
    }
}

/// One statistics file within a study
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudyEntry {
    /// Path to the statistics file
    pub file: PathBuf,
    /// Display label (defaults to the file name)
    #[serde(default)]
    pub label: Option<String>,
    /// Block layout of the file
    pub layout: BlockLayout,
    /// Number of discretization parameter values (P)
    pub parameters: usize,
    /// Number of integration periods (T)
    pub periods: usize,
    /// Leading parameter columns to drop from parameter slices
    #[serde(default)]
    pub skip_parameters: usize,
    /// Length of each integration period (one per period)
    #[serde(default)]
    pub period_lengths: Option<Vec<f64>>,
}

impl StudyEntry {
    /// Validated layout descriptor for this file
    pub fn layout(&self) -> Result<Layout> {
        Layout::new(self.parameters, self.periods, self.layout)
            .with_context(|| format!("Invalid layout for {}", self.file.display()))
    }

    /// Label shown in reports
    pub fn label(&self) -> String {
        self.label.clone().unwrap_or_else(|| {
            self.file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.file.display().to_string())
        })
    }

    /// Per-file report options
    pub fn slice_options(&self) -> SliceOptions {
        SliceOptions {
            skip_parameters: self.skip_parameters,
            period_lengths: self.period_lengths.clone(),
        }
    }

    /// Load the statistics table named by this entry
    pub fn load_table(&self) -> Result<RawTable> {
        RawTable::from_file(&self.file).with_context(|| format!("Failed to load study entry {}", self.label()))
    }
}

/// A TOML study description
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudyConfig {
    /// Reference values for percent error
    #[serde(default)]
    pub references: ReferenceSection,
    /// Statistics files in the study
    #[serde(rename = "study")]
    pub entries: Vec<StudyEntry>,
}

impl StudyConfig {
    /// Parse a study from TOML text. Relative paths resolve against `base_dir`.
    pub fn from_toml_str(contents: &str, base_dir: &Path) -> Result<Self> {
        let mut config: StudyConfig = toml::from_str(contents).context("Invalid study TOML")?;

        if config.entries.is_empty() {
            bail!("Invalid study: at least one [[study]] entry is required");
        }

        for entry in &mut config.entries {
            if entry.parameters == 0 {
                bail!("Invalid study entry {}: parameters must be positive", entry.file.display());
            }
            if entry.periods == 0 {
                bail!("Invalid study entry {}: periods must be positive", entry.file.display());
            }
            if entry.skip_parameters >= entry.parameters {
                bail!(
                    "Invalid study entry {}: skip_parameters ({}) must be < parameters ({})",
                    entry.file.display(),
                    entry.skip_parameters,
                    entry.parameters
                );
            }
            let layout = entry.layout()?;
            entry
                .slice_options()
                .check(&layout)
                .with_context(|| format!("Invalid study entry {}", entry.file.display()))?;
            if entry.file.is_relative() {
                entry.file = base_dir.join(&entry.file);
            }
        }

        let references = config.reference_values();
        for (name, value) in [("mean", references.mean), ("second_moment", references.second_moment)] {
            if let Some(v) = value {
                if !v.is_finite() || v == 0.0 {
                    bail!("Invalid reference {name} = {v}: must be finite and non-zero");
                }
            }
        }

        Ok(config)
    }

    /// Resolved reference values of the study
    pub fn reference_values(&self) -> ReferenceValues {
        self.references.resolve()
    }

    /// Load and validate a study file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            bail!("Study file not found: {}", path_ref.display());
        }

        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read study file {}", path_ref.display()))?;
        let base_dir = path_ref.parent().unwrap_or_else(|| Path::new("."));

        Self::from_toml_str(&contents, base_dir)
            .with_context(|| format!("Failed to load study {}", path_ref.display()))
    }
}
