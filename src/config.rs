//! Run configuration.
//!
//! A [`PipelineConfig`] captures everything one `generate` call needs and
//! serializes to JSON so a run can be reproduced later:
//!
//! ```
//! use svg_assets::{Color, FitMode, PipelineConfig, SourceRef, preset};
//!
//! let config = PipelineConfig::builder(SourceRef::path("logo.svg"))
//!     .with_preset(preset::builtin("web").unwrap())
//!     .with_background(Color::parse("#282a36").unwrap())
//!     .with_fit_mode(FitMode::Contain)
//!     .build();
//!
//! let json = config.to_json().unwrap();
//! let restored = PipelineConfig::from_json(&json).unwrap();
//! assert_eq!(restored, config);
//! ```

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::backend::SourceRef;
use crate::color::{Color, ColorTheme};
use crate::output::{OutputFormat, OutputSpec};
use crate::preset::PresetConfig;
use crate::transform::{ColorReplacement, ColorTransform, FitMode};

/// Manifest file name used when no `manifest` output names one.
pub const DEFAULT_MANIFEST_NAME: &str = "site.webmanifest";

// ============================================================================
// Execution
// ============================================================================

/// How independent outputs are scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// One output at a time on the calling thread.
    #[default]
    Sequential,

    /// A dedicated thread pool; `None` uses the available parallelism.
    ThreadPool {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        workers: Option<usize>,
    },

    /// Worker processes fed JSON jobs over stdin.
    ProcessPool {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        workers: Option<usize>,

        /// Worker executable; defaults to the current executable.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        program: Option<PathBuf>,
    },
}

impl ExecutionMode {
    pub fn thread_pool(workers: Option<usize>) -> Self {
        Self::ThreadPool { workers }
    }

    pub fn process_pool(workers: Option<usize>) -> Self {
        Self::ProcessPool {
            workers,
            program: None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::ThreadPool { .. } => "thread-pool",
            Self::ProcessPool { .. } => "process-pool",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a failed output does to the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strictness {
    /// The run fails with the first failing output; no manifest is written.
    #[default]
    FailFast,

    /// Every output is attempted; the manifest lists the ones that succeeded.
    BestEffort,
}

// ============================================================================
// Manifest
// ============================================================================

/// Settings of the generated web manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestOptions {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// App name; defaults to the source file stem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,

    #[serde(default = "default_display")]
    pub display: String,
}

impl Default for ManifestOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            name: None,
            short_name: None,
            display: default_display(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_display() -> String {
    "standalone".into()
}

// ============================================================================
// PipelineConfig
// ============================================================================

/// Immutable description of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    pub source: SourceRef,

    /// Outputs in manifest order.
    pub outputs: Vec<OutputSpec>,

    #[serde(default)]
    pub theme: ColorTheme,

    /// Fit mode for outputs that do not set their own.
    #[serde(default)]
    pub fit: FitMode,

    #[serde(default)]
    pub execution: ExecutionMode,

    #[serde(default)]
    pub strictness: Strictness,

    #[serde(default)]
    pub manifest: ManifestOptions,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub color_replacements: Vec<ColorReplacement>,
}

impl PipelineConfig {
    pub fn builder(source: impl Into<SourceRef>) -> PipelineBuilder {
        PipelineBuilder::new(source)
    }

    /// Color substitution applied to the source markup.
    pub fn color_transform(&self) -> ColorTransform {
        ColorTransform::from_theme(&self.theme).with_replacements(self.color_replacements.iter().copied())
    }

    /// Effective fit mode of one output.
    pub fn fit_for(&self, spec: &OutputSpec) -> FitMode {
        spec.fit.unwrap_or(self.fit)
    }

    /// File name of the manifest, or `None` when manifest generation is off.
    pub fn manifest_file_name(&self) -> Option<&str> {
        if !self.manifest.enabled {
            return None;
        }
        let named = self
            .outputs
            .iter()
            .find(|spec| spec.format == OutputFormat::Manifest)
            .map(|spec| spec.name.as_str());
        Some(named.unwrap_or(DEFAULT_MANIFEST_NAME))
    }

    /// Serializes the config to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the config to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// PipelineBuilder
// ============================================================================

/// Collects settings and produces a [`PipelineConfig`].
///
/// Explicit outputs are appended after the preset's outputs; one with the
/// same name as a preset output replaces it in place.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    source: SourceRef,
    preset: Option<PresetConfig>,
    outputs: Vec<OutputSpec>,
    theme: ColorTheme,
    replacements: Vec<ColorReplacement>,
    fit: FitMode,
    execution: ExecutionMode,
    strictness: Strictness,
    manifest_enabled: Option<bool>,
    app_name: Option<String>,
    short_name: Option<String>,
}

impl PipelineBuilder {
    pub fn new(source: impl Into<SourceRef>) -> Self {
        Self {
            source: source.into(),
            preset: None,
            outputs: Vec::new(),
            theme: ColorTheme::default(),
            replacements: Vec::new(),
            fit: FitMode::default(),
            execution: ExecutionMode::default(),
            strictness: Strictness::default(),
            manifest_enabled: None,
            app_name: None,
            short_name: None,
        }
    }

    pub fn with_preset(mut self, preset: PresetConfig) -> Self {
        self.preset = Some(preset);
        self
    }

    pub fn with_output(mut self, spec: OutputSpec) -> Self {
        self.outputs.push(spec);
        self
    }

    pub fn with_colors(mut self, theme: ColorTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.theme.background = Some(color);
        self
    }

    pub fn with_foreground(mut self, color: Color) -> Self {
        self.theme.foreground = Some(color);
        self
    }

    pub fn with_color_replacement(mut self, from: Color, to: Color) -> Self {
        self.replacements.push(ColorReplacement::new(from, to));
        self
    }

    pub fn with_fit_mode(mut self, fit: FitMode) -> Self {
        self.fit = fit;
        self
    }

    pub fn with_execution(mut self, execution: ExecutionMode) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    /// Overrides the preset's `generate_manifest`.
    pub fn with_manifest(mut self, enabled: bool) -> Self {
        self.manifest_enabled = Some(enabled);
        self
    }

    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    pub fn with_short_name(mut self, name: impl Into<String>) -> Self {
        self.short_name = Some(name.into());
        self
    }

    pub fn build(self) -> PipelineConfig {
        let mut outputs = self
            .preset
            .as_ref()
            .map(|preset| preset.outputs.clone())
            .unwrap_or_default();

        for spec in self.outputs {
            match outputs.iter_mut().find(|existing| existing.name == spec.name) {
                Some(slot) => *slot = spec,
                None => outputs.push(spec),
            }
        }

        let enabled = self
            .manifest_enabled
            .or_else(|| self.preset.as_ref().map(|preset| preset.generate_manifest))
            .unwrap_or(true);

        PipelineConfig {
            source: self.source,
            outputs,
            theme: self.theme,
            fit: self.fit,
            execution: self.execution,
            strictness: self.strictness,
            manifest: ManifestOptions {
                enabled,
                name: self.app_name,
                short_name: self.short_name,
                ..ManifestOptions::default()
            },
            color_replacements: self.replacements,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
