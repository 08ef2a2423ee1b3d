//! Orchestration: load the source once, render every output through the
//! configured executor, then write the manifest.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::{Backend, ResvgBackend, Source, SourceRef};
use crate::color::Color;
use crate::config::{PipelineConfig, Strictness};
use crate::error::{Error, Result};
use crate::executor::{Executor, Job, worker};
use crate::export::{GeneratedAsset, IcoExporter, ManifestExporter, PngExporter, RasterExporter, SvgExporter};
use crate::output::{OutputFormat, OutputSpec};
use crate::raster::{Raster, SizePx};
use crate::transform::{ColorTransform, FitMode, ResizeTransform};

// ============================================================================
// RenderJob
// ============================================================================

/// Produces and writes one output file.
///
/// In-process executors hand the job the already loaded source and the
/// pipeline's backend. A job that arrives in a worker process has neither
/// and reloads the source with the default backend.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderJob {
    pub spec: OutputSpec,
    pub fit: FitMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,

    pub destination: PathBuf,
    pub source: SourceRef,

    #[serde(default)]
    pub colors: ColorTransform,

    #[serde(skip)]
    loaded: Option<Arc<Source>>,

    #[serde(skip)]
    backend: Option<Arc<dyn Backend>>,
}

impl RenderJob {
    pub fn new(spec: OutputSpec, config: &PipelineConfig, output_dir: &Path) -> Self {
        Self {
            fit: config.fit_for(&spec),
            background: config.theme.background,
            destination: output_dir.join(&spec.name),
            source: config.source.clone(),
            colors: config.color_transform(),
            spec,
            loaded: None,
            backend: None,
        }
    }

    /// Shares an already loaded source and backend with the job.
    pub fn with_loaded(mut self, source: Arc<Source>, backend: Arc<dyn Backend>) -> Self {
        self.loaded = Some(source);
        self.backend = Some(backend);
        self
    }

    fn render(&self, backend: &dyn Backend, source: &Source, target: SizePx) -> Result<Raster> {
        let placement = ResizeTransform::new(target, self.fit).placement(source.width, source.height)?;
        backend.render(source, &placement, self.background)
    }

    fn encode(&self, backend: &dyn Backend, source: &Source) -> Result<(Vec<u8>, Vec<SizePx>)> {
        match self.spec.format {
            OutputFormat::Png => {
                let target = self
                    .spec
                    .size()
                    .ok_or_else(|| Error::config(format!("output {:?} has no size", self.spec.name)))?;
                let raster = self.render(backend, source, target)?;
                Ok((PngExporter.export(&[raster], backend)?, vec![target]))
            }
            OutputFormat::Ico => {
                let sizes: Vec<SizePx> = self.spec.ico_sizes().into_iter().map(SizePx::square).collect();
                let frames = sizes
                    .iter()
                    .map(|size| self.render(backend, source, *size))
                    .collect::<Result<Vec<_>>>()?;
                Ok((IcoExporter.export(&frames, backend)?, sizes))
            }
            OutputFormat::Svg => Ok((SvgExporter.export(source)?, Vec::new())),
            OutputFormat::Manifest => Err(Error::config(format!(
                "manifest {:?} is written by the pipeline, not rendered",
                self.spec.name
            ))),
        }
    }
}

impl Job for RenderJob {
    type Output = GeneratedAsset;

    fn label(&self) -> String {
        self.spec.name.clone()
    }

    fn run(&self) -> Result<GeneratedAsset> {
        let backend: Arc<dyn Backend> = match &self.backend {
            Some(backend) => Arc::clone(backend),
            None => Arc::new(ResvgBackend::new()),
        };
        let source = match &self.loaded {
            Some(source) => Arc::clone(source),
            None => Arc::new(backend.load(&self.source, &self.colors)?),
        };

        let (bytes, sizes) = self.encode(backend.as_ref(), &source)?;
        fs::write(&self.destination, &bytes).map_err(|e| Error::io(&self.destination, e))?;
        debug!(output = %self.spec.name, bytes = bytes.len(), backend = backend.name(), "wrote output");

        Ok(GeneratedAsset {
            name: self.spec.name.clone(),
            path: self.destination.clone(),
            format: self.spec.format,
            role: self.spec.role(),
            sizes,
            bytes: bytes.len() as u64,
        })
    }
}

// ============================================================================
// GenerationReport
// ============================================================================

/// An output that could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFailure {
    pub name: String,
    pub error: Error,
}

/// Outcome of [`Pipeline::generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub output_dir: PathBuf,
    /// Written outputs in output order.
    pub assets: Vec<GeneratedAsset>,
    /// Failed outputs in output order; only populated under best-effort.
    pub failures: Vec<OutputFailure>,
    pub manifest: Option<PathBuf>,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Every written file, manifest last.
    pub fn written_files(&self) -> Vec<PathBuf> {
        self.assets
            .iter()
            .map(|asset| asset.path.clone())
            .chain(self.manifest.clone())
            .collect()
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Runs a [`PipelineConfig`].
pub struct Pipeline {
    config: PipelineConfig,
    backend: Arc<dyn Backend>,
    custom_backend: bool,
}

impl Pipeline {
    /// A pipeline using [`ResvgBackend`].
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            backend: Arc::new(ResvgBackend::new()),
            custom_backend: false,
        }
    }

    /// Replaces the backend. Worker processes always use the default one.
    pub fn with_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = backend;
        self.custom_backend = true;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Checks the configuration without touching the file system.
    pub fn validate(&self) -> Result<()> {
        let outputs = &self.config.outputs;
        if outputs.is_empty() {
            return Err(Error::config("no outputs configured; use a preset or add outputs"));
        }

        let mut names = HashSet::new();
        for spec in outputs {
            spec.validate()?;
            if !names.insert(spec.name.as_str()) {
                return Err(Error::config(format!("duplicate output name {:?}", spec.name)));
            }
        }

        let manifests = outputs.iter().filter(|spec| spec.format == OutputFormat::Manifest).count();
        if manifests > 1 {
            return Err(Error::config("at most one manifest output is allowed"));
        }
        if let Some(manifest) = self.config.manifest_file_name() {
            let clash = outputs
                .iter()
                .any(|spec| spec.name == manifest && spec.format != OutputFormat::Manifest);
            if clash {
                return Err(Error::config(format!(
                    "output {manifest:?} collides with the manifest file"
                )));
            }
        }
        Ok(())
    }

    /// Produces every output under `output_dir`, then the manifest.
    pub fn generate(&self, output_dir: impl AsRef<Path>) -> Result<GenerationReport> {
        let output_dir = output_dir.as_ref();
        self.validate()?;

        let config = &self.config;
        let source = Arc::new(self.backend.load(&config.source, &config.color_transform())?);
        if !source.is_vector() {
            if let Some(spec) = config.outputs.iter().find(|spec| spec.format == OutputFormat::Svg) {
                return Err(Error::config(format!(
                    "output {:?} needs an SVG source, but {} is a raster image",
                    spec.name, config.source
                )));
            }
        }

        fs::create_dir_all(output_dir).map_err(|e| Error::io(output_dir, e))?;

        let executor = Executor::from_mode(&config.execution, config.strictness);
        let in_process = !matches!(executor, Executor::ProcessPool(_));
        if !in_process && self.custom_backend {
            warn!(backend = self.backend.name(), "worker processes render with the default backend");
        }

        let specs: Vec<&OutputSpec> = config
            .outputs
            .iter()
            .filter(|spec| spec.format != OutputFormat::Manifest)
            .collect();
        let jobs: Vec<RenderJob> = specs
            .iter()
            .map(|spec| {
                let job = RenderJob::new((*spec).clone(), config, output_dir);
                if in_process {
                    job.with_loaded(Arc::clone(&source), Arc::clone(&self.backend))
                } else {
                    job
                }
            })
            .collect();

        info!(
            source = %config.source,
            outputs = jobs.len(),
            executor = executor.name(),
            dir = %output_dir.display(),
            "generating assets"
        );
        let results = executor.run(jobs);

        let mut assets = Vec::new();
        let mut failures = Vec::new();
        for (spec, result) in specs.iter().zip(results) {
            match result {
                Ok(asset) => assets.push(asset),
                Err(error) => failures.push(OutputFailure {
                    name: spec.name.clone(),
                    error,
                }),
            }
        }

        if config.strictness == Strictness::FailFast {
            if let Some(first) = failures.into_iter().next() {
                warn!(output = %first.name, error = %first.error, "generation failed");
                return Err(first.error);
            }
            failures = Vec::new();
        }
        for failure in &failures {
            warn!(output = %failure.name, error = %failure.error, "output skipped");
        }

        let manifest = match config.manifest_file_name() {
            Some(name) => Some(self.write_manifest(output_dir, name, &assets)?),
            None => None,
        };

        info!(written = assets.len(), failed = failures.len(), "generation finished");
        Ok(GenerationReport {
            output_dir: output_dir.to_path_buf(),
            assets,
            failures,
            manifest,
        })
    }

    fn write_manifest(&self, output_dir: &Path, name: &str, assets: &[GeneratedAsset]) -> Result<PathBuf> {
        let default_name = self
            .config
            .source
            .label()
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app".into());
        let exporter = ManifestExporter::new(&self.config.manifest, self.config.theme, &default_name);

        let path = output_dir.join(name);
        fs::write(&path, exporter.export(assets)?).map_err(|e| Error::io(&path, e))?;
        debug!(path = %path.display(), "wrote manifest");
        Ok(path)
    }
}

/// Entry point of a process-pool worker: one [`RenderJob`] over stdin/stdout.
pub fn run_worker() -> Result<()> {
    worker::serve_stdio::<RenderJob>()
}

// ============================================================================
// Tests
// ============================================================================
