//! svg-assets: one SVG in, a full favicon/PWA/social-preview set out
//!
//! A [`Pipeline`] loads a source image once, renders every configured output
//! at its own size and fit mode, encodes it (PNG, ICO, SVG passthrough) and
//! finishes with a web manifest listing everything it wrote.
//!
//! # Example
//!
//! ```no_run
//! use svg_assets::{Color, Pipeline, PipelineConfig, SourceRef, preset};
//!
//! let config = PipelineConfig::builder(SourceRef::path("logo.svg"))
//!     .with_preset(preset::builtin("web")?)
//!     .with_background(Color::parse("#282a36")?)
//!     .build();
//!
//! let report = Pipeline::new(config).generate("./output")?;
//! for asset in &report.assets {
//!     println!("{} ({} bytes)", asset.name, asset.bytes);
//! }
//! # Ok::<(), svg_assets::Error>(())
//! ```
//!
//! # Parallel execution
//!
//! Outputs are independent, so they can be rendered on a thread pool or in
//! worker processes. Results (and therefore the manifest) keep the output
//! order either way:
//!
//! ```no_run
//! use svg_assets::{ExecutionMode, Pipeline, PipelineConfig, Strictness, template};
//!
//! let config = PipelineConfig::builder(template::get_template("badge")?)
//!     .with_preset(svg_assets::preset::builtin("full")?)
//!     .with_execution(ExecutionMode::thread_pool(Some(4)))
//!     .with_strictness(Strictness::BestEffort)
//!     .build();
//!
//! let report = Pipeline::new(config).generate("./output")?;
//! assert!(report.is_success());
//! # Ok::<(), svg_assets::Error>(())
//! ```
//!
//! [`ExecutionMode::ProcessPool`] without a `program` re-launches the
//! *current executable* with a single `worker` argument and talks to it over
//! stdin/stdout. The `svg-assets` binary handles that; any other binary that
//! uses the process pool must route `worker` to [`run_worker`] before doing
//! anything else (and must not print to stdout in that mode), or point
//! `program` at the `svg-assets` binary instead:
//!
//! ```no_run
//! use svg_assets::{ExecutionMode, Pipeline, PipelineConfig, preset, template};
//!
//! fn main() -> svg_assets::Result<()> {
//!     if std::env::args().nth(1).as_deref() == Some("worker") {
//!         return svg_assets::run_worker();
//!     }
//!
//!     let config = PipelineConfig::builder(template::get_template("monogram")?)
//!         .with_preset(preset::builtin("web")?)
//!         .with_execution(ExecutionMode::process_pool(Some(4)))
//!         .build();
//!     Pipeline::new(config).generate("./output")?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod executor;
pub mod export;
pub mod preset;
pub mod template;
pub mod transform;

mod color;
mod config;
mod error;
mod output;
mod pipeline;
mod raster;

pub use backend::{Backend, RasterFormat, ResvgBackend, Source, SourceContent, SourceRef};
pub use color::{Color, ColorTheme};
pub use config::{
    DEFAULT_MANIFEST_NAME, ExecutionMode, ManifestOptions, PipelineBuilder, PipelineConfig, Strictness,
};
pub use error::{Error, Result};
pub use export::GeneratedAsset;
pub use output::{AssetRole, DEFAULT_ICO_SIZES, MAX_ICO_SIZE, OutputFormat, OutputSpec};
pub use pipeline::{GenerationReport, OutputFailure, Pipeline, RenderJob, run_worker};
pub use preset::{PresetConfig, PresetRegistry};
pub use raster::{Raster, RectPx, SizePx};
pub use transform::{ColorReplacement, ColorTransform, FitMode, Placement, ResizeTransform};
