use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use image::ImageFormat;
use svg_assets::{
    Backend, Color, Error, ExecutionMode, FitMode, OutputSpec, Pipeline, PipelineConfig, Placement, Raster,
    RasterFormat, ResvgBackend, Result, Source, SourceRef, Strictness, preset,
};
use svg_assets::transform::ColorTransform;

const LOGO: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="512" height="512" viewBox="0 0 512 512">
  <rect x="32" y="32" width="448" height="448" rx="96" fill="#000000"/>
  <circle cx="256" cy="256" r="120" fill="#ffffff"/>
</svg>"##;

const WIDE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="800" height="400"><rect width="800" height="400" fill="#3366ff"/></svg>"##;

fn write_source(dir: &Path, name: &str, markup: &str) -> SourceRef {
    let path = dir.join(name);
    fs::write(&path, markup).unwrap();
    SourceRef::path(path)
}

fn file_names(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

fn manifest_json(path: &Path) -> serde_json::Value {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

#[test]
fn web_preset_writes_the_full_favicon_set() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path(), "logo.svg", LOGO);
    let out = tmp.path().join("out");

    let config = PipelineConfig::builder(source)
        .with_preset(preset::builtin("web").unwrap())
        .build();
    let report = Pipeline::new(config).generate(&out).unwrap();

    let expected: BTreeSet<String> = [
        "favicon.svg",
        "favicon.ico",
        "favicon-16x16.png",
        "favicon-32x32.png",
        "apple-touch-icon.png",
        "android-chrome-192x192.png",
        "android-chrome-512x512.png",
        "og-image.png",
        "site.webmanifest",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    assert_eq!(file_names(&out), expected);
    assert!(report.is_success());
    assert_eq!(report.assets.len(), 8);
    assert_eq!(report.manifest.as_deref(), Some(out.join("site.webmanifest").as_path()));

    let og = image::open(out.join("og-image.png")).unwrap();
    assert_eq!((og.width(), og.height()), (1200, 630));

    let touch = image::open(out.join("apple-touch-icon.png")).unwrap();
    assert_eq!((touch.width(), touch.height()), (180, 180));

    let ico = image::load_from_memory_with_format(&fs::read(out.join("favicon.ico")).unwrap(), ImageFormat::Ico)
        .unwrap();
    assert_eq!(ico.width(), 48);

    assert_eq!(fs::read_to_string(out.join("favicon.svg")).unwrap(), LOGO);

    let manifest = manifest_json(&out.join("site.webmanifest"));
    assert_eq!(manifest["name"], "logo");
    let icons: Vec<&str> = manifest["icons"]
        .as_array()
        .unwrap()
        .iter()
        .map(|icon| icon["src"].as_str().unwrap())
        .collect();
    assert_eq!(
        icons,
        [
            "/favicon-16x16.png",
            "/favicon-32x32.png",
            "/apple-touch-icon.png",
            "/android-chrome-192x192.png",
            "/android-chrome-512x512.png",
        ]
    );
    let og_entry = manifest["assets"]
        .as_array()
        .unwrap()
        .iter()
        .find(|asset| asset["src"] == "/og-image.png")
        .unwrap();
    assert_eq!(og_entry["role"], "og-image");
    assert_eq!(og_entry["sizes"], serde_json::json!(["1200x630"]));
    assert_eq!(manifest["icons"][3]["purpose"], "any maskable");
    assert_eq!(manifest["assets"][1]["sizes"], serde_json::json!(["16x16", "32x32", "48x48"]));
}

#[test]
fn manifest_order_is_the_same_for_every_executor() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path(), "logo.svg", LOGO);

    let mut manifests = Vec::new();
    for (index, execution) in [ExecutionMode::Sequential, ExecutionMode::thread_pool(Some(4))]
        .into_iter()
        .enumerate()
    {
        let out = tmp.path().join(format!("out-{index}"));
        let config = PipelineConfig::builder(source.clone())
            .with_preset(preset::builtin("web").unwrap())
            .with_execution(execution)
            .build();
        let report = Pipeline::new(config).generate(&out).unwrap();

        let names: Vec<_> = report.assets.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names[0], "favicon.svg");
        assert_eq!(names[7], "og-image.png");
        manifests.push(fs::read(out.join("site.webmanifest")).unwrap());
    }

    assert_eq!(manifests[0], manifests[1]);
}

#[test]
fn generation_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path(), "logo.svg", LOGO);
    let out = tmp.path().join("out");
    let config = PipelineConfig::builder(source)
        .with_preset(preset::builtin("web").unwrap())
        .with_foreground(Color::rgb(0x28, 0x2a, 0x36))
        .build();
    let pipeline = Pipeline::new(config);

    pipeline.generate(&out).unwrap();
    let first: Vec<Vec<u8>> = file_names(&out).iter().map(|n| fs::read(out.join(n)).unwrap()).collect();
    pipeline.generate(&out).unwrap();
    let second: Vec<Vec<u8>> = file_names(&out).iter().map(|n| fs::read(out.join(n)).unwrap()).collect();

    assert_eq!(first, second);
}

#[test]
fn no_outputs_fails_before_touching_the_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    let config = PipelineConfig::builder(SourceRef::path(tmp.path().join("missing.svg"))).build();

    let err = Pipeline::new(config).generate(&out).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
    assert!(!out.exists());
}

#[test]
fn missing_source_is_a_source_load_error() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    let config = PipelineConfig::builder(SourceRef::path(tmp.path().join("missing.svg")))
        .with_output(OutputSpec::png("icon.png", 16, 16))
        .build();

    let err = Pipeline::new(config).generate(&out).unwrap_err();
    assert!(matches!(err, Error::SourceLoad { .. }));
    assert!(!out.exists());
}

#[test]
fn zero_sized_source_is_a_configuration_error() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(
        tmp.path(),
        "flat.svg",
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="0" height="100"/>"#,
    );
    let out = tmp.path().join("out");
    let config = PipelineConfig::builder(source)
        .with_output(OutputSpec::png("icon.png", 16, 16))
        .build();

    let err = Pipeline::new(config).generate(&out).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)), "{err:?}");
    assert!(!out.exists());
}

#[test]
fn thin_raster_source_covers_a_wide_canvas() {
    let tmp = tempfile::tempdir().unwrap();
    let png = tmp.path().join("strip.png");
    image::RgbaImage::from_pixel(1, 2000, image::Rgba([40, 40, 200, 255]))
        .save(&png)
        .unwrap();
    let out = tmp.path().join("out");

    let config = PipelineConfig::builder(SourceRef::path(&png))
        .with_output(OutputSpec::png("og-image.png", 1200, 630))
        .with_manifest(false)
        .build();
    Pipeline::new(config).generate(&out).unwrap();

    let og = image::open(out.join("og-image.png")).unwrap().to_rgba8();
    assert_eq!(og.dimensions(), (1200, 630));
    assert!(og.pixels().all(|p| p[3] == 255));
}

#[test]
fn cover_fills_and_contain_pads() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path(), "wide.svg", WIDE);
    let out = tmp.path().join("out");
    let config = PipelineConfig::builder(source)
        .with_output(OutputSpec::png("cover.png", 64, 64))
        .with_output(OutputSpec::png("contain.png", 64, 64).with_fit(FitMode::Contain))
        .with_manifest(false)
        .build();

    let report = Pipeline::new(config).generate(&out).unwrap();
    assert!(report.manifest.is_none());
    assert_eq!(file_names(&out).len(), 2);

    let cover = image::open(out.join("cover.png")).unwrap().to_rgba8();
    assert_eq!(cover.dimensions(), (64, 64));
    assert!(cover.pixels().all(|p| p[3] == 255));

    let contain = image::open(out.join("contain.png")).unwrap().to_rgba8();
    assert_eq!(contain.get_pixel(32, 0)[3], 0);
    assert_eq!(contain.get_pixel(32, 32)[3], 255);
}

#[test]
fn background_fills_contain_padding() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path(), "wide.svg", WIDE);
    let out = tmp.path().join("out");
    let bg = Color::parse("#282a36").unwrap();
    let config = PipelineConfig::builder(source)
        .with_output(OutputSpec::png("og-image.png", 1200, 630).with_fit(FitMode::Contain))
        .with_background(bg)
        .build();

    Pipeline::new(config).generate(&out).unwrap();

    let og = image::open(out.join("og-image.png")).unwrap().to_rgba8();
    assert_eq!(og.get_pixel(600, 3).0, bg.to_array());
    let manifest = manifest_json(&out.join("site.webmanifest"));
    assert_eq!(manifest["background_color"], "#282a36");
}

#[test]
fn raster_sources_are_supported() {
    let tmp = tempfile::tempdir().unwrap();
    let png = tmp.path().join("logo.png");
    image::RgbaImage::from_pixel(300, 300, image::Rgba([200, 40, 40, 255]))
        .save(&png)
        .unwrap();
    let out = tmp.path().join("out");

    let config = PipelineConfig::builder(SourceRef::path(&png))
        .with_output(OutputSpec::png("icon-64.png", 64, 64))
        .with_output(OutputSpec::ico("favicon.ico", 32))
        .build();
    let report = Pipeline::new(config).generate(&out).unwrap();

    assert_eq!(report.assets.len(), 2);
    let icon = image::open(out.join("icon-64.png")).unwrap();
    assert_eq!((icon.width(), icon.height()), (64, 64));
}

// ============================================================================
// Strictness
// ============================================================================

/// Fails to render any 32 px wide canvas.
struct FlakyBackend(ResvgBackend);

impl Backend for FlakyBackend {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn load(&self, source: &SourceRef, colors: &ColorTransform) -> Result<Source> {
        self.0.load(source, colors)
    }

    fn render(&self, source: &Source, placement: &Placement, background: Option<Color>) -> Result<Raster> {
        if placement.canvas.width == 32 {
            return Err(Error::Render("simulated failure".into()));
        }
        self.0.render(source, placement, background)
    }

    fn encode(&self, raster: &Raster, format: RasterFormat) -> Result<Vec<u8>> {
        self.0.encode(raster, format)
    }
}

fn flaky_config(source: SourceRef, strictness: Strictness, execution: ExecutionMode) -> PipelineConfig {
    PipelineConfig::builder(source)
        .with_output(OutputSpec::png("a.png", 16, 16))
        .with_output(OutputSpec::png("b.png", 32, 32))
        .with_output(OutputSpec::png("c.png", 64, 64))
        .with_strictness(strictness)
        .with_execution(execution)
        .build()
}

#[test]
fn fail_fast_stops_without_a_manifest() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path(), "logo.svg", LOGO);

    for execution in [ExecutionMode::Sequential, ExecutionMode::thread_pool(Some(2))] {
        let out = tmp.path().join(format!("out-{execution}"));
        let config = flaky_config(source.clone(), Strictness::FailFast, execution);
        let err = Pipeline::new(config)
            .with_backend(Arc::new(FlakyBackend(ResvgBackend::new())))
            .generate(&out)
            .unwrap_err();

        assert_eq!(err, Error::Render("simulated failure".into()));
        assert!(!out.join("site.webmanifest").exists());
        assert!(!out.join("b.png").exists());
    }
}

#[test]
fn best_effort_reports_failures_and_lists_successes() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path(), "logo.svg", LOGO);
    let out = tmp.path().join("out");

    let config = flaky_config(source, Strictness::BestEffort, ExecutionMode::Sequential);
    let report = Pipeline::new(config)
        .with_backend(Arc::new(FlakyBackend(ResvgBackend::new())))
        .generate(&out)
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].name, "b.png");
    assert!(matches!(report.failures[0].error, Error::Render(_)));

    let manifest = manifest_json(&out.join("site.webmanifest"));
    let srcs: Vec<&str> = manifest["assets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|asset| asset["src"].as_str().unwrap())
        .collect();
    assert_eq!(srcs, ["/a.png", "/c.png"]);
}
