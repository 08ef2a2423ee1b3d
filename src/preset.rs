//! Preset management.
//!
//! A preset is a named list of outputs in YAML. The `web`, `mobile` and
//! `full` presets are compiled into the binary; users can add or override
//! presets by dropping `*.yaml` / `*.yml` files into
//! `<config dir>/svg-assets/presets/`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::output::OutputSpec;

const WEB: &str = include_str!("../presets/web.yaml");
const MOBILE: &str = include_str!("../presets/mobile.yaml");
const FULL: &str = include_str!("../presets/full.yaml");

/// Embedded presets as `(name, yaml)`.
const BUILTIN_PRESETS: [(&str, &str); 3] = [("web", WEB), ("mobile", MOBILE), ("full", FULL)];

/// A named, ordered list of outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct PresetConfig {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Output order determines manifest order.
    pub outputs: Vec<OutputSpec>,

    #[serde(default = "default_true")]
    pub generate_manifest: bool,
}

fn default_true() -> bool {
    true
}

impl PresetConfig {
    /// Parses and validates a preset from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let preset: Self =
            serde_yaml::from_str(yaml).map_err(|e| Error::config(format!("failed to parse preset YAML: {e}")))?;
        preset.validate()?;
        Ok(preset)
    }

    /// Loads a preset from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_yaml(&yaml).map_err(|e| match e {
            Error::Configuration(msg) => Error::config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    pub fn validate(&self) -> Result<()> {
        validate_preset_name(&self.name)?;
        for spec in &self.outputs {
            spec.validate()
                .map_err(|e| Error::config(format!("preset {:?}: {e}", self.name)))?;
        }
        Ok(())
    }
}

/// Rejects preset names that could escape the presets directory.
pub fn validate_preset_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::config("preset name cannot be empty"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(Error::config(format!("preset name {name:?} cannot contain path separators")));
    }
    if name.contains("..") {
        return Err(Error::config(format!("preset name {name:?} cannot contain '..'")));
    }
    if name.starts_with('.') {
        return Err(Error::config(format!("preset name {name:?} cannot start with '.'")));
    }
    if name.contains('\0') {
        return Err(Error::config("preset name cannot contain null bytes"));
    }
    Ok(())
}

/// Parses one of the embedded presets.
pub fn builtin(name: &str) -> Result<PresetConfig> {
    let (_, yaml) = BUILTIN_PRESETS
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .ok_or_else(|| Error::config(format!("no built-in preset named {name:?}")))?;
    PresetConfig::from_yaml(yaml)
}

/// Directory scanned for user presets, if the platform has a config dir.
pub fn user_presets_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("svg-assets").join("presets"))
}

fn is_yaml(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("yaml" | "yml"))
}

// ============================================================================
// PresetRegistry
// ============================================================================

/// Presets available to a run, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct PresetRegistry {
    presets: BTreeMap<String, PresetConfig>,
}

impl PresetRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The embedded presets only.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (name, yaml) in BUILTIN_PRESETS {
            match PresetConfig::from_yaml(yaml) {
                Ok(preset) => registry.register(preset),
                Err(err) => warn!(preset = name, error = %err, "skipping invalid built-in preset"),
            }
        }
        registry
    }

    /// Built-in presets overridden by the user's preset directory.
    pub fn discover() -> Self {
        let mut registry = Self::builtin();
        if let Some(dir) = user_presets_dir() {
            registry.load_dir(&dir);
        }
        registry
    }

    /// Loads every YAML preset in `dir`, replacing presets of the same name.
    ///
    /// Unreadable or invalid files are skipped with a warning. Returns the
    /// number of presets loaded.
    pub fn load_dir(&mut self, dir: &Path) -> usize {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(dir = %dir.display(), error = %err, "no user presets");
                return 0;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_yaml(path))
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            match PresetConfig::load(&path) {
                Ok(preset) => {
                    debug!(preset = %preset.name, path = %path.display(), "loaded user preset");
                    self.register(preset);
                    loaded += 1;
                }
                Err(err) => warn!(path = %path.display(), error = %err, "skipping preset"),
            }
        }
        loaded
    }

    pub fn register(&mut self, preset: PresetConfig) {
        self.presets.insert(preset.name.clone(), preset);
    }

    pub fn get(&self, name: &str) -> Result<&PresetConfig> {
        validate_preset_name(name)?;
        self.presets.get(name).ok_or_else(|| {
            let available: Vec<&str> = self.names().collect();
            Error::config(format!(
                "unknown preset {name:?} (available: {})",
                available.join(", ")
            ))
        })
    }

    /// Preset names in alphabetical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PresetConfig> {
        self.presets.values()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;

    #[test]
    fn builtin_presets_parse() {
        let registry = PresetRegistry::builtin();
        assert_eq!(registry.names().collect::<Vec<_>>(), ["full", "mobile", "web"]);
        for preset in registry.iter() {
            assert!(!preset.outputs.is_empty(), "{}", preset.name);
        }
    }

    #[test]
    fn web_preset_lists_the_standard_favicon_set() {
        let web = builtin("web").unwrap();
        let names: Vec<_> = web.outputs.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(
            names,
            [
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
        );
        assert!(web.generate_manifest);
        assert_eq!(web.outputs[1].format, OutputFormat::Ico);
    }

    #[test]
    fn unknown_preset_lists_alternatives() {
        let err = PresetRegistry::builtin().get("desktop").unwrap_err();
        assert!(err.to_string().contains("web"));
    }

    #[test]
    fn rejects_traversal_in_names() {
        assert!(validate_preset_name("../etc/passwd").is_err());
        assert!(validate_preset_name("a/b").is_err());
        assert!(validate_preset_name(".hidden").is_err());
        assert!(validate_preset_name("").is_err());
        assert!(validate_preset_name("web-dark").is_ok());
        assert!(PresetRegistry::builtin().get("..").is_err());
    }

    #[test]
    fn user_presets_override_builtins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("web.yaml"),
            "name: web\noutputs:\n  - name: only.png\n    format: png\n    width: 8\n",
        )
        .unwrap();
        fs::write(dir.path().join("broken.yml"), "name: [unclosed").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut registry = PresetRegistry::builtin();
        assert_eq!(registry.load_dir(dir.path()), 1);

        let web = registry.get("web").unwrap();
        assert_eq!(web.outputs.len(), 1);
        assert!(web.generate_manifest);
    }

    #[test]
    fn invalid_outputs_fail_preset_validation() {
        let yaml = "name: bad\noutputs:\n  - name: icon.png\n    format: png\n";
        let err = PresetConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn missing_directory_loads_nothing() {
        let mut registry = PresetRegistry::new();
        assert_eq!(registry.load_dir(Path::new("/no/such/presets")), 0);
        assert!(registry.is_empty());
    }
}
