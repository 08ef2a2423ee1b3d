//! Built-in SVG templates, usable as a source without any file on disk.

use crate::backend::SourceRef;
use crate::error::{Error, Result};

static TEMPLATES: [(&str, &str); 4] = [
    ("badge", include_str!("../templates/badge.svg")),
    ("monogram", include_str!("../templates/monogram.svg")),
    ("rounded-square", include_str!("../templates/rounded-square.svg")),
    ("silhouette", include_str!("../templates/silhouette.svg")),
];

/// Names of the built-in templates, alphabetically.
pub fn template_names() -> impl Iterator<Item = &'static str> {
    TEMPLATES.iter().map(|(name, _)| *name)
}

/// Returns a template as an inline source.
pub fn get_template(name: &str) -> Result<SourceRef> {
    TEMPLATES
        .iter()
        .find(|(template, _)| *template == name)
        .map(|(template, markup)| SourceRef::inline(format!("{template}.svg"), *markup))
        .ok_or_else(|| {
            let available: Vec<_> = template_names().collect();
            Error::config(format!(
                "template {name:?} not found (available: {})",
                available.join(", ")
            ))
        })
}
