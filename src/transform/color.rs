//! Color substitution over SVG markup.
//!
//! This is a text-level pass that runs before rasterization. It rewrites the
//! values of `fill`, `stroke` and `stop-color` attributes, as well as the same
//! properties inside `style="..."` attributes. Values that do not paint
//! (`none`, `transparent`, `currentColor`, `inherit`, `url(...)` references)
//! are always preserved.

use serde::{Deserialize, Serialize};

use crate::color::{Color, ColorTheme};

const PAINT_ATTRIBUTES: [&str; 3] = ["fill", "stroke", "stop-color"];

/// A single `from -> to` color mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct ColorReplacement {
    #[cfg_attr(feature = "jsonschema", schemars(with = "String"))]
    pub from: Color,
    #[cfg_attr(feature = "jsonschema", schemars(with = "String"))]
    pub to: Color,
}

impl ColorReplacement {
    pub fn new(from: Color, to: Color) -> Self {
        Self { from, to }
    }
}

/// Maps colors found in source markup to replacement values.
///
/// Explicit replacements win over the foreground: a value matching a
/// replacement's `from` becomes its `to`; any other painted value becomes the
/// foreground, when one is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorTransform {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<Color>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replacements: Vec<ColorReplacement>,
}

impl ColorTransform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the foreground of a theme. The background is not a markup
    /// concern; the backend paints it under the artwork.
    pub fn from_theme(theme: &ColorTheme) -> Self {
        Self {
            foreground: theme.foreground,
            replacements: Vec::new(),
        }
    }

    pub fn with_foreground(mut self, color: Color) -> Self {
        self.foreground = Some(color);
        self
    }

    pub fn with_replacement(mut self, from: Color, to: Color) -> Self {
        self.replacements.push(ColorReplacement::new(from, to));
        self
    }

    pub fn with_replacements(mut self, replacements: impl IntoIterator<Item = ColorReplacement>) -> Self {
        self.replacements.extend(replacements);
        self
    }

    /// Returns true if applying this transform leaves markup untouched.
    pub fn is_identity(&self) -> bool {
        self.foreground.is_none() && self.replacements.is_empty()
    }

    /// Applies the substitution to SVG markup.
    pub fn apply(&self, svg: &str) -> String {
        if self.is_identity() {
            return svg.to_string();
        }

        let mut result = svg.to_string();
        for attr in PAINT_ATTRIBUTES {
            result = replace_color_attr(&result, attr, |value| self.substitute(value));
        }
        result = replace_color_attr(&result, "style", |value| self.substitute_style(value));

        // Shapes without a fill attribute paint black by default; give them
        // the foreground through the root element.
        if let Some(foreground) = self.foreground {
            result = inject_root_fill(&result, foreground);
        }
        result
    }

    /// Returns the replacement for one paint value, or `None` to keep it.
    fn substitute(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if is_preserved(trimmed) {
            return None;
        }

        let parsed = Color::parse(trimmed).ok();
        if let Some(color) = parsed {
            if let Some(rule) = self.replacements.iter().find(|r| r.from == color) {
                return Some(rule.to.to_hex());
            }
        }

        // Only recolor values we understand as colors.
        parsed.and(self.foreground).map(|fg| fg.to_hex())
    }

    fn substitute_style(&self, style: &str) -> Option<String> {
        let mut changed = false;
        let declarations: Vec<String> = style
            .split(';')
            .map(|declaration| {
                let Some((property, value)) = declaration.split_once(':') else {
                    return declaration.to_string();
                };
                if !PAINT_ATTRIBUTES.contains(&property.trim()) {
                    return declaration.to_string();
                }
                match self.substitute(value) {
                    Some(replacement) => {
                        changed = true;
                        format!("{}:{}", property, replacement)
                    }
                    None => declaration.to_string(),
                }
            })
            .collect();

        changed.then(|| declarations.join(";"))
    }
}

fn is_preserved(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "none" | "transparent" | "currentcolor" | "inherit" | ""
    ) || value.starts_with("url(")
}

/// Rewrites the value of every `attr="..."` / `attr='...'` occurrence.
///
/// `replace` returns `None` to keep a value untouched. The attribute name
/// must be preceded by whitespace, so `fill` never matches `data-fill`.
fn replace_color_attr(svg: &str, attr: &str, replace: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(svg.len());
    let mut remaining = svg;

    while let Some((start, quote)) = find_attr(remaining, attr) {
        let value_start = start + attr.len() + 2;
        result.push_str(&remaining[..value_start]);
        remaining = &remaining[value_start..];

        let Some(end) = remaining.find(quote) else {
            break;
        };
        let value = &remaining[..end];
        match replace(value) {
            Some(new_value) => result.push_str(&new_value),
            None => result.push_str(value),
        }
        remaining = &remaining[end..];
    }

    result.push_str(remaining);
    result
}

/// Finds the next `attr=` followed by a quote, returning its offset and quote.
fn find_attr(haystack: &str, attr: &str) -> Option<(usize, char)> {
    let pattern = format!("{}=", attr);
    let mut offset = 0;

    while let Some(pos) = haystack[offset..].find(&pattern) {
        let start = offset + pos;
        let preceded_by_space = haystack[..start]
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace);
        let quote = haystack[start + pattern.len()..].chars().next();

        match quote {
            Some(q @ ('"' | '\'')) if preceded_by_space => return Some((start, q)),
            _ => offset = start + pattern.len(),
        }
    }
    None
}

/// Adds `fill="<color>"` to the root `<svg>` element unless it already has one.
fn inject_root_fill(svg: &str, color: Color) -> String {
    let Some(open) = find_root_tag(svg) else {
        return svg.to_string();
    };
    let Some(close) = svg[open..].find('>') else {
        return svg.to_string();
    };
    let tag = &svg[open..open + close];
    if find_attr(tag, "fill").is_some() {
        return svg.to_string();
    }

    let insert_at = open + "<svg".len();
    format!(
        "{} fill=\"{}\"{}",
        &svg[..insert_at],
        color.to_hex(),
        &svg[insert_at..]
    )
}

fn find_root_tag(svg: &str) -> Option<usize> {
    let mut offset = 0;
    while let Some(pos) = svg[offset..].find("<svg") {
        let start = offset + pos;
        let next = svg[start + 4..].chars().next();
        if next.is_some_and(|c| c.is_whitespace() || c == '>') {
            return Some(start);
        }
        offset = start + 4;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> Color {
        Color::rgb(255, 0, 0)
    }

    #[test]
    fn identity_leaves_markup_alone() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg"><rect fill="#000"/></svg>"##;
        assert_eq!(ColorTransform::new().apply(svg), svg);
    }

    #[test]
    fn foreground_preserves_none() {
        let svg = r##"<svg><circle fill="none" stroke="#000000"/></svg>"##;
        let result = ColorTransform::new().with_foreground(red()).apply(svg);
        assert!(result.contains(r#"fill="none""#));
        assert!(result.contains(r##"stroke="#ff0000""##));
    }

    #[test]
    fn foreground_keeps_gradient_references() {
        let svg = r##"<svg><rect fill="url(#g)"/><stop stop-color='#123456'/></svg>"##;
        let result = ColorTransform::new().with_foreground(red()).apply(svg);
        assert!(result.contains(r##"fill="url(#g)""##));
        assert!(result.contains("stop-color='#ff0000'"));
    }

    #[test]
    fn replacements_map_only_matching_colors() {
        let svg = r##"<svg><rect fill="#FFFFFF"/><rect fill="black"/></svg>"##;
        let result = ColorTransform::new()
            .with_replacement(Color::WHITE, Color::rgb(0x28, 0x2a, 0x36))
            .apply(svg);
        assert!(result.contains(r##"fill="#282a36""##));
        assert!(result.contains(r#"fill="black""#));
    }

    #[test]
    fn style_declarations_are_rewritten() {
        let svg = r##"<svg><path style="fill:#000;stroke-width:2;stroke:none"/></svg>"##;
        let result = ColorTransform::new().with_foreground(red()).apply(svg);
        assert!(result.contains(r##"style="fill:#ff0000;stroke-width:2;stroke:none""##));
    }

    #[test]
    fn attribute_name_must_stand_alone() {
        let svg = r##"<svg fill="none"><g data-fill="#000" fill-opacity="0.5"/></svg>"##;
        let result = ColorTransform::new().with_foreground(red()).apply(svg);
        assert!(result.contains(r##"data-fill="#000""##));
        assert!(result.contains(r#"fill-opacity="0.5""#));
    }

    #[test]
    fn root_fill_is_injected_once() {
        let svg = r#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg"><path d="M0 0h1v1z"/></svg>"#;
        let result = ColorTransform::new().with_foreground(red()).apply(svg);
        assert!(result.contains(r##"<svg fill="#ff0000" xmlns"##));

        let again = ColorTransform::new().with_foreground(red()).apply(&result);
        assert_eq!(again.matches("fill=").count(), 1);
    }
}
