use crate::backend::Source;
use crate::error::{Error, Result};

/// Writes the color-transformed source markup unchanged otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgExporter;

impl SvgExporter {
    pub fn export(&self, source: &Source) -> Result<Vec<u8>> {
        match source.markup() {
            Some(markup) => Ok(markup.as_bytes().to_vec()),
            None => Err(Error::config(format!(
                "cannot write an svg output from raster source {}",
                source.origin
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use image::RgbaImage;

    use super::*;
    use crate::backend::{SourceContent, SourceRef};

    #[test]
    fn passes_markup_through() {
        let source = Source {
            origin: SourceRef::inline("logo.svg", ""),
            content: SourceContent::Vector {
                markup: "<svg fill=\"#ff0000\"/>".into(),
            },
            width: 1.0,
            height: 1.0,
        };
        assert_eq!(SvgExporter.export(&source).unwrap(), b"<svg fill=\"#ff0000\"/>");
    }

    #[test]
    fn raster_source_is_a_configuration_error() {
        let source = Source {
            origin: SourceRef::path("logo.png"),
            content: SourceContent::Raster(RgbaImage::new(4, 4)),
            width: 4.0,
            height: 4.0,
        };
        assert!(matches!(SvgExporter.export(&source), Err(Error::Configuration(_))));
    }
}
