//! Raster images inside site-plan SVG wrappers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::warn;
use regex::Regex;

use crate::error::EdsError;

/// MIME type for an image file, by extension. Unknown extensions are sent as PNG.
pub fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "image/png",
    }
}

/// Wrap raw image bytes in the single-element SVG the editor expects.
pub fn wrap_in_svg(bytes: &[u8], mime: &str, width: f64, height: f64) -> String {
    let data = STANDARD.encode(bytes);
    format!(
        "<svg width=\"{width}\" height=\"{height}\"><image xlink:href=\"data:{mime};base64,{data}\" width=\"{width}\" height=\"{height}\"/></svg>"
    )
}

/// Read an image file and wrap it for embedding.
pub fn load_image_as_svg(path: &Path, size: [f64; 2]) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(wrap_in_svg(&bytes, mime_type(path), size[0], size[1]))
}

fn data_uri_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"data:image/(png|jpeg|jpg|gif);base64,([A-Za-z0-9+/=]+)")
            .expect("data URI pattern is valid")
    })
}

/// An image recovered from an SVG wrapper.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    /// File extension, with `jpeg` normalized to `jpg`.
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Find and decode the first embedded PNG, JPEG or GIF payload.
pub fn extract_image(svg: &str) -> Option<EmbeddedImage> {
    let captures = data_uri_pattern().captures(svg)?;
    let extension = match &captures[1] {
        "jpeg" => "jpg".to_string(),
        other => other.to_string(),
    };
    match STANDARD.decode(&captures[2]) {
        Ok(bytes) => Some(EmbeddedImage { extension, bytes }),
        Err(e) => {
            warn!("embedded image payload is not valid base64: {e}");
            None
        }
    }
}

/// Writes extracted images as `image_<n>.<ext>` with a per-run counter.
#[derive(Debug)]
pub struct ImageExtractor {
    output_dir: PathBuf,
    next_index: usize,
}

impl ImageExtractor {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        ImageExtractor {
            output_dir: output_dir.into(),
            next_index: 0,
        }
    }

    /// Extract the image in `svg` to disk; returns the written file name.
    ///
    /// An SVG without a recognizable payload yields `Ok(None)`. A failed write
    /// is fatal.
    pub fn extract(&mut self, svg: &str) -> Result<Option<String>, EdsError> {
        let Some(image) = extract_image(svg) else {
            return Ok(None);
        };
        let filename = format!("image_{}.{}", self.next_index, image.extension);
        let path = self.output_dir.join(&filename);
        fs::write(&path, &image.bytes).map_err(|e| EdsError::io(&path, e))?;
        self.next_index += 1;
        Ok(Some(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 1, 2, 3];

    #[test]
    fn chooses_mime_by_extension() {
        assert_eq!(mime_type(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(mime_type(Path::new("a.gif")), "image/gif");
        assert_eq!(mime_type(Path::new("a.bmp")), "image/png");
    }

    #[test]
    fn wrapped_image_extracts_back() {
        let svg = wrap_in_svg(PNG_BYTES, "image/png", 200.0, 150.0);
        assert!(svg.starts_with("<svg width=\"200\" height=\"150\">"));
        let image = extract_image(&svg).unwrap();
        assert_eq!(image.extension, "png");
        assert_eq!(image.bytes, PNG_BYTES);
    }

    #[test]
    fn jpeg_is_normalized_to_jpg() {
        let svg = wrap_in_svg(b"jfif", "image/jpeg", 1.0, 1.0);
        assert_eq!(extract_image(&svg).unwrap().extension, "jpg");
    }

    #[test]
    fn embedded_gif_is_written_as_gif() {
        let dir = tempdir().unwrap();
        let gif = wrap_in_svg(b"GIF89a", mime_type(Path::new("logo.gif")), 20.0, 20.0);
        assert_eq!(extract_image(&gif).unwrap().extension, "gif");

        let mut extractor = ImageExtractor::new(dir.path());
        assert_eq!(extractor.extract(&gif).unwrap().as_deref(), Some("image_0.gif"));
        assert_eq!(fs::read(dir.path().join("image_0.gif")).unwrap(), b"GIF89a");
    }

    #[test]
    fn extractor_numbers_files_per_run() {
        let dir = tempdir().unwrap();
        let mut extractor = ImageExtractor::new(dir.path());
        let svg = wrap_in_svg(PNG_BYTES, "image/png", 10.0, 10.0);
        assert_eq!(extractor.extract(&svg).unwrap().as_deref(), Some("image_0.png"));
        assert_eq!(extractor.extract("<svg/>").unwrap(), None);
        assert_eq!(extractor.extract(&svg).unwrap().as_deref(), Some("image_1.png"));
        assert_eq!(fs::read(dir.path().join("image_1.png")).unwrap(), PNG_BYTES);
    }
}
