use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::export::surface::ElementCapture;

pub const PDF_FILENAME: &str = "resume.pdf";

const MM_TO_PT: f64 = 72.0 / 25.4;

/// A4 portrait, `(width, height)` in millimetres.
const A4_PORTRAIT_MM: (f64, f64) = (210.0, 297.0);

/// Conversion options. Defaults are the fixed export settings.
///
/// `scale` and `image_quality` only matter to converters that rasterize.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfOptions {
    /// `[vertical, horizontal]` margins in millimetres.
    pub margin_mm: [f64; 2],
    pub filename: String,
    pub scale: f64,
    pub image_quality: f64,
    /// When false the converter paints no background of its own; only the
    /// captured element's background is drawn.
    pub draw_background: bool,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            margin_mm: [15.0, 15.0],
            filename: PDF_FILENAME.to_string(),
            scale: 2.0,
            image_quality: 0.98,
            draw_background: false,
        }
    }
}

impl PdfOptions {
    /// Page `(width, height)` in points.
    pub fn page_size_pt(&self) -> (f64, f64) {
        let (w, h) = A4_PORTRAIT_MM;
        (w * MM_TO_PT, h * MM_TO_PT)
    }

    /// `(vertical, horizontal)` margins in points.
    pub fn margins_pt(&self) -> (f64, f64) {
        (self.margin_mm[0] * MM_TO_PT, self.margin_mm[1] * MM_TO_PT)
    }
}

/// A finished PDF, ready to be served as a download.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pub filename: String,
    pub bytes: Bytes,
    pub page_count: usize,
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ConversionError(pub String);

/// Element → PDF conversion backend.
#[async_trait]
pub trait PdfConverter: Send + Sync {
    async fn convert(
        &self,
        capture: &ElementCapture,
        options: &PdfOptions,
    ) -> Result<PdfDocument, ConversionError>;
}
