// PDF export of the resume preview.
//
// The exporter works against any `RenderSurface`. It switches the surface to
// the preview view, forces a solid-background rendering context for the
// converter and restores every mutated class list, inline style and the view
// on every exit path (see `scope`).

pub mod converter;
pub mod exporter;
pub mod gate;
pub mod handlers;
pub mod page;
pub mod pdf_writer;
pub mod scope;
pub mod surface;

use thiserror::Error;

pub use converter::{ConversionError, PdfConverter, PdfDocument, PdfOptions};
pub use exporter::PdfExporter;
pub use gate::ExportGate;
pub use page::PreviewPage;
pub use pdf_writer::MarkdownPdfConverter;
pub use surface::{ElementCapture, NodeId, RenderSurface, View};

#[derive(Debug, Error)]
pub enum ExportError {
    /// A required element was not found. Raised before anything is mutated.
    #[error("Required export element not found: {0}")]
    MissingElement(&'static str),

    #[error("An export is already in progress")]
    InProgress,

    #[error("Timed out waiting for the {0} to render")]
    RenderTimeout(&'static str),

    #[error("PDF conversion failed: {0}")]
    Conversion(String),
}

impl ExportError {
    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ExportError::MissingElement(_) => {
                "Failed to generate PDF. Essential content not found. Please try again.".to_string()
            }
            ExportError::InProgress => {
                "A PDF is already being generated. Please wait for it to finish.".to_string()
            }
            ExportError::RenderTimeout(_) => {
                "Failed to generate PDF. The preview did not finish rendering.".to_string()
            }
            ExportError::Conversion(msg) => format!("Failed to generate PDF. Error: {msg}"),
        }
    }
}
