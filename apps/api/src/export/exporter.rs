//! PDF exporter.
//!
//! 1. Switch the surface to the preview view and wait for it to render.
//! 2. Locate target, its parent and the wrapper; fail before mutating anything.
//! 3. Snapshot + restyle inside a `StyleScope`, wait for styles to apply.
//! 4. Convert with fixed options.
//! 5. Guards restore styles, then the view, on every exit path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::export::converter::{PdfConverter, PdfDocument, PdfOptions};
use crate::export::scope::{ExportPalette, ExportTargets, StyleScope, ViewGuard};
use crate::export::surface::{RenderSurface, View};
use crate::export::ExportError;

pub const TARGET_ELEMENT_ID: &str = "resume-pdf";
pub const WRAPPER_ATTRIBUTE: (&str, &str) = ("data-color-mode", "light");

/// Upper bound on waiting for the preview view to render.
pub const VIEW_SETTLE_TIMEOUT: Duration = Duration::from_millis(250);
/// Upper bound on waiting for the export styling to apply.
pub const STYLE_SETTLE_TIMEOUT: Duration = Duration::from_millis(100);

pub struct PdfExporter<C: PdfConverter + ?Sized> {
    converter: Arc<C>,
    options: PdfOptions,
    palette: ExportPalette,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag on drop.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<C: PdfConverter + ?Sized> PdfExporter<C> {
    pub fn new(converter: Arc<C>) -> Self {
        Self {
            converter,
            options: PdfOptions::default(),
            palette: ExportPalette::default(),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_exporting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Exports the surface's preview target to PDF.
    ///
    /// Rejects overlapping calls with `ExportError::InProgress`. The surface
    /// is left exactly as it was found, whatever the outcome.
    pub async fn export<S>(&self, surface: &mut S) -> Result<PdfDocument, ExportError>
    where
        S: RenderSurface + ?Sized,
    {
        let _in_flight = InFlight::acquire(&self.in_flight).ok_or(ExportError::InProgress)?;

        let mut view = ViewGuard::new(surface);
        if view.active_view() != View::Preview {
            view.switch_to(View::Preview);
            tokio::time::timeout(VIEW_SETTLE_TIMEOUT, view.rendered())
                .await
                .map_err(|_| ExportError::RenderTimeout("preview view"))?;
        }

        let targets = locate_targets(&*view)?;

        let mut scope = StyleScope::acquire(&mut *view, targets, &self.palette);
        if tokio::time::timeout(STYLE_SETTLE_TIMEOUT, scope.rendered())
            .await
            .is_err()
        {
            warn!("Export styles not confirmed within {STYLE_SETTLE_TIMEOUT:?}; converting anyway");
        }

        let capture = scope
            .capture(targets.target)
            .ok_or(ExportError::MissingElement("#resume-pdf"))?;

        let document = self
            .converter
            .convert(&capture, &self.options)
            .await
            .map_err(|e| ExportError::Conversion(e.to_string()))?;

        info!(
            "Exported {} ({} page(s), {} bytes)",
            document.filename,
            document.page_count,
            document.bytes.len()
        );
        Ok(document)
    }
}

fn locate_targets<S: RenderSurface + ?Sized>(surface: &S) -> Result<ExportTargets, ExportError> {
    let missing = |what: &'static str| {
        warn!("PDF export aborted: {what} not found");
        ExportError::MissingElement(what)
    };

    let target = surface
        .element_by_id(TARGET_ELEMENT_ID)
        .ok_or_else(|| missing("#resume-pdf"))?;
    let parent = surface
        .parent(target)
        .ok_or_else(|| missing("#resume-pdf container"))?;
    let wrapper = surface
        .query_attribute(WRAPPER_ATTRIBUTE.0, WRAPPER_ATTRIBUTE.1)
        .ok_or_else(|| missing("[data-color-mode=\"light\"]"))?;

    Ok(ExportTargets {
        target,
        parent,
        wrapper,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::export::converter::ConversionError;
    use crate::export::page::PreviewPage;
    use crate::export::pdf_writer::MarkdownPdfConverter;
    use crate::export::surface::{ElementCapture, NodeId};

    type Fingerprint = Vec<(Vec<String>, String)>;

    /// Class lists and inline styles of every node the exporter may touch.
    fn fingerprint<S: RenderSurface + ?Sized>(surface: &S) -> Fingerprint {
        (0..5)
            .map(NodeId)
            .map(|n| (surface.class_list(n), surface.style_text(n)))
            .collect()
    }

    struct FailingConverter;

    #[async_trait]
    impl PdfConverter for FailingConverter {
        async fn convert(
            &self,
            _capture: &ElementCapture,
            _options: &PdfOptions,
        ) -> Result<PdfDocument, ConversionError> {
            Err(ConversionError("canvas exploded".to_string()))
        }
    }

    /// Records what it was asked to convert, then delegates.
    #[derive(Default)]
    struct RecordingConverter {
        seen: Mutex<Vec<ElementCapture>>,
    }

    #[async_trait]
    impl PdfConverter for RecordingConverter {
        async fn convert(
            &self,
            capture: &ElementCapture,
            options: &PdfOptions,
        ) -> Result<PdfDocument, ConversionError> {
            self.seen.lock().unwrap().push(capture.clone());
            MarkdownPdfConverter.convert(capture, options).await
        }
    }

    /// Blocks until released, so a second export can overlap it.
    struct BlockingConverter {
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl PdfConverter for BlockingConverter {
        async fn convert(
            &self,
            capture: &ElementCapture,
            options: &PdfOptions,
        ) -> Result<PdfDocument, ConversionError> {
            self.started.notify_one();
            self.release.notified().await;
            MarkdownPdfConverter.convert(capture, options).await
        }
    }

    /// Applies view changes only when `rendered` is awaited; optionally never renders.
    struct DeferredSurface {
        page: PreviewPage,
        pending: Option<View>,
        stalled: bool,
    }

    #[async_trait]
    impl RenderSurface for DeferredSurface {
        fn active_view(&self) -> View {
            self.page.active_view()
        }
        fn request_view(&mut self, view: View) {
            self.pending = Some(view);
        }
        async fn rendered(&mut self) {
            if self.stalled {
                std::future::pending::<()>().await;
            }
            if let Some(view) = self.pending.take() {
                self.page.request_view(view);
            }
        }
        fn body(&self) -> NodeId {
            self.page.body()
        }
        fn root(&self) -> NodeId {
            self.page.root()
        }
        fn element_by_id(&self, id: &str) -> Option<NodeId> {
            self.page.element_by_id(id)
        }
        fn parent(&self, node: NodeId) -> Option<NodeId> {
            self.page.parent(node)
        }
        fn query_attribute(&self, name: &str, value: &str) -> Option<NodeId> {
            self.page.query_attribute(name, value)
        }
        fn class_list(&self, node: NodeId) -> Vec<String> {
            self.page.class_list(node)
        }
        fn set_class_list(&mut self, node: NodeId, classes: Vec<String>) {
            self.page.set_class_list(node, classes)
        }
        fn style_text(&self, node: NodeId) -> String {
            self.page.style_text(node)
        }
        fn set_style_text(&mut self, node: NodeId, css: &str) {
            self.page.set_style_text(node, css)
        }
        fn style_property(&self, node: NodeId, name: &str) -> Option<String> {
            self.page.style_property(node, name)
        }
        fn set_style_property(&mut self, node: NodeId, name: &str, value: &str) {
            self.page.set_style_property(node, name, value)
        }
        fn capture(&self, node: NodeId) -> Option<ElementCapture> {
            self.page.capture(node)
        }
    }

    #[tokio::test]
    async fn test_missing_target_reports_error_without_mutation() {
        let mut page = PreviewPage::blank(View::Edit);
        let before = fingerprint(&page);
        let exporter = PdfExporter::new(Arc::new(RecordingConverter::default()));

        let err = exporter.export(&mut page).await.unwrap_err();

        assert!(matches!(err, ExportError::MissingElement("#resume-pdf")));
        assert!(err.user_message().contains("Essential content not found"));
        assert_eq!(fingerprint(&page), before);
        assert_eq!(page.active_view(), View::Edit);
        assert!(!exporter.is_exporting());
    }

    #[tokio::test]
    async fn test_failing_conversion_restores_everything() {
        let mut page = PreviewPage::builder_page("## Skills\n\nRust", View::Edit);
        let root = page.root();
        page.set_style_property(root, "--background", "hsl(0 0% 3.9%)");
        let before = fingerprint(&page);
        let exporter = PdfExporter::new(Arc::new(FailingConverter));

        let err = exporter.export(&mut page).await.unwrap_err();

        match &err {
            ExportError::Conversion(msg) => assert_eq!(msg, "canvas exploded"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.user_message().contains("canvas exploded"));
        assert_eq!(page.active_view(), View::Edit);
        page.request_view(View::Preview);
        assert_eq!(fingerprint(&page), before);
        assert!(!exporter.is_exporting());
    }

    #[tokio::test]
    async fn test_successful_export_converts_styled_capture_and_restores() {
        let mut page = PreviewPage::builder_page("## Skills\n\nRust", View::Preview);
        let before = fingerprint(&page);
        let converter = Arc::new(RecordingConverter::default());
        let exporter = PdfExporter::new(converter.clone());

        let doc = exporter.export(&mut page).await.unwrap();

        assert_eq!(doc.filename, "resume.pdf");
        assert!(doc.bytes.starts_with(b"%PDF"));
        let seen = converter.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].markdown, "## Skills\n\nRust");
        assert_eq!(seen[0].background_color.as_deref(), Some("rgb(37, 37, 37)"));
        assert_eq!(seen[0].color.as_deref(), Some("rgb(251, 251, 251)"));
        assert_eq!(fingerprint(&page), before);
        assert_eq!(page.active_view(), View::Preview);
    }

    #[tokio::test]
    async fn test_export_waits_for_preview_render() {
        let mut surface = DeferredSurface {
            page: PreviewPage::builder_page("# Resume", View::Edit),
            pending: None,
            stalled: false,
        };
        let exporter = PdfExporter::new(Arc::new(MarkdownPdfConverter));

        exporter.export(&mut surface).await.unwrap();

        // The revert is requested on drop and applied on the next render.
        assert_eq!(surface.pending, Some(View::Edit));
        surface.rendered().await;
        assert_eq!(surface.active_view(), View::Edit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_timeout_fails_without_mutation() {
        let mut surface = DeferredSurface {
            page: PreviewPage::builder_page("# Resume", View::Edit),
            pending: None,
            stalled: true,
        };
        let before = fingerprint(&surface);
        let exporter = PdfExporter::new(Arc::new(MarkdownPdfConverter));

        let err = exporter.export(&mut surface).await.unwrap_err();

        assert!(matches!(err, ExportError::RenderTimeout(_)));
        assert_eq!(fingerprint(&surface), before);
        // The unapplied switch to preview is replaced by a request for the original view.
        assert_eq!(surface.pending, Some(View::Edit));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_render_after_timeout_lands_on_original_view() {
        let mut surface = DeferredSurface {
            page: PreviewPage::builder_page("# Resume", View::Edit),
            pending: None,
            stalled: true,
        };
        let exporter = PdfExporter::new(Arc::new(MarkdownPdfConverter));
        exporter.export(&mut surface).await.unwrap_err();

        surface.stalled = false;
        surface.rendered().await;
        assert_eq!(surface.active_view(), View::Edit);
    }

    #[tokio::test]
    async fn test_overlapping_export_is_rejected() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let exporter = Arc::new(PdfExporter::new(Arc::new(BlockingConverter {
            started: started.clone(),
            release: release.clone(),
        })));

        let first = {
            let exporter = exporter.clone();
            tokio::spawn(async move {
                let mut page = PreviewPage::builder_page("# One", View::Preview);
                exporter.export(&mut page).await.map(|d| d.page_count)
            })
        };
        started.notified().await;
        assert!(exporter.is_exporting());

        let mut second = PreviewPage::builder_page("# Two", View::Edit);
        let before = fingerprint(&second);
        let err = exporter.export(&mut second).await.unwrap_err();
        assert!(matches!(err, ExportError::InProgress));
        assert_eq!(fingerprint(&second), before);
        assert_eq!(second.active_view(), View::Edit);

        release.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), 1);
        assert!(!exporter.is_exporting());
    }
}
