use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Handle to an element of a render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Builder page views. The export target only exists while `Preview` is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Edit,
    Preview,
}

/// What the converter receives: the target's markdown and its effective colours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementCapture {
    pub markdown: String,
    pub background_color: Option<String>,
    pub color: Option<String>,
}

/// A mutable document the exporter can restyle, render and capture.
///
/// Mutations are synchronous so they can be undone from `Drop`. Rendering is
/// asynchronous: `request_view` and style changes take effect once
/// `rendered` resolves.
#[async_trait]
pub trait RenderSurface: Send {
    fn active_view(&self) -> View;

    /// Requests a view change; completion is signalled by `rendered`.
    fn request_view(&mut self, view: View);

    /// Resolves once every pending view change and style mutation is rendered.
    async fn rendered(&mut self);

    fn body(&self) -> NodeId;

    /// The document root, which carries CSS custom properties.
    fn root(&self) -> NodeId;

    /// Looks up a mounted element by id.
    fn element_by_id(&self, id: &str) -> Option<NodeId>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// First mounted element whose attribute `name` equals `value`.
    fn query_attribute(&self, name: &str, value: &str) -> Option<NodeId>;

    fn class_list(&self, node: NodeId) -> Vec<String>;

    fn set_class_list(&mut self, node: NodeId, classes: Vec<String>);

    /// Inline style serialized as CSS text (`name: value; ...`).
    fn style_text(&self, node: NodeId) -> String;

    fn set_style_text(&mut self, node: NodeId, css: &str);

    fn style_property(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_style_property(&mut self, node: NodeId, name: &str, value: &str);

    /// Captures a mounted element for conversion.
    fn capture(&self, node: NodeId) -> Option<ElementCapture>;
}

pub fn add_class<S: RenderSurface + ?Sized>(surface: &mut S, node: NodeId, class: &str) {
    let mut classes = surface.class_list(node);
    if !classes.iter().any(|c| c == class) {
        classes.push(class.to_string());
        surface.set_class_list(node, classes);
    }
}

pub fn remove_class<S: RenderSurface + ?Sized>(surface: &mut S, node: NodeId, class: &str) {
    let classes = surface.class_list(node);
    if classes.iter().any(|c| c == class) {
        surface.set_class_list(node, classes.into_iter().filter(|c| c != class).collect());
    }
}
