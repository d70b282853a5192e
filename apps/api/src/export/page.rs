//! In-memory model of the resume builder page.
//!
//! Layout mirrors the page the user sees:
//!
//! ```text
//! html (root, carries --background)
//! └── body
//!     └── div[data-color-mode="light"]       wrapper
//!         └── div.hidden                     mounted in preview only
//!             └── div#resume-pdf             export target, holds the markdown
//! ```

use async_trait::async_trait;

use crate::export::exporter::{TARGET_ELEMENT_ID, WRAPPER_ATTRIBUTE};
use crate::export::surface::{ElementCapture, NodeId, RenderSurface, View};

#[derive(Debug, Clone)]
struct Element {
    id: Option<String>,
    attributes: Vec<(String, String)>,
    classes: Vec<String>,
    style: Vec<(String, String)>,
    parent: Option<NodeId>,
    /// Only part of the document while the preview view is active.
    preview_only: bool,
    content: Option<String>,
}

impl Element {
    fn new(parent: Option<NodeId>) -> Self {
        Self {
            id: None,
            attributes: Vec::new(),
            classes: Vec::new(),
            style: Vec::new(),
            parent,
            preview_only: false,
            content: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreviewPage {
    nodes: Vec<Element>,
    view: View,
}

const ROOT: NodeId = NodeId(0);
const BODY: NodeId = NodeId(1);

impl PreviewPage {
    /// Builds the builder page holding `markdown`, starting in `view`.
    pub fn builder_page(markdown: impl Into<String>, view: View) -> Self {
        let mut page = Self {
            nodes: Vec::new(),
            view,
        };

        let root = page.push(Element::new(None));
        let body = page.push(Element {
            classes: vec!["antialiased".to_string()],
            ..Element::new(Some(root))
        });
        let wrapper = page.push(Element {
            attributes: vec![(WRAPPER_ATTRIBUTE.0.to_string(), WRAPPER_ATTRIBUTE.1.to_string())],
            classes: vec!["space-y-4".to_string()],
            ..Element::new(Some(body))
        });
        let hidden = page.push(Element {
            classes: vec!["hidden".to_string()],
            preview_only: true,
            ..Element::new(Some(wrapper))
        });
        page.push(Element {
            id: Some(TARGET_ELEMENT_ID.to_string()),
            preview_only: true,
            content: Some(markdown.into()),
            ..Element::new(Some(hidden))
        });

        page
    }

    /// An empty document: root and body only.
    pub fn blank(view: View) -> Self {
        let mut page = Self {
            nodes: Vec::new(),
            view,
        };
        let root = page.push(Element::new(None));
        page.push(Element::new(Some(root)));
        page
    }

    fn push(&mut self, element: Element) -> NodeId {
        self.nodes.push(element);
        NodeId(self.nodes.len() - 1)
    }

    fn node(&self, node: NodeId) -> Option<&Element> {
        self.nodes.get(node.0)
    }

    fn mounted(&self, node: NodeId) -> Option<&Element> {
        self.node(node)
            .filter(|e| !e.preview_only || self.view == View::Preview)
    }
}

#[async_trait]
impl RenderSurface for PreviewPage {
    fn active_view(&self) -> View {
        self.view
    }

    fn request_view(&mut self, view: View) {
        self.view = view;
    }

    // Mutations apply synchronously; there is never anything pending.
    async fn rendered(&mut self) {}

    fn body(&self) -> NodeId {
        BODY
    }

    fn root(&self) -> NodeId {
        ROOT
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        (0..self.nodes.len())
            .map(NodeId)
            .find(|&n| self.mounted(n).is_some_and(|e| e.id.as_deref() == Some(id)))
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.mounted(node).and_then(|e| e.parent)
    }

    fn query_attribute(&self, name: &str, value: &str) -> Option<NodeId> {
        (0..self.nodes.len()).map(NodeId).find(|&n| {
            self.mounted(n)
                .is_some_and(|e| e.attributes.iter().any(|(k, v)| k == name && v == value))
        })
    }

    fn class_list(&self, node: NodeId) -> Vec<String> {
        self.node(node).map(|e| e.classes.clone()).unwrap_or_default()
    }

    fn set_class_list(&mut self, node: NodeId, classes: Vec<String>) {
        if let Some(e) = self.nodes.get_mut(node.0) {
            e.classes = classes;
        }
    }

    fn style_text(&self, node: NodeId) -> String {
        self.node(node)
            .map(|e| serialize_style(&e.style))
            .unwrap_or_default()
    }

    fn set_style_text(&mut self, node: NodeId, css: &str) {
        if let Some(e) = self.nodes.get_mut(node.0) {
            e.style = parse_style(css);
        }
    }

    fn style_property(&self, node: NodeId, name: &str) -> Option<String> {
        self.node(node)?
            .style
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    fn set_style_property(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(e) = self.nodes.get_mut(node.0) else {
            return;
        };
        if value.is_empty() {
            e.style.retain(|(k, _)| k != name);
        } else if let Some(slot) = e.style.iter_mut().find(|(k, _)| k == name) {
            slot.1 = value.to_string();
        } else {
            e.style.push((name.to_string(), value.to_string()));
        }
    }

    fn capture(&self, node: NodeId) -> Option<ElementCapture> {
        let element = self.mounted(node)?;
        Some(ElementCapture {
            markdown: element.content.clone().unwrap_or_default(),
            background_color: self.style_property(node, "background-color"),
            color: self.style_property(node, "color"),
        })
    }
}

fn serialize_style(style: &[(String, String)]) -> String {
    style
        .iter()
        .map(|(k, v)| format!("{k}: {v};"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_style(css: &str) -> Vec<(String, String)> {
    css.split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let (name, value) = (name.trim(), value.trim());
            (!name.is_empty() && !value.is_empty()).then(|| (name.to_string(), value.to_string()))
        })
        .collect()
}
