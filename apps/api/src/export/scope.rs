//! Scoped mutation of a render surface.
//!
//! `StyleScope` snapshots class lists and inline styles when acquired and
//! writes them back when dropped. `ViewGuard` does the same for the active
//! view. Both restore on every exit path, including early returns and
//! errors propagated with `?`.

use std::ops::{Deref, DerefMut};

use tracing::debug;

use crate::export::surface::{add_class, remove_class, NodeId, RenderSurface, View};

pub const HIDDEN_CLASS: &str = "hidden";
pub const FALLBACK_CLASS: &str = "pdf-fallback";
pub const BACKGROUND_VAR: &str = "--background";

/// Solid colours forced onto the export context. The converter cannot
/// composite transparent or theme-variable backgrounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPalette {
    pub background: String,
    pub foreground: String,
}

impl Default for ExportPalette {
    fn default() -> Self {
        Self {
            background: "rgb(37, 37, 37)".to_string(),
            foreground: "rgb(251, 251, 251)".to_string(),
        }
    }
}

/// Elements located before any mutation happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportTargets {
    pub target: NodeId,
    pub parent: NodeId,
    pub wrapper: NodeId,
}

#[derive(Debug, Clone)]
struct NodeSnapshot {
    node: NodeId,
    classes: Vec<String>,
    style: String,
}

/// Restores the original view on drop.
///
/// View switches are asynchronous, so the guard reverts whenever it has
/// requested a switch, even if the surface has not applied it yet.
pub struct ViewGuard<'a, S: RenderSurface + ?Sized> {
    surface: &'a mut S,
    original: View,
    switched: bool,
}

impl<'a, S: RenderSurface + ?Sized> ViewGuard<'a, S> {
    pub fn new(surface: &'a mut S) -> Self {
        let original = surface.active_view();
        Self {
            surface,
            original,
            switched: false,
        }
    }

    /// Requests `view` on the surface; the original is requested back on drop.
    pub fn switch_to(&mut self, view: View) {
        self.switched = true;
        self.surface.request_view(view);
    }
}

impl<S: RenderSurface + ?Sized> Deref for ViewGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.surface
    }
}

impl<S: RenderSurface + ?Sized> DerefMut for ViewGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.surface
    }
}

impl<S: RenderSurface + ?Sized> Drop for ViewGuard<'_, S> {
    fn drop(&mut self) {
        if self.switched {
            debug!("Reverting surface view to {:?}", self.original);
            self.surface.request_view(self.original);
        }
    }
}

/// Holds the surface in its export styling until dropped.
pub struct StyleScope<'a, S: RenderSurface + ?Sized> {
    surface: &'a mut S,
    snapshots: Vec<NodeSnapshot>,
}

impl<'a, S: RenderSurface + ?Sized> StyleScope<'a, S> {
    /// Snapshots body, root, target, parent and wrapper, then applies the
    /// export styling. Nothing is mutated before the snapshot is complete.
    pub fn acquire(surface: &'a mut S, targets: ExportTargets, palette: &ExportPalette) -> Self {
        let body = surface.body();
        let root = surface.root();

        let mut nodes = vec![body, root, targets.target, targets.parent, targets.wrapper];
        let mut seen = Vec::with_capacity(nodes.len());
        nodes.retain(|n| {
            let fresh = !seen.contains(n);
            seen.push(*n);
            fresh
        });

        let snapshots = nodes
            .into_iter()
            .map(|node| NodeSnapshot {
                node,
                classes: surface.class_list(node),
                style: surface.style_text(node),
            })
            .collect();

        let mut scope = Self { surface, snapshots };
        scope.apply(body, root, targets, palette);
        scope
    }

    fn apply(&mut self, body: NodeId, root: NodeId, targets: ExportTargets, palette: &ExportPalette) {
        let s = &mut *self.surface;
        let ExportTargets {
            target,
            parent,
            wrapper,
        } = targets;

        // Off-screen rather than display:none so the converter can still measure layout.
        remove_class(s, parent, HIDDEN_CLASS);
        for (name, value) in [
            ("position", "absolute"),
            ("left", "-9999px"),
            ("top", "0"),
            ("z-index", "-1"),
            ("width", "210mm"),
            ("min-height", "297mm"),
        ] {
            s.set_style_property(parent, name, value);
        }
        s.set_style_property(parent, "background-color", &palette.background);

        for node in [body, target, wrapper] {
            add_class(s, node, FALLBACK_CLASS);
        }

        s.set_style_property(body, "background-color", &palette.background);
        s.set_style_property(root, BACKGROUND_VAR, &palette.background);
        s.set_style_property(wrapper, "background-color", &palette.background);
        s.set_style_property(target, "background-color", &palette.background);
        s.set_style_property(target, "color", &palette.foreground);
    }
}

impl<S: RenderSurface + ?Sized> Deref for StyleScope<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.surface
    }
}

impl<S: RenderSurface + ?Sized> DerefMut for StyleScope<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.surface
    }
}

impl<S: RenderSurface + ?Sized> Drop for StyleScope<'_, S> {
    fn drop(&mut self) {
        for snapshot in self.snapshots.drain(..).rev() {
            self.surface.set_class_list(snapshot.node, snapshot.classes);
            self.surface.set_style_text(snapshot.node, &snapshot.style);
        }
        debug!("Restored export styling");
    }
}
