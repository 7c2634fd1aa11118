#![deny(clippy::all)]

//! Reactive component host.
//!
//! The template engine renders values; this crate supplies the thin
//! host that owns a component, batches its update requests behind a
//! dirty flag, performs one engine render per update cycle, and relays
//! connect/disconnect into the engine's synchronous disconnection
//! propagation. Scheduling stays with the caller: `flush` is explicit
//! and synchronous.

use lit_dom::{Document, NodeId};
use lit_html::{RenderOptions, Renderer, RootId, TemplateError, TemplateResult};
use tracing::debug;

/// A renderable component.
pub trait Component {
    /// Produce the current view. Called once per update cycle; repeated
    /// renders of semantically unchanged output are cheap by the
    /// engine's contract.
    fn render(&self) -> TemplateResult;

    /// Host entered a document.
    fn connected(&mut self) {}

    /// Host left a document.
    fn disconnected(&mut self) {}
}

/// Owns a [`Component`] and drives it through a [`Renderer`].
pub struct ElementHost<C: Component> {
    component: C,
    renderer: Renderer,
    container: NodeId,
    root: Option<RootId>,
    dirty: bool,
    connected: bool,
    update_count: u64,
}

impl<C: Component> ElementHost<C> {
    /// Create a host rendering into `container`. Nothing renders until
    /// [`connect`](Self::connect) or [`flush`](Self::flush).
    pub fn new(component: C, container: NodeId) -> Self {
        ElementHost {
            component,
            renderer: Renderer::new(),
            container,
            root: None,
            dirty: true,
            connected: false,
            update_count: 0,
        }
    }

    pub fn component(&self) -> &C {
        &self.component
    }

    /// Mutable access to the component; marks the host dirty, since
    /// property changes are what update cycles exist for.
    pub fn component_mut(&mut self) -> &mut C {
        self.dirty = true;
        &mut self.component
    }

    /// Ask for an update cycle. Idempotent between flushes.
    pub fn request_update(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of renders actually performed.
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Run update cycles until the dirty flag stays clear. Returns
    /// whether any render happened. Requests raised while flushing queue
    /// another cycle rather than being lost.
    pub fn flush(&mut self, doc: &mut Document) -> Result<bool, TemplateError> {
        let mut rendered = false;
        while self.dirty {
            self.dirty = false;
            let view = self.component.render();
            let options = RenderOptions {
                host: Some(std::any::type_name::<C>().to_string()),
                ..Default::default()
            };
            let root =
                self.renderer
                    .render_with_options(doc, view, self.container, options)?;
            self.root = Some(root);
            self.update_count += 1;
            rendered = true;
        }
        Ok(rendered)
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Enter a document: notify the component, render pending state,
    /// mark the part tree connected.
    pub fn connect(&mut self, doc: &mut Document) -> Result<(), TemplateError> {
        if self.connected {
            return Ok(());
        }
        self.connected = true;
        self.component.connected();
        self.flush(doc)?;
        if let Some(root) = self.root {
            self.renderer.set_connected(root, true);
        }
        debug!(container = ?self.container, "host connected");
        Ok(())
    }

    /// Leave a document: synchronously disconnect the part tree (and
    /// every directive in it), then notify the component.
    pub fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;
        if let Some(root) = self.root {
            self.renderer.set_connected(root, false);
        }
        self.component.disconnected();
        debug!(container = ?self.container, "host disconnected");
    }
}
