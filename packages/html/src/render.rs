//! The render entry point.

use std::collections::HashMap;

use lit_dom::{Document, NodeId};
use tracing::debug;

use crate::error::TemplateError;
use crate::part::ChildPart;
use crate::template::TemplateCache;
use crate::value::Value;

/// Options for a render call.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Insert rendered content before this sibling instead of appending
    /// to the container.
    pub render_before: Option<NodeId>,
    /// Cache-scope discriminator: hosts that rewrite templates per
    /// element name (legacy-compatibility layers) render with a scope so
    /// their prepared templates do not collide with unscoped ones.
    pub scope: Option<String>,
    /// Diagnostic label for the host driving this render.
    pub host: Option<String>,
}

/// Handle to a root child part created by [`Renderer::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootId(usize);

/// Everything a commit pass needs: the live document, the template
/// cache, and the inherited state of the committing subtree.
pub(crate) struct RenderContext<'a> {
    pub(crate) doc: &'a mut Document,
    pub(crate) cache: &'a mut TemplateCache,
    pub(crate) connected: bool,
    pub(crate) scope: Option<String>,
}

/// Owns the template cache and the root parts, one per render target.
///
/// The cache is injected state, not a process-wide global: two renderers
/// never share prepared templates, so tests can run against isolated
/// caches and hosts can bound memory by dropping the renderer.
#[derive(Debug, Default)]
pub struct Renderer {
    cache: TemplateCache,
    roots: Vec<RootEntry>,
    by_target: HashMap<(NodeId, Option<NodeId>), RootId>,
}

#[derive(Debug)]
struct RootEntry {
    part: ChildPart,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer::default()
    }

    /// Build a renderer around an existing cache.
    pub fn with_cache(cache: TemplateCache) -> Self {
        Renderer {
            cache,
            roots: Vec::new(),
            by_target: HashMap::new(),
        }
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut TemplateCache {
        &mut self.cache
    }

    /// Render `value` into `container`, creating the root part on first
    /// use and diffing against the previous commit afterwards.
    pub fn render(
        &mut self,
        doc: &mut Document,
        value: impl Into<Value>,
        container: NodeId,
    ) -> Result<RootId, TemplateError> {
        self.render_with_options(doc, value, container, RenderOptions::default())
    }

    pub fn render_with_options(
        &mut self,
        doc: &mut Document,
        value: impl Into<Value>,
        container: NodeId,
        options: RenderOptions,
    ) -> Result<RootId, TemplateError> {
        let key = (container, options.render_before);
        let root = match self.by_target.get(&key) {
            Some(root) => *root,
            None => {
                let marker = doc.create_comment("");
                doc.insert_before(container, marker, options.render_before);
                let part = ChildPart::new(marker, options.render_before, true);
                let root = RootId(self.roots.len());
                self.roots.push(RootEntry { part });
                self.by_target.insert(key, root);
                debug!(?container, host = options.host.as_deref(), "created root part");
                root
            }
        };

        let entry = &mut self.roots[root.0];
        let mut cx = RenderContext {
            doc,
            cache: &mut self.cache,
            connected: entry.part.connected(),
            scope: options.scope,
        };
        entry.part.commit(value.into(), &mut cx)?;
        Ok(root)
    }

    /// Synchronously propagate a connection-state change through the
    /// root's whole part tree, top-down. Hosts call this when the
    /// container leaves or re-enters their document.
    pub fn set_connected(&mut self, root: RootId, connected: bool) {
        if let Some(entry) = self.roots.get_mut(root.0) {
            entry.part.set_connected(connected);
        }
    }

    /// The root part's marker node, mostly useful to tests.
    pub fn root_marker(&self, root: RootId) -> Option<NodeId> {
        self.roots.get(root.0).map(|entry| entry.part.start())
    }
}
