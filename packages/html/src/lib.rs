#![deny(clippy::all)]

//! An efficient DOM-diffing template engine.
//!
//! Templates are written with the [`html!`]/[`svg!`] macros: static
//! markup segments with brace-wrapped bindings between them. The first
//! render of a call site parses its segments once into a cached
//! [`Template`]; every subsequent render walks the live parts and writes
//! to the document only where a bound value actually changed.
//!
//! ```
//! use lit_dom::Document;
//! use lit_html::{html, Renderer};
//!
//! let mut doc = Document::new();
//! let container = doc.create_element("div");
//! let mut renderer = Renderer::new();
//!
//! let view = |name: &str| html!("<p>Hello, " {name} "!</p>");
//! renderer.render(&mut doc, view("world"), container).unwrap();
//! assert!(doc.inner_html(container).contains("world"));
//! ```
//!
//! Template identity is the address of the call site's static strings
//! (the macros hoist them into a `static`), so the cache requires
//! rendering through the macros, not through hand-assembled slices.

mod directive;
mod error;
mod instance;
mod part;
mod render;
mod scanner;
mod template;
mod template_result;
mod value;

pub mod directives;

pub use lit_dom as dom;

pub use directive::{directive, BoundPart, Directive, DirectiveClass, DirectiveSpec, PartKinds};
pub use error::TemplateError;
pub use render::{RenderOptions, Renderer, RootId};
pub use template::{Template, TemplateCache};
pub use template_result::{TemplateIdentity, TemplateKind, TemplateResult};
pub use value::Value;
