//! Built-in directives.

mod class_map;
mod ref_;
mod repeat;
mod unsafe_html;

pub use class_map::{class_map, ClassMapDirective};
pub use ref_::{create_ref, ref_, ref_callback, ElementRef, RefDirective};
pub use repeat::{repeat, RepeatDirective};
pub use unsafe_html::{unsafe_html, UnsafeHtmlDirective};
