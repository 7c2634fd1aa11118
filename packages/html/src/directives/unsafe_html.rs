//! The sanctioned raw-markup escape hatch.
//!
//! Ordinary bound text is always committed as inert character data; this
//! directive is the one path that parses a bound string as markup. The
//! content is re-parsed and re-spliced only when the string changes.

use crate::directive::{directive, BoundPart, Directive, DirectiveClass, PartKinds};
use crate::error::TemplateError;
use crate::value::Value;

/// Render a string of trusted markup into a child binding.
pub fn unsafe_html(markup: impl Into<String>) -> Value {
    directive::<UnsafeHtmlDirective>(vec![Value::Text(markup.into())])
}

#[derive(Default)]
pub struct UnsafeHtmlDirective {
    committed: bool,
    last: Option<String>,
}

impl Directive for UnsafeHtmlDirective {
    fn update(
        &mut self,
        part: &mut BoundPart<'_, '_>,
        args: Vec<Value>,
    ) -> Result<Value, TemplateError> {
        let arg = args
            .into_iter()
            .next()
            .ok_or(TemplateError::DirectiveArguments { name: Self::NAME })?;
        let markup = match arg {
            Value::Text(s) => Some(s),
            Value::Null | Value::Nothing => None,
            _ => return Err(TemplateError::DirectiveArguments { name: Self::NAME }),
        };

        if self.committed && self.last == markup {
            return Ok(Value::NoChange);
        }

        part.clear_children()?;
        if let Some(markup) = &markup {
            part.insert_markup(markup)?;
        }
        self.committed = true;
        self.last = markup;
        Ok(Value::NoChange)
    }

    fn render(&mut self, _args: Vec<Value>) -> Result<Value, TemplateError> {
        Ok(Value::NoChange)
    }
}

impl DirectiveClass for UnsafeHtmlDirective {
    const NAME: &'static str = "unsafe-html";
    const COMPATIBLE: PartKinds = PartKinds::CHILD;
}
