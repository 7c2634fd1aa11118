//! Class list composition for attribute bindings.

use indexmap::IndexMap;

use crate::directive::{directive, Directive, DirectiveClass, PartKinds};
use crate::error::TemplateError;
use crate::value::Value;

/// Compose a `class` attribute value from flagged names; later duplicate
/// names override earlier ones. The attribute part's own diffing makes
/// an unchanged composition a no-op write-wise.
pub fn class_map<S: Into<String>>(classes: impl IntoIterator<Item = (S, bool)>) -> Value {
    let mut map: IndexMap<String, bool> = IndexMap::new();
    for (name, enabled) in classes {
        map.insert(name.into(), enabled);
    }
    let pairs = map
        .into_iter()
        .map(|(name, enabled)| Value::List(vec![Value::Text(name), Value::Bool(enabled)]))
        .collect();
    directive::<ClassMapDirective>(vec![Value::List(pairs)])
}

#[derive(Default)]
pub struct ClassMapDirective;

impl Directive for ClassMapDirective {
    fn render(&mut self, args: Vec<Value>) -> Result<Value, TemplateError> {
        let Some(Value::List(pairs)) = args.into_iter().next() else {
            return Err(TemplateError::DirectiveArguments { name: Self::NAME });
        };
        let mut enabled = Vec::new();
        for pair in pairs {
            let Value::List(pair) = pair else {
                return Err(TemplateError::DirectiveArguments { name: Self::NAME });
            };
            match (pair.first(), pair.get(1)) {
                (Some(Value::Text(name)), Some(Value::Bool(true))) => {
                    enabled.push(name.clone());
                }
                (Some(Value::Text(_)), Some(Value::Bool(false))) => {}
                _ => return Err(TemplateError::DirectiveArguments { name: Self::NAME }),
            }
        }
        Ok(Value::Text(enabled.join(" ")))
    }
}

impl DirectiveClass for ClassMapDirective {
    const NAME: &'static str = "class-map";
    const COMPATIBLE: PartKinds = PartKinds::ATTRIBUTE;
}
