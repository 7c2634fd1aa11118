//! Keyed list rendering.
//!
//! `repeat` keys each rendered item so that re-orders move the existing
//! DOM ranges instead of rewriting their contents in place. Stateful
//! child content (focused inputs, running animations, directive state)
//! survives permutations because node identity is preserved.

use crate::directive::{directive, BoundPart, Directive, DirectiveClass, PartKinds};
use crate::error::TemplateError;
use crate::value::Value;

/// Render a keyed sequence into a child binding.
///
/// Keys should be primitives (strings or integers); they are compared
/// with strict equality across renders. Unkeyed positional rendering is
/// what a plain [`Value::List`] already does.
pub fn repeat<K, I>(items: I) -> Value
where
    K: Into<Value>,
    I: IntoIterator<Item = (K, Value)>,
{
    let (keys, values): (Vec<Value>, Vec<Value>) =
        items.into_iter().map(|(k, v)| (k.into(), v)).unzip();
    directive::<RepeatDirective>(vec![Value::List(keys), Value::List(values)])
}

#[derive(Default)]
pub struct RepeatDirective {
    keys: Vec<Value>,
}

impl Directive for RepeatDirective {
    fn update(
        &mut self,
        part: &mut BoundPart<'_, '_>,
        args: Vec<Value>,
    ) -> Result<Value, TemplateError> {
        let (new_keys, new_values) = decode_args(args)?;

        // First render into this position, or the position held something
        // other than our item list in between: fall back to a positional
        // commit, which builds the item parts.
        if self.keys.is_empty() || part.item_count() != self.keys.len() {
            self.keys = new_keys;
            return Ok(Value::List(new_values));
        }

        let mut keys = std::mem::take(&mut self.keys);
        for (idx, (key, value)) in new_keys.iter().zip(new_values).enumerate() {
            match keys[idx..].iter().position(|k| k.strict_eq(key)) {
                Some(0) => {
                    part.commit_item(idx, value)?;
                }
                Some(offset) => {
                    let from = idx + offset;
                    part.move_item(from, idx)?;
                    let moved = keys.remove(from);
                    keys.insert(idx, moved);
                    part.commit_item(idx, value)?;
                }
                None => {
                    part.insert_item(idx)?;
                    keys.insert(idx, key.clone());
                    part.commit_item(idx, value)?;
                }
            }
        }

        // Everything shuffled past the new length is gone.
        while keys.len() > new_keys.len() {
            part.remove_item(new_keys.len())?;
            keys.remove(new_keys.len());
        }

        self.keys = new_keys;
        Ok(Value::NoChange)
    }

    fn render(&mut self, args: Vec<Value>) -> Result<Value, TemplateError> {
        let (keys, values) = decode_args(args)?;
        self.keys = keys;
        Ok(Value::List(values))
    }
}

impl DirectiveClass for RepeatDirective {
    const NAME: &'static str = "repeat";
    const COMPATIBLE: PartKinds = PartKinds::CHILD;
}

fn decode_args(args: Vec<Value>) -> Result<(Vec<Value>, Vec<Value>), TemplateError> {
    let mut args = args.into_iter();
    match (args.next(), args.next(), args.next()) {
        (Some(Value::List(keys)), Some(Value::List(values)), None)
            if keys.len() == values.len() =>
        {
            Ok((keys, values))
        }
        _ => Err(TemplateError::DirectiveArguments {
            name: RepeatDirective::NAME,
        }),
    }
}
