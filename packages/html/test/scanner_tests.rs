//! Binding-position error tests through the public render surface.
//!
//! Templates here are hand-assembled (not macro call sites) so each case
//! can pick its static segments dynamically; the cache precondition does
//! not matter because every case renders exactly once.

#[path = "util/mod.rs"]
mod util;

use lit_dom::Document;
use lit_html::{Renderer, TemplateError, TemplateKind, TemplateResult, Value};
use util::setup;

fn leak(segments: &[&str]) -> &'static [&'static str] {
    let leaked: Vec<&'static str> = segments
        .iter()
        .map(|s| &*Box::leak(s.to_string().into_boxed_str()))
        .collect();
    Box::leak(leaked.into_boxed_slice())
}

fn render_template(segments: &[&str], values: Vec<Value>) -> Result<(), TemplateError> {
    let (mut doc, container): (Document, _) = setup();
    let mut renderer = Renderer::new();
    let result = TemplateResult::new(TemplateKind::Html, leak(segments), values);
    renderer.render(&mut doc, result, container).map(|_| ())
}

mod rejected_positions {
    use super::*;

    #[test]
    fn should_reject_tag_name_interpolation() {
        let err = render_template(&["<", "></div>"], vec![Value::from("div")]);
        assert!(matches!(err, Err(TemplateError::TagNameBinding)));
    }

    #[test]
    fn should_reject_partial_tag_name_interpolation() {
        let err = render_template(&["<my-", "></my-card>"], vec![Value::from("card")]);
        assert!(matches!(err, Err(TemplateError::TagNameBinding)));
    }

    #[test]
    fn should_reject_bindings_before_the_first_tag() {
        let err = render_template(&["", "<p></p>"], vec![Value::from("x")]);
        assert!(matches!(err, Err(TemplateError::BindingBeforeFirstTag)));
    }

    #[test]
    fn should_reject_bindings_inside_comments() {
        let err = render_template(&["<div><!-- ", " --></div>"], vec![Value::from("x")]);
        assert!(matches!(err, Err(TemplateError::CommentBinding)));
    }

    #[test]
    fn should_reject_bindings_inside_script_and_style() {
        let err = render_template(&["<script>", "</script>"], vec![Value::from("x")]);
        assert!(matches!(err, Err(TemplateError::RawTextBinding { tag }) if tag == "script"));

        let err = render_template(&["<style>", "</style>"], vec![Value::from("x")]);
        assert!(matches!(err, Err(TemplateError::RawTextBinding { tag }) if tag == "style"));
    }

    #[test]
    fn should_reject_bindings_inside_textarea() {
        let err = render_template(&["<textarea>", "</textarea>"], vec![Value::from("x")]);
        assert!(matches!(err, Err(TemplateError::RawTextBinding { tag }) if tag == "textarea"));
    }

    #[test]
    fn should_reject_attribute_name_interpolation() {
        let err = render_template(&["<div data-", "=\"v\"></div>"], vec![Value::from("x")]);
        assert!(matches!(err, Err(TemplateError::AttributeNameBinding)));
    }

    #[test]
    fn should_reject_bindings_in_end_tags() {
        let err = render_template(&["<div></div ", ">"], vec![Value::from("x")]);
        assert!(matches!(err, Err(TemplateError::UnsupportedBindingPosition)));
    }

    #[test]
    fn should_reject_the_reserved_marker_in_static_text() {
        let err = render_template(&["<p>lit$rs$</p>"], vec![]);
        assert!(matches!(err, Err(TemplateError::MarkerInStatics)));
    }

    #[test]
    fn should_reject_multi_value_boolean_bindings() {
        let err = render_template(
            &["<div ?on=\"", " ", "\"></div>"],
            vec![Value::from(true), Value::from(false)],
        );
        assert!(matches!(err, Err(TemplateError::UnsupportedBindingPosition)));
    }
}

mod accepted_positions {
    use super::*;

    #[test]
    fn should_accept_bindings_after_the_last_tag() {
        let ok = render_template(&["<b>x</b> ", ""], vec![Value::from("tail")]);
        assert!(ok.is_ok());
    }

    #[test]
    fn should_accept_static_raw_text_elements() {
        let ok = render_template(
            &["<style>p { color: red }</style><p>", "</p>"],
            vec![Value::from("x")],
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn should_accept_unquoted_single_bindings() {
        let ok = render_template(&["<input value=", ">"], vec![Value::from("v")]);
        assert!(ok.is_ok());
    }
}
