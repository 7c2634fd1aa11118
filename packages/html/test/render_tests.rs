//! End-to-end render and diffing tests.

#[path = "util/mod.rs"]
mod util;

use lit_dom::{Document, Namespace, NodeId};
use lit_html::directives::unsafe_html;
use lit_html::{html, svg, Renderer, Value};
use util::{setup, visible};

fn first_element_child(doc: &Document, parent: NodeId) -> Option<NodeId> {
    doc.children(parent)
        .into_iter()
        .find(|id| doc.node(*id).is_element())
}

mod first_render {
    use super::*;

    #[test]
    fn should_render_text_bindings() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        renderer
            .render(&mut doc, html!("<p>Hello, " {"world"} "!</p>"), container)
            .unwrap();
        assert_eq!(visible(&doc, container), "<p>Hello, world!</p>");
    }

    #[test]
    fn should_render_bare_primitives_at_the_root() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        renderer.render(&mut doc, 42, container).unwrap();
        assert_eq!(visible(&doc, container), "42");
    }

    #[test]
    fn should_render_nested_template_results() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        let inner = html!("<em>" {"x"} "</em>");
        renderer
            .render(&mut doc, html!("<p>" {inner} "</p>"), container)
            .unwrap();
        assert_eq!(visible(&doc, container), "<p><em>x</em></p>");
    }

    #[test]
    fn should_render_lists_positionally() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        let items: Vec<Value> = (1..=3).map(Value::from).collect();
        renderer
            .render(&mut doc, html!("<ul>" {items} "</ul>"), container)
            .unwrap();
        assert_eq!(visible(&doc, container), "<ul>123</ul>");
    }

    #[test]
    fn should_render_svg_in_the_svg_namespace() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        renderer
            .render(&mut doc, svg!("<circle r=\"" {4} "\"></circle>"), container)
            .unwrap();
        let circle = first_element_child(&doc, container).unwrap();
        let element = doc.node(circle).as_element().unwrap();
        assert_eq!(element.tag_name(), "circle");
        assert_eq!(element.namespace(), Namespace::Svg);
        assert_eq!(doc.attribute(circle, "r"), Some("4"));
    }

    #[test]
    fn should_render_before_a_reference_node() {
        let (mut doc, container) = setup();
        let sentinel = doc.create_element("hr");
        doc.append_child(container, sentinel);

        let mut renderer = Renderer::new();
        renderer
            .render_with_options(
                &mut doc,
                html!("<p>before</p>"),
                container,
                lit_html::RenderOptions {
                    render_before: Some(sentinel),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(visible(&doc, container), "<p>before</p><hr>");
    }
}

mod diffing {
    use super::*;

    #[test]
    fn should_perform_zero_writes_when_rerendering_equal_values() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        let view = |name: &str, n: i64| html!("<p class=\"" {name} "\">" {n} "</p>");

        renderer.render(&mut doc, view("a", 7), container).unwrap();
        doc.reset_counters();
        renderer.render(&mut doc, view("a", 7), container).unwrap();
        assert_eq!(doc.counters().total(), 0);
    }

    #[test]
    fn should_not_write_text_for_equal_primitives() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        renderer.render(&mut doc, 42, container).unwrap();
        doc.reset_counters();
        renderer.render(&mut doc, 42, container).unwrap();
        assert_eq!(doc.counters().text_writes, 0);
        assert_eq!(doc.counters().total(), 0);
    }

    #[test]
    fn should_update_only_the_changed_text() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        let view = |n: i64| html!("<p>" {n} "</p>");

        renderer.render(&mut doc, view(1), container).unwrap();
        doc.reset_counters();
        renderer.render(&mut doc, view(2), container).unwrap();

        let c = doc.counters();
        assert_eq!(c.text_writes, 1);
        assert_eq!(c.node_inserts, 0);
        assert_eq!(c.node_removes, 0);
        assert_eq!(visible(&doc, container), "<p>2</p>");
    }

    #[test]
    fn should_reuse_the_instance_for_the_same_template_identity() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        let view = |n: i64| html!("<p>" {n} "</p>");

        renderer.render(&mut doc, view(1), container).unwrap();
        let p_before = first_element_child(&doc, container).unwrap();
        renderer.render(&mut doc, view(2), container).unwrap();
        let p_after = first_element_child(&doc, container).unwrap();
        assert_eq!(p_before, p_after);
    }

    #[test]
    fn should_replace_the_instance_for_a_different_template() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();

        renderer
            .render(&mut doc, html!("<p>one</p>"), container)
            .unwrap();
        let p = first_element_child(&doc, container).unwrap();
        renderer
            .render(&mut doc, html!("<section>two</section>"), container)
            .unwrap();
        let section = first_element_child(&doc, container).unwrap();
        assert_ne!(p, section);
        assert_eq!(visible(&doc, container), "<section>two</section>");
    }

    #[test]
    fn should_clear_on_nothing() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        renderer
            .render(&mut doc, html!("<p>gone soon</p>"), container)
            .unwrap();
        renderer.render(&mut doc, Value::Nothing, container).unwrap();
        assert_eq!(visible(&doc, container), "");
    }

    #[test]
    fn should_clear_on_null() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        renderer.render(&mut doc, "text", container).unwrap();
        renderer.render(&mut doc, Value::Null, container).unwrap();
        assert_eq!(visible(&doc, container), "");
    }

    #[test]
    fn should_leave_dom_untouched_on_no_change() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        renderer.render(&mut doc, "kept", container).unwrap();
        doc.reset_counters();
        renderer
            .render(&mut doc, Value::NoChange, container)
            .unwrap();
        assert_eq!(doc.counters().total(), 0);
        assert_eq!(visible(&doc, container), "kept");
    }

    #[test]
    fn should_switch_between_text_and_template_content() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        renderer.render(&mut doc, "plain", container).unwrap();
        renderer
            .render(&mut doc, html!("<b>bold</b>"), container)
            .unwrap();
        assert_eq!(visible(&doc, container), "<b>bold</b>");
        renderer.render(&mut doc, "plain again", container).unwrap();
        assert_eq!(visible(&doc, container), "plain again");
    }
}

mod lists {
    use super::*;

    fn digits(n: usize) -> Vec<Value> {
        (0..n).map(|i| Value::from(i as i64)).collect()
    }

    #[test]
    fn should_grow_by_appending_parts() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        renderer.render(&mut doc, digits(2), container).unwrap();
        assert_eq!(visible(&doc, container), "01");
        renderer.render(&mut doc, digits(4), container).unwrap();
        assert_eq!(visible(&doc, container), "0123");
    }

    #[test]
    fn should_shrink_by_removing_trailing_parts() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        renderer.render(&mut doc, digits(4), container).unwrap();
        renderer.render(&mut doc, digits(2), container).unwrap();
        assert_eq!(visible(&doc, container), "01");
    }

    #[test]
    fn should_not_write_for_unchanged_items() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        renderer.render(&mut doc, digits(3), container).unwrap();
        doc.reset_counters();
        renderer.render(&mut doc, digits(3), container).unwrap();
        assert_eq!(doc.counters().total(), 0);
    }
}

mod escaping {
    use super::*;

    #[test]
    fn should_commit_markup_strings_as_inert_text() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        renderer
            .render(&mut doc, html!("<p>" {"<b>x</b>"} "</p>"), container)
            .unwrap();

        // No <b> element anywhere in the committed tree.
        let p = first_element_child(&doc, container).unwrap();
        assert!(doc
            .descendants(p)
            .into_iter()
            .all(|id| !doc.node(id).is_element()));
        assert_eq!(visible(&doc, container), "<p>&lt;b&gt;x&lt;/b&gt;</p>");
    }

    #[test]
    fn should_keep_attribute_injection_inert() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        let payload = "\" onmouseover=\"steal()";
        renderer
            .render(&mut doc, html!("<a title=\"" {payload} "\"></a>"), container)
            .unwrap();

        let a = first_element_child(&doc, container).unwrap();
        assert_eq!(doc.attribute(a, "title"), Some(payload));
        assert_eq!(doc.attribute(a, "onmouseover"), None);
    }

    #[test]
    fn should_parse_markup_only_through_the_unsafe_directive() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        renderer
            .render(
                &mut doc,
                html!("<p>" {unsafe_html("<b>x</b>")} "</p>"),
                container,
            )
            .unwrap();
        assert_eq!(visible(&doc, container), "<p><b>x</b></p>");
    }
}

mod error_handling {
    use super::*;
    use lit_html::{
        directive, BoundPart, Directive, DirectiveClass, PartKinds, TemplateError,
    };

    #[derive(Default)]
    struct FailingDirective;

    impl Directive for FailingDirective {
        fn render(&mut self, _args: Vec<Value>) -> Result<Value, TemplateError> {
            Err(TemplateError::DirectiveArguments { name: "failing" })
        }

        fn update(
            &mut self,
            _part: &mut BoundPart<'_, '_>,
            args: Vec<Value>,
        ) -> Result<Value, TemplateError> {
            self.render(args)
        }
    }

    impl DirectiveClass for FailingDirective {
        const NAME: &'static str = "failing";
        const COMPATIBLE: PartKinds = PartKinds::CHILD;
    }

    #[test]
    fn should_report_parse_errors_at_first_render() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        let result = renderer.render(
            &mut doc,
            html!("<script>var x = " {1} ";</script>"),
            container,
        );
        assert!(matches!(result, Err(TemplateError::RawTextBinding { .. })));
    }

    #[test]
    fn should_propagate_directive_errors_without_rolling_back() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        let failing = directive::<FailingDirective>(vec![]);
        let result = renderer.render(
            &mut doc,
            html!("<p>" {"kept"} "</p><p>" {failing} "</p>"),
            container,
        );
        assert!(result.is_err());
        // The sibling committed before the failure stays applied.
        assert!(doc.inner_html(container).contains("kept"));
    }

    #[test]
    fn should_reject_directives_on_incompatible_parts() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        let failing = directive::<FailingDirective>(vec![]);
        let result = renderer.render(
            &mut doc,
            html!("<p title=\"" {failing} "\"></p>"),
            container,
        );
        assert!(matches!(
            result,
            Err(TemplateError::IncompatibleDirective { .. })
        ));
    }
}

mod isolated_caches {
    use super::*;

    #[test]
    fn should_keep_renderer_caches_independent() {
        let (mut doc, container_a) = setup();
        let container_b = doc.create_element("div");
        let mut a = Renderer::new();
        let mut b = Renderer::new();

        let view = || html!("<p>shared call site</p>");
        a.render(&mut doc, view(), container_a).unwrap();
        b.render(&mut doc, view(), container_b).unwrap();
        assert_eq!(a.cache().len(), 1);
        assert_eq!(b.cache().len(), 1);
    }
}
