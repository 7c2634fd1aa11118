//! Keyed list reconciliation tests.

#[path = "util/mod.rs"]
mod util;

use std::collections::HashMap;

use lit_dom::{Document, NodeId};
use lit_html::directives::repeat;
use lit_html::{html, Renderer, Value};
use util::{setup, visible};

/// One call site for every item template, as a host component would have.
fn item_view(key: i64) -> Value {
    Value::Template(html!("<li>" {key} "</li>"))
}

fn keyed(keys: &[i64]) -> Value {
    repeat(keys.iter().map(|&k| (k, item_view(k))))
}

fn list_view(keys: &[i64]) -> lit_html::TemplateResult {
    html!("<ul>" {keyed(keys)} "</ul>")
}

fn ul_of(doc: &Document, container: NodeId) -> NodeId {
    doc.children(container)
        .into_iter()
        .find(|id| doc.node(*id).is_element())
        .expect("list container")
}

/// Map of rendered key text to the `<li>` node carrying it.
fn items_by_key(doc: &Document, container: NodeId) -> HashMap<String, NodeId> {
    let ul = ul_of(doc, container);
    doc.descendants(ul)
        .into_iter()
        .filter(|id| {
            doc.node(*id)
                .as_element()
                .is_some_and(|e| e.tag_name() == "li")
        })
        .map(|li| {
            let text = doc
                .descendants(li)
                .into_iter()
                .find_map(|id| doc.text(id).map(String::from))
                .unwrap_or_default();
            (text, li)
        })
        .collect()
}

mod rendering {
    use super::*;

    #[test]
    fn should_render_keyed_items_in_order() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        renderer
            .render(&mut doc, list_view(&[1, 2, 3]), container)
            .unwrap();
        assert_eq!(
            visible(&doc, container),
            "<ul><li>1</li><li>2</li><li>3</li></ul>"
        );
    }

    #[test]
    fn should_render_empty_lists_and_grow_later() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        renderer.render(&mut doc, list_view(&[]), container).unwrap();
        assert_eq!(visible(&doc, container), "<ul></ul>");
        renderer
            .render(&mut doc, list_view(&[7, 8]), container)
            .unwrap();
        assert_eq!(visible(&doc, container), "<ul><li>7</li><li>8</li></ul>");
    }

    #[test]
    fn should_be_idempotent_for_equal_keys_and_values() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        renderer
            .render(&mut doc, list_view(&[1, 2, 3]), container)
            .unwrap();
        doc.reset_counters();
        renderer
            .render(&mut doc, list_view(&[1, 2, 3]), container)
            .unwrap();
        assert_eq!(doc.counters().total(), 0);
    }
}

mod identity {
    use super::*;

    #[test]
    fn should_move_existing_nodes_on_permutation() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        renderer
            .render(&mut doc, list_view(&[1, 2, 3]), container)
            .unwrap();
        let before = items_by_key(&doc, container);

        doc.reset_counters();
        renderer
            .render(&mut doc, list_view(&[3, 1, 2]), container)
            .unwrap();
        let after = items_by_key(&doc, container);

        assert_eq!(
            visible(&doc, container),
            "<ul><li>3</li><li>1</li><li>2</li></ul>"
        );
        for key in ["1", "2", "3"] {
            assert_eq!(before[key], after[key], "node identity for key {}", key);
        }
        let counters = doc.counters();
        assert_eq!(counters.node_inserts, 0);
        assert_eq!(counters.node_removes, 0);
        assert!(counters.node_moves > 0);
    }

    #[test]
    fn should_preserve_identity_across_a_full_reversal() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        renderer
            .render(&mut doc, list_view(&[1, 2, 3, 4]), container)
            .unwrap();
        let before = items_by_key(&doc, container);

        renderer
            .render(&mut doc, list_view(&[4, 3, 2, 1]), container)
            .unwrap();
        let after = items_by_key(&doc, container);
        assert_eq!(
            visible(&doc, container),
            "<ul><li>4</li><li>3</li><li>2</li><li>1</li></ul>"
        );
        for key in ["1", "2", "3", "4"] {
            assert_eq!(before[key], after[key]);
        }
    }

    #[test]
    fn should_keep_survivors_when_removing_from_the_middle() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        renderer
            .render(&mut doc, list_view(&[1, 2, 3]), container)
            .unwrap();
        let before = items_by_key(&doc, container);

        renderer
            .render(&mut doc, list_view(&[1, 3]), container)
            .unwrap();
        let after = items_by_key(&doc, container);

        assert_eq!(visible(&doc, container), "<ul><li>1</li><li>3</li></ul>");
        assert_eq!(before["1"], after["1"]);
        assert_eq!(before["3"], after["3"]);
        assert!(!after.contains_key("2"));
    }

    #[test]
    fn should_keep_neighbors_when_inserting_in_the_middle() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        renderer
            .render(&mut doc, list_view(&[1, 3]), container)
            .unwrap();
        let before = items_by_key(&doc, container);

        renderer
            .render(&mut doc, list_view(&[1, 2, 3]), container)
            .unwrap();
        let after = items_by_key(&doc, container);

        assert_eq!(
            visible(&doc, container),
            "<ul><li>1</li><li>2</li><li>3</li></ul>"
        );
        assert_eq!(before["1"], after["1"]);
        assert_eq!(before["3"], after["3"]);
    }

    #[test]
    fn should_clear_when_all_keys_are_removed() {
        let (mut doc, container) = setup();
        let mut renderer = Renderer::new();
        renderer
            .render(&mut doc, list_view(&[1, 2]), container)
            .unwrap();
        renderer.render(&mut doc, list_view(&[]), container).unwrap();
        assert_eq!(visible(&doc, container), "<ul></ul>");
    }
}
