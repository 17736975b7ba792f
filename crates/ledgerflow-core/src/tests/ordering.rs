use crate::*;
use serde_json::json;

fn ids(g: &ProcessedGraph, depth: usize) -> Vec<&str> {
    g.layers[depth]
        .iter()
        .map(|&i| g.nodes[i].id.as_str())
        .collect()
}

#[test]
fn non_expense_nodes_precede_expenses_within_a_group() {
    let ds = Dataset::new(
        vec![
            NodeInput::new("Revenue", 0, 1000.0, "revenue"),
            NodeInput::new("Tax", 1, 100.0, "expense"),
            NodeInput::new("COGS", 1, 300.0, "expense"),
            NodeInput::new("Gross Profit", 1, 600.0, "profit"),
        ],
        vec![
            LinkInput::new("Revenue", "Tax", 100.0),
            LinkInput::new("Revenue", "COGS", 300.0),
            LinkInput::new("Revenue", "Gross Profit", 600.0),
        ],
    );
    let g = DataProcessor::default().process(&ds).unwrap();
    assert_eq!(ids(&g, 1), vec!["Gross Profit", "Tax", "COGS"]);
}

#[test]
fn children_follow_their_parents_order() {
    let ds = Dataset::new(
        vec![
            NodeInput::new("Big", 0, 100.0, "revenue"),
            NodeInput::new("Small", 0, 10.0, "revenue"),
            NodeInput::new("From Small", 1, 10.0, "revenue"),
            NodeInput::new("From Big", 1, 100.0, "revenue"),
        ],
        vec![
            LinkInput::new("Small", "From Small", 10.0),
            LinkInput::new("Big", "From Big", 100.0),
        ],
    );
    let g = DataProcessor::default().process(&ds).unwrap();
    assert_eq!(ids(&g, 0), vec!["Big", "Small"]);
    assert_eq!(ids(&g, 1), vec!["From Big", "From Small"]);
    assert_eq!(g.node("From Small").unwrap().parent.as_deref(), Some("Small"));
}

#[test]
fn custom_order_applies_only_when_the_whole_layer_has_it() {
    let full = Dataset::from_value(json!({
        "nodes": [
            {"id": "A", "depth": 0, "value": 5, "customOrder": 2},
            {"id": "B", "depth": 0, "value": 1, "customOrder": 1}
        ],
        "links": []
    }))
    .unwrap();
    let g = DataProcessor::default().process(&full).unwrap();
    assert_eq!(ids(&g, 0), vec!["B", "A"]);

    let partial = Dataset::from_value(json!({
        "nodes": [
            {"id": "A", "depth": 0, "value": 5, "customOrder": 2},
            {"id": "B", "depth": 0, "value": 1}
        ],
        "links": []
    }))
    .unwrap();
    let g = DataProcessor::default().process(&partial).unwrap();
    assert_eq!(ids(&g, 0), vec!["A", "B"]);
}

#[test]
fn explicit_order_beats_value() {
    let ds = Dataset::from_value(json!({
        "nodes": [
            {"id": "Large", "depth": 0, "value": 50, "order": 2},
            {"id": "Tiny", "depth": 0, "value": 1, "order": 1}
        ],
        "links": []
    }))
    .unwrap();
    let g = DataProcessor::default().process(&ds).unwrap();
    assert_eq!(ids(&g, 0), vec!["Tiny", "Large"]);
    assert_eq!(g.rank_of(g.node_index("Large").unwrap()), Some(1));
}

#[test]
fn nodes_without_order_sort_after_ordered_ones_in_any_input_order() {
    let a = json!({"id": "a", "depth": 0, "value": 10, "order": 1});
    let b = json!({"id": "b", "depth": 0, "value": 20});
    let c = json!({"id": "c", "depth": 0, "value": 30, "order": 2});
    let permutations = [
        [&a, &b, &c],
        [&a, &c, &b],
        [&b, &a, &c],
        [&b, &c, &a],
        [&c, &a, &b],
        [&c, &b, &a],
    ];
    for nodes in permutations {
        let ds = Dataset::from_value(json!({"nodes": nodes, "links": []})).unwrap();
        let g = DataProcessor::default().process(&ds).unwrap();
        assert_eq!(ids(&g, 0), vec!["a", "c", "b"], "input order {nodes:?}");
    }
}
