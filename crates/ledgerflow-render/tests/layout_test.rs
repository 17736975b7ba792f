use ledgerflow_core::{ConfigStore, DataProcessor, Dataset, LinkInput, NodeInput, ProcessedGraph};
use ledgerflow_render::sankey::{compute_link_paths, layout_sankey};
use serde_json::json;

fn scenario(expenses: f64) -> ProcessedGraph {
    let ds = Dataset::new(
        vec![
            NodeInput::new("Revenue", 0, 1000.0, "revenue"),
            NodeInput::new("Expenses", 1, expenses, "expense"),
            NodeInput::new("Net Income", 1, 400.0, "profit"),
        ],
        vec![
            LinkInput::new("Revenue", "Expenses", 600.0),
            LinkInput::new("Revenue", "Net Income", 400.0),
        ],
    );
    DataProcessor::default().process(&ds).unwrap()
}

fn multi_layer(imbalanced: bool) -> ProcessedGraph {
    let gp_out = if imbalanced { 520.0 } else { 600.0 };
    let ds = Dataset::new(
        vec![
            NodeInput::new("Product", 0, 700.0, "revenue"),
            NodeInput::new("Services", 0, 300.0, "revenue"),
            NodeInput::new("Revenue", 1, 1000.0, "revenue"),
            NodeInput::new("COGS", 2, 400.0, "expense"),
            NodeInput::new("Gross Profit", 2, 600.0, "profit"),
            NodeInput::new("OpEx", 3, 250.0, "expense"),
            NodeInput::new("Net Income", 3, 350.0, "profit"),
        ],
        vec![
            LinkInput::new("Product", "Revenue", 700.0),
            LinkInput::new("Services", "Revenue", 300.0),
            LinkInput::new("Revenue", "COGS", 400.0),
            LinkInput::new("Revenue", "Gross Profit", 600.0),
            LinkInput::new("Gross Profit", "OpEx", 250.0),
            LinkInput::new("Gross Profit", "Net Income", gp_out - 250.0),
        ],
    );
    DataProcessor::default().process(&ds).unwrap()
}

#[test]
fn three_node_scenario_splits_revenue_proportionally() {
    let graph = scenario(600.0);
    assert!(graph.warnings.is_empty());
    let layout = layout_sankey(&graph, &ConfigStore::default().layout_settings()).unwrap();
    assert_eq!(layout.nodes.len(), 3);
    assert_eq!(layout.links.len(), 2);
    assert!(layout.links.iter().all(|l| !l.path.is_empty()));

    let revenue = layout.node("Revenue").unwrap();
    let to_expenses = layout.link("link:Revenue->Expenses#0").unwrap();
    let to_net = layout.link("link:Revenue->Net Income#0").unwrap();
    assert!((to_expenses.source_width / to_net.source_width - 1.5).abs() < 1e-9);
    assert!((to_expenses.source_width + to_net.source_width - revenue.height()).abs() < 1e-9);
}

#[test]
fn imbalanced_sink_still_lays_out_at_its_own_value() {
    let graph = scenario(650.0);
    assert_eq!(graph.warnings.len(), 1);
    let layout = layout_sankey(&graph, &ConfigStore::default().layout_settings()).unwrap();
    let expenses = layout.node("Expenses").unwrap();
    assert!((expenses.height() - 650.0 * layout.scale).abs() < 1e-9);
    let into = layout.link("link:Revenue->Expenses#0").unwrap();
    assert!((into.target_width - expenses.height()).abs() < 1e-9);
}

#[test]
fn link_widths_add_up_to_node_height_on_both_sides() {
    for imbalanced in [false, true] {
        let graph = multi_layer(imbalanced);
        let layout = layout_sankey(&graph, &ConfigStore::default().layout_settings()).unwrap();
        for node in &layout.nodes {
            if node.source_links.is_empty() || node.target_links.is_empty() {
                continue;
            }
            let out: f64 = node
                .source_links
                .iter()
                .map(|&li| layout.links[li].source_width)
                .sum();
            let inc: f64 = node
                .target_links
                .iter()
                .map(|&li| layout.links[li].target_width)
                .sum();
            assert!((out - node.height()).abs() < 1e-6, "{} outflow", node.id);
            assert!((inc - node.height()).abs() < 1e-6, "{} inflow", node.id);
        }
    }
}

#[test]
fn zero_value_links_still_cover_their_nodes() {
    let ds = Dataset::new(
        vec![
            NodeInput::new("Revenue", 0, 100.0, "revenue"),
            NodeInput::new("Grants", 0, 0.0, "revenue"),
            NodeInput::new("Net Income", 1, 100.0, "profit"),
            NodeInput::new("Pending", 1, 0.0, "other"),
            NodeInput::new("Reserve", 2, 0.0, "other"),
            NodeInput::new("Spare", 2, 0.0, "other"),
        ],
        vec![
            LinkInput::new("Revenue", "Net Income", 100.0),
            LinkInput::new("Grants", "Pending", 0.0),
            LinkInput::new("Pending", "Reserve", 0.0),
            LinkInput::new("Pending", "Spare", 0.0),
        ],
    );
    let graph = DataProcessor::default().process(&ds).unwrap();
    let layout = layout_sankey(&graph, &ConfigStore::default().layout_settings()).unwrap();

    let pending = layout.node("Pending").unwrap();
    assert!(pending.height() > 0.0);
    let widths = pending
        .source_links
        .iter()
        .map(|&li| layout.links[li].source_width)
        .collect::<Vec<_>>();
    assert_eq!(widths.len(), 2);
    assert!((widths[0] - widths[1]).abs() < 1e-9);
    assert!((widths.iter().sum::<f64>() - pending.height()).abs() < 1e-9);
    let inbound: f64 = pending
        .target_links
        .iter()
        .map(|&li| layout.links[li].target_width)
        .sum();
    assert!((inbound - pending.height()).abs() < 1e-9);
}

#[test]
fn nodes_stay_inside_the_canvas_without_overlap() {
    let layout =
        layout_sankey(&multi_layer(false), &ConfigStore::default().layout_settings()).unwrap();
    for node in &layout.nodes {
        assert!(node.x0 >= 0.0 && node.y0 >= 0.0);
        assert!(node.x1 <= layout.width && node.y1 <= layout.height);
    }
    for layer in &layout.layers {
        for pair in layer.windows(2) {
            let (a, b) = (&layout.nodes[pair[0]], &layout.nodes[pair[1]]);
            assert!(a.y1 <= b.y0 + 1e-9, "{} overlaps {}", a.id, b.id);
        }
    }
}

#[test]
fn layer_spacing_multiplier_changes_gaps() {
    let graph = multi_layer(false);
    let mut store = ConfigStore::default();
    store.set("autoMiddleAlign", json!(false)).unwrap();
    let layout = layout_sankey(&graph, &store.layout_settings()).unwrap();
    let gap = |depth: usize| {
        let l = &layout.layers[depth];
        layout.nodes[l[1]].y0 - layout.nodes[l[0]].y1
    };
    assert!((gap(0) - 30.0 * 0.8).abs() < 1e-9);
    assert!((gap(2) - 30.0 * 0.9).abs() < 1e-9);
    assert!((gap(3) - 30.0 * 0.7).abs() < 1e-9);
}

#[test]
fn min_node_height_is_a_floor() {
    let ds = Dataset::new(
        vec![
            NodeInput::new("Revenue", 0, 1_000_000.0, "revenue"),
            NodeInput::new("Rounding", 1, 1.0, "expense"),
            NodeInput::new("Net Income", 1, 999_999.0, "profit"),
        ],
        vec![
            LinkInput::new("Revenue", "Rounding", 1.0),
            LinkInput::new("Revenue", "Net Income", 999_999.0),
        ],
    );
    let graph = DataProcessor::default().process(&ds).unwrap();
    let mut store = ConfigStore::default();
    store.set("minNodeHeight", json!(5)).unwrap();
    let layout = layout_sankey(&graph, &store.layout_settings()).unwrap();
    assert!((layout.node("Rounding").unwrap().height() - 5.0).abs() < 1e-9);
}

#[test]
fn curvature_only_recompute_keeps_nodes_fixed() {
    let graph = multi_layer(false);
    let mut store = ConfigStore::default();
    let mut layout = layout_sankey(&graph, &store.layout_settings()).unwrap();
    let nodes_before = layout.nodes.clone();
    let paths_before = layout
        .links
        .iter()
        .map(|l| l.path.clone())
        .collect::<Vec<_>>();

    store.set("curveIntensity", json!(0.7)).unwrap();
    compute_link_paths(&mut layout, &store.curvature_settings());

    assert_eq!(layout.nodes, nodes_before);
    for (link, before) in layout.links.iter().zip(&paths_before) {
        assert_ne!(&link.path, before);
        assert_eq!(link.curvature, 0.7);
    }
}

#[test]
fn per_layer_curvature_overrides_global() {
    let graph = multi_layer(false);
    let mut store = ConfigStore::default();
    store.apply_preset("dramatic").unwrap();
    let layout = layout_sankey(&graph, &store.layout_settings()).unwrap();
    let from_depth = |id: &str| layout.links.iter().find(|l| l.source == id).unwrap().curvature;
    assert_eq!(from_depth("Product"), 0.4);
    assert_eq!(from_depth("Revenue"), 0.6);
    assert_eq!(from_depth("Gross Profit"), 0.7);
}

#[test]
fn degenerate_canvas_is_rejected() {
    let mut store = ConfigStore::default();
    store
        .update(&json!({"width": 400, "margin": {"left": 200, "right": 200}}))
        .unwrap();
    let err = layout_sankey(&scenario(600.0), &store.layout_settings()).unwrap_err();
    assert!(matches!(err, ledgerflow_render::Error::Layout { .. }));
}

#[test]
fn layout_is_deterministic() {
    let settings = ConfigStore::default().layout_settings();
    let a = layout_sankey(&multi_layer(true), &settings).unwrap();
    let b = layout_sankey(&multi_layer(true), &settings).unwrap();
    assert_eq!(a, b);
}
