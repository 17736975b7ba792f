use ledgerflow_core::{
    ChartKind, ConfigStore, DataProcessor, Dataset, LinkInput, NodeInput, ProcessedGraph,
};
use ledgerflow_render::bar::layout_bars;
use ledgerflow_render::renderer::{COLOR_TRANSITION_MS, Renderer, link_key, node_key};
use ledgerflow_render::sankey::{compute_link_paths, layout_sankey};
use ledgerflow_render::{DrawingSurface, Group, SvgSurface, TransitionKind};
use serde_json::json;

fn dataset() -> Dataset {
    let mut ds = Dataset::new(
        vec![
            NodeInput::new("Revenue", 0, 1000.0, "revenue"),
            NodeInput::new("Expenses", 1, 600.0, "expense"),
            NodeInput::new("Net Income", 1, 400.0, "profit"),
        ],
        vec![
            LinkInput::new("Revenue", "Expenses", 600.0),
            LinkInput::new("Revenue", "Net Income", 400.0),
        ],
    );
    ds.metadata.title = Some("Acme & Co".to_string());
    ds
}

fn process(ds: &Dataset) -> ProcessedGraph {
    DataProcessor::default().process(ds).unwrap()
}

#[test]
fn rendering_twice_is_idempotent() {
    let store = ConfigStore::default();
    let graph = process(&dataset());
    let layout = layout_sankey(&graph, &store.layout_settings()).unwrap();
    let renderer = Renderer::new(store.style_settings());
    let mut surface = SvgSurface::new(1.0, 1.0);

    let first = renderer.render_chart(&mut surface, &layout, &graph);
    assert_eq!(first.entered, surface.len());
    let keys = surface.keys().map(str::to_string).collect::<Vec<_>>();
    let svg = surface.to_svg();
    surface.take_transitions();

    let second = renderer.render_chart(&mut surface, &layout, &graph);
    assert!(second.is_noop());
    assert!(surface.transitions().is_empty());
    assert_eq!(surface.keys().map(str::to_string).collect::<Vec<_>>(), keys);
    assert_eq!(surface.to_svg(), svg);
}

#[test]
fn element_keys_are_stable_and_unique() {
    let store = ConfigStore::default();
    let graph = process(&dataset());
    let layout = layout_sankey(&graph, &store.layout_settings()).unwrap();
    let mut surface = SvgSurface::new(1.0, 1.0);
    Renderer::new(store.style_settings()).render_chart(&mut surface, &layout, &graph);

    let doc_text = surface.to_svg();
    let doc = roxmltree::Document::parse(&doc_text).unwrap();
    let mut keys = doc
        .descendants()
        .filter_map(|n| n.attribute("data-key"))
        .collect::<Vec<_>>();
    let total = keys.len();
    keys.sort_unstable();
    keys.dedup();
    assert_eq!(keys.len(), total);
    for key in [
        "node:Revenue",
        "node:Expenses",
        "node:Net Income",
        "link:Revenue->Expenses#0",
        "link:Revenue->Net Income#0",
        "label:Revenue",
        "title",
    ] {
        assert!(keys.contains(&key), "missing {key}");
    }

    let title = doc
        .descendants()
        .find(|n| n.attribute("data-key") == Some("title"))
        .unwrap();
    let text = title.descendants().filter_map(|n| n.text()).collect::<String>();
    assert_eq!(text, "Acme & Co");
}

#[test]
fn ids_containing_arrows_get_distinct_link_keys() {
    let ds = Dataset::new(
        vec![
            NodeInput::new("A", 0, 10.0, "revenue"),
            NodeInput::new("A->B", 0, 5.0, "revenue"),
            NodeInput::new("C", 1, 5.0, "profit"),
            NodeInput::new("B->C", 1, 10.0, "profit"),
        ],
        vec![
            LinkInput::new("A", "B->C", 10.0),
            LinkInput::new("A->B", "C", 5.0),
        ],
    );
    let store = ConfigStore::default();
    let graph = process(&ds);
    let layout = layout_sankey(&graph, &store.layout_settings()).unwrap();
    assert_eq!(layout.links[0].key, link_key("A", "B->C", 0));
    assert_eq!(layout.links[1].key, link_key("A->B", "C", 0));
    assert_ne!(layout.links[0].key, layout.links[1].key);
    assert_eq!(link_key("A#1", "50%", 2), "link:A%231->50%25#2");

    let mut surface = SvgSurface::new(1.0, 1.0);
    Renderer::new(store.style_settings()).render_chart(&mut surface, &layout, &graph);
    assert_eq!(surface.keys_in(Group::Links).len(), 2);
}

#[test]
fn labels_carry_value_and_margin_lines() {
    let store = ConfigStore::default();
    let graph = process(&dataset());
    let layout = layout_sankey(&graph, &store.layout_settings()).unwrap();
    let mut surface = SvgSurface::new(1.0, 1.0);
    Renderer::new(store.style_settings()).render_chart(&mut surface, &layout, &graph);

    let label = surface.get("label:Net Income").unwrap();
    let ledgerflow_render::Shape::Text { lines, anchor, .. } = &label.shape else {
        panic!("label is not text");
    };
    assert_eq!(lines, &vec!["Net Income", "$400", "Net Margin: 40.0%"]);
    assert_eq!(*anchor, ledgerflow_render::TextAnchor::Start);

    let revenue = surface.get("label:Revenue").unwrap();
    let ledgerflow_render::Shape::Text { lines, anchor, .. } = &revenue.shape else {
        panic!("label is not text");
    };
    assert_eq!(lines, &vec!["Revenue", "$1,000"]);
    assert_eq!(*anchor, ledgerflow_render::TextAnchor::End);
}

#[test]
fn removed_nodes_exit_and_new_nodes_enter() {
    let store = ConfigStore::default();
    let renderer = Renderer::new(store.style_settings());
    let mut surface = SvgSurface::new(1.0, 1.0);

    let graph = process(&dataset());
    let layout = layout_sankey(&graph, &store.layout_settings()).unwrap();
    renderer.render_chart(&mut surface, &layout, &graph);
    surface.take_transitions();

    let mut next = dataset();
    next.nodes.pop();
    next.links.pop();
    next.nodes.push(NodeInput::new("Profit", 1, 400.0, "profit"));
    next.links.push(LinkInput::new("Revenue", "Profit", 400.0));
    let graph = process(&next);
    let layout = layout_sankey(&graph, &store.layout_settings()).unwrap();
    let summary = renderer.render_chart(&mut surface, &layout, &graph);

    assert!(surface.get("node:Net Income").is_none());
    assert!(surface.get("node:Profit").is_some());
    assert!(summary.exited >= 3);
    let t = surface.transitions();
    let kind_of = |key: &str| t.iter().find(|t| t.key == key).map(|t| t.kind);
    assert_eq!(kind_of("node:Net Income"), Some(TransitionKind::Exit));
    assert_eq!(kind_of("node:Profit"), Some(TransitionKind::Enter));
    assert!(t.iter().all(|t| t.duration_ms == 800 || t.kind == TransitionKind::Recolor));
}

#[test]
fn color_changes_use_the_short_transition() {
    let mut store = ConfigStore::default();
    let graph = process(&dataset());
    let layout = layout_sankey(&graph, &store.layout_settings()).unwrap();
    let mut renderer = Renderer::new(store.style_settings());
    let mut surface = SvgSurface::new(1.0, 1.0);
    renderer.render_chart(&mut surface, &layout, &graph);
    surface.take_transitions();
    let geometry_before = surface.get(&node_key("Revenue")).unwrap().shape.clone();

    store.set("colors.revenue", json!("#000000")).unwrap();
    renderer.set_style(store.style_settings());
    let summary = renderer.render_colors(&mut surface, &layout, &graph);

    assert!(summary.recolored >= 1);
    assert_eq!(summary.entered + summary.exited, 0);
    let node = surface.get(&node_key("Revenue")).unwrap();
    assert_eq!(node.style.fill.as_deref(), Some("#000000"));
    assert_eq!(node.shape, geometry_before);
    assert!(
        surface
            .transitions()
            .iter()
            .filter(|t| t.kind == TransitionKind::Recolor)
            .all(|t| t.duration_ms == COLOR_TRANSITION_MS)
    );
}

#[test]
fn link_only_render_leaves_nodes_untouched() {
    let mut store = ConfigStore::default();
    let graph = process(&dataset());
    let mut layout = layout_sankey(&graph, &store.layout_settings()).unwrap();
    let renderer = Renderer::new(store.style_settings());
    let mut surface = SvgSurface::new(1.0, 1.0);
    renderer.render_chart(&mut surface, &layout, &graph);
    surface.take_transitions();

    store.set("curveIntensity", json!(0.2)).unwrap();
    compute_link_paths(&mut layout, &store.curvature_settings());
    let summary = renderer.render_links(&mut surface, &layout, &graph);

    assert_eq!(summary.updated, 2);
    assert!(
        surface
            .transitions()
            .iter()
            .all(|t| surface.get(&t.key).is_some_and(|e| e.group == Group::Links))
    );
}

#[test]
fn bar_variant_replaces_links_with_bars() {
    let store = ConfigStore::new(ChartKind::Bar);
    let graph = process(&dataset());
    let renderer = Renderer::new(store.style_settings());
    let mut surface = SvgSurface::new(1.0, 1.0);

    let sankey = layout_sankey(&graph, &store.layout_settings()).unwrap();
    renderer.render_chart(&mut surface, &sankey, &graph);
    let bars = layout_bars(&graph, &store.layout_settings()).unwrap();
    renderer.render_bars(&mut surface, &bars, &graph);

    assert!(surface.keys_in(Group::Links).is_empty());
    assert!(surface.get("bar:Revenue").is_some());
    assert!(surface.get("node:Revenue").is_none());
    assert!(surface.get("value:Revenue").is_some());
}
