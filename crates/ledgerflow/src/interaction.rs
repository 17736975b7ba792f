//! Hover, tooltip, selection and context-action behavior over a rendered chart.
//!
//! Nothing here touches layout. Highlighting only changes element opacity on the surface and is
//! undone by [`InteractionLayer::clear_hover`].

use indexmap::{IndexMap, IndexSet};
use ledgerflow_core::config::LabelSettings;
use ledgerflow_core::finance::MarginType;
use ledgerflow_core::ProcessedGraph;
use ledgerflow_render::format::{format_percent, format_value};
use ledgerflow_render::renderer::node_key;
use ledgerflow_render::{DrawingSurface, Group, SankeyLayout, Transition, TransitionKind};
use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};

/// Opacity multiplier for elements outside the highlighted subgraph.
pub const DIM_FACTOR: f64 = 0.2;
pub const HOVER_TRANSITION_MS: u64 = 150;

/// Node and link indices reachable from a starting point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connected {
    pub nodes: BTreeSet<usize>,
    pub links: BTreeSet<usize>,
}

impl Connected {
    fn walk(&mut self, graph: &ProcessedGraph, start: usize, downstream: bool) {
        let mut queue = VecDeque::from([start]);
        self.nodes.insert(start);
        while let Some(i) = queue.pop_front() {
            let node = &graph.nodes[i];
            let edges = if downstream {
                &node.source_links
            } else {
                &node.target_links
            };
            for &li in edges {
                self.links.insert(li);
                let link = &graph.links[li];
                let next = if downstream { link.target } else { link.source };
                if self.nodes.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }
}

/// Everything upstream and downstream of `node`.
pub fn connected_subgraph(graph: &ProcessedGraph, node: usize) -> Connected {
    let mut c = Connected::default();
    if node < graph.nodes.len() {
        c.walk(graph, node, false);
        c.walk(graph, node, true);
    }
    c
}

/// The link itself, everything feeding its source and everything fed by its target.
pub fn link_subgraph(graph: &ProcessedGraph, link: usize) -> Connected {
    let mut c = Connected::default();
    let Some(l) = graph.links.get(link) else {
        return c;
    };
    c.links.insert(link);
    c.walk(graph, l.source, false);
    c.walk(graph, l.target, true);
    c
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tooltip {
    pub title: String,
    pub lines: Vec<String>,
}

pub fn node_tooltip(graph: &ProcessedGraph, index: usize, labels: &LabelSettings) -> Option<Tooltip> {
    let node = graph.nodes.get(index)?;
    let money = |v: f64| format_value(v, graph.metadata.unit, &labels.prefix, &labels.suffix);

    let mut lines = vec![format!("Value: {}", money(node.value))];
    if graph.hub_value().is_some() {
        let m = &node.metrics;
        lines.push(format!(
            "{} of Revenue",
            format_percent(m.percentage_of_revenue)
        ));
        if m.margin_type != MarginType::PercentOfRevenue {
            if let Some(margin) = m.margin_percentage {
                lines.push(format!("{}: {}", m.margin_type.label(), format_percent(margin)));
            }
        }
    }
    if !node.target_links.is_empty() {
        lines.push(format!("Inflow: {}", money(node.inflow)));
    }
    if !node.source_links.is_empty() {
        lines.push(format!("Outflow: {}", money(node.outflow)));
    }
    lines.push(format!("Category: {}", node.category));
    if let Some(desc) = node.description.as_deref().filter(|d| !d.trim().is_empty()) {
        lines.push(desc.to_string());
    }
    Some(Tooltip {
        title: node.id.clone(),
        lines,
    })
}

/// Value plus the link's share of its source's outflow and its target's inflow.
pub fn link_tooltip(graph: &ProcessedGraph, index: usize, labels: &LabelSettings) -> Option<Tooltip> {
    let link = graph.links.get(index)?;
    let (source, target) = (&graph.nodes[link.source], &graph.nodes[link.target]);
    let share = |part: f64, whole: f64| {
        format_percent(if whole > 0.0 { part / whole * 100.0 } else { 0.0 })
    };
    Some(Tooltip {
        title: format!("{} → {}", source.id, target.id),
        lines: vec![
            format!(
                "Value: {}",
                format_value(link.value, graph.metadata.unit, &labels.prefix, &labels.suffix)
            ),
            format!("{} of {} outflow", share(link.value, source.outflow), source.id),
            format!("{} of {} inflow", share(link.value, target.inflow), target.id),
        ],
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ContextAction {
    HighlightFlow,
    Recolor,
    EditLabel,
    ResetPosition,
    CopyValue,
}

impl ContextAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::HighlightFlow => "Highlight connected flows",
            Self::Recolor => "Change color",
            Self::EditLabel => "Edit label",
            Self::ResetPosition => "Reset position",
            Self::CopyValue => "Copy value",
        }
    }
}

/// Actions offered for a node. `moved` adds the reset entry for dragged nodes.
pub fn context_actions(graph: &ProcessedGraph, index: usize, moved: bool) -> Vec<ContextAction> {
    let Some(node) = graph.nodes.get(index) else {
        return Vec::new();
    };
    let mut actions = Vec::with_capacity(5);
    if !node.source_links.is_empty() || !node.target_links.is_empty() {
        actions.push(ContextAction::HighlightFlow);
    }
    actions.extend([ContextAction::Recolor, ContextAction::EditLabel]);
    if moved {
        actions.push(ContextAction::ResetPosition);
    }
    actions.push(ContextAction::CopyValue);
    actions
}

/// Hover and selection state for one chart.
#[derive(Debug, Clone, Default)]
pub struct InteractionLayer {
    hovered: Option<String>,
    /// Element key to its opacity before dimming.
    dimmed: IndexMap<String, Option<f64>>,
    selected: IndexSet<String>,
}

impl InteractionLayer {
    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn is_dimmed(&self, key: &str) -> bool {
        self.dimmed.contains_key(key)
    }

    /// Dims every node and link outside `connected`; previously dimmed members are restored.
    pub fn highlight(
        &mut self,
        surface: &mut dyn DrawingSurface,
        graph: &ProcessedGraph,
        layout: &SankeyLayout,
        hovered: String,
        connected: &Connected,
    ) {
        let mut keep: IndexSet<String> = connected
            .nodes
            .iter()
            .map(|&i| node_key(&graph.nodes[i].id))
            .collect();
        keep.extend(
            layout
                .links
                .iter()
                .filter(|l| connected.links.contains(&l.index))
                .map(|l| l.key.clone()),
        );

        for key in surface
            .keys_in(Group::Nodes)
            .into_iter()
            .chain(surface.keys_in(Group::Links))
        {
            if keep.contains(&key) {
                self.restore(surface, &key);
            } else if !self.dimmed.contains_key(&key) {
                let Some(mut el) = surface.get(&key).cloned() else {
                    continue;
                };
                self.dimmed.insert(key.clone(), el.style.opacity);
                el.style.opacity = Some(el.style.opacity.unwrap_or(1.0) * DIM_FACTOR);
                surface.put(el);
                surface.animate(hover_transition(key));
            }
        }
        self.hovered = Some(hovered);
    }

    pub fn clear_hover(&mut self, surface: &mut dyn DrawingSurface) {
        let keys = self.dimmed.keys().cloned().collect::<Vec<_>>();
        for key in keys {
            self.restore(surface, &key);
        }
        self.hovered = None;
    }

    fn restore(&mut self, surface: &mut dyn DrawingSurface, key: &str) {
        let Some(original) = self.dimmed.shift_remove(key) else {
            return;
        };
        let Some(mut el) = surface.get(key).cloned() else {
            return;
        };
        el.style.opacity = original;
        surface.put(el);
        surface.animate(hover_transition(key.to_string()));
    }

    /// Flips selection of `id`; returns whether it is selected afterwards.
    pub fn toggle_selection(&mut self, id: &str) -> bool {
        if self.selected.shift_remove(id) {
            false
        } else {
            self.selected.insert(id.to_string());
            true
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn selected(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Drops selections whose node no longer exists.
    pub fn retain_existing(&mut self, graph: &ProcessedGraph) {
        self.selected.retain(|id| graph.node(id).is_some());
    }
}

fn hover_transition(key: String) -> Transition {
    Transition {
        key,
        kind: TransitionKind::Recolor,
        duration_ms: HOVER_TRANSITION_MS,
    }
}
