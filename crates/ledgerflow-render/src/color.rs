//! Fill resolution for nodes and links.

use ledgerflow_core::config::StyleSettings;
use ledgerflow_core::{CategoryKind, FlowLink, FlowNode, ProcessedGraph};

pub const SCHEME_TABLEAU10: [&str; 10] = [
    "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
    "#9c755f", "#bab0ab",
];

/// Resolved paint for one element.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub color: String,
    pub opacity: f64,
}

/// Explicit node color, then balance-sheet group, then the configured category color, then the
/// categorical palette.
pub fn node_fill(node: &FlowNode, style: &StyleSettings) -> Fill {
    if let Some(color) = node.color.as_deref().filter(|c| !c.trim().is_empty()) {
        return Fill {
            color: color.to_string(),
            opacity: style.node_opacity,
        };
    }
    if let Some(group) = &node.color_group {
        return Fill {
            color: group.color.clone(),
            opacity: style.node_opacity * group.opacity,
        };
    }
    let color = style
        .colors
        .get(node.kind.as_str())
        .cloned()
        .unwrap_or_else(|| SCHEME_TABLEAU10[node.index % SCHEME_TABLEAU10.len()].to_string());
    Fill {
        color,
        opacity: style.node_opacity,
    }
}

/// Links take their explicit color, the expense color when flowing into an expense, or the
/// source node's color.
pub fn link_fill(link: &FlowLink, graph: &ProcessedGraph, style: &StyleSettings) -> Fill {
    let color = match link.color.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(c) => c.to_string(),
        None => {
            let target = &graph.nodes[link.target];
            let from = if target.kind == CategoryKind::Expense {
                target
            } else {
                &graph.nodes[link.source]
            };
            node_fill(from, style).color
        }
    };
    Fill {
        color,
        opacity: style.link_opacity,
    }
}
