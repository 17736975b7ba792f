//! Validation and normalization of raw datasets.

use crate::config::LabelSettings;
use crate::finance;
use crate::graph::{CategoryKind, FlowLink, FlowNode, FlowRole, FlowWarning, ProcessedGraph};
use crate::model::{Dataset, StatementType};
use crate::text::{DeterministicTextMeasurer, TextMeasurer, TextStyle, wrap_text_lines};
use crate::{Error, Result};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::sync::Arc;

/// Relative tolerance for flow-conservation checks.
pub const BALANCE_TOLERANCE_RATIO: f64 = 0.01;
/// Absolute tolerance floor for flow-conservation checks.
pub const BALANCE_TOLERANCE_FLOOR: f64 = 0.1;
/// Largest accepted node depth. Layers are allocated densely up to the deepest node.
pub const MAX_DEPTH: usize = 256;

pub fn balance_tolerance(value: f64) -> f64 {
    BALANCE_TOLERANCE_FLOOR.max(value * BALANCE_TOLERANCE_RATIO)
}

#[derive(Clone)]
pub struct DataProcessor {
    measurer: Arc<dyn TextMeasurer + Send + Sync>,
    label_style: TextStyle,
    max_label_width: Option<f64>,
}

impl std::fmt::Debug for DataProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataProcessor")
            .field("label_style", &self.label_style)
            .field("max_label_width", &self.max_label_width)
            .finish_non_exhaustive()
    }
}

impl Default for DataProcessor {
    fn default() -> Self {
        Self {
            measurer: Arc::new(DeterministicTextMeasurer::default()),
            label_style: TextStyle::default(),
            max_label_width: None,
        }
    }
}

impl DataProcessor {
    pub fn new(labels: &LabelSettings) -> Self {
        Self {
            label_style: TextStyle::sized(labels.font_size),
            max_label_width: Some(labels.max_label_width),
            ..Self::default()
        }
    }

    pub fn with_measurer(mut self, measurer: Arc<dyn TextMeasurer + Send + Sync>) -> Self {
        self.measurer = measurer;
        self
    }

    /// Validates and normalizes `data` into an owned graph. The input is never modified.
    pub fn process(&self, data: &Dataset) -> Result<ProcessedGraph> {
        let mut nodes = Vec::with_capacity(data.nodes.len());
        let mut index_by_id: FxHashMap<String, usize> = FxHashMap::default();

        for (i, raw) in data.nodes.iter().enumerate() {
            let id = raw
                .id
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| Error::structural(format!("node #{i} is missing `id`")))?
                .to_string();
            let value = raw
                .value
                .ok_or_else(|| Error::structural(format!("node `{id}` is missing `value`")))?;
            if !value.is_finite() || value < 0.0 {
                return Err(Error::structural(format!(
                    "node `{id}` has invalid value {value}"
                )));
            }
            let depth = raw
                .depth
                .ok_or_else(|| Error::structural(format!("node `{id}` is missing `depth`")))?;
            if !depth.is_finite() || depth < 0.0 || depth.fract() != 0.0 {
                return Err(Error::structural(format!(
                    "node `{id}` has invalid depth {depth}"
                )));
            }
            if depth > MAX_DEPTH as f64 {
                return Err(Error::structural(format!(
                    "node `{id}` has depth {depth}, deeper than {MAX_DEPTH}"
                )));
            }
            if index_by_id.insert(id.clone(), i).is_some() {
                return Err(Error::structural(format!("duplicate node id `{id}`")));
            }

            let category = raw
                .category
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_ascii_lowercase)
                .unwrap_or_else(|| CategoryKind::classify(&id).as_str().to_string());
            let kind = CategoryKind::classify(&category);
            let label_lines = wrap_text_lines(
                &id,
                self.measurer.as_ref(),
                &self.label_style,
                self.max_label_width,
            );

            let mut node = FlowNode {
                id,
                index: i,
                depth: depth as usize,
                value,
                category,
                kind,
                description: raw.description.clone(),
                label_lines,
                order: raw.order,
                parent_order: raw.parent_order,
                custom_order: raw.custom_order,
                parent: raw.parent.clone(),
                color: raw.color.clone(),
                inflow: 0.0,
                outflow: 0.0,
                source_links: Vec::new(),
                target_links: Vec::new(),
                metrics: Default::default(),
                color_group: None,
            };
            node.metrics.margin_percentage = raw.margin_percentage;
            node.metrics.is_expense_type = kind.is_expense_like();
            nodes.push(node);
        }

        let mut links = Vec::with_capacity(data.links.len());
        for (i, raw) in data.links.iter().enumerate() {
            let source = *index_by_id.get(raw.source.trim()).ok_or_else(|| {
                Error::structural(format!(
                    "link #{i} references unknown source `{}`",
                    raw.source
                ))
            })?;
            let target = *index_by_id.get(raw.target.trim()).ok_or_else(|| {
                Error::structural(format!(
                    "link #{i} references unknown target `{}`",
                    raw.target
                ))
            })?;
            if !raw.value.is_finite() || raw.value < 0.0 {
                return Err(Error::structural(format!(
                    "link #{i} ({} -> {}) has invalid value {}",
                    raw.source, raw.target, raw.value
                )));
            }
            if nodes[target].depth <= nodes[source].depth {
                tracing::warn!(
                    source = %nodes[source].id,
                    target = %nodes[target].id,
                    "link does not flow left to right"
                );
            }

            let kind = raw
                .kind
                .clone()
                .unwrap_or_else(|| nodes[source].category.clone());
            links.push(FlowLink {
                index: i,
                source,
                target,
                source_id: nodes[source].id.clone(),
                target_id: nodes[target].id.clone(),
                value: raw.value,
                kind,
                color: raw.color.clone(),
            });
            nodes[source].source_links.push(i);
            nodes[target].target_links.push(i);
            nodes[source].outflow += raw.value;
            nodes[target].inflow += raw.value;
        }

        infer_parents(&mut nodes, &links);
        let layers = order_layers(&nodes);

        let mut graph = ProcessedGraph {
            nodes,
            links,
            layers,
            metadata: data.metadata.clone(),
            warnings: Vec::new(),
            statement_type: data.metadata.statement_type.unwrap_or(StatementType::Income),
            revenue_hub: None,
            index_by_id,
        };

        finance::annotate(&mut graph);
        graph.warnings = validate_flow_balance(&graph);
        for w in &graph.warnings {
            tracing::warn!(
                node = %w.node,
                inflow = w.inflow,
                outflow = w.outflow,
                value = w.value,
                delta = w.delta,
                "flow imbalance beyond tolerance"
            );
        }
        tracing::debug!(
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            layers = graph.layers.len(),
            "dataset processed"
        );
        Ok(graph)
    }
}

/// Lists nodes whose flows disagree with their value beyond `max(0.1, value * 1%)`.
///
/// Source nodes are only checked on their outflow and sink nodes on their inflow; isolated nodes
/// are never reported.
pub fn validate_flow_balance(graph: &ProcessedGraph) -> Vec<FlowWarning> {
    let mut out = Vec::new();
    for node in &graph.nodes {
        let tolerance = balance_tolerance(node.value);
        let role = node.role();
        let delta = match role {
            FlowRole::Isolated => continue,
            FlowRole::Source => node.value - node.outflow,
            FlowRole::Sink => node.value - node.inflow,
            FlowRole::Interior => {
                let d_in = node.value - node.inflow;
                let d_out = node.value - node.outflow;
                if d_in.abs() >= d_out.abs() { d_in } else { d_out }
            }
        };
        if delta.abs() > tolerance {
            out.push(FlowWarning {
                node: node.id.clone(),
                role,
                value: node.value,
                inflow: node.inflow,
                outflow: node.outflow,
                delta,
                tolerance,
            });
        }
    }
    out
}

/// Nodes without an explicit parent take the source of their largest inbound link.
fn infer_parents(nodes: &mut [FlowNode], links: &[FlowLink]) {
    for i in 0..nodes.len() {
        if nodes[i].parent.is_some() {
            continue;
        }
        let parent = nodes[i]
            .target_links
            .iter()
            .map(|&li| &links[li])
            .max_by(|a, b| {
                a.value
                    .total_cmp(&b.value)
                    .then_with(|| b.index.cmp(&a.index))
            })
            .map(|l| l.source_id.clone());
        nodes[i].parent = parent;
    }
}

/// Orders each depth: `customOrder` when every node in the layer has one, otherwise grouped by
/// parent position, then `order` (missing sorts last), then value (expense-like ascending, others
/// descending), then id.
fn order_layers(nodes: &[FlowNode]) -> Vec<Vec<usize>> {
    let layer_count = nodes
        .iter()
        .filter_map(|n| n.depth.checked_add(1))
        .max()
        .unwrap_or(0);
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); layer_count];
    for n in nodes {
        layers[n.depth].push(n.index);
    }

    let by_id: FxHashMap<&str, usize> = nodes.iter().map(|n| (n.id.as_str(), n.index)).collect();
    let mut rank: Vec<Option<usize>> = vec![None; nodes.len()];

    for layer in &mut layers {
        let all_custom = !layer.is_empty() && layer.iter().all(|&i| nodes[i].custom_order.is_some());
        if all_custom {
            layer.sort_by(|&a, &b| {
                let (na, nb) = (&nodes[a], &nodes[b]);
                f64_cmp(na.custom_order, nb.custom_order).then_with(|| na.id.cmp(&nb.id))
            });
        } else {
            let group_key = |i: usize| -> f64 {
                let n = &nodes[i];
                if let Some(p) = n.parent_order {
                    return p;
                }
                n.parent
                    .as_deref()
                    .and_then(|p| by_id.get(p))
                    .and_then(|&pi| rank[pi])
                    .map(|r| r as f64)
                    .unwrap_or(f64::INFINITY)
            };
            let keys = layer.iter().map(|&i| (i, group_key(i))).collect::<FxHashMap<_, _>>();
            layer.sort_by(|&a, &b| {
                let (na, nb) = (&nodes[a], &nodes[b]);
                keys[&a]
                    .total_cmp(&keys[&b])
                    .then_with(|| f64_cmp(na.order, nb.order))
                    .then_with(|| value_key(na).total_cmp(&value_key(nb)))
                    .then_with(|| na.id.cmp(&nb.id))
            });
        }
        for (pos, &i) in layer.iter().enumerate() {
            rank[i] = Some(pos);
        }
    }
    layers
}

fn value_key(n: &FlowNode) -> f64 {
    if n.kind.is_expense_like() {
        n.value
    } else {
        -n.value
    }
}

fn f64_cmp(a: Option<f64>, b: Option<f64>) -> Ordering {
    a.unwrap_or(f64::INFINITY)
        .total_cmp(&b.unwrap_or(f64::INFINITY))
}
