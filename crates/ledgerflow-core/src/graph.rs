//! The owned, annotated graph produced by the data processor.

use crate::finance::{ColorAssignment, MarginType, RevenueHub};
use crate::model::{Metadata, StatementType};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Financial role inferred from a free-form category tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Revenue,
    Expense,
    Profit,
    Asset,
    Liability,
    Equity,
    Other,
}

impl CategoryKind {
    pub fn classify(category: &str) -> Self {
        let c = category.trim().to_ascii_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| c.contains(w));
        if has(&["revenue", "sales", "turnover"]) {
            Self::Revenue
        } else if has(&["expense", "cost", "cogs", "opex", "tax", "loss", "interest"]) {
            Self::Expense
        } else if has(&["profit", "income", "margin", "earning"]) {
            Self::Profit
        } else if has(&["asset"]) {
            Self::Asset
        } else if has(&["liabilit"]) {
            Self::Liability
        } else if has(&["equity"]) {
            Self::Equity
        } else {
            Self::Other
        }
    }

    /// Expense-like layers sort ascending by value; everything else sorts descending.
    pub fn is_expense_like(self) -> bool {
        matches!(self, Self::Expense)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::Expense => "expense",
            Self::Profit => "profit",
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Other => "other",
        }
    }
}

/// Derived values set by the financial metrics pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub percentage_of_revenue: f64,
    pub margin_percentage: Option<f64>,
    pub margin_type: MarginType,
    pub is_expense_type: bool,
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self {
            percentage_of_revenue: 0.0,
            margin_percentage: None,
            margin_type: MarginType::PercentOfRevenue,
            is_expense_type: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: String,
    pub index: usize,
    pub depth: usize,
    pub value: f64,
    pub category: String,
    pub kind: CategoryKind,
    pub description: Option<String>,
    pub label_lines: Vec<String>,
    pub order: Option<f64>,
    pub parent_order: Option<f64>,
    pub custom_order: Option<f64>,
    /// Explicit or inferred grouping parent.
    pub parent: Option<String>,
    pub color: Option<String>,
    pub inflow: f64,
    pub outflow: f64,
    /// Outgoing link indices.
    pub source_links: Vec<usize>,
    /// Incoming link indices.
    pub target_links: Vec<usize>,
    pub metrics: NodeMetrics,
    pub color_group: Option<ColorAssignment>,
}

impl FlowNode {
    pub fn role(&self) -> FlowRole {
        match (self.target_links.is_empty(), self.source_links.is_empty()) {
            (true, true) => FlowRole::Isolated,
            (true, false) => FlowRole::Source,
            (false, true) => FlowRole::Sink,
            (false, false) => FlowRole::Interior,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowLink {
    pub index: usize,
    pub source: usize,
    pub target: usize,
    pub source_id: String,
    pub target_id: String,
    pub value: f64,
    /// Flow classification; defaults to the source node's category.
    pub kind: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowRole {
    Source,
    Sink,
    Interior,
    Isolated,
}

/// A node whose flows disagree with its value beyond tolerance. Never fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowWarning {
    pub node: String,
    pub role: FlowRole,
    pub value: f64,
    pub inflow: f64,
    pub outflow: f64,
    /// `value - observed flow` for the side that disagrees most.
    pub delta: f64,
    pub tolerance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedGraph {
    pub nodes: Vec<FlowNode>,
    pub links: Vec<FlowLink>,
    /// Node indices per depth, in display order.
    pub layers: Vec<Vec<usize>>,
    pub metadata: Metadata,
    pub warnings: Vec<FlowWarning>,
    pub statement_type: StatementType,
    pub revenue_hub: Option<RevenueHub>,
    #[serde(skip)]
    pub(crate) index_by_id: FxHashMap<String, usize>,
}

impl ProcessedGraph {
    /// Rebuilds the id lookup, e.g. after deserializing a graph.
    pub fn reindex(&mut self) {
        self.index_by_id = self
            .nodes
            .iter()
            .map(|n| (n.id.clone(), n.index))
            .collect();
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.node_index(id).map(|i| &self.nodes[i])
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut FlowNode> {
        let i = self.node_index(id)?;
        self.nodes.get_mut(i)
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.nodes.iter().map(|n| n.depth).max()
    }

    /// Position of a node inside its layer.
    pub fn rank_of(&self, index: usize) -> Option<usize> {
        let depth = self.nodes.get(index)?.depth;
        self.layers.get(depth)?.iter().position(|&i| i == index)
    }

    pub fn hub_value(&self) -> Option<f64> {
        self.revenue_hub
            .as_ref()
            .map(|h| h.value)
            .filter(|v| *v > 0.0)
    }
}
