//! Financial annotations: statement detection, revenue hub, margins and balance-sheet groups.

mod balance;

pub use balance::{
    CHILD_OPACITY, ColorAssignment, PARENT_OPACITY, ParentGroup, assign_color_groups,
};

use crate::graph::{CategoryKind, ProcessedGraph};
use crate::model::StatementType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarginType {
    GrossMargin,
    OperatingMargin,
    NetMargin,
    PercentOfRevenue,
}

impl MarginType {
    pub fn label(self) -> &'static str {
        match self {
            Self::GrossMargin => "Gross Margin",
            Self::OperatingMargin => "Operating Margin",
            Self::NetMargin => "Net Margin",
            Self::PercentOfRevenue => "% of Revenue",
        }
    }

    /// Margin type for a profit node, picked from keywords in its id.
    pub fn for_profit(id: &str) -> Self {
        let id = id.to_ascii_lowercase();
        if id.contains("gross") {
            Self::GrossMargin
        } else if id.contains("operating") || id.contains("ebit") {
            Self::OperatingMargin
        } else if id.contains("net") {
            Self::NetMargin
        } else {
            Self::PercentOfRevenue
        }
    }
}

/// Which detection rule selected the revenue hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HubRule {
    /// Id names the hub explicitly (`total revenue`, `net revenue`, ...).
    Named,
    /// Revenue node collecting the most inbound flows.
    MostInflows,
    /// Revenue node nearest the middle layer.
    NearestMiddle,
    /// No revenue node; the hub layer defaults to 1.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueHub {
    pub node: Option<usize>,
    pub id: Option<String>,
    pub layer: usize,
    pub value: f64,
    pub rule: HubRule,
}

const DEFAULT_HUB_LAYER: usize = 1;
const BALANCE_SHEET_VOCABULARY: [&str; 3] = ["asset", "liabilit", "equity"];

/// Runs every financial pass in order and stores the results on `graph`.
pub fn annotate(graph: &mut ProcessedGraph) {
    graph.statement_type = detect_statement_type(graph);
    let hub = detect_revenue_hub(graph);
    tracing::debug!(
        statement = ?graph.statement_type,
        hub = hub.id.as_deref().unwrap_or("<none>"),
        layer = hub.layer,
        rule = ?hub.rule,
        "financial annotations"
    );
    graph.revenue_hub = Some(hub);
    apply_margins(graph);
    if graph.statement_type == StatementType::BalanceSheet {
        assign_color_groups(graph);
    }
}

/// An explicit `metadata.statementType` wins; otherwise balance-sheet vocabulary decides.
pub fn detect_statement_type(graph: &ProcessedGraph) -> StatementType {
    if let Some(explicit) = graph.metadata.statement_type {
        return explicit;
    }
    if graph
        .nodes
        .iter()
        .any(|n| ParentGroup::from_name(&n.id).is_some())
    {
        return StatementType::BalanceSheet;
    }
    let hits = graph
        .nodes
        .iter()
        .filter(|n| {
            let id = n.id.to_ascii_lowercase();
            BALANCE_SHEET_VOCABULARY.iter().any(|w| id.contains(w))
        })
        .count();
    if hits >= 2 {
        StatementType::BalanceSheet
    } else {
        StatementType::Income
    }
}

pub fn detect_revenue_hub(graph: &ProcessedGraph) -> RevenueHub {
    let hub = |i: usize, rule: HubRule| {
        let n = &graph.nodes[i];
        RevenueHub {
            node: Some(i),
            id: Some(n.id.clone()),
            layer: n.depth,
            value: n.value,
            rule,
        }
    };

    let named = graph.nodes.iter().find(|n| {
        let id = n.id.to_ascii_lowercase();
        ["total revenue", "revenue hub", "net revenue"]
            .iter()
            .any(|k| id.contains(k))
            || (id.trim() == "revenue" && n.target_links.len() > 3)
    });
    if let Some(n) = named {
        return hub(n.index, HubRule::Named);
    }

    let revenue = || graph.nodes.iter().filter(|n| n.kind == CategoryKind::Revenue);

    let most_inflows = revenue()
        .filter(|n| !n.target_links.is_empty())
        .max_by(|a, b| {
            a.target_links
                .len()
                .cmp(&b.target_links.len())
                .then_with(|| a.value.total_cmp(&b.value))
                .then_with(|| b.index.cmp(&a.index))
        });
    if let Some(n) = most_inflows {
        return hub(n.index, HubRule::MostInflows);
    }

    let middle = graph.max_depth().unwrap_or(0) as f64 / 2.0;
    let nearest = revenue().min_by(|a, b| {
        let da = (a.depth as f64 - middle).abs();
        let db = (b.depth as f64 - middle).abs();
        da.total_cmp(&db)
            .then_with(|| b.value.total_cmp(&a.value))
            .then_with(|| a.index.cmp(&b.index))
    });
    if let Some(n) = nearest {
        return hub(n.index, HubRule::NearestMiddle);
    }

    RevenueHub {
        node: None,
        id: None,
        layer: DEFAULT_HUB_LAYER,
        value: 0.0,
        rule: HubRule::Fallback,
    }
}

/// Sets revenue share and margin type on every node. Upstream margins are preserved.
pub fn apply_margins(graph: &mut ProcessedGraph) {
    let hub_value = graph.hub_value();
    for node in &mut graph.nodes {
        let pct = hub_value.map(|h| node.value / h * 100.0).unwrap_or(0.0);
        node.metrics.percentage_of_revenue = pct;
        node.metrics.margin_type = if node.kind == CategoryKind::Profit {
            MarginType::for_profit(&node.id)
        } else {
            MarginType::PercentOfRevenue
        };
        node.metrics.is_expense_type = node.kind.is_expense_like();
        if node.metrics.margin_percentage.is_none() {
            node.metrics.margin_percentage = Some(pct);
        }
    }
}
