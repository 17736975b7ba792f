use crate::graph::ProcessedGraph;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::OnceLock;

pub const PARENT_OPACITY: f64 = 1.0;
pub const CHILD_OPACITY: f64 = 0.65;

/// Canonical balance-sheet aggregation groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParentGroup {
    TotalAssets,
    CurrentAssets,
    NonCurrentAssets,
    CurrentLiabilities,
    NonCurrentLiabilities,
    ShareholdersEquity,
}

impl ParentGroup {
    pub fn color(self) -> &'static str {
        match self {
            Self::TotalAssets => "#1f4e79",
            Self::CurrentAssets => "#2e86c1",
            Self::NonCurrentAssets => "#5dade2",
            Self::CurrentLiabilities => "#c0392b",
            Self::NonCurrentLiabilities => "#e74c3c",
            Self::ShareholdersEquity => "#8e44ad",
        }
    }

    /// Matches a node name against the group patterns, most specific first.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = normalize(name);
        let candidate = normalized.strip_prefix("total ").unwrap_or(&normalized);
        matchers()
            .iter()
            .find(|(_, re)| re.is_match(candidate))
            .map(|(group, _)| *group)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorAssignment {
    pub group: ParentGroup,
    pub color: String,
    pub opacity: f64,
    pub is_parent: bool,
}

fn matchers() -> &'static [(ParentGroup, Regex)] {
    static RE: OnceLock<Vec<(ParentGroup, Regex)>> = OnceLock::new();
    RE.get_or_init(|| {
        [
            (
                ParentGroup::NonCurrentAssets,
                r"^(non ?current|long term|fixed) assets?$|^nca$",
            ),
            (ParentGroup::CurrentAssets, r"^current assets?$|^ca$"),
            (ParentGroup::TotalAssets, r"^assets?$|^ta$"),
            (
                ParentGroup::NonCurrentLiabilities,
                r"^(non ?current|long term) liabilit(y|ies)$|^ncl$",
            ),
            (
                ParentGroup::CurrentLiabilities,
                r"^current liabilit(y|ies)$|^cl$",
            ),
            (
                ParentGroup::ShareholdersEquity,
                r"^((share|stock) ?holders? |owners? )?equity$|^se$",
            ),
        ]
        .into_iter()
        .map(|(group, pat)| (group, Regex::new(pat).expect("valid regex")))
        .collect()
    })
}

fn normalize(name: &str) -> String {
    let lowered = name
        .to_ascii_lowercase()
        .replace(['-', '_'], " ")
        .replace(['\'', '\u{2019}'], "");
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Marks group parents and gives every other connected node its nearest parent's color.
pub fn assign_color_groups(graph: &mut ProcessedGraph) {
    let parents: Vec<Option<ParentGroup>> = graph
        .nodes
        .iter()
        .map(|n| ParentGroup::from_name(&n.id))
        .collect();

    let assignments: Vec<Option<ColorAssignment>> = (0..graph.nodes.len())
        .map(|i| match parents[i] {
            Some(group) => Some(ColorAssignment {
                group,
                color: group.color().to_string(),
                opacity: PARENT_OPACITY,
                is_parent: true,
            }),
            None => nearest_parent(graph, &parents, i).map(|group| ColorAssignment {
                group,
                color: group.color().to_string(),
                opacity: CHILD_OPACITY,
                is_parent: false,
            }),
        })
        .collect();

    for (node, assignment) in graph.nodes.iter_mut().zip(assignments) {
        node.color_group = assignment;
    }
}

/// Breadth-first walk over links. At each step inbound senders named `total ...` are tried first,
/// then other inbound senders, then outbound targets.
fn nearest_parent(
    graph: &ProcessedGraph,
    parents: &[Option<ParentGroup>],
    start: usize,
) -> Option<ParentGroup> {
    let mut seen = vec![false; graph.nodes.len()];
    let mut queue = VecDeque::from([start]);
    seen[start] = true;

    while let Some(i) = queue.pop_front() {
        let node = &graph.nodes[i];
        let inbound = node
            .target_links
            .iter()
            .map(|&li| graph.links[li].source)
            .collect::<Vec<_>>();
        let (totals, rest): (Vec<usize>, Vec<usize>) = inbound
            .into_iter()
            .partition(|&s| graph.nodes[s].id.to_ascii_lowercase().starts_with("total"));
        let outbound = node.source_links.iter().map(|&li| graph.links[li].target);

        for next in totals.into_iter().chain(rest).chain(outbound) {
            if seen[next] {
                continue;
            }
            if let Some(group) = parents[next] {
                return Some(group);
            }
            seen[next] = true;
            queue.push_back(next);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::annotate;
    use crate::model::{Dataset, LinkInput, NodeInput, StatementType};
    use crate::process::DataProcessor;

    #[test]
    fn group_names_match_loosely() {
        assert_eq!(ParentGroup::from_name("Total Assets"), Some(ParentGroup::TotalAssets));
        assert_eq!(
            ParentGroup::from_name("Non-Current Assets"),
            Some(ParentGroup::NonCurrentAssets)
        );
        assert_eq!(
            ParentGroup::from_name("current_assets"),
            Some(ParentGroup::CurrentAssets)
        );
        assert_eq!(
            ParentGroup::from_name("Total Current Liabilities"),
            Some(ParentGroup::CurrentLiabilities)
        );
        assert_eq!(
            ParentGroup::from_name("Shareholders' Equity"),
            Some(ParentGroup::ShareholdersEquity)
        );
        assert_eq!(ParentGroup::from_name("NCL"), Some(ParentGroup::NonCurrentLiabilities));
        assert_eq!(ParentGroup::from_name("Cash"), None);
        assert_eq!(ParentGroup::from_name("Asset Light Revenue"), None);
    }

    #[test]
    fn children_inherit_nearest_parent_color() {
        let ds = Dataset::new(
            vec![
                NodeInput::new("Total Assets", 0, 1000.0, "asset"),
                NodeInput::new("Current Assets", 1, 400.0, "asset"),
                NodeInput::new("Non-Current Assets", 1, 600.0, "asset"),
                NodeInput::new("Cash", 2, 150.0, "asset"),
                NodeInput::new("Receivables", 2, 250.0, "asset"),
                NodeInput::new("Property", 2, 600.0, "asset"),
            ],
            vec![
                LinkInput::new("Total Assets", "Current Assets", 400.0),
                LinkInput::new("Total Assets", "Non-Current Assets", 600.0),
                LinkInput::new("Current Assets", "Cash", 150.0),
                LinkInput::new("Current Assets", "Receivables", 250.0),
                LinkInput::new("Non-Current Assets", "Property", 600.0),
            ],
        );
        let mut g = DataProcessor::default().process(&ds).unwrap();
        annotate(&mut g);
        assert_eq!(g.statement_type, StatementType::BalanceSheet);

        let parent = g.node("Current Assets").unwrap().color_group.clone().unwrap();
        assert!(parent.is_parent);
        assert_eq!(parent.opacity, PARENT_OPACITY);

        let cash = g.node("Cash").unwrap().color_group.clone().unwrap();
        assert_eq!(cash.group, ParentGroup::CurrentAssets);
        assert_eq!(cash.color, parent.color);
        assert_eq!(cash.opacity, CHILD_OPACITY);
        assert!(!cash.is_parent);

        let property = g.node("Property").unwrap().color_group.clone().unwrap();
        assert_eq!(property.group, ParentGroup::NonCurrentAssets);
    }

    #[test]
    fn total_prefixed_senders_take_priority() {
        let ds = Dataset::new(
            vec![
                NodeInput::new("Total Current Liabilities", 0, 100.0, "liability"),
                NodeInput::new("Equity", 0, 50.0, "equity"),
                NodeInput::new("Accrued Items", 1, 150.0, "liability"),
            ],
            vec![
                LinkInput::new("Equity", "Accrued Items", 50.0),
                LinkInput::new("Total Current Liabilities", "Accrued Items", 100.0),
            ],
        );
        let mut g = DataProcessor::default().process(&ds).unwrap();
        annotate(&mut g);
        let accrued = g.node("Accrued Items").unwrap().color_group.clone().unwrap();
        assert_eq!(accrued.group, ParentGroup::CurrentLiabilities);
    }

    #[test]
    fn disconnected_nodes_get_no_group() {
        let mut ds = Dataset::new(
            vec![
                NodeInput::new("Total Assets", 0, 10.0, "asset"),
                NodeInput::new("Memo", 0, 5.0, "other"),
            ],
            vec![],
        );
        ds.metadata.statement_type = Some(StatementType::BalanceSheet);
        let mut g = DataProcessor::default().process(&ds).unwrap();
        annotate(&mut g);
        assert!(g.node("Memo").unwrap().color_group.is_none());
        assert!(g.node("Total Assets").unwrap().color_group.is_some());
    }
}
