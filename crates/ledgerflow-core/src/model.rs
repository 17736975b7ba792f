//! Caller-facing dataset shapes.
//!
//! These types mirror the JSON documents handed to the chart. Required fields are optional here so
//! the data processor can report a structural error instead of a serde error.

use crate::statement::IncomeStatement;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub depth: Option<f64>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_order: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_order: Option<f64>,
    /// Explicit grouping parent; inferred from inbound links when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Upstream-supplied margin; never overwritten by the metrics pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_percentage: Option<f64>,
}

impl NodeInput {
    pub fn new(id: &str, depth: usize, value: f64, category: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            depth: Some(depth as f64),
            value: Some(value),
            category: Some(category.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkInput {
    pub source: String,
    pub target: String,
    pub value: f64,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl LinkInput {
    pub fn new(source: &str, target: &str, value: f64) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            value,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementType {
    #[serde(alias = "income_statement", alias = "incomeStatement")]
    Income,
    #[serde(alias = "balance", alias = "balanceSheet")]
    BalanceSheet,
}

impl StatementType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::BalanceSheet => "balance_sheet",
        }
    }
}

/// Unit scale of every value in the dataset. Carried as metadata, never inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Units,
    Thousands,
    Millions,
    Billions,
}

impl Unit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Units => "units",
            Self::Thousands => "thousands",
            Self::Millions => "millions",
            Self::Billions => "billions",
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Units => "",
            Self::Thousands => "K",
            Self::Millions => "M",
            Self::Billions => "B",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_type: Option<StatementType>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub nodes: Vec<NodeInput>,
    #[serde(default)]
    pub links: Vec<LinkInput>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Dataset {
    pub fn new(nodes: Vec<NodeInput>, links: Vec<LinkInput>) -> Self {
        Self {
            nodes,
            links,
            metadata: Metadata::default(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Accepts either a `{nodes, links, metadata}` document or an income-statement document.
    pub fn from_value(value: Value) -> Result<Self> {
        let Some(map) = value.as_object() else {
            return Err(Error::structural("dataset must be a JSON object"));
        };
        if map.contains_key("nodes") {
            return Ok(serde_json::from_value(value)?);
        }
        if map.contains_key("revenue") {
            let statement: IncomeStatement = serde_json::from_value(value)?;
            return Ok(statement.to_dataset());
        }
        Err(Error::structural(
            "expected a `{nodes, links}` dataset or an income statement with `revenue`",
        ))
    }
}
