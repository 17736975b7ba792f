//! Income-statement documents converted into flow datasets.

use crate::model::{Dataset, LinkInput, Metadata, NodeInput, StatementType, Unit};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub revenue: f64,
    #[serde(default)]
    pub cost_of_goods_sold: f64,
    #[serde(default)]
    pub operating_expenses: f64,
    /// Taxes, interest and other below-the-line items. Derived from `net_income` when absent.
    #[serde(default)]
    pub other_expenses: Option<f64>,
    pub net_income: f64,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub unit: Unit,
}

impl IncomeStatement {
    /// Builds a four-layer flow: revenue, gross split, operating split, net split.
    pub fn to_dataset(&self) -> Dataset {
        let gross_profit = (self.revenue - self.cost_of_goods_sold).max(0.0);
        let operating_income = (gross_profit - self.operating_expenses).max(0.0);
        let other = self
            .other_expenses
            .unwrap_or(operating_income - self.net_income)
            .max(0.0);
        let net_income = self.net_income.max(0.0);

        let mut nodes = vec![NodeInput::new("Revenue", 0, self.revenue, "revenue")];
        let mut links = Vec::new();

        let mut push_split = |nodes: &mut Vec<NodeInput>,
                              from: &str,
                              depth: usize,
                              parts: [(&str, f64, &str); 2]| {
            for (id, value, category) in parts {
                if value <= 0.0 {
                    continue;
                }
                nodes.push(NodeInput::new(id, depth, value, category));
                links.push(LinkInput::new(from, id, value));
            }
        };

        push_split(
            &mut nodes,
            "Revenue",
            1,
            [
                ("Cost of Goods Sold", self.cost_of_goods_sold, "expense"),
                ("Gross Profit", gross_profit, "profit"),
            ],
        );
        push_split(
            &mut nodes,
            "Gross Profit",
            2,
            [
                ("Operating Expenses", self.operating_expenses, "expense"),
                ("Operating Income", operating_income, "profit"),
            ],
        );
        push_split(
            &mut nodes,
            "Operating Income",
            3,
            [
                ("Taxes & Other", other, "expense"),
                ("Net Income", net_income, "profit"),
            ],
        );

        Dataset {
            nodes,
            links,
            metadata: Metadata {
                title: self
                    .company
                    .as_ref()
                    .map(|c| format!("{c} Income Statement")),
                company: self.company.clone(),
                period: self.period.clone(),
                unit: self.unit,
                statement_type: Some(StatementType::Income),
                ..Metadata::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dataset;
    use serde_json::json;

    #[test]
    fn income_statement_generates_layered_flows() {
        let ds = Dataset::from_value(json!({
            "revenue": 1000,
            "cost_of_goods_sold": 400,
            "operating_expenses": 300,
            "net_income": 220,
            "company": "Acme",
            "unit": "millions"
        }))
        .unwrap();

        let ids = ds
            .nodes
            .iter()
            .filter_map(|n| n.id.as_deref())
            .collect::<Vec<_>>();
        assert_eq!(
            ids,
            vec![
                "Revenue",
                "Cost of Goods Sold",
                "Gross Profit",
                "Operating Expenses",
                "Operating Income",
                "Taxes & Other",
                "Net Income",
            ]
        );
        assert_eq!(ds.links.len(), 6);
        let taxes = ds
            .nodes
            .iter()
            .find(|n| n.id.as_deref() == Some("Taxes & Other"))
            .unwrap();
        assert_eq!(taxes.value, Some(80.0));
        assert_eq!(taxes.depth, Some(3.0));
        assert_eq!(ds.metadata.unit, Unit::Millions);
        assert_eq!(ds.metadata.statement_type, Some(StatementType::Income));
    }

    #[test]
    fn zero_items_are_skipped() {
        let ds = IncomeStatement {
            revenue: 500.0,
            net_income: 500.0,
            ..IncomeStatement::default()
        }
        .to_dataset();
        assert!(ds.nodes.iter().all(|n| n.value.unwrap_or_default() > 0.0));
        assert_eq!(ds.links.len(), 3);
    }
}
