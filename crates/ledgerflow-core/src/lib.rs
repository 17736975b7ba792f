#![forbid(unsafe_code)]

//! Financial flow data model, configuration and processing (headless).
//!
//! Raw datasets go through [`DataProcessor::process`], which validates the structure, orders
//! layers, checks flow conservation and annotates revenue share and balance-sheet groups. The
//! resulting [`ProcessedGraph`] is owned and never aliases the caller's input.

pub mod config;
pub mod error;
pub mod finance;
pub mod graph;
pub mod model;
pub mod process;
pub mod statement;
pub mod text;

pub use config::{ChartKind, ConfigStore, LayoutSettings, StyleSettings};
pub use error::{Error, Result};
pub use graph::{CategoryKind, FlowLink, FlowNode, FlowWarning, ProcessedGraph};
pub use model::{Dataset, LinkInput, Metadata, NodeInput, StatementType, Unit};
pub use process::{DataProcessor, validate_flow_balance};
pub use statement::IncomeStatement;

#[cfg(test)]
mod tests;
