#![forbid(unsafe_code)]

//! `ledgerflow` renders financial statements as Sankey flow charts, headless.
//!
//! [`ChartController`] owns one chart: it processes a [`Dataset`], lays it out, renders it onto a
//! retained SVG surface and keeps it up to date as configuration changes, picking the cheapest
//! update that covers what changed.
//!
//! # Features
//!
//! - `raster`: enable PNG export via pure-Rust SVG rasterization

pub mod coalesce;
pub mod controller;
pub mod error;
pub mod events;
pub mod export;
pub mod interaction;

pub use coalesce::UpdateCoalescer;
pub use controller::{Chart, ChartController, ChartState, UpdateType};
pub use error::{ChartError, Result};
pub use events::{ChartEvent, EventBus, SubscriptionId};
pub use export::ExportFormat;
pub use interaction::{ContextAction, InteractionLayer, Tooltip};

pub use ledgerflow_core;
pub use ledgerflow_core::{
    ChartKind, ConfigStore, DataProcessor, Dataset, FlowWarning, IncomeStatement, LinkInput,
    Metadata, NodeInput, ProcessedGraph, StatementType, Unit,
};
pub use ledgerflow_render;
pub use ledgerflow_render::{ChartLayout, RenderSummary, SvgSurface};
