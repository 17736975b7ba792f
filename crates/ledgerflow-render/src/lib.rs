#![forbid(unsafe_code)]

//! Layout engine and renderer for financial flow charts.
//!
//! [`sankey::layout_sankey`] and [`bar::layout_bars`] turn a processed graph into positioned
//! geometry; [`renderer::Renderer`] binds that geometry to a retained [`surface::DrawingSurface`].

pub mod bar;
pub mod color;
pub mod format;
pub mod model;
pub mod renderer;
pub mod sankey;
pub mod surface;
pub mod svg;

pub use model::{
    BarItemLayout, BarLayout, Bounds, ChartLayout, LayerClass, LinkLayout, NodeLayout, SankeyLayout,
};
pub use renderer::{RenderSummary, Renderer};
pub use surface::{
    DrawingSurface, Element, Group, Shape, Style, TextAnchor, Transition, TransitionKind,
};
pub use svg::SvgSurface;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("layout error: {message}")]
    Layout { message: String },
    #[error("invalid layout model: {message}")]
    InvalidModel { message: String },
    #[error(transparent)]
    Core(#[from] ledgerflow_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn layout(message: impl Into<String>) -> Self {
        Self::Layout {
            message: message.into(),
        }
    }
}
