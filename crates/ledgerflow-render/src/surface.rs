//! Retained drawing-surface abstraction.
//!
//! The renderer never draws directly. It computes the desired element set and hands keyed
//! elements plus transition commands to a [`DrawingSurface`]; the surface decides how to present
//! them (an SVG document here, an animated canvas elsewhere).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Z-ordered element groups. Later groups draw on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Links,
    Nodes,
    Labels,
    Decorations,
}

impl Group {
    pub const ALL: [Group; 4] = [Self::Links, Self::Nodes, Self::Labels, Self::Decorations];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Links => "links",
            Self::Nodes => "nodes",
            Self::Labels => "labels",
            Self::Decorations => "decorations",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Path {
        d: String,
    },
    Text {
        x: f64,
        y: f64,
        anchor: TextAnchor,
        lines: Vec<String>,
        line_height: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Style {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub opacity: Option<f64>,
    pub font_size: Option<f64>,
    pub font_weight: Option<String>,
    pub class: Option<String>,
}

/// One keyed, retained element. Equality drives idempotent re-rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub key: String,
    pub group: Group,
    pub shape: Shape,
    pub style: Style,
    /// Extra `data-*` attributes exposed to the interaction layer.
    pub data: IndexMap<String, String>,
    /// Receives hover/click events.
    pub interactive: bool,
}

impl Element {
    pub fn new(key: impl Into<String>, group: Group, shape: Shape) -> Self {
        Self {
            key: key.into(),
            group,
            shape,
            style: Style::default(),
            data: IndexMap::new(),
            interactive: false,
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_data(mut self, name: &str, value: impl Into<String>) -> Self {
        self.data.insert(name.to_string(), value.into());
        self
    }

    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    /// Starts at zero size/opacity and grows in.
    Enter,
    /// Geometry or style moves to the new value.
    Update,
    /// Color-only change.
    Recolor,
    /// Fades out, then the element is removed.
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub key: String,
    pub kind: TransitionKind,
    pub duration_ms: u64,
}

/// The operations the renderer needs from a retained vector surface.
pub trait DrawingSurface {
    fn size(&self) -> (f64, f64);
    fn resize(&mut self, width: f64, height: f64);
    fn get(&self, key: &str) -> Option<&Element>;
    fn keys_in(&self, group: Group) -> Vec<String>;
    /// Inserts or replaces the element with the same key.
    fn put(&mut self, element: Element);
    fn remove(&mut self, key: &str) -> Option<Element>;
    fn animate(&mut self, transition: Transition);
}
