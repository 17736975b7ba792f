use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut it = points.into_iter();
        let (x0, y0) = it.next()?;
        let mut b = Self {
            min_x: x0,
            min_y: y0,
            max_x: x0,
            max_y: y0,
        };
        for (x, y) in it {
            b.min_x = b.min_x.min(x);
            b.min_y = b.min_y.min(y);
            b.max_x = b.max_x.max(x);
            b.max_y = b.max_y.max(y);
        }
        Some(b)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Spacing class of a layer; terminal layers pack tighter than hub layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerClass {
    Leftmost,
    Middle,
    Rightmost,
}

impl LayerClass {
    pub fn of(depth: usize, max_depth: usize) -> Self {
        if depth == 0 {
            Self::Leftmost
        } else if depth >= max_depth {
            Self::Rightmost
        } else {
            Self::Middle
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLayout {
    pub id: String,
    /// Index into the processed graph's nodes.
    pub index: usize,
    pub depth: usize,
    pub value: f64,
    pub class: LayerClass,
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    /// Outgoing link indices, sorted by target position.
    pub source_links: Vec<usize>,
    /// Incoming link indices, sorted by source position.
    pub target_links: Vec<usize>,
}

impl NodeLayout {
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn center_y(&self) -> f64 {
        (self.y0 + self.y1) / 2.0
    }
}

/// A flow band between two nodes. Widths differ at each end because each end is normalized
/// against its own node's stacked flows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkLayout {
    pub index: usize,
    /// Stable surface key, see [`crate::renderer::link_key`].
    pub key: String,
    pub source: String,
    pub target: String,
    pub source_index: usize,
    pub target_index: usize,
    pub value: f64,
    pub x0: f64,
    pub x1: f64,
    /// Top edge at the source node.
    pub y0: f64,
    /// Top edge at the target node.
    pub y1: f64,
    pub source_width: f64,
    pub target_width: f64,
    pub curvature: f64,
    /// Closed path: two cubic Béziers joined by vertical edges.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SankeyLayout {
    /// Extent of the drawn content.
    pub bounds: Bounds,
    /// Usable canvas area inside the margins.
    pub frame: Bounds,
    pub width: f64,
    pub height: f64,
    pub node_width: f64,
    /// Pixels per unit of value.
    pub scale: f64,
    pub nodes: Vec<NodeLayout>,
    pub links: Vec<LinkLayout>,
    /// Node indices per depth, top to bottom.
    pub layers: Vec<Vec<usize>>,
}

impl SankeyLayout {
    pub fn node(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn link(&self, key: &str) -> Option<&LinkLayout> {
        self.links.iter().find(|l| l.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarItemLayout {
    pub id: String,
    pub index: usize,
    pub value: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarLayout {
    pub bounds: Bounds,
    pub width: f64,
    pub height: f64,
    /// Y of the value axis baseline.
    pub baseline: f64,
    pub max_value: f64,
    pub bars: Vec<BarItemLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartLayout {
    Sankey(SankeyLayout),
    Bar(BarLayout),
}

impl ChartLayout {
    pub fn bounds(&self) -> Bounds {
        match self {
            Self::Sankey(l) => l.bounds,
            Self::Bar(l) => l.bounds,
        }
    }

    pub fn size(&self) -> (f64, f64) {
        match self {
            Self::Sankey(l) => (l.width, l.height),
            Self::Bar(l) => (l.width, l.height),
        }
    }

    pub fn as_sankey(&self) -> Option<&SankeyLayout> {
        match self {
            Self::Sankey(l) => Some(l),
            Self::Bar(_) => None,
        }
    }

    pub fn as_sankey_mut(&mut self) -> Option<&mut SankeyLayout> {
        match self {
            Self::Sankey(l) => Some(l),
            Self::Bar(_) => None,
        }
    }
}
