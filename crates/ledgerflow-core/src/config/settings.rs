use super::ConfigStore;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Padding multipliers per layer class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerSpacing {
    pub leftmost: f64,
    pub middle: f64,
    pub rightmost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvatureSettings {
    pub global: f64,
    pub per_layer: BTreeMap<usize, f64>,
}

impl CurvatureSettings {
    /// Curve intensity for links leaving `layer`, falling back to the global intensity.
    pub fn for_layer(&self, layer: usize) -> f64 {
        self.per_layer.get(&layer).copied().unwrap_or(self.global)
    }
}

/// Typed snapshot of every setting the layout engine reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSettings {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
    pub node_width: f64,
    pub node_padding: f64,
    pub min_node_height: f64,
    pub max_node_height_ratio: f64,
    pub scale_factor: f64,
    pub layer_spacing: LayerSpacing,
    pub curvature: CurvatureSettings,
    pub auto_center: bool,
    pub auto_middle_align: bool,
    pub dynamic_space_fill: bool,
    pub bar_padding: f64,
    pub bar_sort_descending: bool,
}

impl LayoutSettings {
    pub fn usable_width(&self) -> f64 {
        self.width - self.margin.left - self.margin.right
    }

    pub fn usable_height(&self) -> f64 {
        self.height - self.margin.top - self.margin.bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelDistance {
    pub leftmost: f64,
    pub middle: f64,
    pub rightmost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSettings {
    pub font_size: f64,
    pub max_label_width: f64,
    pub show_values: bool,
    pub show_percentages: bool,
    pub prefix: String,
    pub suffix: String,
    pub distance: LabelDistance,
}

/// Typed snapshot of the visual settings the renderer reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSettings {
    pub colors: IndexMap<String, String>,
    pub link_opacity: f64,
    pub node_opacity: f64,
    pub animation_duration_ms: u64,
    pub labels: LabelSettings,
    pub title: Option<String>,
    pub export_scale: f64,
    pub export_background: String,
}

impl ConfigStore {
    fn f64_or(&self, path: &str, fallback: f64) -> f64 {
        self.get_f64(path).unwrap_or(fallback)
    }

    fn bool_or(&self, path: &str, fallback: bool) -> bool {
        self.get_bool(path).unwrap_or(fallback)
    }

    pub fn layout_settings(&self) -> LayoutSettings {
        LayoutSettings {
            width: self.f64_or("width", 1200.0),
            height: self.f64_or("height", 700.0),
            margin: Margin {
                top: self.f64_or("margin.top", 60.0),
                right: self.f64_or("margin.right", 160.0),
                bottom: self.f64_or("margin.bottom", 60.0),
                left: self.f64_or("margin.left", 160.0),
            },
            node_width: self.f64_or("nodeWidth", 15.0),
            node_padding: self.f64_or("nodePadding", 30.0),
            min_node_height: self.f64_or("minNodeHeight", 2.0),
            max_node_height_ratio: self.f64_or("maxNodeHeightRatio", 0.85),
            scale_factor: self.f64_or("scaleFactor", 1.0),
            layer_spacing: LayerSpacing {
                leftmost: self.f64_or("layerSpacing.leftmost", 0.8),
                middle: self.f64_or("layerSpacing.middle", 0.9),
                rightmost: self.f64_or("layerSpacing.rightmost", 0.7),
            },
            curvature: self.curvature_settings(),
            auto_center: self.bool_or("autoCenter", true),
            auto_middle_align: self.bool_or("autoMiddleAlign", true),
            dynamic_space_fill: self.bool_or("dynamicSpaceFill", true),
            bar_padding: self.f64_or("bar.padding", 0.2),
            bar_sort_descending: self.bool_or("bar.sortDescending", true),
        }
    }

    pub fn curvature_settings(&self) -> CurvatureSettings {
        CurvatureSettings {
            global: self.f64_or("curveIntensity", 0.4),
            per_layer: self.layer_curvature(),
        }
    }

    pub fn style_settings(&self) -> StyleSettings {
        let colors = self
            .get("colors")
            .and_then(|v| v.as_object().cloned())
            .map(|m| {
                m.into_iter()
                    .filter_map(|(k, v)| Some((k, v.as_str()?.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        StyleSettings {
            colors,
            link_opacity: self.f64_or("linkOpacity", 0.65),
            node_opacity: self.f64_or("nodeOpacity", 1.0),
            animation_duration_ms: self.f64_or("animationDuration", 800.0).max(0.0) as u64,
            labels: LabelSettings {
                font_size: self.f64_or("labels.fontSize", 12.0),
                max_label_width: self.f64_or("labels.maxLabelWidth", 140.0),
                show_values: self.bool_or("labels.showValues", true),
                show_percentages: self.bool_or("labels.showPercentages", true),
                prefix: self.get_str("labels.prefix").unwrap_or("$").to_string(),
                suffix: self.get_str("labels.suffix").unwrap_or_default().to_string(),
                distance: LabelDistance {
                    leftmost: self.f64_or("labels.distance.leftmost", 12.0),
                    middle: self.f64_or("labels.distance.middle", 8.0),
                    rightmost: self.f64_or("labels.distance.rightmost", 12.0),
                },
            },
            title: self.get_str("title").map(str::to_string),
            export_scale: self.f64_or("export.pngScale", 2.0),
            export_background: self
                .get_str("export.background")
                .unwrap_or("#ffffff")
                .to_string(),
        }
    }
}
