use super::{ChartKind, CurvaturePreset};
use indexmap::IndexMap;
use serde_json::{Value, json};

/// Defaults shared by every chart kind.
pub fn global_defaults() -> Value {
    json!({
        "chartType": "sankey",
        "width": 1200,
        "height": 700,
        "margin": { "top": 60, "right": 160, "bottom": 60, "left": 160 },
        "nodeWidth": 15,
        "nodePadding": 30,
        "minNodeHeight": 2,
        "maxNodeHeightRatio": 0.85,
        "scaleFactor": 1.0,
        "layerSpacing": { "leftmost": 0.8, "middle": 0.9, "rightmost": 0.7 },
        "curveIntensity": 0.4,
        "curvature": { "layerCurvature": {} },
        "autoCenter": true,
        "autoMiddleAlign": true,
        "dynamicSpaceFill": true,
        "animationDuration": 800,
        "linkOpacity": 0.65,
        "nodeOpacity": 1.0,
        "colors": {
            "revenue": "#3498db",
            "expense": "#e74c3c",
            "profit": "#27ae60",
            "asset": "#2980b9",
            "liability": "#c0392b",
            "equity": "#8e44ad",
            "other": "#95a5a6"
        },
        "labels": {
            "fontSize": 12,
            "maxLabelWidth": 140,
            "showValues": true,
            "showPercentages": true,
            "prefix": "$",
            "suffix": "",
            "distance": { "leftmost": 12, "middle": 8, "rightmost": 12 }
        },
        "title": null,
        "export": { "pngScale": 2, "background": "#ffffff" }
    })
}

/// Chart-type defaults layered over [`global_defaults`].
pub fn chart_defaults(kind: ChartKind) -> Value {
    match kind {
        ChartKind::Sankey => json!({}),
        ChartKind::Bar => json!({
            "margin": { "top": 60, "right": 40, "bottom": 120, "left": 80 },
            "bar": { "padding": 0.2, "sortDescending": true }
        }),
    }
}

pub(super) fn curvature_presets() -> IndexMap<String, CurvaturePreset> {
    let mut presets = IndexMap::new();
    presets.insert(
        "gentle".to_string(),
        CurvaturePreset::from([(0, 0.2), (1, 0.25), (2, 0.3)]),
    );
    presets.insert(
        "moderate".to_string(),
        CurvaturePreset::from([(0, 0.3), (1, 0.4), (2, 0.5)]),
    );
    presets.insert(
        "dramatic".to_string(),
        CurvaturePreset::from([(0, 0.4), (1, 0.6), (2, 0.7)]),
    );
    presets.insert(
        "progressive".to_string(),
        CurvaturePreset::from([(0, 0.2), (1, 0.35), (2, 0.5), (3, 0.65)]),
    );
    presets
}
