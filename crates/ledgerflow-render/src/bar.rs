use crate::model::{BarItemLayout, BarLayout, Bounds};
use crate::{Error, Result};
use ledgerflow_core::ProcessedGraph;
use ledgerflow_core::config::LayoutSettings;

/// Lays out one vertical bar per node on a shared value axis.
///
/// Bars are sorted by value (descending) when `bar.sortDescending` is set, otherwise they keep the
/// processed layer order, left to right.
pub fn layout_bars(graph: &ProcessedGraph, settings: &LayoutSettings) -> Result<BarLayout> {
    if graph.nodes.is_empty() {
        return Err(Error::layout("cannot lay out a bar chart without nodes"));
    }
    let usable_w = settings.usable_width();
    let usable_h = settings.usable_height();
    if !(usable_w > 0.0 && usable_h > 0.0) {
        return Err(Error::layout(format!(
            "usable canvas is {usable_w}x{usable_h} after margins"
        )));
    }

    let mut order: Vec<usize> = graph.layers.iter().flatten().copied().collect();
    if settings.bar_sort_descending {
        order.sort_by(|&a, &b| {
            let (na, nb) = (&graph.nodes[a], &graph.nodes[b]);
            nb.value
                .total_cmp(&na.value)
                .then_with(|| na.id.cmp(&nb.id))
        });
    }

    let max_value = graph.nodes.iter().map(|n| n.value).fold(0.0, f64::max);
    let band = usable_w / order.len() as f64;
    let bar_width = band * (1.0 - settings.bar_padding.clamp(0.0, 0.9));
    let baseline = settings.margin.top + usable_h;

    let bars: Vec<BarItemLayout> = order
        .iter()
        .enumerate()
        .map(|(slot, &i)| {
            let node = &graph.nodes[i];
            let height = if max_value > 0.0 {
                (node.value / max_value * usable_h).max(settings.min_node_height)
            } else {
                settings.min_node_height
            };
            BarItemLayout {
                id: node.id.clone(),
                index: i,
                value: node.value,
                x: settings.margin.left + slot as f64 * band + (band - bar_width) / 2.0,
                y: baseline - height,
                width: bar_width,
                height,
            }
        })
        .collect();

    let bounds = Bounds::from_points(
        bars.iter()
            .flat_map(|b| [(b.x, b.y), (b.x + b.width, b.y + b.height)]),
    )
    .unwrap_or(Bounds {
        min_x: settings.margin.left,
        min_y: settings.margin.top,
        max_x: settings.margin.left + usable_w,
        max_y: baseline,
    });

    Ok(BarLayout {
        bounds,
        width: settings.width,
        height: settings.height,
        baseline,
        max_value,
        bars,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerflow_core::{ChartKind, ConfigStore, DataProcessor, Dataset, NodeInput};

    fn graph() -> ProcessedGraph {
        let ds = Dataset::new(
            vec![
                NodeInput::new("Small", 0, 10.0, "expense"),
                NodeInput::new("Large", 0, 40.0, "revenue"),
                NodeInput::new("Mid", 1, 20.0, "profit"),
            ],
            vec![],
        );
        DataProcessor::default().process(&ds).unwrap()
    }

    #[test]
    fn bars_sort_descending_and_share_a_baseline() {
        let settings = ConfigStore::new(ChartKind::Bar).layout_settings();
        let layout = layout_bars(&graph(), &settings).unwrap();
        let ids = layout.bars.iter().map(|b| b.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["Large", "Mid", "Small"]);
        for b in &layout.bars {
            assert!((b.y + b.height - layout.baseline).abs() < 1e-9);
        }
        assert!((layout.bars[0].height - settings.usable_height()).abs() < 1e-9);
        assert!((layout.bars[1].height * 2.0 - layout.bars[0].height).abs() < 1e-9);
        assert!(layout.bars[0].x + layout.bars[0].width < layout.bars[1].x);
    }

    #[test]
    fn unsorted_bars_keep_layer_order() {
        let mut store = ConfigStore::new(ChartKind::Bar);
        store
            .set("bar.sortDescending", serde_json::json!(false))
            .unwrap();
        let layout = layout_bars(&graph(), &store.layout_settings()).unwrap();
        let ids = layout.bars.iter().map(|b| b.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["Large", "Small", "Mid"]);
    }
}
