use crate::format::fmt_path;
use crate::model::{Bounds, LayerClass, LinkLayout, NodeLayout, SankeyLayout};
use crate::renderer::link_key;
use crate::{Error, Result};
use ledgerflow_core::ProcessedGraph;
use ledgerflow_core::config::{CurvatureSettings, LayerSpacing, LayoutSettings};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;

fn f64_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn spacing_multiplier(spacing: &LayerSpacing, class: LayerClass) -> f64 {
    match class {
        LayerClass::Leftmost => spacing.leftmost,
        LayerClass::Middle => spacing.middle,
        LayerClass::Rightmost => spacing.rightmost,
    }
}

/// Lays out a processed graph as a left-to-right Sankey diagram.
///
/// Node heights are `max(minNodeHeight, value * scale)` where `scale` fits the fullest layer and
/// keeps the largest node under `maxNodeHeightRatio` of the usable height. Link widths at each end
/// are normalized against the flows actually stacked on that node, so the bands touching a node
/// always add up to its drawn height.
pub fn layout_sankey(graph: &ProcessedGraph, settings: &LayoutSettings) -> Result<SankeyLayout> {
    let Some(max_depth) = graph.max_depth() else {
        return Err(Error::layout("cannot lay out a graph without nodes"));
    };
    let usable_w = settings.usable_width();
    let usable_h = settings.usable_height();
    if !(usable_w > 0.0 && usable_h > 0.0) {
        return Err(Error::layout(format!(
            "usable canvas is {usable_w}x{usable_h} after margins"
        )));
    }

    let node_width = settings.node_width.min(usable_w);
    let step = usable_w / (max_depth as f64 + 1.0);
    let span = max_depth as f64 * step + node_width;
    let offset_x = if settings.auto_center && settings.dynamic_space_fill {
        ((usable_w - span) / 2.0).max(0.0)
    } else {
        0.0
    };

    let padding_for = |depth: usize| {
        settings.node_padding
            * spacing_multiplier(&settings.layer_spacing, LayerClass::of(depth, max_depth))
    };

    let mut ky = f64::INFINITY;
    for (depth, layer) in graph.layers.iter().enumerate() {
        let sum: f64 = layer.iter().map(|&i| graph.nodes[i].value).sum();
        if layer.is_empty() || sum <= 0.0 {
            continue;
        }
        let room = (usable_h - (layer.len() as f64 - 1.0) * padding_for(depth)).max(usable_h * 0.5);
        ky = ky.min(room / sum);
    }
    if !ky.is_finite() {
        ky = 0.0;
    }
    let max_value = graph.nodes.iter().map(|n| n.value).fold(0.0, f64::max);
    if max_value > 0.0 {
        ky = ky.min(settings.max_node_height_ratio * usable_h / max_value);
    }
    ky *= settings.scale_factor;

    let mut nodes: Vec<NodeLayout> = graph
        .nodes
        .iter()
        .map(|n| {
            let x0 = settings.margin.left + offset_x + n.depth as f64 * step;
            NodeLayout {
                id: n.id.clone(),
                index: n.index,
                depth: n.depth,
                value: n.value,
                class: LayerClass::of(n.depth, max_depth),
                x0,
                x1: x0 + node_width,
                y0: 0.0,
                y1: settings.min_node_height.max(n.value * ky),
                source_links: Vec::new(),
                target_links: Vec::new(),
            }
        })
        .collect();

    for (depth, layer) in graph.layers.iter().enumerate() {
        if layer.is_empty() {
            continue;
        }
        let count = layer.len() as f64;
        let heights_sum: f64 = layer.iter().map(|&i| nodes[i].y1).sum();
        let mut pad = padding_for(depth);
        if count > 1.0 && heights_sum + (count - 1.0) * pad > usable_h {
            pad = ((usable_h - heights_sum) / (count - 1.0)).max(0.0);
            tracing::debug!(depth, pad, "layer overflows canvas; padding compressed");
        }
        let total = heights_sum + (count - 1.0) * pad;
        let mut y = settings.margin.top;
        if settings.auto_middle_align {
            y += ((usable_h - total) / 2.0).max(0.0);
        }
        for &i in layer {
            let h = nodes[i].y1;
            nodes[i].y0 = y;
            nodes[i].y1 = y + h;
            y += h + pad;
        }
    }

    let mut occurrences: FxHashMap<(usize, usize), usize> = FxHashMap::default();
    let mut links: Vec<LinkLayout> = Vec::with_capacity(graph.links.len());
    for l in &graph.links {
        let n = occurrences.entry((l.source, l.target)).or_insert(0);
        let key = link_key(&l.source_id, &l.target_id, *n);
        *n += 1;
        links.push(LinkLayout {
            index: l.index,
            key,
            source: l.source_id.clone(),
            target: l.target_id.clone(),
            source_index: l.source,
            target_index: l.target,
            value: l.value,
            x0: nodes[l.source].x1,
            x1: nodes[l.target].x0,
            y0: 0.0,
            y1: 0.0,
            source_width: 0.0,
            target_width: 0.0,
            curvature: 0.0,
            path: String::new(),
        });
        nodes[l.source].source_links.push(l.index);
        nodes[l.target].target_links.push(l.index);
    }

    reorder_links(&mut nodes, &links);
    assign_link_slots(&nodes, &mut links);

    let frame = Bounds {
        min_x: settings.margin.left,
        min_y: settings.margin.top,
        max_x: settings.margin.left + usable_w,
        max_y: settings.margin.top + usable_h,
    };
    let mut layout = SankeyLayout {
        bounds: frame,
        frame,
        width: settings.width,
        height: settings.height,
        node_width,
        scale: ky,
        nodes,
        links,
        layers: graph.layers.clone(),
    };
    compute_link_paths(&mut layout, &settings.curvature);
    layout.bounds = content_bounds(&layout).unwrap_or(frame);

    tracing::debug!(
        nodes = layout.nodes.len(),
        links = layout.links.len(),
        scale = ky,
        "sankey layout"
    );
    Ok(layout)
}

fn content_bounds(layout: &SankeyLayout) -> Option<Bounds> {
    Bounds::from_points(
        layout
            .nodes
            .iter()
            .flat_map(|n| [(n.x0, n.y0), (n.x1, n.y1)]),
    )
}

fn sort_source_links_by_target_y0(nodes: &[NodeLayout], links: &[LinkLayout], indices: &mut [usize]) {
    indices.sort_by(|&a, &b| {
        let ta = nodes[links[a].target_index].y0;
        let tb = nodes[links[b].target_index].y0;
        f64_cmp(ta, tb).then_with(|| links[a].index.cmp(&links[b].index))
    });
}

fn sort_target_links_by_source_y0(nodes: &[NodeLayout], links: &[LinkLayout], indices: &mut [usize]) {
    indices.sort_by(|&a, &b| {
        let sa = nodes[links[a].source_index].y0;
        let sb = nodes[links[b].source_index].y0;
        f64_cmp(sa, sb).then_with(|| links[a].index.cmp(&links[b].index))
    });
}

/// Orders each node's link slots by the position of the node at the other end, so bands do not
/// cross where they attach.
fn reorder_links(nodes: &mut [NodeLayout], links: &[LinkLayout]) {
    for i in 0..nodes.len() {
        let mut out = std::mem::take(&mut nodes[i].source_links);
        let mut inc = std::mem::take(&mut nodes[i].target_links);
        sort_source_links_by_target_y0(nodes, links, &mut out);
        sort_target_links_by_source_y0(nodes, links, &mut inc);
        nodes[i].source_links = out;
        nodes[i].target_links = inc;
    }
}

/// Stacks link ends along each node. Each end's width is the link's share of that side's total,
/// scaled to the node's drawn height.
fn assign_link_slots(nodes: &[NodeLayout], links: &mut [LinkLayout]) {
    for node in nodes {
        let h = node.height();

        let widths = slot_widths(h, node.source_links.iter().map(|&li| links[li].value));
        let mut y = node.y0;
        for (&li, w) in node.source_links.iter().zip(widths) {
            links[li].y0 = y;
            links[li].source_width = w;
            y += w;
        }

        let widths = slot_widths(h, node.target_links.iter().map(|&li| links[li].value));
        let mut y = node.y0;
        for (&li, w) in node.target_links.iter().zip(widths) {
            links[li].y1 = y;
            links[li].target_width = w;
            y += w;
        }
    }
}

/// Splits `height` across links in proportion to value. All-zero sides split evenly so the
/// widths still cover the node.
fn slot_widths(height: f64, values: impl Iterator<Item = f64>) -> Vec<f64> {
    let values = values.collect::<Vec<_>>();
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        values.iter().map(|v| height * v / total).collect()
    } else {
        vec![height / values.len().max(1) as f64; values.len()]
    }
}

/// Recomputes every link's curvature and path. Node geometry is left untouched.
pub fn compute_link_paths(layout: &mut SankeyLayout, curvature: &CurvatureSettings) {
    for link in &mut layout.links {
        let depth = layout
            .nodes
            .get(link.source_index)
            .map(|n| n.depth)
            .unwrap_or_default();
        link.curvature = curvature.for_layer(depth);
        link.path = link_path(link);
    }
}

/// Filled band: top edge source to target, down the target side, bottom edge back.
pub fn link_path(link: &LinkLayout) -> String {
    let c = link.curvature * (link.x1 - link.x0);
    let (x0, x1) = (link.x0, link.x1);
    let (cx0, cx1) = (x0 + c, x1 - c);
    let (sy0, sy1) = (link.y0, link.y0 + link.source_width);
    let (ty0, ty1) = (link.y1, link.y1 + link.target_width);
    let p = fmt_path;
    format!(
        "M{},{}C{},{},{},{},{},{}L{},{}C{},{},{},{},{},{}Z",
        p(x0),
        p(sy0),
        p(cx0),
        p(sy0),
        p(cx1),
        p(ty0),
        p(x1),
        p(ty0),
        p(x1),
        p(ty1),
        p(cx1),
        p(ty1),
        p(cx0),
        p(sy1),
        p(x0),
        p(sy1),
    )
}

/// Moves one node vertically, clamped to the frame, and rebuilds only the paths of its links.
///
/// Returns the applied offset and the indices of the links whose geometry changed.
pub fn shift_node(layout: &mut SankeyLayout, index: usize, dy: f64) -> Option<(f64, Vec<usize>)> {
    let node = layout.nodes.get(index)?;
    let min_dy = layout.frame.min_y - node.y0;
    let max_dy = layout.frame.max_y - node.y1;
    let applied = if min_dy > max_dy {
        min_dy
    } else {
        dy.clamp(min_dy, max_dy)
    };

    let node = &mut layout.nodes[index];
    node.y0 += applied;
    node.y1 += applied;
    let outgoing = node.source_links.clone();
    let incoming = node.target_links.clone();

    for &li in &outgoing {
        layout.links[li].y0 += applied;
    }
    for &li in &incoming {
        layout.links[li].y1 += applied;
    }
    let mut touched = outgoing;
    touched.extend(incoming);
    touched.sort_unstable();
    touched.dedup();
    for &li in &touched {
        layout.links[li].path = link_path(&layout.links[li]);
    }
    layout.bounds = content_bounds(layout).unwrap_or(layout.frame);
    Some((applied, touched))
}
