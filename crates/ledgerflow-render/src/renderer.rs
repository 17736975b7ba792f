use crate::color::{link_fill, node_fill};
use crate::format::{format_percent, format_value};
use crate::model::{BarLayout, ChartLayout, LayerClass, NodeLayout, SankeyLayout};
use crate::surface::{
    DrawingSurface, Element, Group, Shape, Style, TextAnchor, Transition, TransitionKind,
};
use ledgerflow_core::config::StyleSettings;
use ledgerflow_core::finance::MarginType;
use ledgerflow_core::{FlowNode, ProcessedGraph};
use rustc_hash::FxHashSet;

/// Color changes animate over a fixed duration, independent of `animationDuration`.
pub const COLOR_TRANSITION_MS: u64 = 300;
const LINE_HEIGHT_EM: f64 = 1.2;
const BASELINE_SHIFT_EM: f64 = 0.35;

/// Counts of what a render pass did to the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub entered: usize,
    pub updated: usize,
    pub recolored: usize,
    pub exited: usize,
    pub unchanged: usize,
}

impl RenderSummary {
    /// True when the pass left the surface exactly as it was.
    pub fn is_noop(&self) -> bool {
        self.entered == 0 && self.updated == 0 && self.recolored == 0 && self.exited == 0
    }

    pub fn absorb(&mut self, other: RenderSummary) {
        self.entered += other.entered;
        self.updated += other.updated;
        self.recolored += other.recolored;
        self.exited += other.exited;
        self.unchanged += other.unchanged;
    }
}

pub fn node_key(id: &str) -> String {
    format!("node:{id}")
}

/// `link:{source}->{target}#{n}` with `%`, `>` and `#` percent-escaped inside the ids, so two
/// different endpoint pairs never share a key.
pub fn link_key(source: &str, target: &str, occurrence: usize) -> String {
    format!(
        "link:{}->{}#{occurrence}",
        escape_key_part(source),
        escape_key_part(target)
    )
}

fn escape_key_part(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for ch in id.chars() {
        match ch {
            '%' => out.push_str("%25"),
            '>' => out.push_str("%3E"),
            '#' => out.push_str("%23"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn label_key(id: &str) -> String {
    format!("label:{id}")
}

pub fn bar_key(id: &str) -> String {
    format!("bar:{id}")
}

pub const TITLE_KEY: &str = "title";
pub const SUBTITLE_KEY: &str = "subtitle";

#[derive(Debug, Clone)]
pub struct Renderer {
    style: StyleSettings,
}

impl Renderer {
    pub fn new(style: StyleSettings) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &StyleSettings {
        &self.style
    }

    pub fn set_style(&mut self, style: StyleSettings) {
        self.style = style;
    }

    pub fn render(
        &self,
        surface: &mut dyn DrawingSurface,
        layout: &ChartLayout,
        graph: &ProcessedGraph,
    ) -> RenderSummary {
        match layout {
            ChartLayout::Sankey(l) => self.render_chart(surface, l, graph),
            ChartLayout::Bar(l) => self.render_bars(surface, l, graph),
        }
    }

    /// Binds nodes, links, labels and decorations. Rendering the same input twice is a no-op.
    pub fn render_chart(
        &self,
        surface: &mut dyn DrawingSurface,
        layout: &SankeyLayout,
        graph: &ProcessedGraph,
    ) -> RenderSummary {
        surface.resize(layout.width, layout.height);
        let mut summary = self.render_links(surface, layout, graph);
        summary.absorb(self.render_nodes(surface, layout, graph));
        summary.absorb(self.render_decorations(surface, layout.width, layout.frame.min_y, graph));
        tracing::debug!(?summary, "sankey rendered");
        summary
    }

    /// Rebinds link geometry only.
    pub fn render_links(
        &self,
        surface: &mut dyn DrawingSurface,
        layout: &SankeyLayout,
        graph: &ProcessedGraph,
    ) -> RenderSummary {
        let desired = layout
            .links
            .iter()
            .map(|l| {
                let flow = &graph.links[l.index];
                let fill = link_fill(flow, graph, &self.style);
                Element::new(l.key.clone(), Group::Links, Shape::Path { d: l.path.clone() })
                    .with_style(Style {
                        fill: Some(fill.color),
                        opacity: Some(fill.opacity),
                        class: Some(format!("link {}", flow.kind)),
                        ..Style::default()
                    })
                    .with_data("source", l.source.clone())
                    .with_data("target", l.target.clone())
                    .with_data("value", l.value.to_string())
                    .interactive()
            })
            .collect();
        self.join(surface, Group::Links, desired)
    }

    /// Rebinds node rectangles and their labels.
    pub fn render_nodes(
        &self,
        surface: &mut dyn DrawingSurface,
        layout: &SankeyLayout,
        graph: &ProcessedGraph,
    ) -> RenderSummary {
        let nodes = layout
            .nodes
            .iter()
            .map(|n| self.node_element(n, &graph.nodes[n.index]))
            .collect();
        let mut summary = self.join(surface, Group::Nodes, nodes);
        summary.absorb(self.render_labels(surface, layout, graph));
        summary
    }

    pub fn render_labels(
        &self,
        surface: &mut dyn DrawingSurface,
        layout: &SankeyLayout,
        graph: &ProcessedGraph,
    ) -> RenderSummary {
        let labels = layout
            .nodes
            .iter()
            .map(|n| self.label_element(n, &graph.nodes[n.index], graph))
            .collect();
        self.join(surface, Group::Labels, labels)
    }

    /// Restyles existing nodes and links without touching geometry, then rebinds labels and
    /// decorations so text settings apply too.
    pub fn render_colors(
        &self,
        surface: &mut dyn DrawingSurface,
        layout: &SankeyLayout,
        graph: &ProcessedGraph,
    ) -> RenderSummary {
        let mut summary = RenderSummary::default();
        for n in &layout.nodes {
            let fill = node_fill(&graph.nodes[n.index], &self.style);
            summary.absorb(self.restyle(surface, &node_key(&n.id), fill.color, fill.opacity));
        }
        for l in &layout.links {
            let fill = link_fill(&graph.links[l.index], graph, &self.style);
            summary.absorb(self.restyle(surface, &l.key, fill.color, fill.opacity));
        }
        summary.absorb(self.render_labels(surface, layout, graph));
        summary.absorb(self.render_decorations(surface, layout.width, layout.frame.min_y, graph));
        summary
    }

    /// Bar variant: one bar per node plus a name and value label, no links.
    pub fn render_bars(
        &self,
        surface: &mut dyn DrawingSurface,
        layout: &BarLayout,
        graph: &ProcessedGraph,
    ) -> RenderSummary {
        surface.resize(layout.width, layout.height);
        let font_size = self.style.labels.font_size;
        let unit = graph.metadata.unit;

        let mut bars = Vec::with_capacity(layout.bars.len());
        let mut labels = Vec::with_capacity(layout.bars.len() * 2);
        for b in &layout.bars {
            let node = &graph.nodes[b.index];
            let fill = node_fill(node, &self.style);
            bars.push(
                Element::new(
                    bar_key(&b.id),
                    Group::Nodes,
                    Shape::Rect {
                        x: b.x,
                        y: b.y,
                        width: b.width,
                        height: b.height,
                    },
                )
                .with_style(Style {
                    fill: Some(fill.color),
                    opacity: Some(fill.opacity),
                    class: Some(format!("bar {}", node.category)),
                    ..Style::default()
                })
                .with_data("id", b.id.clone())
                .with_data("value", b.value.to_string())
                .interactive(),
            );

            let cx = b.x + b.width / 2.0;
            labels.push(
                Element::new(
                    label_key(&b.id),
                    Group::Labels,
                    Shape::Text {
                        x: cx,
                        y: layout.baseline + font_size * 1.4,
                        anchor: TextAnchor::Middle,
                        lines: node.label_lines.clone(),
                        line_height: font_size * LINE_HEIGHT_EM,
                    },
                )
                .with_style(self.text_style(font_size, None)),
            );
            if self.style.labels.show_values {
                let value = format_value(
                    b.value,
                    unit,
                    &self.style.labels.prefix,
                    &self.style.labels.suffix,
                );
                labels.push(
                    Element::new(
                        format!("value:{}", b.id),
                        Group::Labels,
                        Shape::Text {
                            x: cx,
                            y: b.y - font_size * 0.5,
                            anchor: TextAnchor::Middle,
                            lines: vec![value],
                            line_height: font_size * LINE_HEIGHT_EM,
                        },
                    )
                    .with_style(self.text_style(font_size, None)),
                );
            }
        }

        let mut summary = self.join(surface, Group::Links, Vec::new());
        summary.absorb(self.join(surface, Group::Nodes, bars));
        summary.absorb(self.join(surface, Group::Labels, labels));
        summary.absorb(self.render_decorations(surface, layout.width, layout.bounds.min_y, graph));
        tracing::debug!(?summary, "bar chart rendered");
        summary
    }

    fn render_decorations(
        &self,
        surface: &mut dyn DrawingSurface,
        width: f64,
        top: f64,
        graph: &ProcessedGraph,
    ) -> RenderSummary {
        let font_size = self.style.labels.font_size;
        let mut desired = Vec::new();
        let title = self
            .style
            .title
            .clone()
            .or_else(|| graph.metadata.title.clone());
        if let Some(title) = title {
            desired.push(
                Element::new(
                    TITLE_KEY,
                    Group::Decorations,
                    Shape::Text {
                        x: width / 2.0,
                        y: (top / 2.0).max(font_size * 1.5),
                        anchor: TextAnchor::Middle,
                        lines: vec![title],
                        line_height: font_size * 1.5 * LINE_HEIGHT_EM,
                    },
                )
                .with_style(self.text_style(font_size * 1.5, Some("bold"))),
            );
        }
        let subtitle = [
            graph.metadata.company.as_deref(),
            graph.metadata.period.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" · ");
        if !subtitle.is_empty() {
            desired.push(
                Element::new(
                    SUBTITLE_KEY,
                    Group::Decorations,
                    Shape::Text {
                        x: width / 2.0,
                        y: (top / 2.0).max(font_size * 1.5) + font_size * 1.6,
                        anchor: TextAnchor::Middle,
                        lines: vec![subtitle],
                        line_height: font_size * LINE_HEIGHT_EM,
                    },
                )
                .with_style(self.text_style(font_size, None)),
            );
        }
        self.join(surface, Group::Decorations, desired)
    }

    fn node_element(&self, layout: &NodeLayout, node: &FlowNode) -> Element {
        let fill = node_fill(node, &self.style);
        Element::new(
            node_key(&layout.id),
            Group::Nodes,
            Shape::Rect {
                x: layout.x0,
                y: layout.y0,
                width: layout.width(),
                height: layout.height(),
            },
        )
        .with_style(Style {
            fill: Some(fill.color),
            opacity: Some(fill.opacity),
            class: Some(format!("node {}", node.category)),
            ..Style::default()
        })
        .with_data("id", layout.id.clone())
        .with_data("value", layout.value.to_string())
        .with_data("depth", layout.depth.to_string())
        .interactive()
    }

    fn label_element(&self, layout: &NodeLayout, node: &FlowNode, graph: &ProcessedGraph) -> Element {
        let labels = &self.style.labels;
        let font_size = labels.font_size;
        let (x, anchor) = match layout.class {
            LayerClass::Leftmost => (layout.x0 - labels.distance.leftmost, TextAnchor::End),
            LayerClass::Middle => (layout.x1 + labels.distance.middle, TextAnchor::Start),
            LayerClass::Rightmost => (layout.x1 + labels.distance.rightmost, TextAnchor::Start),
        };

        let mut lines = node.label_lines.clone();
        if labels.show_values {
            lines.push(format_value(
                node.value,
                graph.metadata.unit,
                &labels.prefix,
                &labels.suffix,
            ));
        }
        if labels.show_percentages {
            if let Some(line) = percentage_line(node, graph) {
                lines.push(line);
            }
        }

        let line_height = font_size * LINE_HEIGHT_EM;
        let y = layout.center_y() - (lines.len() as f64 - 1.0) * line_height / 2.0
            + font_size * BASELINE_SHIFT_EM;
        Element::new(
            label_key(&layout.id),
            Group::Labels,
            Shape::Text {
                x,
                y,
                anchor,
                lines,
                line_height,
            },
        )
        .with_style(self.text_style(font_size, None))
        .with_data("id", layout.id.clone())
    }

    fn text_style(&self, font_size: f64, weight: Option<&str>) -> Style {
        Style {
            fill: Some("#2c3e50".to_string()),
            font_size: Some(font_size),
            font_weight: weight.map(str::to_string),
            class: Some("label".to_string()),
            ..Style::default()
        }
    }

    fn restyle(
        &self,
        surface: &mut dyn DrawingSurface,
        key: &str,
        color: String,
        opacity: f64,
    ) -> RenderSummary {
        let mut summary = RenderSummary::default();
        let Some(existing) = surface.get(key) else {
            return summary;
        };
        if existing.style.fill.as_deref() == Some(color.as_str())
            && existing.style.opacity == Some(opacity)
        {
            summary.unchanged += 1;
            return summary;
        }
        let mut el = existing.clone();
        el.style.fill = Some(color);
        el.style.opacity = Some(opacity);
        surface.put(el);
        surface.animate(Transition {
            key: key.to_string(),
            kind: TransitionKind::Recolor,
            duration_ms: COLOR_TRANSITION_MS,
        });
        summary.recolored += 1;
        summary
    }

    /// Keyed enter/update/exit binding of one group.
    fn join(
        &self,
        surface: &mut dyn DrawingSurface,
        group: Group,
        desired: Vec<Element>,
    ) -> RenderSummary {
        let duration = self.style.animation_duration_ms;
        let mut summary = RenderSummary::default();

        let wanted: FxHashSet<&str> = desired.iter().map(|e| e.key.as_str()).collect();
        for key in surface.keys_in(group) {
            if wanted.contains(key.as_str()) {
                continue;
            }
            surface.animate(Transition {
                key: key.clone(),
                kind: TransitionKind::Exit,
                duration_ms: duration,
            });
            surface.remove(&key);
            summary.exited += 1;
        }

        for el in desired {
            let kind = match surface.get(&el.key) {
                Some(existing) if *existing == el => None,
                Some(existing) if existing.shape == el.shape => Some(TransitionKind::Recolor),
                Some(_) => Some(TransitionKind::Update),
                None => Some(TransitionKind::Enter),
            };
            let Some(kind) = kind else {
                summary.unchanged += 1;
                continue;
            };
            let duration_ms = match kind {
                TransitionKind::Recolor => {
                    summary.recolored += 1;
                    COLOR_TRANSITION_MS
                }
                TransitionKind::Update => {
                    summary.updated += 1;
                    duration
                }
                _ => {
                    summary.entered += 1;
                    duration
                }
            };
            surface.animate(Transition {
                key: el.key.clone(),
                kind,
                duration_ms,
            });
            surface.put(el);
        }
        summary
    }
}

/// Margin line for profit nodes, revenue share for everything else. The hub itself gets none.
fn percentage_line(node: &FlowNode, graph: &ProcessedGraph) -> Option<String> {
    let hub = graph.revenue_hub.as_ref()?;
    graph.hub_value()?;
    if hub.node == Some(node.index) {
        return None;
    }
    let m = &node.metrics;
    Some(match m.margin_type {
        MarginType::PercentOfRevenue => {
            format!("{} of Revenue", format_percent(m.percentage_of_revenue))
        }
        other => format!(
            "{}: {}",
            other.label(),
            format_percent(m.margin_percentage.unwrap_or(m.percentage_of_revenue))
        ),
    })
}
