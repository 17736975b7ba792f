//! Chart controller: owns one chart's modules and drives full and partial updates.
//!
//! A full render runs process → layout → render. Configuration changes go through
//! [`ChartController::customize`], which picks the cheapest [`UpdateType`] that covers every
//! changed key. The surface is only touched once layout has succeeded, so a failing render leaves
//! the previous output in place.

use crate::coalesce::UpdateCoalescer;
use crate::error::{ChartError, Result};
use crate::events::{ChartEvent, EventBus, SubscriptionId};
use crate::export::{self, ExportFormat};
use crate::interaction::{
    self, ContextAction, InteractionLayer, Tooltip, connected_subgraph, link_subgraph,
};
use indexmap::IndexMap;
use ledgerflow_core::{
    ChartKind, ConfigStore, DataProcessor, Dataset, FlowWarning, ProcessedGraph,
};
use ledgerflow_render::bar::layout_bars;
use ledgerflow_render::renderer::node_key;
use ledgerflow_render::sankey::{compute_link_paths, layout_sankey, shift_node};
use ledgerflow_render::{
    ChartLayout, DrawingSurface, RenderSummary, Renderer, SvgSurface, Transition,
};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fmt;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartState {
    Uninitialized,
    Initializing,
    Ready,
    Rendering,
    PartiallyUpdating,
    /// The last render or update failed. Not terminal; the next call may succeed.
    Error,
}

impl ChartState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Rendering => "rendering",
            Self::PartiallyUpdating => "partially updating",
            Self::Error => "in error",
        }
    }
}

impl fmt::Display for ChartState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much of the pipeline a configuration change has to rerun. Ordered cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateType {
    /// Restyle in place.
    Colors,
    /// Recompute link paths only.
    Curvature,
    /// Re-layout the processed graph and re-render.
    Layout,
    /// Reprocess the dataset.
    Full,
}

const FULL_KEYS: &[&str] = &[
    "width",
    "height",
    "margin",
    "chartType",
    "nodeWidth",
    "labels.fontSize",
    "labels.maxLabelWidth",
];
const LAYOUT_KEYS: &[&str] = &[
    "nodePadding",
    "layerSpacing",
    "minNodeHeight",
    "maxNodeHeightRatio",
    "scaleFactor",
    "autoCenter",
    "autoMiddleAlign",
    "dynamicSpaceFill",
    "bar",
];
const CURVATURE_KEYS: &[&str] = &["curveIntensity", "curvature"];

fn path_under(path: &str, keys: &[&str]) -> bool {
    keys.iter().any(|k| {
        path == *k
            || path
                .strip_prefix(k)
                .is_some_and(|rest| rest.starts_with('.'))
    })
}

impl UpdateType {
    pub fn for_path(path: &str) -> Self {
        if path_under(path, FULL_KEYS) {
            Self::Full
        } else if path_under(path, LAYOUT_KEYS) {
            Self::Layout
        } else if path_under(path, CURVATURE_KEYS) {
            Self::Curvature
        } else {
            Self::Colors
        }
    }

    /// The widest update any of `paths` needs; `None` when nothing changed.
    pub fn classify<S: AsRef<str>>(paths: &[S]) -> Option<Self> {
        paths.iter().map(|p| Self::for_path(p.as_ref())).max()
    }
}

/// Capabilities every chart variant offers to an application shell.
pub trait Chart {
    fn kind(&self) -> ChartKind;
    fn render(&mut self, data: &Dataset) -> Result<RenderSummary>;
    /// Applies options and reports which update they triggered.
    fn update_config(&mut self, options: &Value) -> Result<Option<UpdateType>>;
    fn export_svg(&self) -> Result<String>;
    fn export_png(&self) -> Result<Vec<u8>>;
    fn destroy(&mut self);
}

/// User edits that survive re-layout.
#[derive(Debug, Clone, Default, PartialEq)]
struct Overrides {
    offsets: IndexMap<String, f64>,
    colors: IndexMap<String, String>,
    labels: IndexMap<String, Vec<String>>,
}

impl Overrides {
    fn retain_existing(&mut self, graph: &ProcessedGraph) {
        let dropped = self.offsets.len() + self.colors.len() + self.labels.len();
        self.offsets.retain(|id, _| graph.node(id).is_some());
        self.colors.retain(|id, _| graph.node(id).is_some());
        self.labels.retain(|id, _| graph.node(id).is_some());
        let dropped = dropped - (self.offsets.len() + self.colors.len() + self.labels.len());
        if dropped > 0 {
            tracing::debug!(dropped, "dropped overrides for removed nodes");
        }
    }

    fn apply_to_graph(&self, graph: &mut ProcessedGraph) {
        for (id, color) in &self.colors {
            if let Some(node) = graph.node_mut(id) {
                node.color = Some(color.clone());
            }
        }
        for (id, lines) in &self.labels {
            if let Some(node) = graph.node_mut(id) {
                node.label_lines = lines.clone();
            }
        }
    }

    fn apply_offsets(&self, layout: &mut ChartLayout) {
        let Some(sankey) = layout.as_sankey_mut() else {
            return;
        };
        for (id, dy) in &self.offsets {
            if let Some(i) = sankey.nodes.iter().position(|n| n.id == *id) {
                shift_node(sankey, i, *dy);
            }
        }
    }
}

/// Orchestrates one chart instance.
#[derive(Debug)]
pub struct ChartController {
    state: ChartState,
    config: ConfigStore,
    processor: DataProcessor,
    renderer: Renderer,
    surface: SvgSurface,
    interactions: InteractionLayer,
    events: EventBus,
    coalescer: UpdateCoalescer,
    overrides: Overrides,
    data: Option<Dataset>,
    graph: Option<ProcessedGraph>,
    layout: Option<ChartLayout>,
    last_summary: RenderSummary,
}

impl ChartController {
    pub fn new(kind: ChartKind) -> Result<Self> {
        Self::with_options(kind, &json!({}))
    }

    /// Builds every module in dependency order. Invalid options fail construction.
    pub fn with_options(kind: ChartKind, options: &Value) -> Result<Self> {
        tracing::debug!(kind = kind.as_str(), state = %ChartState::Initializing, "building chart");
        let config = ConfigStore::with_overrides(kind, options).map_err(|e| {
            ChartError::ModuleInitialization {
                module: "config",
                message: e.to_string(),
            }
        })?;
        let style = config.style_settings();
        let processor = DataProcessor::new(&style.labels);
        let settings = config.layout_settings();
        let surface = SvgSurface::new(settings.width, settings.height);
        let renderer = Renderer::new(style);

        Ok(Self {
            state: ChartState::Ready,
            config,
            processor,
            renderer,
            surface,
            interactions: InteractionLayer::default(),
            events: EventBus::default(),
            coalescer: UpdateCoalescer::default(),
            overrides: Overrides::default(),
            data: None,
            graph: None,
            layout: None,
            last_summary: RenderSummary::default(),
        })
    }

    /// Sets the root `id` of the emitted SVG.
    pub fn with_surface_id(mut self, id: impl Into<String>) -> Self {
        self.surface = self.surface.with_id(id);
        self
    }

    pub fn with_coalescer(mut self, coalescer: UpdateCoalescer) -> Self {
        self.coalescer = coalescer;
        self
    }

    pub fn state(&self) -> ChartState {
        self.state
    }

    pub fn kind(&self) -> ChartKind {
        self.config.kind()
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn graph(&self) -> Option<&ProcessedGraph> {
        self.graph.as_ref()
    }

    pub fn layout(&self) -> Option<&ChartLayout> {
        self.layout.as_ref()
    }

    pub fn surface(&self) -> &SvgSurface {
        &self.surface
    }

    pub fn warnings(&self) -> &[FlowWarning] {
        self.graph
            .as_ref()
            .map(|g| g.warnings.as_slice())
            .unwrap_or_default()
    }

    pub fn last_summary(&self) -> RenderSummary {
        self.last_summary
    }

    /// Transitions issued since the last call.
    pub fn take_transitions(&mut self) -> Vec<Transition> {
        self.surface.take_transitions()
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&ChartEvent) + Send + 'static,
    ) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Runs the full pipeline on `data`.
    pub fn render(&mut self, data: &Dataset) -> Result<&mut Self> {
        self.ensure_idle()?;
        self.state = ChartState::Rendering;
        self.events.emit(ChartEvent::RenderStart {
            node_count: data.nodes.len(),
            link_count: data.links.len(),
        });
        let started = Instant::now();
        if let Err(e) = self.full_pipeline(data) {
            return Err(self.fail(e));
        }
        self.data = Some(data.clone());
        self.state = ChartState::Ready;

        let (node_count, link_count) = self
            .graph
            .as_ref()
            .map_or((0, 0), |g| (g.nodes.len(), g.links.len()));
        let render_time = started.elapsed();
        tracing::info!(
            nodes = node_count,
            links = link_count,
            elapsed_ms = render_time.as_secs_f64() * 1000.0,
            "chart rendered"
        );
        self.events.emit(ChartEvent::RenderComplete {
            render_time,
            node_count,
            link_count,
        });
        Ok(self)
    }

    pub fn update_data(&mut self, data: &Dataset) -> Result<&mut Self> {
        self.render(data)
    }

    /// Relayouts at the new size. A size the layout cannot fit leaves config and surface as they
    /// were.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<&mut Self> {
        self.ensure_idle()?;
        let previous = self.config.clone();
        self.config
            .update(&json!({ "width": width, "height": height }))?;
        if let Err(e) = self.partial_update(UpdateType::Full) {
            self.rollback_config(previous);
            return Err(e);
        }
        // The renderer sizes the surface once there is something to draw.
        if self.graph.is_none() {
            self.surface.resize(width, height);
        }
        self.events.emit(ChartEvent::Resized { width, height });
        Ok(self)
    }

    /// Deep-merges `options` into the configuration and reruns as little as the change needs.
    ///
    /// When the rerun fails the previous configuration is restored.
    pub fn customize(&mut self, options: &Value) -> Result<&mut Self> {
        self.ensure_idle()?;
        let changed = self.config.changed_paths(options);
        let previous = self.config.clone();
        self.config.update(options)?;
        let Some(update) = UpdateType::classify(&changed) else {
            return Ok(self);
        };
        tracing::debug!(?update, paths = ?changed, "configuration changed");
        if let Err(e) = self.partial_update(update) {
            self.rollback_config(previous);
            return Err(e);
        }
        Ok(self)
    }

    pub fn set_curve_intensity(&mut self, intensity: f64) -> Result<&mut Self> {
        self.customize(&json!({ "curveIntensity": intensity }))
    }

    pub fn set_layer_curvature(&mut self, layer: usize, intensity: f64) -> Result<&mut Self> {
        let mut layers = Map::new();
        layers.insert(layer.to_string(), json!(intensity));
        self.customize(&json!({ "curvature": { "layerCurvature": Value::Object(layers) } }))
    }

    pub fn apply_curvature_preset(&mut self, name: &str) -> Result<&mut Self> {
        self.ensure_idle()?;
        self.config.apply_preset(name)?;
        self.partial_update(UpdateType::Curvature)?;
        Ok(self)
    }

    /// Validates `options` now and defers applying them until the coalescer's quiet period has
    /// passed (see [`ChartController::flush_pending`]).
    pub fn queue_customize(&mut self, options: &Value, now: Instant) -> Result<&mut Self> {
        self.config.clone().update(options)?;
        self.coalescer.push(options, now);
        Ok(self)
    }

    /// Applies the merged queued options if the quiet period is over. Returns whether it did.
    pub fn flush_pending(&mut self, now: Instant) -> Result<bool> {
        match self.coalescer.take_ready(now) {
            Some(options) => self.customize(&options).map(|_| true),
            None => Ok(false),
        }
    }

    pub fn flush_pending_now(&mut self) -> Result<bool> {
        match self.coalescer.take() {
            Some(options) => self.customize(&options).map(|_| true),
            None => Ok(false),
        }
    }

    pub fn has_pending(&self) -> bool {
        self.coalescer.is_pending()
    }

    /// Moves a node vertically. Only the node and its attached links are redrawn; the offset is
    /// kept across later layout passes.
    pub fn drag_node(&mut self, id: &str, dy: f64) -> Result<&mut Self> {
        self.ensure_idle()?;
        let (Some(graph), Some(layout)) = (self.graph.as_ref(), self.layout.as_mut()) else {
            return Err(ChartError::NotRendered);
        };
        let ChartLayout::Sankey(sankey) = layout else {
            return Err(ChartError::Unsupported {
                operation: "drag_node",
                kind: ChartKind::Bar.as_str(),
            });
        };
        let index = graph
            .node_index(id)
            .ok_or_else(|| ChartError::UnknownNode { id: id.to_string() })?;
        let Some((applied, touched)) = shift_node(sankey, index, dy) else {
            return Err(ChartError::UnknownNode { id: id.to_string() });
        };
        *self.overrides.offsets.entry(id.to_string()).or_insert(0.0) += applied;

        self.interactions.clear_hover(&mut self.surface);
        let mut summary = self.renderer.render_links(&mut self.surface, sankey, graph);
        summary.absorb(self.renderer.render_nodes(&mut self.surface, sankey, graph));
        self.last_summary = summary;

        tracing::debug!(id, applied, links = touched.len(), "node dragged");
        self.events.emit(ChartEvent::PartialUpdate {
            update_type: UpdateType::Layout,
        });
        Ok(self)
    }

    /// Accumulated drag offset of a node.
    pub fn node_offset(&self, id: &str) -> Option<f64> {
        self.overrides.offsets.get(id).copied()
    }

    pub fn reset_node_position(&mut self, id: &str) -> Result<&mut Self> {
        self.ensure_idle()?;
        if self.overrides.offsets.shift_remove(id).is_some() {
            self.partial_update(UpdateType::Layout)?;
        }
        Ok(self)
    }

    pub fn recolor_node(&mut self, id: &str, color: &str) -> Result<&mut Self> {
        self.ensure_idle()?;
        if let Some(rule) = self.config.rules().rule_for("colors.node") {
            rule.check("color", &Value::from(color))?;
        }
        let graph = self.graph.as_mut().ok_or(ChartError::NotRendered)?;
        let node = graph
            .node_mut(id)
            .ok_or_else(|| ChartError::UnknownNode { id: id.to_string() })?;
        node.color = Some(color.trim().to_string());
        self.overrides
            .colors
            .insert(id.to_string(), color.trim().to_string());
        self.partial_update(UpdateType::Colors)?;
        Ok(self)
    }

    /// Replaces a node's label; each line of `text` becomes one label line.
    pub fn edit_label(&mut self, id: &str, text: &str) -> Result<&mut Self> {
        self.ensure_idle()?;
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();
        if lines.is_empty() {
            return Err(ledgerflow_core::Error::Validation {
                path: format!("label.{id}"),
                message: "label text must not be empty".to_string(),
            }
            .into());
        }
        let graph = self.graph.as_mut().ok_or(ChartError::NotRendered)?;
        let node = graph
            .node_mut(id)
            .ok_or_else(|| ChartError::UnknownNode { id: id.to_string() })?;
        node.label_lines = lines.clone();
        self.overrides.labels.insert(id.to_string(), lines);
        self.partial_update(UpdateType::Colors)?;
        Ok(self)
    }

    /// Highlights everything connected to the node and returns its tooltip.
    pub fn hover_node(&mut self, id: &str) -> Result<Tooltip> {
        let graph = self.graph.as_ref().ok_or(ChartError::NotRendered)?;
        let index = graph
            .node_index(id)
            .ok_or_else(|| ChartError::UnknownNode { id: id.to_string() })?;
        if let Some(ChartLayout::Sankey(sankey)) = &self.layout {
            self.interactions.highlight(
                &mut self.surface,
                graph,
                sankey,
                node_key(id),
                &connected_subgraph(graph, index),
            );
        }
        interaction::node_tooltip(graph, index, &self.renderer.style().labels)
            .ok_or_else(|| ChartError::UnknownNode { id: id.to_string() })
    }

    /// Highlights the flow through a link (by element key) and returns its tooltip.
    pub fn hover_link(&mut self, key: &str) -> Result<Tooltip> {
        let graph = self.graph.as_ref().ok_or(ChartError::NotRendered)?;
        let Some(ChartLayout::Sankey(sankey)) = &self.layout else {
            return Err(ChartError::Unsupported {
                operation: "hover_link",
                kind: ChartKind::Bar.as_str(),
            });
        };
        let index = sankey
            .link(key)
            .map(|l| l.index)
            .ok_or_else(|| ChartError::UnknownNode { id: key.to_string() })?;
        self.interactions.highlight(
            &mut self.surface,
            graph,
            sankey,
            key.to_string(),
            &link_subgraph(graph, index),
        );
        interaction::link_tooltip(graph, index, &self.renderer.style().labels).ok_or_else(|| {
            ChartError::UnknownNode {
                id: key.to_string(),
            }
        })
    }

    pub fn clear_hover(&mut self) -> &mut Self {
        self.interactions.clear_hover(&mut self.surface);
        self
    }

    pub fn interactions(&self) -> &InteractionLayer {
        &self.interactions
    }

    /// Toggles selection of a node; returns whether it is selected afterwards.
    pub fn click_node(&mut self, id: &str) -> Result<bool> {
        let graph = self.graph.as_ref().ok_or(ChartError::NotRendered)?;
        if graph.node(id).is_none() {
            return Err(ChartError::UnknownNode { id: id.to_string() });
        }
        Ok(self.interactions.toggle_selection(id))
    }

    pub fn context_actions(&self, id: &str) -> Result<Vec<ContextAction>> {
        let graph = self.graph.as_ref().ok_or(ChartError::NotRendered)?;
        let index = graph
            .node_index(id)
            .ok_or_else(|| ChartError::UnknownNode { id: id.to_string() })?;
        let moved = self.overrides.offsets.get(id).is_some_and(|dy| *dy != 0.0);
        Ok(interaction::context_actions(graph, index, moved))
    }

    pub fn export_svg(&self) -> Result<String> {
        self.graph.as_ref().ok_or(ChartError::NotRendered)?;
        let background = self.renderer.style().export_background.as_str();
        Ok(export::svg_document(&self.surface, Some(background)))
    }

    pub fn export_csv(&self) -> Result<String> {
        let graph = self.graph.as_ref().ok_or(ChartError::NotRendered)?;
        export::csv_document(graph)
    }

    #[cfg(feature = "raster")]
    pub fn export_png(&self) -> Result<Vec<u8>> {
        let svg = self.export_svg()?;
        let style = self.renderer.style();
        export::svg_to_png(
            &svg,
            style.export_scale as f32,
            Some(style.export_background.as_str()),
        )
        .map_err(|e| ChartError::export(e.to_string()))
    }

    #[cfg(not(feature = "raster"))]
    pub fn export_png(&self) -> Result<Vec<u8>> {
        tracing::warn!("PNG export requested but the `raster` feature is disabled");
        Err(ChartError::export(
            "PNG export requires the `raster` feature",
        ))
    }

    pub fn export(&self, format: ExportFormat) -> Result<Vec<u8>> {
        match format {
            ExportFormat::Svg => self.export_svg().map(String::into_bytes),
            ExportFormat::Csv => self.export_csv().map(String::into_bytes),
            ExportFormat::Png => self.export_png(),
        }
    }

    pub async fn export_svg_async(&self) -> Result<String> {
        self.export_svg()
    }

    pub async fn export_csv_async(&self) -> Result<String> {
        self.export_csv()
    }

    pub async fn export_png_async(&self) -> Result<Vec<u8>> {
        self.export_png()
    }

    /// Clears the surface and every module's state. The chart accepts no further calls.
    pub fn destroy(&mut self) {
        self.surface.clear();
        self.interactions = InteractionLayer::default();
        self.coalescer.take();
        self.overrides = Overrides::default();
        self.data = None;
        self.graph = None;
        self.layout = None;
        self.events.clear();
        self.state = ChartState::Uninitialized;
        tracing::debug!("chart destroyed");
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.state {
            ChartState::Ready | ChartState::Error => Ok(()),
            state => Err(ChartError::InvalidState { state }),
        }
    }

    fn fail(&mut self, error: ChartError) -> ChartError {
        tracing::warn!(%error, "chart update failed");
        self.state = ChartState::Error;
        self.events.emit(ChartEvent::RenderError {
            error: error.to_string(),
        });
        error
    }

    fn rollback_config(&mut self, previous: ConfigStore) {
        self.config = previous;
        let style = self.config.style_settings();
        self.processor = DataProcessor::new(&style.labels);
        self.renderer.set_style(style);
    }

    fn compute_layout(&self, graph: &ProcessedGraph) -> Result<ChartLayout> {
        let settings = self.config.layout_settings();
        let mut layout = match self.config.kind() {
            ChartKind::Sankey => ChartLayout::Sankey(layout_sankey(graph, &settings)?),
            ChartKind::Bar => ChartLayout::Bar(layout_bars(graph, &settings)?),
        };
        self.overrides.apply_offsets(&mut layout);
        Ok(layout)
    }

    fn full_pipeline(&mut self, data: &Dataset) -> Result<()> {
        let style = self.config.style_settings();
        self.processor = DataProcessor::new(&style.labels);
        self.renderer.set_style(style);

        let mut graph = self.processor.process(data)?;
        self.events.emit(ChartEvent::DataProcessed {
            node_count: graph.nodes.len(),
            link_count: graph.links.len(),
            warning_count: graph.warnings.len(),
        });

        let mut overrides = self.overrides.clone();
        overrides.retain_existing(&graph);
        overrides.apply_to_graph(&mut graph);
        let previous = std::mem::replace(&mut self.overrides, overrides);
        let layout = match self.compute_layout(&graph) {
            Ok(layout) => layout,
            Err(e) => {
                self.overrides = previous;
                return Err(e);
            }
        };

        self.interactions.clear_hover(&mut self.surface);
        self.interactions.retain_existing(&graph);
        self.last_summary = self.renderer.render(&mut self.surface, &layout, &graph);
        self.graph = Some(graph);
        self.layout = Some(layout);
        Ok(())
    }

    fn partial_update(&mut self, update: UpdateType) -> Result<()> {
        if self.graph.is_none() {
            return Ok(());
        }
        self.state = ChartState::PartiallyUpdating;
        if let Err(e) = self.run_partial(update) {
            return Err(self.fail(e));
        }
        self.state = ChartState::Ready;
        self.events.emit(ChartEvent::PartialUpdate {
            update_type: update,
        });
        Ok(())
    }

    fn run_partial(&mut self, update: UpdateType) -> Result<()> {
        if update == UpdateType::Full {
            let data = self.data.clone().ok_or(ChartError::NotRendered)?;
            return self.full_pipeline(&data);
        }

        self.renderer.set_style(self.config.style_settings());
        self.interactions.clear_hover(&mut self.surface);
        let graph = self.graph.as_ref().ok_or(ChartError::NotRendered)?;
        self.last_summary = match update {
            UpdateType::Layout => {
                let layout = self.compute_layout(graph)?;
                let summary = self.renderer.render(&mut self.surface, &layout, graph);
                self.layout = Some(layout);
                summary
            }
            UpdateType::Curvature => match self.layout.as_mut() {
                Some(ChartLayout::Sankey(sankey)) => {
                    compute_link_paths(sankey, &self.config.curvature_settings());
                    // Coalesced updates may carry color changes alongside curvature.
                    let mut summary = self.renderer.render_links(&mut self.surface, sankey, graph);
                    summary.absorb(self.renderer.render_colors(&mut self.surface, sankey, graph));
                    summary
                }
                Some(ChartLayout::Bar(bars)) => {
                    self.renderer.render_bars(&mut self.surface, bars, graph)
                }
                None => return Err(ChartError::NotRendered),
            },
            UpdateType::Colors | UpdateType::Full => match self.layout.as_ref() {
                Some(ChartLayout::Sankey(sankey)) => {
                    self.renderer.render_colors(&mut self.surface, sankey, graph)
                }
                Some(ChartLayout::Bar(bars)) => {
                    self.renderer.render_bars(&mut self.surface, bars, graph)
                }
                None => return Err(ChartError::NotRendered),
            },
        };
        Ok(())
    }
}

impl Chart for ChartController {
    fn kind(&self) -> ChartKind {
        self.config.kind()
    }

    fn render(&mut self, data: &Dataset) -> Result<RenderSummary> {
        ChartController::render(self, data).map(|c| c.last_summary)
    }

    fn update_config(&mut self, options: &Value) -> Result<Option<UpdateType>> {
        let changed = self.config.changed_paths(options);
        self.customize(options)?;
        Ok(UpdateType::classify(&changed))
    }

    fn export_svg(&self) -> Result<String> {
        ChartController::export_svg(self)
    }

    fn export_png(&self) -> Result<Vec<u8>> {
        ChartController::export_png(self)
    }

    fn destroy(&mut self) {
        ChartController::destroy(self)
    }
}
