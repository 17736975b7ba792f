//! Chart configuration store.
//!
//! The store keeps every layout and visual knob in a single JSON tree. Paths are dotted
//! (`margin.left`, `curvature.layerCurvature.2`) and every write goes through the registered
//! validation rules before it touches the tree.

mod defaults;
mod rules;
mod settings;

#[cfg(test)]
mod tests;

use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub use defaults::{chart_defaults, global_defaults};
pub use rules::{Rule, RuleKind, RuleSet};
pub use settings::{
    CurvatureSettings, LabelDistance, LabelSettings, LayerSpacing, LayoutSettings, Margin,
    StyleSettings,
};

pub const LAYER_CURVATURE_PATH: &str = "curvature.layerCurvature";

/// Chart variants sharing one configuration schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Sankey,
    Bar,
}

impl ChartKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sankey => "sankey",
            Self::Bar => "bar",
        }
    }
}

impl std::str::FromStr for ChartKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sankey" => Ok(Self::Sankey),
            "bar" => Ok(Self::Bar),
            other => Err(Error::NotFound {
                kind: "chart type",
                name: other.to_string(),
            }),
        }
    }
}

/// Per-layer curvature presets keyed by name.
pub type CurvaturePreset = BTreeMap<usize, f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigStore {
    kind: ChartKind,
    baseline: Value,
    value: Value,
    rules: RuleSet,
    presets: IndexMap<String, CurvaturePreset>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(ChartKind::Sankey)
    }
}

impl ConfigStore {
    /// Builds a store from global defaults layered under the chart-type defaults.
    pub fn new(kind: ChartKind) -> Self {
        let mut baseline = global_defaults();
        deep_merge_value(&mut baseline, &chart_defaults(kind));
        set_path(&mut baseline, "chartType", Value::String(kind.as_str().to_string()));

        Self {
            kind,
            value: baseline.clone(),
            baseline,
            rules: RuleSet::standard(),
            presets: defaults::curvature_presets(),
        }
    }

    /// Builds a store and applies instance overrides on top of the layered defaults.
    ///
    /// Overrides go through the same all-or-nothing validation as [`ConfigStore::update`].
    pub fn with_overrides(kind: ChartKind, overrides: &Value) -> Result<Self> {
        let mut store = Self::new(kind);
        store.update(overrides)?;
        Ok(store)
    }

    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Returns an owned copy of the value at `dotted_path`.
    pub fn get(&self, dotted_path: &str) -> Option<Value> {
        lookup(&self.value, dotted_path).cloned()
    }

    pub fn get_f64(&self, dotted_path: &str) -> Option<f64> {
        lookup(&self.value, dotted_path)?.as_f64()
    }

    pub fn get_bool(&self, dotted_path: &str) -> Option<bool> {
        lookup(&self.value, dotted_path)?.as_bool()
    }

    pub fn get_str(&self, dotted_path: &str) -> Option<&str> {
        lookup(&self.value, dotted_path)?.as_str()
    }

    /// Returns an owned copy of the whole tree (round-trips through [`ConfigStore::update`]).
    pub fn get_all(&self) -> Value {
        self.value.clone()
    }

    /// Validates and writes a single value.
    ///
    /// Object values merge into the existing object at `dotted_path` the same way
    /// [`ConfigStore::update`] does, so `set("margin", {"top": 10})` keeps the other margins.
    pub fn set(&mut self, dotted_path: &str, value: Value) -> Result<()> {
        if dotted_path.is_empty() {
            return Err(Error::validation(dotted_path, "empty configuration path"));
        }
        self.check_parents(dotted_path)?;
        self.rules.validate_tree(dotted_path, &value)?;
        if dotted_path == "chartType" {
            self.check_chart_type(&value)?;
        }
        tracing::debug!(path = dotted_path, "config set");
        deep_merge_value(&mut self.value, &nest(dotted_path, value));
        Ok(())
    }

    /// Deep-merges `incoming` into the store. Every leaf is validated before anything is applied.
    pub fn update(&mut self, incoming: &Value) -> Result<()> {
        let Some(map) = incoming.as_object() else {
            return Err(Error::validation("", "configuration update must be an object"));
        };
        for (key, value) in map {
            self.rules.validate_tree(key, value)?;
        }
        if let Some(kind) = map.get("chartType") {
            self.check_chart_type(kind)?;
        }
        deep_merge_value(&mut self.value, incoming);
        Ok(())
    }

    /// Restores the layered defaults the store was built with.
    pub fn reset(&mut self) {
        self.value = self.baseline.clone();
    }

    /// Leaf paths of `incoming` whose value differs from the current store.
    pub fn changed_paths(&self, incoming: &Value) -> Vec<String> {
        let mut leaves = Vec::new();
        collect_leaves("", incoming, &mut leaves);
        leaves
            .into_iter()
            .filter(|(path, value)| lookup(&self.value, path) != Some(*value))
            .map(|(path, _)| path)
            .collect()
    }

    pub fn preset_names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    pub fn preset(&self, name: &str) -> Option<&CurvaturePreset> {
        self.presets.get(name)
    }

    /// Registers (or replaces) a named curvature preset.
    pub fn register_preset(&mut self, name: &str, layers: CurvaturePreset) -> Result<()> {
        for (layer, intensity) in &layers {
            let path = format!("{LAYER_CURVATURE_PATH}.{layer}");
            self.rules.validate_tree(&path, &Value::from(*intensity))?;
        }
        self.presets.insert(name.to_string(), layers);
        Ok(())
    }

    /// Replaces the per-layer curvature map with a named preset. Nothing else changes.
    pub fn apply_preset(&mut self, name: &str) -> Result<()> {
        let preset = self.presets.get(name).ok_or_else(|| Error::NotFound {
            kind: "curvature preset",
            name: name.to_string(),
        })?;
        let map = preset
            .iter()
            .map(|(layer, intensity)| (layer.to_string(), Value::from(*intensity)))
            .collect::<Map<String, Value>>();
        set_path(&mut self.value, LAYER_CURVATURE_PATH, Value::Object(map));
        Ok(())
    }

    /// Per-layer curvature as configured; entries with non-numeric keys are skipped.
    pub fn layer_curvature(&self) -> BTreeMap<usize, f64> {
        let Some(map) = lookup(&self.value, LAYER_CURVATURE_PATH).and_then(Value::as_object) else {
            return BTreeMap::new();
        };
        map.iter()
            .filter_map(|(k, v)| Some((k.parse::<usize>().ok()?, v.as_f64()?)))
            .collect()
    }

    /// Every proper prefix of `dotted_path` must be an object, both by rule and in the tree.
    fn check_parents(&self, dotted_path: &str) -> Result<()> {
        let mut prefix = String::new();
        let mut segments = dotted_path.split('.').peekable();
        while let Some(seg) = segments.next() {
            if segments.peek().is_none() {
                break;
            }
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(seg);

            let rule_is_scalar = self
                .rules
                .rule_for(&prefix)
                .is_some_and(|rule| rule.kind != RuleKind::Object);
            let value_is_scalar = lookup(&self.value, &prefix).is_some_and(|v| !v.is_object());
            if rule_is_scalar || value_is_scalar {
                return Err(Error::validation(
                    dotted_path,
                    format!("`{prefix}` is not an object"),
                ));
            }
        }
        Ok(())
    }

    fn check_chart_type(&self, value: &Value) -> Result<()> {
        let requested = value.as_str().unwrap_or_default();
        if requested != self.kind.as_str() {
            return Err(Error::validation(
                "chartType",
                format!(
                    "chart type is fixed at construction ({}), got `{requested}`",
                    self.kind.as_str()
                ),
            ));
        }
        Ok(())
    }
}

pub(crate) fn lookup<'a>(root: &'a Value, dotted_path: &str) -> Option<&'a Value> {
    let mut cur = root;
    for segment in dotted_path.split('.') {
        cur = cur.as_object()?.get(segment)?;
    }
    Some(cur)
}

fn set_path(root: &mut Value, dotted_path: &str, value: Value) {
    if !root.is_object() {
        *root = Value::Object(Map::new());
    }
    let Value::Object(root) = root else {
        return;
    };
    let mut cur: &mut Map<String, Value> = root;
    let mut segments = dotted_path.split('.').peekable();
    while let Some(seg) = segments.next() {
        if segments.peek().is_none() {
            cur.insert(seg.to_string(), value);
            return;
        }
        let slot = cur
            .entry(seg)
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Some(next) = slot.as_object_mut() else {
            return;
        };
        cur = next;
    }
}

/// Wraps `value` in one object per path segment.
fn nest(dotted_path: &str, value: Value) -> Value {
    dotted_path.rsplit('.').fold(value, |child, seg| {
        let mut map = Map::new();
        map.insert(seg.to_string(), child);
        Value::Object(map)
    })
}

/// Recursively merges `incoming` into `base`; non-object values replace.
pub fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}

fn collect_leaves<'a>(prefix: &str, value: &'a Value, out: &mut Vec<(String, &'a Value)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                collect_leaves(&path, child, out);
            }
        }
        other if !prefix.is_empty() => out.push((prefix.to_string(), other)),
        _ => {}
    }
}
