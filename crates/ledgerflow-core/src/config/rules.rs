use crate::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    Number { min: f64, max: f64 },
    Bool,
    Text,
    Color,
    OneOf(&'static [&'static str]),
    /// A nested map; children are validated by their own rules.
    Object,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub kind: RuleKind,
    pub nullable: bool,
}

impl Rule {
    pub const fn range(min: f64, max: f64) -> Self {
        Self {
            kind: RuleKind::Number { min, max },
            nullable: false,
        }
    }

    pub const fn of(kind: RuleKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn check(&self, path: &str, value: &Value) -> Result<()> {
        if value.is_null() {
            return if self.nullable {
                Ok(())
            } else {
                Err(Error::validation(path, "value must not be null"))
            };
        }
        match &self.kind {
            RuleKind::Number { min, max } => {
                let Some(v) = value.as_f64() else {
                    return Err(Error::validation(path, format!("expected a number, got {value}")));
                };
                if !v.is_finite() || v < *min || v > *max {
                    return Err(Error::validation(
                        path,
                        format!("{v} is outside the allowed range [{min}, {max}]"),
                    ));
                }
                Ok(())
            }
            RuleKind::Bool => value
                .is_boolean()
                .then_some(())
                .ok_or_else(|| Error::validation(path, format!("expected a boolean, got {value}"))),
            RuleKind::Text => value
                .is_string()
                .then_some(())
                .ok_or_else(|| Error::validation(path, format!("expected a string, got {value}"))),
            RuleKind::Color => {
                let Some(s) = value.as_str() else {
                    return Err(Error::validation(path, format!("expected a color, got {value}")));
                };
                if color_re().is_match(s.trim()) {
                    Ok(())
                } else {
                    Err(Error::validation(path, format!("`{s}` is not a color")))
                }
            }
            RuleKind::OneOf(allowed) => {
                let s = value.as_str().unwrap_or_default();
                if allowed.contains(&s) {
                    Ok(())
                } else {
                    Err(Error::validation(
                        path,
                        format!("expected one of {allowed:?}, got {value}"),
                    ))
                }
            }
            RuleKind::Object => value
                .is_object()
                .then_some(())
                .ok_or_else(|| Error::validation(path, format!("expected an object, got {value}"))),
        }
    }
}

fn color_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(#[0-9a-fA-F]{3}|#[0-9a-fA-F]{4}|#[0-9a-fA-F]{6}|#[0-9a-fA-F]{8}|rgba?\([0-9.,%\s]+\)|hsla?\([0-9.,%\s]+\)|[a-zA-Z]+)$",
        )
        .expect("valid regex")
    })
}

/// Path patterns mapped to rules. `*` matches exactly one path segment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleSet {
    entries: Vec<(Vec<String>, Rule)>,
}

impl RuleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        let mut set = Self::empty();
        for (pattern, rule) in STANDARD_RULES {
            set.register(pattern, rule.clone());
        }
        set
    }

    pub fn register(&mut self, pattern: &str, rule: Rule) {
        let segments = pattern.split('.').map(str::to_string).collect::<Vec<_>>();
        self.entries.retain(|(existing, _)| *existing != segments);
        self.entries.push((segments, rule));
    }

    pub fn rule_for(&self, dotted_path: &str) -> Option<&Rule> {
        let segments = dotted_path.split('.').collect::<Vec<_>>();
        self.entries
            .iter()
            .find(|(pattern, _)| {
                pattern.len() == segments.len()
                    && pattern
                        .iter()
                        .zip(&segments)
                        .all(|(p, s)| p == "*" || p == s)
            })
            .map(|(_, rule)| rule)
    }

    /// Validates `value` at `dotted_path` and, for objects, every nested entry.
    ///
    /// Paths without a registered rule are accepted as free-form keys.
    pub fn validate_tree(&self, dotted_path: &str, value: &Value) -> Result<()> {
        match self.rule_for(dotted_path) {
            Some(rule) => {
                rule.check(dotted_path, value)?;
                if rule.kind == RuleKind::Object {
                    self.validate_children(dotted_path, value)?;
                }
                Ok(())
            }
            None => self.validate_children(dotted_path, value),
        }
    }

    fn validate_children(&self, dotted_path: &str, value: &Value) -> Result<()> {
        let Some(map) = value.as_object() else {
            return Ok(());
        };
        for (key, child) in map {
            self.validate_tree(&format!("{dotted_path}.{key}"), child)?;
        }
        Ok(())
    }
}

const STANDARD_RULES: &[(&str, Rule)] = &[
    ("chartType", Rule::of(RuleKind::OneOf(&["sankey", "bar"]))),
    ("width", Rule::range(400.0, 5000.0)),
    ("height", Rule::range(300.0, 3000.0)),
    ("margin", Rule::of(RuleKind::Object)),
    ("margin.top", Rule::range(0.0, 500.0)),
    ("margin.right", Rule::range(0.0, 500.0)),
    ("margin.bottom", Rule::range(0.0, 500.0)),
    ("margin.left", Rule::range(0.0, 500.0)),
    ("nodeWidth", Rule::range(5.0, 60.0)),
    ("nodePadding", Rule::range(0.0, 120.0)),
    ("minNodeHeight", Rule::range(0.0, 50.0)),
    ("maxNodeHeightRatio", Rule::range(0.1, 1.0)),
    ("scaleFactor", Rule::range(0.1, 2.0)),
    ("layerSpacing", Rule::of(RuleKind::Object)),
    ("layerSpacing.leftmost", Rule::range(0.1, 3.0)),
    ("layerSpacing.middle", Rule::range(0.1, 3.0)),
    ("layerSpacing.rightmost", Rule::range(0.1, 3.0)),
    ("curveIntensity", Rule::range(0.1, 0.8)),
    ("curvature", Rule::of(RuleKind::Object)),
    ("curvature.layerCurvature", Rule::of(RuleKind::Object)),
    ("curvature.layerCurvature.*", Rule::range(0.1, 0.8)),
    ("autoCenter", Rule::of(RuleKind::Bool)),
    ("autoMiddleAlign", Rule::of(RuleKind::Bool)),
    ("dynamicSpaceFill", Rule::of(RuleKind::Bool)),
    ("animationDuration", Rule::range(0.0, 10_000.0)),
    ("linkOpacity", Rule::range(0.0, 1.0)),
    ("nodeOpacity", Rule::range(0.0, 1.0)),
    ("colors", Rule::of(RuleKind::Object)),
    ("colors.*", Rule::of(RuleKind::Color)),
    ("labels", Rule::of(RuleKind::Object)),
    ("labels.fontSize", Rule::range(6.0, 48.0)),
    ("labels.maxLabelWidth", Rule::range(40.0, 600.0)),
    ("labels.showValues", Rule::of(RuleKind::Bool)),
    ("labels.showPercentages", Rule::of(RuleKind::Bool)),
    ("labels.prefix", Rule::of(RuleKind::Text)),
    ("labels.suffix", Rule::of(RuleKind::Text)),
    ("labels.distance", Rule::of(RuleKind::Object)),
    ("labels.distance.leftmost", Rule::range(0.0, 100.0)),
    ("labels.distance.middle", Rule::range(0.0, 100.0)),
    ("labels.distance.rightmost", Rule::range(0.0, 100.0)),
    ("title", Rule::of(RuleKind::Text).nullable()),
    ("bar", Rule::of(RuleKind::Object)),
    ("bar.padding", Rule::range(0.0, 0.9)),
    ("bar.sortDescending", Rule::of(RuleKind::Bool)),
    ("export", Rule::of(RuleKind::Object)),
    ("export.pngScale", Rule::range(0.5, 8.0)),
    ("export.background", Rule::of(RuleKind::Color)),
];
