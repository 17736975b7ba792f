use crate::format::{escape_xml, fmt};
use crate::surface::{DrawingSurface, Element, Group, Shape, Transition};
use indexmap::IndexMap;
use std::fmt::Write as _;

/// In-memory retained surface that serializes to a standalone SVG document.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgSurface {
    id: String,
    width: f64,
    height: f64,
    elements: IndexMap<String, Element>,
    transitions: Vec<Transition>,
}

impl SvgSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            id: "ledgerflow".to_string(),
            width,
            height,
            elements: IndexMap::new(),
            transitions: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    /// Every transition issued since the last [`SvgSurface::take_transitions`].
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn take_transitions(&mut self) -> Vec<Transition> {
        std::mem::take(&mut self.transitions)
    }

    pub fn clear(&mut self) {
        self.elements.clear();
        self.transitions.clear();
    }

    pub fn to_svg(&self) -> String {
        self.to_svg_with_background(None)
    }

    /// Serializes the final state of every element; transitions are not baked in.
    pub fn to_svg_with_background(&self, background: Option<&str>) -> String {
        let mut out = String::new();
        let _ = write!(
            &mut out,
            r#"<svg id="{id}" xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" role="graphics-document document" aria-roledescription="sankey">"#,
            id = escape_xml(&self.id),
            w = fmt(self.width),
            h = fmt(self.height),
        );
        if let Some(bg) = background {
            let _ = write!(
                &mut out,
                r#"<rect class="background" x="0" y="0" width="{w}" height="{h}" fill="{fill}"/>"#,
                w = fmt(self.width),
                h = fmt(self.height),
                fill = escape_xml(bg),
            );
        }
        for group in Group::ALL {
            let _ = write!(&mut out, r#"<g class="{}">"#, group.as_str());
            for el in self.elements.values().filter(|e| e.group == group) {
                write_element(&mut out, el);
            }
            out.push_str("</g>");
        }
        out.push_str("</svg>");
        out
    }
}

fn write_common_attrs(out: &mut String, el: &Element) {
    let _ = write!(out, r#" data-key="{}""#, escape_xml(&el.key));
    for (name, value) in &el.data {
        let _ = write!(out, r#" data-{}="{}""#, escape_xml(name), escape_xml(value));
    }
    let s = &el.style;
    if let Some(class) = &s.class {
        let _ = write!(out, r#" class="{}""#, escape_xml(class));
    }
    match &s.fill {
        Some(fill) => {
            let _ = write!(out, r#" fill="{}""#, escape_xml(fill));
        }
        None if !matches!(el.shape, Shape::Text { .. }) => out.push_str(r#" fill="none""#),
        None => {}
    }
    if let Some(stroke) = &s.stroke {
        let _ = write!(out, r#" stroke="{}""#, escape_xml(stroke));
    }
    if let Some(sw) = s.stroke_width {
        let _ = write!(out, r#" stroke-width="{}""#, fmt(sw));
    }
    if let Some(opacity) = s.opacity {
        let _ = write!(out, r#" opacity="{}""#, fmt(opacity));
    }
    if let Some(size) = s.font_size {
        let _ = write!(out, r#" font-size="{}""#, fmt(size));
    }
    if let Some(weight) = &s.font_weight {
        let _ = write!(out, r#" font-weight="{}""#, escape_xml(weight));
    }
    if el.interactive {
        out.push_str(r#" pointer-events="all""#);
    }
}

fn write_element(out: &mut String, el: &Element) {
    match &el.shape {
        Shape::Rect {
            x,
            y,
            width,
            height,
        } => {
            let _ = write!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}""#,
                fmt(*x),
                fmt(*y),
                fmt(*width),
                fmt(*height)
            );
            write_common_attrs(out, el);
            out.push_str("/>");
        }
        Shape::Path { d } => {
            let _ = write!(out, r#"<path d="{}""#, escape_xml(d));
            write_common_attrs(out, el);
            out.push_str("/>");
        }
        Shape::Text {
            x,
            y,
            anchor,
            lines,
            line_height,
        } => {
            let _ = write!(
                out,
                r#"<text x="{}" y="{}" text-anchor="{}""#,
                fmt(*x),
                fmt(*y),
                anchor.as_str()
            );
            write_common_attrs(out, el);
            out.push('>');
            for (i, line) in lines.iter().enumerate() {
                let dy = if i == 0 { 0.0 } else { *line_height };
                let _ = write!(
                    out,
                    r#"<tspan x="{}" dy="{}">{}</tspan>"#,
                    fmt(*x),
                    fmt(dy),
                    escape_xml(line)
                );
            }
            out.push_str("</text>");
        }
    }
}

impl DrawingSurface for SvgSurface {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    fn get(&self, key: &str) -> Option<&Element> {
        self.elements.get(key)
    }

    fn keys_in(&self, group: Group) -> Vec<String> {
        self.elements
            .values()
            .filter(|e| e.group == group)
            .map(|e| e.key.clone())
            .collect()
    }

    fn put(&mut self, element: Element) {
        self.elements.insert(element.key.clone(), element);
    }

    fn remove(&mut self, key: &str) -> Option<Element> {
        self.elements.shift_remove(key)
    }

    fn animate(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }
}
