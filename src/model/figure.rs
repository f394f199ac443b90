//! In-memory chart model, serialized as a plotly.js figure (`data` + `layout`).

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

use super::style::{StyleDescriptor, TraceMode, Visibility};

/// A point coordinate on a category-free axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coord {
    Time(NaiveDateTime),
    Number(f64),
}

impl Serialize for Coord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Coord::Time(t) => serializer.collect_str(&t.format("%Y-%m-%d %H:%M:%S")),
            Coord::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

/// plotly's `visible` attribute: `true` or `"legendonly"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visible(pub Visibility);

impl Serialize for Visible {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Visibility::Shown => serializer.serialize_bool(true),
            Visibility::LegendOnly => serializer.serialize_str("legendonly"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Scatter,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Line {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: TraceKind,
    pub name: String,
    pub x: Vec<Coord>,
    pub y: Vec<Coord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<TraceMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    /// Bar thickness in data units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
    pub visible: Visible,
}

impl Trace {
    /// Scatter trace styled from a descriptor.
    pub fn scatter(name: &str, x: Vec<Coord>, y: Vec<Coord>, style: &StyleDescriptor) -> Self {
        let line = match style.mode {
            TraceMode::Lines | TraceMode::LinesMarkers => Some(Line {
                color: Some(style.color.clone()),
                ..Default::default()
            }),
            TraceMode::Markers => None,
        };
        Trace {
            kind: TraceKind::Scatter,
            name: name.to_string(),
            x,
            y,
            mode: Some(style.mode),
            marker: Some(Marker {
                color: Some(style.color.clone()),
                symbol: style.symbol.clone(),
                size: style.size,
            }),
            line,
            opacity: None,
            orientation: None,
            width: None,
            yaxis: None,
            showlegend: None,
            visible: Visible(style.visibility),
        }
    }

    /// Plain bar trace in one color.
    pub fn bar(name: &str, x: Vec<Coord>, y: Vec<Coord>, color: &str) -> Self {
        Trace {
            kind: TraceKind::Bar,
            name: name.to_string(),
            x,
            y,
            mode: None,
            marker: Some(Marker {
                color: Some(color.to_string()),
                ..Default::default()
            }),
            line: None,
            opacity: None,
            orientation: None,
            width: None,
            yaxis: None,
            showlegend: None,
            visible: Visible(Visibility::Shown),
        }
    }

    pub fn on_axis(mut self, axis: &str) -> Self {
        self.yaxis = Some(axis.to_string());
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn visible(mut self, visibility: Visibility) -> Self {
        self.visible = Visible(visibility);
        self
    }
}

// ── Layout ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

impl Title {
    pub fn new(text: impl Into<String>) -> Self {
        Title { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Font {
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlaying: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showgrid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gridcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickformat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickvals: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticktext: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Axis {
    pub fn titled(text: &str) -> Self {
        Axis {
            title: Some(Title::new(text)),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Margin {
    pub l: u32,
    pub r: u32,
    pub t: u32,
    pub b: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub orientation: String,
    pub yanchor: String,
    pub y: f64,
    pub xanchor: String,
    pub x: f64,
}

impl Legend {
    /// Horizontal legend above the plot, right-aligned.
    pub fn horizontal_top() -> Self {
        Legend {
            orientation: "h".to_string(),
            yanchor: "bottom".to_string(),
            y: 1.02,
            xanchor: "right".to_string(),
            x: 1.0,
        }
    }
}

/// Full-width horizontal reference line at `y`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
    #[serde(rename = "type")]
    pub kind: String,
    pub xref: String,
    pub yref: String,
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    pub line: Line,
}

impl Shape {
    pub fn hline(y: f64, color: &str, dash: &str) -> Self {
        Shape {
            kind: "line".to_string(),
            xref: "paper".to_string(),
            yref: "y".to_string(),
            x0: 0.0,
            x1: 1.0,
            y0: y,
            y1: y,
            line: Line {
                color: Some(color.to_string()),
                width: Some(1.5),
                dash: Some(dash.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub xref: String,
    pub yref: String,
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub showarrow: bool,
    pub xanchor: String,
    pub yanchor: String,
    pub font: Font,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Layout {
    pub title: Option<Title>,
    pub xaxis: Axis,
    pub yaxis: Axis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis2: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis3: Option<Axis>,
    pub plot_bgcolor: String,
    pub paper_bgcolor: String,
    pub font: Font,
    pub autosize: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<Margin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shapes: Vec<Shape>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl Layout {
    /// Black background with white text, sized by its container.
    pub fn dark(title: impl Into<String>) -> Self {
        Layout {
            title: Some(Title::new(title)),
            plot_bgcolor: "black".to_string(),
            paper_bgcolor: "black".to_string(),
            font: Font {
                color: "white".to_string(),
                size: None,
            },
            autosize: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    pub fn new(layout: Layout) -> Self {
        Figure {
            data: Vec::new(),
            layout,
        }
    }

    pub fn add_trace(&mut self, trace: Trace) {
        self.data.push(trace);
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
