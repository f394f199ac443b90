use std::collections::{BTreeMap, HashMap};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How a scatter trace draws its points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum TraceMode {
    #[serde(rename = "lines")]
    Lines,
    #[serde(rename = "markers")]
    Markers,
    #[serde(rename = "lines+markers")]
    LinesMarkers,
}

/// Whether a series is drawn on first load or only listed in the legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Shown,
    #[default]
    LegendOnly,
}

/// Rendering attributes for one named series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StyleDescriptor {
    /// CSS color name or hex string.
    pub color: String,
    /// Plotly marker symbol (`circle`, `square-open`, `triangle-up`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    pub mode: TraceMode,
    #[serde(default)]
    pub visibility: Visibility,
    /// Marker size in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl StyleDescriptor {
    /// Neutral descriptor for series with no entry.
    pub fn fallback() -> Self {
        StyleDescriptor {
            color: "gray".to_string(),
            symbol: Some("circle".to_string()),
            mode: TraceMode::Markers,
            visibility: Visibility::LegendOnly,
            size: None,
        }
    }

    fn marker(color: &str, symbol: &str) -> Self {
        StyleDescriptor {
            color: color.to_string(),
            symbol: Some(symbol.to_string()),
            mode: TraceMode::Markers,
            visibility: Visibility::LegendOnly,
            size: None,
        }
    }

    fn line(color: &str) -> Self {
        StyleDescriptor {
            color: color.to_string(),
            symbol: None,
            mode: TraceMode::Lines,
            visibility: Visibility::LegendOnly,
            size: None,
        }
    }

    fn sized(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }
}

/// Read-only lookup from series name to style. Unknown names get the fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleTable {
    entries: HashMap<String, StyleDescriptor>,
    fallback: StyleDescriptor,
    /// Series that is always drawn on first load.
    reference: Option<String>,
}

impl Default for StyleTable {
    fn default() -> Self {
        StyleTable {
            entries: HashMap::new(),
            fallback: StyleDescriptor::fallback(),
            reference: None,
        }
    }
}

impl StyleTable {
    pub fn new(entries: HashMap<String, StyleDescriptor>) -> Self {
        StyleTable {
            entries,
            ..Default::default()
        }
    }

    /// Mark `series` as the one that is always initially visible.
    pub fn with_reference(mut self, series: impl Into<String>) -> Self {
        self.reference = Some(series.into());
        self
    }

    /// Replace or add entries by series name.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, StyleDescriptor>) -> Self {
        for (name, style) in overrides {
            self.entries.insert(name.clone(), style.clone());
        }
        self
    }

    /// The configured descriptor for `series`, or the fallback.
    pub fn lookup(&self, series: &str) -> &StyleDescriptor {
        self.entries.get(series).unwrap_or(&self.fallback)
    }

    /// Initial visibility, honouring the reference series.
    pub fn visibility_of(&self, series: &str) -> Visibility {
        if self.reference.as_deref() == Some(series) {
            Visibility::Shown
        } else {
            self.lookup(series).visibility
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Built-in tables ─────────────────────────────────────────────────

/// Marker table for GEX history overlays.
pub fn gex_history_styles() -> StyleTable {
    let mut spot = StyleDescriptor::line("blue");
    spot.visibility = Visibility::Shown;
    let entries = [
        ("SPOT", spot),
        ("MAXGEX", StyleDescriptor::marker("red", "square-open")),
        ("MINGEX", StyleDescriptor::marker("green", "square-open")),
        ("MAXVEX", StyleDescriptor::marker("red", "x")),
        ("MINVEX", StyleDescriptor::marker("green", "x")),
        ("MAXDEX", StyleDescriptor::marker("red", "diamond")),
        ("MINDEX", StyleDescriptor::marker("green", "diamond")),
        ("ZERO", StyleDescriptor::marker("yellow", "circle-open")),
        ("MAXCP", StyleDescriptor::marker("red", "circle")),
        ("MINCP", StyleDescriptor::marker("green", "circle")),
        ("BAC", StyleDescriptor::marker("cyan", "triangle-down").sized(14)),
        ("SAC", StyleDescriptor::marker("magenta", "triangle-down").sized(14)),
        ("BAP", StyleDescriptor::marker("cyan", "triangle-up").sized(14)),
        ("SAP", StyleDescriptor::marker("magenta", "triangle-up").sized(14)),
        ("LONGGAMMA", StyleDescriptor::marker("cyan", "cross")),
        ("SHORTGAMMA", StyleDescriptor::marker("magenta", "cross")),
    ];
    StyleTable::new(
        entries
            .into_iter()
            .map(|(name, style)| (name.to_string(), style))
            .collect(),
    )
    .with_reference("SPOT")
}

/// Color table for data-flow dual-axis charts.
pub fn data_flow_styles() -> StyleTable {
    let colors = [
        ("GEX_BY_OI", "white"),
        ("GEX_BY_VOLUME", "white"),
        ("NETPRESS", "red"),
        ("NETFLOW", "yellow"),
        ("PREM_PRESS", "orange"),
        ("PREM_FLOW", "blue"),
        ("GAMMA_FLOW", "purple"),
        ("DELTA_FLOW", "green"),
    ];
    let mut entries: HashMap<String, StyleDescriptor> = colors
        .into_iter()
        .map(|(name, color)| {
            let mut style = StyleDescriptor::line(color);
            style.mode = TraceMode::LinesMarkers;
            (name.to_string(), style)
        })
        .collect();
    let mut spot = StyleDescriptor::line("cyan");
    spot.visibility = Visibility::Shown;
    entries.insert("SPOT".to_string(), spot);
    StyleTable::new(entries).with_reference("SPOT")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_series_gets_fallback() {
        let table = gex_history_styles();
        let style = table.lookup("NOT_A_SERIES");
        assert_eq!(style, &StyleDescriptor::fallback());
        assert_eq!(style.color, "gray");
        assert_eq!(style.mode, TraceMode::Markers);
    }

    #[test]
    fn known_series_returns_exact_entry() {
        let table = gex_history_styles();
        let bac = table.lookup("BAC");
        assert_eq!(bac.color, "cyan");
        assert_eq!(bac.symbol.as_deref(), Some("triangle-down"));
        assert_eq!(bac.size, Some(14));
    }

    #[test]
    fn only_reference_series_starts_visible() {
        let table = gex_history_styles();
        assert_eq!(table.visibility_of("SPOT"), Visibility::Shown);
        assert_eq!(table.visibility_of("MAXGEX"), Visibility::LegendOnly);
        assert_eq!(table.visibility_of("UNKNOWN"), Visibility::LegendOnly);
    }

    #[test]
    fn reference_wins_over_hidden_override() {
        let mut overrides = BTreeMap::new();
        let mut hidden = StyleDescriptor::line("white");
        hidden.visibility = Visibility::LegendOnly;
        overrides.insert("SPOT".to_string(), hidden);
        let table = data_flow_styles().with_overrides(&overrides);
        assert_eq!(table.lookup("SPOT").color, "white");
        assert_eq!(table.visibility_of("SPOT"), Visibility::Shown);
    }

    #[test]
    fn mode_uses_plotly_names() {
        let json = serde_json::to_string(&TraceMode::LinesMarkers).unwrap();
        assert_eq!(json, "\"lines+markers\"");
    }
}
