use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Name of a schema in the registry (e.g. `gex_history`).
pub type SchemaName = String;

// ── Schema descriptors ──────────────────────────────────────────────

/// Positional layout of a headerless input file and how to chart it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableSchema {
    /// Timestamp-indexed history. The first column is the timestamp.
    TimeSeries {
        /// Chart title prefix, followed by the upper-cased file stem.
        title: String,
        /// Every column in file order, timestamp first.
        columns: Vec<String>,
        /// Column holding the underlying spot price. Always initially visible.
        spot: String,
        /// How the value columns are laid out on the chart.
        chart: SeriesChart,
    },
    /// Strike-indexed snapshot. The first row holds reference prices,
    /// every later row is a strike followed by volume buckets.
    Snapshot {
        /// Label of the underlying used in the chart title (e.g. "SPX").
        title: String,
        /// Every data-row column in file order, strike first.
        columns: Vec<String>,
    },
}

/// Chart layout for a time-series schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SeriesChart {
    /// Each column is its own styled trace on a single axis.
    Overlay,
    /// Spot on the primary axis, everything else on a secondary axis.
    DualAxis {
        /// Level series plotted as-is on the secondary axis.
        #[serde(default)]
        levels: Vec<String>,
        /// Flow series plotted as bars and/or running totals.
        flows: Vec<String>,
        /// Which flow representations to emit.
        #[serde(default)]
        display: FlowDisplay,
    },
}

/// Flow representation on a dual-axis chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FlowDisplay {
    /// Raw per-interval bars.
    Bars,
    /// Running totals as lines with markers.
    Cumulative,
    /// Both, toggled from the legend.
    #[default]
    Both,
}

impl TableSchema {
    pub fn columns(&self) -> &[String] {
        match self {
            TableSchema::TimeSeries { columns, .. } | TableSchema::Snapshot { columns, .. } => {
                columns
            }
        }
    }

    pub fn title(&self) -> &str {
        match self {
            TableSchema::TimeSeries { title, .. } | TableSchema::Snapshot { title, .. } => title,
        }
    }

    /// Columns a chart refers to by name, which must exist in `columns`.
    pub fn referenced_columns(&self) -> Vec<&str> {
        match self {
            TableSchema::TimeSeries { spot, chart, .. } => {
                let mut refs = vec![spot.as_str()];
                if let SeriesChart::DualAxis { levels, flows, .. } = chart {
                    refs.extend(levels.iter().map(String::as_str));
                    refs.extend(flows.iter().map(String::as_str));
                }
                refs
            }
            TableSchema::Snapshot { .. } => Vec::new(),
        }
    }
}

// ── Routing ──────────────────────────────────────────────────────────

/// Maps a filename suffix to a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Route {
    /// Case-insensitive filename suffix, e.g. `_gex_history.csv`.
    pub suffix: String,
    /// Schema name, either built-in or declared under `schemas`.
    pub schema: SchemaName,
    /// Column header used for this route in the daily index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Route {
    /// `_gex_history.csv` -> `_gex_history`.
    pub fn suffix_stem(&self) -> &str {
        match self.suffix.rfind('.') {
            Some(dot) => &self.suffix[..dot],
            None => &self.suffix,
        }
    }
}

/// A file that matched a route.
#[derive(Debug, Clone, Copy)]
pub struct RoutedFile<'a> {
    pub route: &'a Route,
    pub schema_name: &'a str,
    pub schema: &'a TableSchema,
}

/// Resolves discovered files to schemas before anything is loaded.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: BTreeMap<SchemaName, TableSchema>,
    routes: Vec<Route>,
    assets: Vec<String>,
}

impl SchemaRegistry {
    /// Build a registry. `assets` restricts matches to filenames starting with
    /// one of the given names; an empty list accepts any prefix.
    pub fn new(
        schemas: BTreeMap<SchemaName, TableSchema>,
        routes: Vec<Route>,
        assets: Vec<String>,
    ) -> Self {
        let assets = assets.into_iter().map(|a| a.to_lowercase()).collect();
        SchemaRegistry {
            schemas,
            routes,
            assets,
        }
    }

    pub fn schemas(&self) -> &BTreeMap<SchemaName, TableSchema> {
        &self.schemas
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn schema(&self, name: &str) -> Option<&TableSchema> {
        self.schemas.get(name)
    }

    /// First route whose suffix and asset prefix match `file_name`.
    pub fn resolve(&self, file_name: &str) -> Option<RoutedFile<'_>> {
        let lower = file_name.to_lowercase();
        let route = self.routes.iter().find(|r| {
            let suffix = r.suffix.to_lowercase();
            lower.ends_with(&suffix)
                && lower.len() > suffix.len()
                && (self.assets.is_empty() || self.assets.iter().any(|a| lower.starts_with(a)))
        })?;
        let (schema_name, schema) = self.schemas.get_key_value(&route.schema)?;
        Some(RoutedFile {
            route,
            schema_name,
            schema,
        })
    }
}

// ── Built-ins ────────────────────────────────────────────────────────

pub const GEX_HISTORY: &str = "gex_history";
pub const DATA_FLOW: &str = "data_flow";
pub const VOLUME_SNAPSHOT: &str = "volume_snapshot";

fn names(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

/// Schemas for the three file kinds the data feed exports.
pub fn builtin_schemas() -> BTreeMap<SchemaName, TableSchema> {
    let mut schemas = BTreeMap::new();
    schemas.insert(
        GEX_HISTORY.to_string(),
        TableSchema::TimeSeries {
            title: "GEX History".to_string(),
            columns: names(&[
                "Time", "MAXGEX", "MINGEX", "MAXVEX", "MINVEX", "MAXDEX", "MINDEX", "ZERO", "BAC",
                "SAC", "BAP", "SAP", "MAXCP", "MINCP", "LONGGAMMA", "SHORTGAMMA", "SPOT",
            ]),
            spot: "SPOT".to_string(),
            chart: SeriesChart::Overlay,
        },
    );
    schemas.insert(
        DATA_FLOW.to_string(),
        TableSchema::TimeSeries {
            title: "DATAFLOW".to_string(),
            columns: names(&[
                "TIME_STAMP",
                "GEX_BY_OI",
                "GEX_BY_VOLUME",
                "NETPRESS",
                "NETFLOW",
                "PREM_PRESS",
                "PREM_FLOW",
                "GAMMA_FLOW",
                "DELTA_FLOW",
                "SPOT",
            ]),
            spot: "SPOT".to_string(),
            chart: SeriesChart::DualAxis {
                levels: names(&["GEX_BY_OI", "GEX_BY_VOLUME"]),
                flows: names(&[
                    "NETPRESS",
                    "NETFLOW",
                    "PREM_PRESS",
                    "PREM_FLOW",
                    "GAMMA_FLOW",
                    "DELTA_FLOW",
                ]),
                display: FlowDisplay::Both,
            },
        },
    );
    schemas.insert(
        VOLUME_SNAPSHOT.to_string(),
        TableSchema::Snapshot {
            title: "SPX".to_string(),
            columns: names(&["Strike", "Vol0DTE", "Vol1DTE", "OtherVol"]),
        },
    );
    schemas
}

pub fn builtin_routes() -> Vec<Route> {
    vec![
        Route {
            suffix: "_gex_history.csv".to_string(),
            schema: GEX_HISTORY.to_string(),
            label: Some("GEX History".to_string()),
        },
        Route {
            suffix: "_data_flow.csv".to_string(),
            schema: DATA_FLOW.to_string(),
            label: Some("Data Flow".to_string()),
        },
        Route {
            suffix: "_vol.csv".to_string(),
            schema: VOLUME_SNAPSHOT.to_string(),
            label: Some("Volume".to_string()),
        },
    ]
}

pub fn builtin_assets() -> Vec<String> {
    names(&["spy", "spx", "qqq", "ndx"])
}
