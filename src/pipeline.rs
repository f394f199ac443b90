//! One input file in, at most one artifact out:
//! route → load → window/band → style → render → persist.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::debug;

use crate::error::PipelineError;
use crate::load::{self, TimestampParser};
use crate::model::schema::{Route, RoutedFile, SchemaRegistry, TableSchema};
use crate::model::style::StyleTable;
use crate::persist::html::{self, HtmlOptions};
use crate::persist::index::IndexColumn;
use crate::persist::{self, PersistOutcome, WritePolicy, image};
use crate::render::{self, ImageFormat, VolumeOptions, svg};
use crate::transform::{Band, TimeWindow, filter_band};

/// Everything a run needs, resolved once at start-up and shared read-only.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub registry: SchemaRegistry,
    /// Style table per schema name.
    pub styles: BTreeMap<String, StyleTable>,
    pub timestamps: TimestampParser,
    /// Time-of-day filter for time-series schemas without an override.
    pub window: Option<TimeWindow>,
    /// Per-schema windows; `None` turns filtering off for that schema.
    pub window_overrides: BTreeMap<String, Option<TimeWindow>>,
    pub band: Band,
    pub policy: WritePolicy,
    pub html: HtmlOptions,
    pub volume: VolumeOptions,
}

/// A file written by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    /// Asset prefix of the source file name, e.g. `spx`.
    pub asset: String,
    pub format: ImageFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Written(Artifact),
    /// The target existed and the policy is `skip_existing`.
    Skipped(PathBuf),
    /// Nothing left after filtering; no artifact written.
    Empty,
    /// No route matches the file name.
    Unrouted,
}

impl Pipeline {
    pub fn run_file(&self, source: &Path, output_dir: &Path) -> Result<RunOutcome, PipelineError> {
        self.run_file_at(source, output_dir, Local::now().naive_local())
    }

    /// Run with an explicit generation time (embedded in titles and pages).
    pub fn run_file_at(
        &self,
        source: &Path,
        output_dir: &Path,
        now: NaiveDateTime,
    ) -> Result<RunOutcome, PipelineError> {
        let Some(file_name) = source.file_name().and_then(|n| n.to_str()) else {
            return Ok(RunOutcome::Unrouted);
        };
        let Some(routed) = self.registry.resolve(file_name) else {
            return Ok(RunOutcome::Unrouted);
        };
        let asset = asset_of(file_name, routed.route);

        let format = match routed.schema {
            TableSchema::TimeSeries { .. } => ImageFormat::Html,
            TableSchema::Snapshot { .. } => self.volume.format,
        };
        let target = if self.volume.timestamped && format != ImageFormat::Html {
            persist::timestamped_path(source, output_dir, format.extension(), now)?
        } else {
            persist::target_path(source, output_dir, format.extension())?
        };
        if !persist::should_write(&target, self.policy) {
            return Ok(RunOutcome::Skipped(target));
        }

        let Some(bytes) = self.render(source, &routed, &asset, format, &target, now)? else {
            return Ok(RunOutcome::Empty);
        };

        match persist::persist(&target, &bytes, self.policy)? {
            PersistOutcome::Written(path) => Ok(RunOutcome::Written(Artifact {
                path,
                asset,
                format,
            })),
            PersistOutcome::Skipped(path) => Ok(RunOutcome::Skipped(path)),
        }
    }

    /// Serialized artifact, or `None` when filtering leaves nothing to draw.
    fn render(
        &self,
        source: &Path,
        routed: &RoutedFile<'_>,
        asset: &str,
        format: ImageFormat,
        target: &Path,
        now: NaiveDateTime,
    ) -> Result<Option<Vec<u8>>, PipelineError> {
        let stem = persist::file_stem(source)?;
        match routed.schema {
            TableSchema::TimeSeries {
                title,
                columns,
                spot,
                chart,
            } => {
                let mut table = load::load_series(source, columns, &self.timestamps)?;
                if let Some(window) = self.window_for(routed.schema_name) {
                    window.apply(&mut table);
                }
                debug!(path = %source.display(), rows = table.len(), rejected = table.rejected, "loaded series");
                if table.is_empty() {
                    return Ok(None);
                }
                let fallback;
                let styles = match self.styles.get(routed.schema_name) {
                    Some(s) => s,
                    None => {
                        fallback = StyleTable::default().with_reference(spot.clone());
                        &fallback
                    }
                };
                let figure =
                    render::series_figure(routed.schema_name, title, spot, chart, stem, &table, styles)?;
                let page = html::render_page(&figure, &self.html, stem, now)?;
                Ok(Some(page.into_bytes()))
            }
            TableSchema::Snapshot { title, columns } => {
                let table = load::load_snapshot(source, columns)?;
                let filtered = filter_band(&table, self.band);
                debug!(
                    path = %source.display(),
                    kept = filtered.rows.len(),
                    min = filtered.bounds.min,
                    max = filtered.bounds.max,
                    "filtered snapshot"
                );
                if filtered.is_empty() {
                    return Ok(None);
                }
                let label = if asset.is_empty() { title.as_str() } else { asset };
                let chart = render::volume::build(
                    label,
                    &filtered,
                    &table.reference,
                    &table.volume_columns,
                    &self.volume,
                    now,
                );
                let bytes = match format {
                    ImageFormat::Png => image::rasterize(&svg::render(&chart), target)?,
                    ImageFormat::Svg => svg::render(&chart).into_bytes(),
                    ImageFormat::Html => {
                        html::render_page(&chart.to_figure(), &self.html, stem, now)?.into_bytes()
                    }
                };
                Ok(Some(bytes))
            }
        }
    }

    /// The window applied to a time-series schema.
    pub fn window_for(&self, schema_name: &str) -> Option<&TimeWindow> {
        match self.window_overrides.get(schema_name) {
            Some(window) => window.as_ref(),
            None => self.window.as_ref(),
        }
    }

    /// Whether a file name would be picked up by any route.
    pub fn matches(&self, file_name: &str) -> bool {
        self.registry.resolve(file_name).is_some()
    }

    /// Index columns for every route that produces HTML pages.
    pub fn index_columns(&self) -> Vec<IndexColumn> {
        self.registry
            .routes()
            .iter()
            .filter(|route| match self.registry.schema(&route.schema) {
                Some(TableSchema::TimeSeries { .. }) => true,
                Some(TableSchema::Snapshot { .. }) => self.volume.format == ImageFormat::Html,
                None => false,
            })
            .map(|route| IndexColumn {
                label: route.label.clone().unwrap_or_else(|| route.schema.clone()),
                suffix_stem: route.suffix_stem().to_string(),
            })
            .collect()
    }
}

/// `spx_vol.csv` with route `_vol.csv` -> `spx`.
pub fn asset_of(file_name: &str, route: &Route) -> String {
    let cut = file_name.len().saturating_sub(route.suffix.len());
    file_name
        .get(..cut)
        .unwrap_or_default()
        .trim_end_matches(['_', '-', '.'])
        .to_string()
}
