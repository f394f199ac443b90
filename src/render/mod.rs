//! Chart construction. Nothing in here touches the filesystem.

pub mod dataflow;
pub mod history;
pub mod svg;
pub mod volume;

use crate::error::RenderError;
use crate::model::figure::Figure;
use crate::model::schema::SeriesChart;
use crate::model::style::StyleTable;
use crate::model::table::SeriesTable;

pub use volume::{ImageFormat, VolumeChart, VolumeOptions};

/// Figure for a time-series table, laid out as its schema asks.
pub fn series_figure(
    schema: &str,
    title: &str,
    spot: &str,
    chart: &SeriesChart,
    stem: &str,
    table: &SeriesTable,
    styles: &StyleTable,
) -> Result<Figure, RenderError> {
    if table.column_index(spot).is_none() {
        return Err(RenderError::MissingColumn {
            schema: schema.to_string(),
            column: spot.to_string(),
        });
    }
    match chart {
        SeriesChart::Overlay => Ok(history::render(title, stem, table, styles)),
        SeriesChart::DualAxis {
            levels,
            flows,
            display,
        } => dataflow::render(
            dataflow::DualAxis {
                schema,
                title,
                spot,
                levels,
                flows,
                display: *display,
            },
            stem,
            table,
            styles,
        ),
    }
}
