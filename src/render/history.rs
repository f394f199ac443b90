//! Overlay chart: every value column is its own styled trace on one axis.

use crate::model::figure::{Axis, Coord, Figure, Layout, Trace};
use crate::model::style::StyleTable;
use crate::model::table::SeriesTable;

pub fn render(title: &str, stem: &str, table: &SeriesTable, styles: &StyleTable) -> Figure {
    let mut layout = Layout::dark(format!("{title}: {}", stem.to_uppercase()));
    layout.xaxis = Axis::titled("Time");
    layout.yaxis = Axis::titled("Value");

    let x: Vec<Coord> = table.rows.iter().map(|r| Coord::Time(r.timestamp)).collect();
    let mut figure = Figure::new(layout);
    for (idx, name) in table.columns.iter().enumerate() {
        let y = table.rows.iter().map(|r| Coord::Number(r.values[idx])).collect();
        let trace = Trace::scatter(name, x.clone(), y, styles.lookup(name))
            .visible(styles.visibility_of(name));
        figure.add_trace(trace);
    }
    figure
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::figure::Visible;
    use crate::model::style::{Visibility, gex_history_styles};
    use crate::model::table::ObservationRow;
    use chrono::NaiveDate;

    fn table() -> SeriesTable {
        let t = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        SeriesTable {
            columns: vec!["MAXGEX".into(), "MYSTERY".into(), "SPOT".into()],
            rows: vec![ObservationRow {
                timestamp: t,
                values: vec![4810.0, 1.0, 4800.0],
            }],
            rejected: 0,
        }
    }

    #[test]
    fn one_trace_per_column_with_spot_visible() {
        let fig = render("GEX History", "spx_gex_history", &table(), &gex_history_styles());
        assert_eq!(fig.data.len(), 3);
        assert_eq!(
            fig.layout.title.as_ref().map(|t| t.text.as_str()),
            Some("GEX History: SPX_GEX_HISTORY")
        );
        let spot = fig.data.iter().find(|t| t.name == "SPOT").unwrap();
        assert_eq!(spot.visible, Visible(Visibility::Shown));
        let maxgex = fig.data.iter().find(|t| t.name == "MAXGEX").unwrap();
        assert_eq!(maxgex.visible, Visible(Visibility::LegendOnly));
    }

    #[test]
    fn unknown_column_is_drawn_with_fallback_style() {
        let fig = render("GEX History", "spx", &table(), &gex_history_styles());
        let mystery = fig.data.iter().find(|t| t.name == "MYSTERY").unwrap();
        let marker = mystery.marker.as_ref().unwrap();
        assert_eq!(marker.color.as_deref(), Some("gray"));
        assert_eq!(marker.symbol.as_deref(), Some("circle"));
    }
}
