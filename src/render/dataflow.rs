//! Dual-axis flow chart: spot on the primary axis, levels and flows on the
//! secondary axis. Flows can be drawn as raw bars, running totals, or both.

use crate::error::RenderError;
use crate::model::figure::{Axis, Coord, Figure, Layout, Legend, Margin, Trace};
use crate::model::schema::FlowDisplay;
use crate::model::style::{StyleTable, Visibility};
use crate::model::table::SeriesTable;

/// Which columns go where on a dual-axis chart.
#[derive(Debug, Clone, Copy)]
pub struct DualAxis<'a> {
    pub schema: &'a str,
    pub title: &'a str,
    pub spot: &'a str,
    pub levels: &'a [String],
    pub flows: &'a [String],
    pub display: FlowDisplay,
}

const BAR_OPACITY: f64 = 0.7;
const LINE_WIDTH: f64 = 2.0;

pub fn render(
    chart: DualAxis<'_>,
    stem: &str,
    table: &SeriesTable,
    styles: &StyleTable,
) -> Result<Figure, RenderError> {
    let column = |name: &str| {
        table.column(name).ok_or_else(|| RenderError::MissingColumn {
            schema: chart.schema.to_string(),
            column: name.to_string(),
        })
    };
    let x: Vec<Coord> = table.rows.iter().map(|r| Coord::Time(r.timestamp)).collect();
    let mut figure = Figure::new(layout(chart.title, stem));

    // ── Primary axis ──
    let spot_style = styles.lookup(chart.spot);
    let mut spot = Trace::scatter(chart.spot, x.clone(), numbers(&column(chart.spot)?), spot_style)
        .visible(styles.visibility_of(chart.spot));
    if let Some(line) = spot.line.as_mut() {
        line.width = Some(LINE_WIDTH);
    }
    figure.add_trace(spot);

    // ── Secondary axis ──
    if chart.display != FlowDisplay::Cumulative {
        for name in chart.flows {
            let style = styles.lookup(name);
            let bar = Trace::bar(name, x.clone(), numbers(&column(name)?), &style.color)
                .with_opacity(BAR_OPACITY)
                .on_axis("y2")
                .visible(Visibility::LegendOnly);
            figure.add_trace(bar);
        }
    }

    for name in chart.levels {
        let trace = Trace::scatter(name, x.clone(), numbers(&column(name)?), styles.lookup(name))
            .on_axis("y2")
            .visible(styles.visibility_of(name));
        figure.add_trace(trace);
    }

    if chart.display != FlowDisplay::Bars {
        for name in chart.flows {
            let running = cumulative(&column(name)?);
            let mut trace = Trace::scatter(
                &format!("{name} (Cum)"),
                x.clone(),
                numbers(&running),
                styles.lookup(name),
            )
            .on_axis("y2")
            .visible(styles.visibility_of(name));
            if let Some(line) = trace.line.as_mut() {
                line.width = Some(LINE_WIDTH);
            }
            figure.add_trace(trace);
        }
    }

    Ok(figure)
}

/// Running sum, same length as the input.
pub fn cumulative(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |acc, v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

fn numbers(values: &[f64]) -> Vec<Coord> {
    values.iter().map(|v| Coord::Number(*v)).collect()
}

fn layout(title: &str, stem: &str) -> Layout {
    let mut layout = Layout::dark(format!("{title} - {}", stem.replace('_', " ").to_uppercase()));
    layout.xaxis = Axis {
        showgrid: Some(true),
        gridcolor: Some("gray".to_string()),
        ..Axis::titled("Time")
    };
    layout.yaxis = Axis {
        side: Some("left".to_string()),
        showgrid: Some(false),
        tickformat: Some(".2f".to_string()),
        ..Axis::titled("SPOT")
    };
    layout.yaxis2 = Some(Axis {
        overlaying: Some("y".to_string()),
        side: Some("right".to_string()),
        showgrid: Some(true),
        gridcolor: Some("rgba(100,100,100,0.2)".to_string()),
        ..Axis::titled("Flows")
    });
    layout.margin = Some(Margin {
        l: 50,
        r: 50,
        t: 50,
        b: 50,
    });
    layout.legend = Some(Legend::horizontal_top());
    layout.barmode = Some("group".to_string());
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::figure::{TraceKind, Visible};
    use crate::model::style::data_flow_styles;
    use crate::model::table::ObservationRow;
    use chrono::NaiveDate;

    fn table() -> SeriesTable {
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        SeriesTable {
            columns: vec!["GEX_BY_OI".into(), "NETFLOW".into(), "SPOT".into()],
            rows: (0..3)
                .map(|i| ObservationRow {
                    timestamp: day.and_hms_opt(9, i, 0).unwrap(),
                    values: vec![10.0, f64::from(i + 1), 4800.0],
                })
                .collect(),
            rejected: 0,
        }
    }

    fn chart<'a>(levels: &'a [String], flows: &'a [String], display: FlowDisplay) -> DualAxis<'a> {
        DualAxis {
            schema: "data_flow",
            title: "DATAFLOW",
            spot: "SPOT",
            levels,
            flows,
            display,
        }
    }

    #[test]
    fn cumulative_is_a_running_sum() {
        assert_eq!(cumulative(&[1.0, 2.0, -4.0]), vec![1.0, 3.0, -1.0]);
        assert!(cumulative(&[]).is_empty());
    }

    #[test]
    fn both_display_emits_bars_and_running_totals() {
        let levels = vec!["GEX_BY_OI".to_string()];
        let flows = vec!["NETFLOW".to_string()];
        let fig = render(
            chart(&levels, &flows, FlowDisplay::Both),
            "spx_data_flow",
            &table(),
            &data_flow_styles(),
        )
        .unwrap();

        let names: Vec<_> = fig.data.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["SPOT", "NETFLOW", "GEX_BY_OI", "NETFLOW (Cum)"]);
        assert_eq!(fig.data[0].visible, Visible(Visibility::Shown));
        assert_eq!(fig.data[1].kind, TraceKind::Bar);
        assert_eq!(fig.data[1].yaxis.as_deref(), Some("y2"));

        let cum: Vec<_> = fig.data[3].y.clone();
        assert_eq!(cum, vec![Coord::Number(1.0), Coord::Number(3.0), Coord::Number(6.0)]);
        assert_eq!(
            fig.layout.title.as_ref().map(|t| t.text.as_str()),
            Some("DATAFLOW - SPX DATA FLOW")
        );
    }

    #[test]
    fn bars_only_skips_running_totals() {
        let flows = vec!["NETFLOW".to_string()];
        let fig = render(chart(&[], &flows, FlowDisplay::Bars), "x", &table(), &data_flow_styles())
            .unwrap();
        assert_eq!(fig.data.len(), 2);
    }

    #[test]
    fn unknown_flow_column_is_an_error() {
        let flows = vec!["NOPE".to_string()];
        let err = render(chart(&[], &flows, FlowDisplay::Both), "x", &table(), &data_flow_styles())
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingColumn { column, .. } if column == "NOPE"));
    }
}
