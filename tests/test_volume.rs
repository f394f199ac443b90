use std::fs;

use chrono::NaiveDate;

use gex_charts::load::load_snapshot;
use gex_charts::persist::html::{HtmlOptions, render_page};
use gex_charts::render::volume::build;
use gex_charts::render::{VolumeOptions, svg};
use gex_charts::transform::{Band, filter_band};

fn columns() -> Vec<String> {
    ["Strike", "Vol0DTE", "Vol1DTE", "OtherVol"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

#[test]
fn snapshot_file_to_chart_and_page() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spx_vol.csv");
    fs::write(
        &path,
        "4800,4795,480\n\
         4750,120,-30,10\n\
         4700,999,0,0\n\
         4790,-40,-5,0\n",
    )
    .unwrap();
    let now = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(11, 0, 0)
        .unwrap();

    let table = load_snapshot(&path, &columns()).unwrap();
    let filtered = filter_band(&table, Band::Percent { value: 1.5 });
    assert_eq!(filtered.bounds.min, 4728.0);
    assert_eq!(filtered.bounds.max, 4872.0);
    assert_eq!(filtered.totals, vec![100.0, -45.0]);

    let chart = build(
        "spx",
        &filtered,
        &table.reference,
        &table.volume_columns,
        &VolumeOptions::default(),
        now,
    );
    assert_eq!(chart.title, "SPX Volume by Strike - Spot: 4800.00  (2024-01-02 11:00)");
    // Spot line plus both extrema.
    assert_eq!(chart.lines.len(), 3);
    assert_eq!(chart.scales.len(), 2);

    let image = svg::render(&chart);
    assert!(image.contains("Max+ (4750.00, Vol: 100)"));
    assert!(image.contains("Max- (4790.00, Vol: -45)"));

    let page = render_page(&chart.to_figure(), &HtmlOptions::default(), "spx_vol", now).unwrap();
    assert!(page.contains("<meta http-equiv=\"refresh\" content=\"30\">"));
    assert!(page.contains("plotly_axis_ranges_spx_vol"));
    assert!(page.contains("\"barmode\":\"relative\""));
    assert!(page.contains("Vol0DTE +"));
}

#[test]
fn page_without_state_script_plots_directly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("qqq_vol.csv");
    fs::write(&path, "400\n401,10,20,30\n").unwrap();
    let now = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(11, 0, 0)
        .unwrap();

    let table = load_snapshot(&path, &columns()).unwrap();
    let filtered = filter_band(&table, Band::Points { value: 5.0 });
    let chart = build(
        "qqq",
        &filtered,
        &table.reference,
        &table.volume_columns,
        &VolumeOptions::default(),
        now,
    );
    // Only the spot is known: no future axis, ETF axis from the fallback ratio.
    assert_eq!(chart.scales.len(), 1);
    assert_eq!(chart.scales[0].label, "SPY Equivalent");

    let options = HtmlOptions {
        persist_state: false,
        refresh_secs: 0,
        ..HtmlOptions::default()
    };
    let page = render_page(&chart.to_figure(), &options, "qqq_vol", now).unwrap();
    assert!(!page.contains("http-equiv"));
    assert!(!page.contains("localStorage"));
    assert!(page.contains("Plotly.newPlot('chart'"));
}
