//! Volume-by-strike chart: horizontal bars stacked right for positive and left
//! for negative volume, with extra price scales derived from reference-price
//! ratios.

use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::figure::{Annotation, Axis, Coord, Figure, Font, Layout, Shape, Trace};
use crate::model::table::ReferencePrices;
use crate::transform::band::{BandBounds, FilteredSnapshot};

/// Lightest to darkest, one shade per volume column.
pub const POSITIVE_RAMP: [&str; 3] = ["#90EE90", "#32CD32", "#006400"];
pub const NEGATIVE_RAMP: [&str; 3] = ["#FFC0CB", "#FF0000", "#8B0000"];

const EXTENT_PADDING: f64 = 1.1;

/// Upper bound on strike-axis ticks; wider bands get a coarser step.
pub const MAX_STRIKE_TICKS: usize = 400;

// ── Options ──────────────────────────────────────────────────────────

/// Output format of a volume chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Svg,
    Html,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
            ImageFormat::Html => "html",
        }
    }

    pub fn is_raster(self) -> bool {
        self == ImageFormat::Png
    }
}

/// Secondary price scale: primary strike ticks multiplied by
/// `reference[reference_index] / spot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PriceScale {
    pub label: String,
    /// Position of the correlated price on the snapshot's first row.
    pub reference_index: usize,
    pub color: String,
    /// Ratio to spot used when the reference price is missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VolumeOptions {
    #[serde(default)]
    pub format: ImageFormat,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Strike spacing between primary-axis ticks.
    #[serde(default = "default_tick_step")]
    pub tick_step: f64,
    /// Bar thickness in strike points.
    #[serde(default = "default_bar_height")]
    pub bar_height: f64,
    /// At most two: the first is drawn on the right, the second on the far left.
    #[serde(default = "default_scales")]
    pub scales: Vec<PriceScale>,
    /// Name images `{stem}_{YYYYMMDD_HHMMSS}` instead of `{stem}`.
    #[serde(default)]
    pub timestamped: bool,
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    1200
}

fn default_tick_step() -> f64 {
    5.0
}

fn default_bar_height() -> f64 {
    4.0
}

fn default_scales() -> Vec<PriceScale> {
    vec![
        PriceScale {
            label: "/ES Equivalent".to_string(),
            reference_index: 1,
            color: "cyan".to_string(),
            fallback_ratio: None,
        },
        PriceScale {
            label: "SPY Equivalent".to_string(),
            reference_index: 2,
            color: "orange".to_string(),
            fallback_ratio: Some(0.1),
        },
    ]
}

impl Default for VolumeOptions {
    fn default() -> Self {
        VolumeOptions {
            format: ImageFormat::default(),
            width: default_width(),
            height: default_height(),
            tick_step: default_tick_step(),
            bar_height: default_bar_height(),
            scales: default_scales(),
            timestamped: false,
        }
    }
}

// ── Chart model ──────────────────────────────────────────────────────

/// Signed contributions of one volume column, parallel to `VolumeChart::strikes`.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeStack {
    pub column: String,
    pub positive: Vec<f64>,
    pub negative: Vec<f64>,
    pub positive_color: String,
    pub negative_color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dash {
    Dashed,
    Dotted,
}

impl Dash {
    pub fn plotly(self) -> &'static str {
        match self {
            Dash::Dashed => "dash",
            Dash::Dotted => "dot",
        }
    }

    pub fn svg(self) -> &'static str {
        match self {
            Dash::Dashed => "8,5",
            Dash::Dotted => "2,4",
        }
    }
}

/// Horizontal marker across the plot at a strike.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLine {
    pub strike: f64,
    pub color: String,
    pub dash: Dash,
    pub label: Option<String>,
}

/// A derived price axis with precomputed tick labels.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleAxis {
    pub label: String,
    pub color: String,
    pub labels: Vec<String>,
}

/// One drawn rectangle after stacking.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSegment {
    pub strike: f64,
    pub start: f64,
    pub end: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeChart {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub strikes: Vec<f64>,
    pub stacks: Vec<VolumeStack>,
    pub bar_height: f64,
    pub strike_ticks: Vec<f64>,
    pub strike_range: [f64; 2],
    /// Half-width of the symmetric volume axis.
    pub volume_extent: f64,
    pub volume_ticks: Vec<f64>,
    pub scales: Vec<ScaleAxis>,
    pub lines: Vec<ReferenceLine>,
}

/// Build the chart for a non-empty band-filtered snapshot.
pub fn build(
    asset: &str,
    snapshot: &FilteredSnapshot,
    reference: &ReferencePrices,
    volume_columns: &[String],
    options: &VolumeOptions,
    generated_at: NaiveDateTime,
) -> VolumeChart {
    let spot = reference.spot();
    let strikes: Vec<f64> = snapshot.rows.iter().map(|r| r.strike).collect();

    let stacks: Vec<VolumeStack> = volume_columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let values = snapshot.rows.iter().map(|r| r.volumes.get(i).copied().unwrap_or(0.0));
            VolumeStack {
                column: column.clone(),
                positive: values.clone().map(|v| v.max(0.0)).collect(),
                negative: values.map(|v| v.min(0.0)).collect(),
                positive_color: ramp(&POSITIVE_RAMP, i).to_string(),
                negative_color: ramp(&NEGATIVE_RAMP, i).to_string(),
            }
        })
        .collect();

    let widest = (0..strikes.len())
        .map(|row| {
            let pos: f64 = stacks.iter().map(|s| s.positive[row]).sum();
            let neg: f64 = stacks.iter().map(|s| s.negative[row]).sum();
            pos.max(-neg)
        })
        .fold(0.0, f64::max);
    let volume_extent = if widest > 0.0 { widest * EXTENT_PADDING } else { 1.0 };

    let ticks = strike_ticks(snapshot.bounds, options.tick_step);
    let half_step = options.tick_step / 2.0;
    let strike_range = match (ticks.first(), ticks.last()) {
        (Some(lo), Some(hi)) => [lo - half_step, hi + half_step],
        _ => [snapshot.bounds.min, snapshot.bounds.max],
    };

    let scales = options
        .scales
        .iter()
        .filter_map(|scale| {
            let ratio = scale_ratio(scale, reference)?;
            Some(ScaleAxis {
                label: scale.label.clone(),
                color: scale.color.clone(),
                labels: ticks.iter().map(|t| format!("{:.2}", t * ratio)).collect(),
            })
        })
        .collect();

    let mut lines = vec![ReferenceLine {
        strike: spot,
        color: "yellow".to_string(),
        dash: Dash::Dashed,
        label: None,
    }];
    if let Some(m) = snapshot.max_positive {
        lines.push(ReferenceLine {
            strike: m.strike,
            color: "lightgreen".to_string(),
            dash: Dash::Dotted,
            label: Some(format!("Max+ ({:.2}, Vol: {:.0})", m.strike, m.total)),
        });
    }
    if let Some(m) = snapshot.max_negative {
        lines.push(ReferenceLine {
            strike: m.strike,
            color: "pink".to_string(),
            dash: Dash::Dotted,
            label: Some(format!("Max- ({:.2}, Vol: {:.0})", m.strike, m.total)),
        });
    }

    VolumeChart {
        title: format!(
            "{} Volume by Strike - Spot: {spot:.2}  ({})",
            asset.to_uppercase(),
            generated_at.format("%Y-%m-%d %H:%M")
        ),
        width: options.width,
        height: options.height,
        strikes,
        stacks,
        bar_height: options.bar_height,
        strike_ticks: ticks,
        strike_range,
        volume_extent,
        volume_ticks: volume_ticks(volume_extent),
        scales,
        lines,
    }
}

fn ramp<'a>(colors: &[&'a str], i: usize) -> &'a str {
    colors[i.min(colors.len() - 1)]
}

fn scale_ratio(scale: &PriceScale, reference: &ReferencePrices) -> Option<f64> {
    let spot = reference.spot();
    match reference.get(scale.reference_index) {
        Some(price) => Some(price / spot),
        None => match scale.fallback_ratio {
            Some(ratio) => {
                warn!(
                    scale = %scale.label,
                    approximation = spot * ratio,
                    "reference price not provided, approximating from spot"
                );
                Some(ratio)
            }
            None => {
                debug!(scale = %scale.label, "reference price not provided, omitting scale");
                None
            }
        },
    }
}

/// Multiples of `step` covering the band, rounded outward.
pub fn strike_ticks(bounds: BandBounds, step: f64) -> Vec<f64> {
    if !step.is_finite() || step <= 0.0 || !bounds.min.is_finite() || !bounds.max.is_finite() {
        return Vec::new();
    }
    let span = bounds.max - bounds.min;
    let wanted = (span / step).ceil();
    let step = if wanted > MAX_STRIKE_TICKS as f64 {
        step * (wanted / MAX_STRIKE_TICKS as f64).ceil()
    } else {
        step
    };
    let lo = (bounds.min / step).floor() * step;
    let hi = (bounds.max / step).ceil() * step;
    let count = ((hi - lo) / step).round() as usize;
    (0..=count).map(|i| lo + i as f64 * step).collect()
}

/// Symmetric ticks at a 1/2/5 step, about three per side.
pub fn volume_ticks(extent: f64) -> Vec<f64> {
    if !extent.is_finite() || extent <= 0.0 {
        return vec![0.0];
    }
    let raw = extent / 3.0;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude);
    let n = (extent / step).floor() as i64;
    (-n..=n).map(|k| k as f64 * step).collect()
}

/// `12000` -> `12K`; zero stays `0`.
pub fn format_volume(x: f64) -> String {
    if x == 0.0 {
        "0".to_string()
    } else {
        format!("{:.0}K", x / 1000.0)
    }
}

impl VolumeChart {
    /// Rectangles after stacking each column outward from zero.
    pub fn segments(&self) -> Vec<BarSegment> {
        let mut segments = Vec::new();
        for (row, &strike) in self.strikes.iter().enumerate() {
            let mut right = 0.0;
            let mut left = 0.0;
            for stack in &self.stacks {
                let pos = stack.positive[row];
                if pos > 0.0 {
                    segments.push(BarSegment {
                        strike,
                        start: right,
                        end: right + pos,
                        color: stack.positive_color.clone(),
                    });
                    right += pos;
                }
                let neg = stack.negative[row];
                if neg < 0.0 {
                    segments.push(BarSegment {
                        strike,
                        start: left + neg,
                        end: left,
                        color: stack.negative_color.clone(),
                    });
                    left += neg;
                }
            }
        }
        segments
    }

    /// Same chart as a plotly figure; plotly's relative bar mode does the stacking.
    pub fn to_figure(&self) -> Figure {
        let mut layout = Layout::dark(self.title.clone());
        layout.autosize = false;
        layout.width = Some(self.width);
        layout.height = Some(self.height);
        layout.barmode = Some("relative".to_string());
        layout.showlegend = Some(false);

        let left_margin = if self.scales.len() > 1 { 0.12 } else { 0.0 };
        layout.xaxis = Axis {
            range: Some([-self.volume_extent, self.volume_extent]),
            tickvals: Some(self.volume_ticks.clone()),
            ticktext: Some(self.volume_ticks.iter().map(|v| format_volume(*v)).collect()),
            domain: Some([left_margin, 1.0]),
            ..Axis::titled("Volume")
        };
        layout.yaxis = Axis {
            range: Some(self.strike_range),
            tickvals: Some(self.strike_ticks.clone()),
            ticktext: Some(self.strike_ticks.iter().map(|t| format!("{t:.0}")).collect()),
            showgrid: Some(false),
            ..Default::default()
        };
        let mut scales = self.scales.iter();
        layout.yaxis2 = scales.next().map(|s| Axis {
            overlaying: Some("y".to_string()),
            side: Some("right".to_string()),
            ..self.scale_axis(s)
        });
        layout.yaxis3 = scales.next().map(|s| Axis {
            overlaying: Some("y".to_string()),
            side: Some("left".to_string()),
            anchor: Some("free".to_string()),
            position: Some(0.0),
            ..self.scale_axis(s)
        });

        for line in &self.lines {
            layout.shapes.push(Shape::hline(line.strike, &line.color, line.dash.plotly()));
            if let Some(text) = &line.label {
                layout.annotations.push(Annotation {
                    xref: "paper".to_string(),
                    yref: "y".to_string(),
                    x: 1.0,
                    y: line.strike,
                    text: text.clone(),
                    showarrow: false,
                    xanchor: "right".to_string(),
                    yanchor: "bottom".to_string(),
                    font: Font {
                        color: line.color.clone(),
                        size: Some(12),
                    },
                });
            }
        }

        let y: Vec<Coord> = self.strikes.iter().map(|s| Coord::Number(*s)).collect();
        let mut figure = Figure::new(layout);
        for stack in &self.stacks {
            for (suffix, values, color) in [
                ("+", &stack.positive, &stack.positive_color),
                ("-", &stack.negative, &stack.negative_color),
            ] {
                let x = values.iter().map(|v| Coord::Number(*v)).collect();
                let mut bar = Trace::bar(&format!("{} {suffix}", stack.column), x, y.clone(), color);
                bar.orientation = Some("h".to_string());
                bar.width = Some(self.bar_height);
                figure.add_trace(bar);
            }
        }
        figure
    }

    fn scale_axis(&self, scale: &ScaleAxis) -> Axis {
        Axis {
            range: Some(self.strike_range),
            tickvals: Some(self.strike_ticks.clone()),
            ticktext: Some(scale.labels.clone()),
            color: Some(scale.color.clone()),
            showgrid: Some(false),
            ..Axis::titled(&scale.label)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::table::{SnapshotTable, StrikeRow};
    use crate::transform::band::{Band, filter_band};
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, 15, 0)
            .unwrap()
    }

    fn table(reference: Vec<f64>) -> SnapshotTable {
        SnapshotTable {
            reference: ReferencePrices::new(reference).unwrap(),
            volume_columns: vec!["Vol0DTE".into(), "Vol1DTE".into(), "OtherVol".into()],
            rows: vec![
                StrikeRow {
                    strike: 4750.0,
                    volumes: vec![120.0, -30.0, 10.0],
                },
                StrikeRow {
                    strike: 4800.0,
                    volumes: vec![-500.0, -20.0, 0.0],
                },
            ],
            rejected: 0,
        }
    }

    fn chart(reference: Vec<f64>) -> VolumeChart {
        let t = table(reference);
        let filtered = filter_band(&t, Band::Percent { value: 1.5 });
        build("spx", &filtered, &t.reference, &t.volume_columns, &VolumeOptions::default(), now())
    }

    #[test]
    fn ticks_round_outward_to_step() {
        let ticks = strike_ticks(BandBounds { min: 4728.0, max: 4872.0 }, 5.0);
        assert_eq!(ticks.first(), Some(&4725.0));
        assert_eq!(ticks.last(), Some(&4875.0));
        assert_eq!(ticks.len(), 31);
    }

    #[test]
    fn huge_band_gets_a_coarser_step() {
        let ticks = strike_ticks(BandBounds { min: -1e9, max: 1e9 }, 5.0);
        assert!(ticks.len() <= MAX_STRIKE_TICKS + 2, "{} ticks", ticks.len());
        assert!(ticks.first().is_some_and(|t| *t <= -1e9));
        assert!(ticks.last().is_some_and(|t| *t >= 1e9));
    }

    #[test]
    fn tiny_step_is_widened() {
        let ticks = strike_ticks(BandBounds { min: 4728.0, max: 4872.0 }, 0.001);
        assert!(ticks.len() <= MAX_STRIKE_TICKS + 2);
        assert!(ticks.len() > 100);
    }

    #[test]
    fn volume_labels_are_thousands() {
        assert_eq!(format_volume(0.0), "0");
        assert_eq!(format_volume(12000.0), "12K");
        assert_eq!(format_volume(-3000.0), "-3K");
    }

    #[test]
    fn volume_ticks_are_symmetric() {
        let ticks = volume_ticks(1100.0);
        assert_eq!(ticks.len() % 2, 1);
        assert_eq!(ticks[ticks.len() / 2], 0.0);
        assert_eq!(ticks.first().map(|t| -t), ticks.last().copied());
    }

    #[test]
    fn stacks_split_by_sign_and_extent_is_padded() {
        let c = chart(vec![4800.0, 4795.0, 480.0]);
        let segs = c.segments();
        // 4750: +120, +10 right of zero; -30 left of zero.
        let at_4750: Vec<_> = segs.iter().filter(|s| s.strike == 4750.0).collect();
        assert_eq!(at_4750.len(), 3);
        assert_eq!((at_4750[0].start, at_4750[0].end), (0.0, 120.0));
        assert_eq!((at_4750[1].start, at_4750[1].end), (-30.0, 0.0));
        assert_eq!((at_4750[2].start, at_4750[2].end), (120.0, 130.0));
        assert_eq!(at_4750[0].color, POSITIVE_RAMP[0]);
        assert_eq!(at_4750[2].color, POSITIVE_RAMP[2]);
        // widest stack is 520 to the left
        assert!((c.volume_extent - 520.0 * 1.1).abs() < 1e-9);
    }

    #[test]
    fn extrema_and_spot_become_reference_lines() {
        let c = chart(vec![4800.0, 4795.0, 480.0]);
        assert_eq!(c.lines.len(), 3);
        assert_eq!(c.lines[0].strike, 4800.0);
        assert_eq!(c.lines[1].label.as_deref(), Some("Max+ (4750.00, Vol: 100)"));
        assert_eq!(c.lines[2].label.as_deref(), Some("Max- (4800.00, Vol: -520)"));
        assert_eq!(c.title, "SPX Volume by Strike - Spot: 4800.00  (2024-01-02 10:15)");
    }

    #[test]
    fn scales_follow_reference_ratios() {
        let c = chart(vec![4800.0, 4795.0, 480.0]);
        assert_eq!(c.scales.len(), 2);
        let i = c.strike_ticks.iter().position(|t| *t == 4800.0).unwrap();
        assert_eq!(c.scales[0].labels[i], "4795.00");
        assert_eq!(c.scales[1].labels[i], "480.00");
    }

    #[test]
    fn missing_etf_price_falls_back_and_missing_future_is_omitted() {
        let c = chart(vec![4800.0]);
        assert_eq!(c.scales.len(), 1);
        assert_eq!(c.scales[0].label, "SPY Equivalent");
        let i = c.strike_ticks.iter().position(|t| *t == 4800.0).unwrap();
        assert_eq!(c.scales[0].labels[i], "480.00");
    }

    #[test]
    fn figure_uses_relative_bars_and_extra_axes() {
        let fig = chart(vec![4800.0, 4795.0, 480.0]).to_figure();
        assert_eq!(fig.layout.barmode.as_deref(), Some("relative"));
        assert_eq!(fig.data.len(), 6);
        assert!(fig.layout.yaxis2.is_some());
        assert!(fig.layout.yaxis3.is_some());
        assert_eq!(fig.layout.shapes.len(), 3);
        assert_eq!(fig.layout.annotations.len(), 2);
    }
}
