//! Standalone SVG drawing of a [`VolumeChart`], used for SVG output and as the
//! input to PNG rasterization.

use std::fmt::Write;

use super::volume::{VolumeChart, format_volume};

const TOP: f64 = 70.0;
const BOTTOM: f64 = 60.0;
const RIGHT_WITH_SCALE: f64 = 90.0;
const RIGHT_BARE: f64 = 30.0;
const LEFT_BARE: f64 = 70.0;
const LEFT_WITH_SCALE: f64 = 150.0;
const FONT: &str = "sans-serif";

struct Frame {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    extent: f64,
    strike_min: f64,
    strike_max: f64,
}

impl Frame {
    fn x(&self, volume: f64) -> f64 {
        self.left + (volume + self.extent) / (2.0 * self.extent) * self.width
    }

    fn y(&self, strike: f64) -> f64 {
        let span = self.strike_max - self.strike_min;
        if span <= 0.0 {
            return self.top + self.height / 2.0;
        }
        self.top + (self.strike_max - strike) / span * self.height
    }

    fn right(&self) -> f64 {
        self.left + self.width
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

pub fn render(chart: &VolumeChart) -> String {
    let width = f64::from(chart.width);
    let height = f64::from(chart.height);
    let left = if chart.scales.len() > 1 { LEFT_WITH_SCALE } else { LEFT_BARE };
    let right = if chart.scales.is_empty() { RIGHT_BARE } else { RIGHT_WITH_SCALE };
    let frame = Frame {
        left,
        top: TOP,
        width: (width - left - right).max(1.0),
        height: (height - TOP - BOTTOM).max(1.0),
        extent: chart.volume_extent,
        strike_min: chart.strike_range[0],
        strike_max: chart.strike_range[1],
    };

    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"##,
        chart.width, chart.height, chart.width, chart.height
    );
    let _ = writeln!(out, r##"<rect width="100%" height="100%" fill="black"/>"##);
    let _ = writeln!(
        out,
        r##"<text x="{:.1}" y="35" fill="white" font-family="{FONT}" font-size="16" text-anchor="middle">{}</text>"##,
        width / 2.0,
        escape(&chart.title)
    );

    draw_bars(&mut out, chart, &frame);
    draw_axes(&mut out, chart, &frame);
    draw_lines(&mut out, chart, &frame);

    out.push_str("</svg>\n");
    out
}

fn draw_bars(out: &mut String, chart: &VolumeChart, frame: &Frame) {
    let span = (frame.strike_max - frame.strike_min).max(f64::EPSILON);
    let thickness = chart.bar_height / span * frame.height;
    for seg in chart.segments() {
        let x0 = frame.x(seg.start);
        let x1 = frame.x(seg.end);
        let _ = writeln!(
            out,
            r##"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/>"##,
            x0,
            frame.y(seg.strike) - thickness / 2.0,
            (x1 - x0).max(0.0),
            thickness,
            escape(&seg.color)
        );
    }
}

fn draw_axes(out: &mut String, chart: &VolumeChart, frame: &Frame) {
    let _ = writeln!(
        out,
        r##"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="#666"/>"##,
        frame.left, frame.top, frame.width, frame.height
    );

    // Primary strikes on the left edge.
    for tick in &chart.strike_ticks {
        let y = frame.y(*tick);
        let _ = writeln!(
            out,
            r##"<text x="{:.2}" y="{:.2}" fill="white" font-family="{FONT}" font-size="12" text-anchor="end" dominant-baseline="middle">{tick:.0}</text>"##,
            frame.left - 6.0,
            y
        );
    }

    // Volume along the bottom.
    for tick in &chart.volume_ticks {
        let x = frame.x(*tick);
        let _ = writeln!(
            out,
            r##"<line x1="{x:.2}" y1="{:.2}" x2="{x:.2}" y2="{:.2}" stroke="#666"/>"##,
            frame.bottom(),
            frame.bottom() + 5.0
        );
        let _ = writeln!(
            out,
            r##"<text x="{x:.2}" y="{:.2}" fill="white" font-family="{FONT}" font-size="12" text-anchor="middle">{}</text>"##,
            frame.bottom() + 20.0,
            format_volume(*tick)
        );
    }
    let _ = writeln!(
        out,
        r##"<text x="{:.2}" y="{:.2}" fill="white" font-family="{FONT}" font-size="12" text-anchor="middle">Volume</text>"##,
        frame.left + frame.width / 2.0,
        frame.bottom() + 42.0
    );

    // Derived scales: first on the right, second on the far left.
    for (i, scale) in chart.scales.iter().take(2).enumerate() {
        let (x, anchor, title_x) = if i == 0 {
            (frame.right() + 6.0, "start", frame.right() + 78.0)
        } else {
            (frame.left - 70.0, "end", frame.left - 135.0)
        };
        let color = escape(&scale.color);
        for (tick, label) in chart.strike_ticks.iter().zip(&scale.labels) {
            let _ = writeln!(
                out,
                r##"<text x="{x:.2}" y="{:.2}" fill="{color}" font-family="{FONT}" font-size="12" text-anchor="{anchor}" dominant-baseline="middle">{}</text>"##,
                frame.y(*tick),
                escape(label)
            );
        }
        let mid = frame.top + frame.height / 2.0;
        let _ = writeln!(
            out,
            r##"<text x="{title_x:.2}" y="{mid:.2}" fill="{color}" font-family="{FONT}" font-size="12" text-anchor="middle" transform="rotate(-90 {title_x:.2} {mid:.2})">{}</text>"##,
            escape(&scale.label)
        );
    }
}

fn draw_lines(out: &mut String, chart: &VolumeChart, frame: &Frame) {
    for line in &chart.lines {
        let y = frame.y(line.strike);
        let color = escape(&line.color);
        let _ = writeln!(
            out,
            r##"<line x1="{:.2}" y1="{y:.2}" x2="{:.2}" y2="{y:.2}" stroke="{color}" stroke-width="1.5" stroke-dasharray="{}" stroke-opacity="0.7"/>"##,
            frame.left,
            frame.right(),
            line.dash.svg()
        );
        if let Some(label) = &line.label {
            let _ = writeln!(
                out,
                r##"<text x="{:.2}" y="{:.2}" fill="{color}" font-family="{FONT}" font-size="12" text-anchor="end">{}</text>"##,
                frame.right() - 4.0,
                y - 4.0,
                escape(label)
            );
        }
    }
}

/// Escape text for use in SVG content and attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
