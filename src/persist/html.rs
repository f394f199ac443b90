//! Self-refreshing HTML page around a plotly figure.

use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::model::figure::Figure;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HtmlOptions {
    /// Seconds between automatic page reloads. 0 disables the refresh tag.
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u32,
    /// Remember legend toggles and zoom across reloads (browser localStorage).
    #[serde(default = "default_true")]
    pub persist_state: bool,
    /// localStorage key shared by every page for legend visibility.
    #[serde(default = "default_visibility_key")]
    pub visibility_key: String,
    #[serde(default = "default_plotly_cdn")]
    pub plotly_cdn: String,
}

fn default_refresh_secs() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

fn default_visibility_key() -> String {
    "plotly_visibility".to_string()
}

fn default_plotly_cdn() -> String {
    "https://cdn.plot.ly/plotly-2.35.2.min.js".to_string()
}

impl Default for HtmlOptions {
    fn default() -> Self {
        HtmlOptions {
            refresh_secs: default_refresh_secs(),
            persist_state: true,
            visibility_key: default_visibility_key(),
            plotly_cdn: default_plotly_cdn(),
        }
    }
}

/// localStorage key for one page's axis ranges.
pub fn range_key(stem: &str) -> String {
    format!("plotly_axis_ranges_{stem}")
}

pub fn render_page(
    figure: &Figure,
    options: &HtmlOptions,
    stem: &str,
    generated_at: NaiveDateTime,
) -> Result<String, RenderError> {
    // `</` inside an inline script would end it early.
    let figure_json = figure.to_json()?.replace("</", "<\\/");
    let title = figure
        .layout
        .title
        .as_ref()
        .map(|t| t.text.as_str())
        .unwrap_or(stem);

    let mut page = String::new();
    page.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    if options.refresh_secs > 0 {
        page.push_str(&format!(
            "<meta http-equiv=\"refresh\" content=\"{}\">\n",
            options.refresh_secs
        ));
    }
    page.push_str(&format!(
        "<meta name=\"generated\" content=\"{}\">\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    page.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    page.push_str(&format!(
        "<script src=\"{}\"></script>\n",
        escape_html(&options.plotly_cdn)
    ));
    page.push_str(STYLE);
    page.push_str("</head>\n<body>\n<div id=\"chart\"></div>\n<script>\n");
    page.push_str(&format!("const figure = {figure_json};\n"));
    if options.persist_state {
        page.push_str(&format!(
            "const STORAGE_KEY = {};\nconst RANGE_STORAGE_KEY = {};\n",
            js_string(&options.visibility_key),
            js_string(&range_key(stem))
        ));
        page.push_str(STATE_SCRIPT);
    } else {
        page.push_str(
            "Plotly.newPlot('chart', figure.data, figure.layout, {responsive: true});\n",
        );
    }
    page.push_str("</script>\n</body>\n</html>\n");
    Ok(page)
}

const STYLE: &str = r#"<style>
html, body { margin: 0; padding: 0; height: 100%; background-color: black; overflow: hidden; }
#chart { width: 100vw; height: 100vh; }
</style>
"#;

const STATE_SCRIPT: &str = r#"const saved = (key) => {
  try { return JSON.parse(localStorage.getItem(key)); } catch (e) { return null; }
};
Plotly.newPlot('chart', figure.data, figure.layout, {responsive: true}).then((gd) => {
  const visibility = saved(STORAGE_KEY);
  if (Array.isArray(visibility) && visibility.length === gd.data.length) {
    Plotly.restyle(gd, 'visible', visibility);
  }
  const ranges = saved(RANGE_STORAGE_KEY);
  if (ranges) {
    Plotly.relayout(gd, ranges);
  }
  gd.on('plotly_legendclick', (event) => {
    const visibilities = gd.data.map((trace) => trace.visible === undefined ? true : trace.visible);
    const i = event.curveNumber;
    visibilities[i] = visibilities[i] === 'legendonly' ? true : 'legendonly';
    localStorage.setItem(STORAGE_KEY, JSON.stringify(visibilities));
  });
  gd.on('plotly_relayout', (event) => {
    const kept = {};
    for (const key in event) {
      if (key.includes('range')) {
        kept[key] = event[key];
      }
    }
    if (Object.keys(kept).length > 0) {
      localStorage.setItem(RANGE_STORAGE_KEY, JSON.stringify(kept));
    }
  });
});
"#;

fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string())
        .to_string()
        .replace("</", "<\\/")
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::figure::Layout;
    use chrono::NaiveDate;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn page_has_refresh_chart_div_and_state_keys() {
        let fig = Figure::new(Layout::dark("GEX History: SPX"));
        let page = render_page(&fig, &HtmlOptions::default(), "spx_gex_history", at(9)).unwrap();
        assert!(page.contains("<meta http-equiv=\"refresh\" content=\"30\">"));
        assert!(page.contains("<div id=\"chart\"></div>"));
        assert!(page.contains("\"plotly_visibility\""));
        assert!(page.contains("\"plotly_axis_ranges_spx_gex_history\""));
        assert!(page.contains("<title>GEX History: SPX</title>"));
    }

    #[test]
    fn script_close_in_data_is_neutralised() {
        let fig = Figure::new(Layout::dark("</script><b>x"));
        let page = render_page(&fig, &HtmlOptions::default(), "x", at(9)).unwrap();
        assert_eq!(page.matches("</script>").count(), 2);
    }

    #[test]
    fn pages_differ_only_in_generation_stamp() {
        let fig = Figure::new(Layout::dark("t"));
        let a = render_page(&fig, &HtmlOptions::default(), "x", at(9)).unwrap();
        let b = render_page(&fig, &HtmlOptions::default(), "x", at(10)).unwrap();
        let strip = |p: &str| {
            p.lines()
                .filter(|l| !l.starts_with("<meta name=\"generated\""))
                .collect::<Vec<_>>()
                .join("\n")
        };
        assert_ne!(a, b);
        assert_eq!(strip(&a), strip(&b));
    }

    #[test]
    fn state_script_can_be_disabled() {
        let opts = HtmlOptions {
            persist_state: false,
            refresh_secs: 0,
            ..HtmlOptions::default()
        };
        let page = render_page(&Figure::new(Layout::dark("t")), &opts, "x", at(9)).unwrap();
        assert!(!page.contains("localStorage"));
        assert!(!page.contains("http-equiv"));
    }
}
