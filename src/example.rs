use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::{ConfigFile, WebhookConfig, WindowConfig};
use crate::model::style::{StyleDescriptor, TraceMode, Visibility};
use crate::persist::WritePolicy;
use crate::persist::html::HtmlOptions;
use crate::render::{ImageFormat, VolumeOptions};
use crate::transform::Band;

/// The config printed by `gex-charts example`: a live-refresh setup for a
/// single feed directory, regular session only, PNG volume charts.
pub fn example_config() -> ConfigFile {
    let mut gex_styles = BTreeMap::new();
    gex_styles.insert(
        "ZERO".to_string(),
        StyleDescriptor {
            color: "yellow".to_string(),
            symbol: Some("circle-open".to_string()),
            mode: TraceMode::Markers,
            visibility: Visibility::Shown,
            size: Some(8),
        },
    );

    ConfigFile {
        input_dir: PathBuf::from("/srv/gex/feed"),
        output_dir: Some(PathBuf::from("/srv/gex/charts")),
        assets: None,
        routes: None,
        schemas: BTreeMap::new(),
        styles: BTreeMap::from([("gex_history".to_string(), gex_styles)]),
        window: Some(WindowConfig {
            start: "08:30:00".to_string(),
            end: "15:15:00".to_string(),
        }),
        schema_windows: BTreeMap::from([("gex_history".to_string(), None)]),
        band: Band::Percent { value: 1.5 },
        write_policy: WritePolicy::Overwrite,
        timestamp_formats: vec!["%Y-%m-%d %H:%M:%S".to_string()],
        html: HtmlOptions::default(),
        volume: VolumeOptions {
            format: ImageFormat::Png,
            ..Default::default()
        },
        webhook: WebhookConfig::default(),
        poll_interval_secs: 300,
        debounce_ms: 250,
        initial_scan: true,
    }
}

/// Print an example config JSON to stdout.
pub fn run() -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&example_config())?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Overrides;

    #[test]
    fn example_resolves() {
        let json = serde_json::to_string(&example_config()).unwrap();
        let file: ConfigFile = serde_json::from_str(&json).unwrap();
        assert_eq!(file, example_config());
        let app = file.resolve_with_env(&Overrides::default(), |_| None).unwrap();
        assert!(app.pipeline.window.is_some());
        assert_eq!(app.output_dir, PathBuf::from("/srv/gex/charts"));
    }
}
