//! Multipart image post to a chat webhook (Discord-style `content` + `file`).

use std::path::Path;
use std::time::Duration;

use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};
use reqwest::multipart::{Form, Part};

use crate::error::PublishError;

pub struct Webhook {
    client: reqwest::Client,
    url: String,
}

impl Webhook {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gex-charts/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Webhook {
            client,
            url: url.into(),
        })
    }

    /// Post one image with a text message. Any non-2xx answer is an error;
    /// the caller decides whether to log it. Nothing is retried.
    pub async fn post_image(&self, image: &Path, content: &str) -> Result<(), PublishError> {
        let bytes = std::fs::read(image).map_err(|source| PublishError::Io {
            path: image.to_path_buf(),
            source,
        })?;
        let file_name = image
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("chart")
            .to_string();
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_for(image))?;
        let form = Form::new().text("content", content.to_string()).part("file", part);

        let resp = self.client.post(&self.url).multipart(form).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(PublishError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Weekdays 09:30–16:00 inclusive, local exchange time.
pub fn market_status(at: NaiveDateTime) -> &'static str {
    let weekday = !matches!(at.weekday(), Weekday::Sat | Weekday::Sun);
    let open = NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN);
    let close = NaiveTime::from_hms_opt(16, 0, 0).unwrap_or(NaiveTime::MIN);
    let t = at.time();
    if weekday && open <= t && t <= close {
        "Market Hours"
    } else {
        "After Hours"
    }
}

pub fn message(asset: &str, at: NaiveDateTime) -> String {
    format!(
        "📊 **{} Volume Distribution** | {} | {}",
        asset.to_uppercase(),
        at.format("%Y-%m-%d %H:%M"),
        market_status(at)
    )
}
