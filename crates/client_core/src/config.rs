use std::{collections::HashMap, fs};

use anyhow::Context;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
        }
    }
}

/// Defaults, then `client.toml`, then the `DETECT_BASE_URL` environment
/// variable. Callers layer CLI flags on top of the returned value.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("client.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("base_url") {
                settings.base_url = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("DETECT_BASE_URL") {
        settings.base_url = v;
    }

    settings
}

/// Validates and normalizes a configured base URL so endpoint paths can be
/// appended with plain formatting.
pub fn prepare_base_url(raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Ok(Settings::default().base_url);
    }

    let parsed = Url::parse(raw).with_context(|| format!("invalid base url '{raw}'"))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("base url must start with http:// or https://, got '{raw}'");
    }

    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_local_backend() {
        assert_eq!(Settings::default().base_url, "http://127.0.0.1:5000");
    }

    #[test]
    fn strips_trailing_slashes() {
        assert_eq!(
            prepare_base_url("http://detect.example:5000/").expect("url"),
            "http://detect.example:5000"
        );
    }

    #[test]
    fn empty_value_falls_back_to_default() {
        assert_eq!(prepare_base_url("  ").expect("url"), DEFAULT_BASE_URL);
    }

    #[test]
    fn rejects_non_http_schemes() {
        assert!(prepare_base_url("ftp://detect.example").is_err());
        assert!(prepare_base_url("detect.example:5000").is_err());
    }
}
