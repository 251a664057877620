// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

fn default_reviews_collection() -> String {
    "reviews".to_string()
}

fn default_summaries_collection() -> String {
    "summaries".to_string()
}

/// Connection settings for the hosted review store (PostgREST dialect).
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Project base URL, e.g. "https://xyzcompany.supabase.co".
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_reviews_collection")]
    pub reviews_collection: String,
    #[serde(default = "default_summaries_collection")]
    pub summaries_collection: String,
}

/// Config file location: CLI flag > REVIEW_PULSE_CONFIG > platform config dir.
pub fn resolve_config_path(cli: Option<&str>) -> PathBuf {
    if let Some(path) = cli {
        return PathBuf::from(path);
    }
    if let Ok(path) = std::env::var("REVIEW_PULSE_CONFIG") {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("review_pulse")
        .join("config.json")
}

pub fn load_config(path: &Path) -> Result<StoreConfig> {
    if !path.exists() {
        return Err(anyhow!(
            "store config not found at {}\n\
             Use --config to specify a config file, or set REVIEW_PULSE_CONFIG.\n\
             Example config.json:\n\
             {{\n  \"url\": \"https://YOUR-PROJECT.supabase.co\",\n  \"api_key\": \"YOUR_ANON_KEY\"\n}}\n",
            path.display()
        ));
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let mut cfg: StoreConfig = serde_json::from_str(&text)
        .with_context(|| format!("parse config {}", path.display()))?;

    // Env wins over the file for credentials, handy in CI.
    if let Ok(url) = std::env::var("REVIEW_PULSE_URL") {
        cfg.url = url;
    }
    if let Ok(key) = std::env::var("REVIEW_PULSE_KEY") {
        cfg.api_key = key;
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parse_fills_collection_defaults() {
        let cfg: StoreConfig =
            serde_json::from_str(r#"{"url": "https://x.example", "api_key": "k"}"#).unwrap();
        assert_eq!(cfg.reviews_collection, "reviews");
        assert_eq!(cfg.summaries_collection, "summaries");
    }

    #[test]
    fn config_parse_keeps_explicit_collections() {
        let cfg: StoreConfig = serde_json::from_str(
            r#"{"url": "https://x.example", "api_key": "k", "reviews_collection": "bank_reviews"}"#,
        )
        .unwrap();
        assert_eq!(cfg.reviews_collection, "bank_reviews");
        assert_eq!(cfg.summaries_collection, "summaries");
    }

    #[test]
    fn cli_path_takes_precedence() {
        let path = resolve_config_path(Some("/tmp/custom.json"));
        assert_eq!(path, PathBuf::from("/tmp/custom.json"));
    }
}
