use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE, RANGE};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::api_types::ApiReview;
use crate::config::StoreConfig;
use crate::listing::{cell_text, is_audit_column};
use crate::models::{parse_quoted_list, parse_score, parse_timestamp, split_items, Review};

const PAGE_SIZE: usize = 1000;

/// Client for the hosted review store. Collections are REST resources under
/// `rest/v1/`, authenticated with the project api key.
pub struct Store {
    client: Client,
    base: Url,
}

impl Store {
    pub fn new(cfg: &StoreConfig) -> Result<Store> {
        let mut headers = HeaderMap::new();
        let mut api_key =
            HeaderValue::from_str(&cfg.api_key).context("api key is not a valid header value")?;
        api_key.set_sensitive(true);
        headers.insert("apikey", api_key);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", cfg.api_key))
            .context("api key is not a valid header value")?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context("build HTTP client")?;

        // A trailing slash keeps Url::join from eating the last path segment.
        let mut base = cfg.url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base =
            Url::parse(&base).with_context(|| format!("invalid store url {:?}", cfg.url))?;

        Ok(Store { client, base })
    }

    fn collection_url(&self, collection: &str) -> Result<Url> {
        self.base
            .join(&format!("rest/v1/{collection}"))
            .with_context(|| format!("invalid collection name {collection:?}"))
    }

    /// Every row of a collection.
    pub async fn select_all(&self, collection: &str) -> Result<Vec<Value>> {
        self.fetch_paged(collection, &[]).await
    }

    /// Rows where `field` equals `value` exactly.
    pub async fn select_where(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Value>> {
        let filter = format!("eq.{value}");
        self.fetch_paged(collection, &[(field, filter.as_str())]).await
    }

    /// Range-paged fetch, one outstanding request at a time, until a short
    /// page signals the end.
    async fn fetch_paged(&self, collection: &str, filters: &[(&str, &str)]) -> Result<Vec<Value>> {
        let url = self.collection_url(collection)?;
        let start = std::time::Instant::now();
        let mut rows: Vec<Value> = Vec::new();
        let mut offset = 0usize;

        loop {
            let range = format!("{}-{}", offset, offset + PAGE_SIZE - 1);
            debug!("Fetching rows - collection={}, range={}", collection, range);

            let mut req = self.client.get(url.clone()).query(&[("select", "*")]);
            for (field, filter) in filters {
                req = req.query(&[(field, filter)]);
            }
            let resp = req
                .header(RANGE, range.as_str())
                .send()
                .await
                .with_context(|| format!("request failed for {url}"))?;
            let resp = resp
                .error_for_status()
                .with_context(|| format!("HTTP error for {url}"))?;
            let page: Vec<Value> = resp
                .json()
                .await
                .with_context(|| format!("decoding JSON for {url}"))?;

            let got = page.len();
            rows.extend(page);
            if got < PAGE_SIZE {
                break;
            }
            offset += PAGE_SIZE;
        }

        info!(
            "Store fetch completed - collection={}, duration={:.2}s, rows={}",
            collection,
            start.elapsed().as_secs_f32(),
            rows.len()
        );
        Ok(rows)
    }

    /// Total row count via a HEAD probe; None when the store omits it.
    pub async fn count_exact(&self, collection: &str) -> Result<Option<u64>> {
        let url = self.collection_url(collection)?;
        let resp = self
            .client
            .head(url.clone())
            .query(&[("select", "*")])
            .header("Prefer", "count=exact")
            .send()
            .await
            .with_context(|| format!("request failed for {url}"))?;
        let resp = resp
            .error_for_status()
            .with_context(|| format!("HTTP error for {url}"))?;
        let count = resp
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_total);
        Ok(count)
    }
}

/// "0-24/3573" -> 3573. The store sends "*" when counting is disabled.
fn parse_total(content_range: &str) -> Option<u64> {
    content_range.rsplit('/').next()?.parse().ok()
}

/// Map raw store rows into parsed reviews. Rows that are not objects or
/// carry no app name cannot feed any view; they are dropped and counted.
pub fn ingest_reviews(raw: Vec<Value>) -> Vec<Review> {
    let total = raw.len();
    let mut rows = Vec::with_capacity(total);
    let mut unusable = 0usize;
    for value in raw {
        match review_from_value(value) {
            Some(review) => rows.push(review),
            None => unusable += 1,
        }
    }
    if unusable > 0 {
        warn!(
            "Dropped rows without a usable app column - dropped={}, kept={}",
            unusable,
            rows.len()
        );
    }
    rows
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn review_from_value(value: Value) -> Option<Review> {
    let api: ApiReview = serde_json::from_value(value).ok()?;
    let app = api.app.as_deref().map(str::trim).unwrap_or_default().to_string();
    if app.is_empty() {
        return None;
    }

    let sentiment_tags = parse_quoted_list(api.sentiments.as_deref().unwrap_or_default());
    let category_tokens = parse_quoted_list(api.mapped_categories.as_deref().unwrap_or_default());
    let aspects = non_empty(api.aspects.as_deref()).map(split_items).unwrap_or_default();
    let opinions = non_empty(api.opinions.as_deref()).map(split_items).unwrap_or_default();
    let score = api.score.as_ref().and_then(parse_score);
    let posted_at = api.timestamp.as_deref().and_then(parse_timestamp);

    // Known columns lead the detail table; extra columns follow in name
    // order, with audit columns dropped.
    let mut detail = vec![("app".to_string(), app.clone())];
    let known = [
        ("sentiments", api.sentiments.as_deref()),
        ("mapped_categories", api.mapped_categories.as_deref()),
        ("aspects", api.aspects.as_deref()),
        ("opinions", api.opinions.as_deref()),
        ("timestamp", api.timestamp.as_deref()),
    ];
    for (name, text) in known {
        if let Some(text) = text {
            detail.push((name.to_string(), text.to_string()));
        }
    }
    if let Some(score_raw) = &api.score {
        detail.push(("score".to_string(), cell_text(score_raw)));
    }
    for (name, value) in &api.extra {
        if !is_audit_column(name) {
            detail.push((name.clone(), cell_text(value)));
        }
    }

    Some(Review {
        app,
        sentiment_tags,
        category_tokens,
        aspects,
        opinions,
        score,
        posted_at,
        detail,
    })
}
