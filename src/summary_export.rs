// src/summary_export.rs
use anyhow::{Context, Result};
use itertools::Itertools;
use serde::Serialize;
use serde_json::{json, Value};
use std::{fs, path::Path};
use xxhash_rust::xxh3::xxh3_64;

use crate::aggregate::aggregate;
use crate::drilldown::DrillSelection;
use crate::listing::{self, ListingQuery};
use crate::models::{Review, ViewMode};
use crate::taxonomy::classify;

/* -------------------------------------------------------------------------- */
/* Entry point                                                                */
/* -------------------------------------------------------------------------- */

/// Write every chart-ready summary JSON into `out/<date>/`, one file per
/// view mode plus a per-day index.
pub fn write_all_summaries(out_dir_for_date: &Path, date: &str, rows: &[Review]) -> Result<()> {
    fs::create_dir_all(out_dir_for_date)
        .with_context(|| format!("create {:?}", out_dir_for_date))?;

    let mut files = Vec::with_capacity(ViewMode::ALL.len());
    for mode in ViewMode::ALL {
        let view = aggregate(rows, mode);
        let name = format!("summary.{}.json", mode.slug());
        write_json(out_dir_for_date.join(&name), &view)?;
        files.push(name);
    }

    let idx = build_index(date, rows, &files);
    write_json(out_dir_for_date.join("summary.index.json"), &idx)?;

    Ok(())
}

/// The detail rows behind one clicked summary entry.
pub fn write_drilldown(
    out_dir_for_date: &Path,
    sel: &DrillSelection,
    rows: &[Review],
) -> Result<()> {
    fs::create_dir_all(out_dir_for_date)
        .with_context(|| format!("create {:?}", out_dir_for_date))?;
    let detail: Vec<Value> = rows.iter().map(detail_object).collect();
    let payload = json!({
        "selection": sel.describe(),
        "count": rows.len(),
        "rows": detail,
    });
    write_json(out_dir_for_date.join("summary.drilldown.json"), &payload)
}

/// The filtered pre-aggregated summaries listing, rows kept verbatim.
pub fn write_listing(
    out_dir_for_date: &Path,
    query: &ListingQuery,
    rows: &[Value],
) -> Result<()> {
    fs::create_dir_all(out_dir_for_date)
        .with_context(|| format!("create {:?}", out_dir_for_date))?;
    let payload = json!({
        "app": query.app,
        "search": query.search,
        "apps": listing::app_names(rows),
        "columns": listing::display_columns(rows),
        "count": rows.len(),
        "rows": rows,
    });
    write_json(out_dir_for_date.join("summary.listing.json"), &payload)
}

fn write_json<P: AsRef<Path>, T: ?Sized + Serialize>(path: P, value: &T) -> Result<()> {
    fs::write(path, serde_json::to_vec_pretty(value)?)
        .map(|_| ())
        .map_err(|e| e.into())
}

/* -------------------------------------------------------------------------- */
/* Index                                                                      */
/* -------------------------------------------------------------------------- */

fn build_index(date: &str, rows: &[Review], files: &[String]) -> Value {
    let apps = rows.iter().map(|r| r.app.as_str()).unique().count();
    let categories = rows
        .iter()
        .flat_map(|r| &r.category_tokens)
        .map(|t| classify(t))
        .unique()
        .count();
    json!({
        "date": date,
        "version": 1,
        "counts": {
            "reviews": rows.len(),
            "apps": apps,
            "categories": categories,
        },
        "fingerprint": collection_fingerprint(rows),
        "files": files,
    })
}

/// Stable hash of the ingested collection, so downstream consumers can tell
/// whether a day's bundle changed.
fn collection_fingerprint(rows: &[Review]) -> String {
    let mut buf = String::new();
    for row in rows {
        for (key, value) in &row.detail {
            buf.push_str(key);
            buf.push('=');
            buf.push_str(value);
            buf.push('\n');
        }
        buf.push('\n');
    }
    format!("{:016x}", xxh3_64(buf.as_bytes()))
}

fn detail_object(review: &Review) -> Value {
    let map: serde_json::Map<String, Value> = review
        .detail
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    Value::Object(map)
}
