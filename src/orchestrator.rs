use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::aggregate::{app_overview, build_all_views};
use crate::config::StoreConfig;
use crate::drilldown::{self, DrillSelection};
use crate::listing::{self, ListingQuery};
use crate::models::collapse_app_name;
use crate::render;
use crate::store::{ingest_reviews, Store};
use crate::summary_export;

pub struct RunOptions {
    pub ymd: String,
    pub output_dir: String,
    /// Render the per-app overview section for this app.
    pub focus_app: Option<String>,
    /// Expand one summary entry into its detail rows.
    pub drill: Option<DrillSelection>,
    /// Include the pre-aggregated summaries listing.
    pub listing: Option<ListingQuery>,
}

pub async fn run_report(cfg: &StoreConfig, opts: &RunOptions) -> Result<()> {
    let pipeline_start = std::time::Instant::now();
    info!(
        "Pipeline started - date={}, collection={}",
        opts.ymd, cfg.reviews_collection
    );

    let store = Store::new(cfg)?;

    // 1) preflight count; informational only, the paged fetch is the truth
    match store.count_exact(&cfg.reviews_collection).await {
        Ok(Some(n)) => debug!(
            "Store count preflight - collection={}, rows={}",
            cfg.reviews_collection, n
        ),
        Ok(None) => debug!(
            "Store count preflight - collection={}, rows=unknown",
            cfg.reviews_collection
        ),
        Err(e) => warn!("Store count preflight failed - {e:#}"),
    }

    // 2) fetch and ingest reviews
    let fetch_start = std::time::Instant::now();
    let raw = store.select_all(&cfg.reviews_collection).await?;
    let raw_count = raw.len();
    let rows = ingest_reviews(raw);
    info!(
        "Review ingest completed - duration={:.2}s, raw={}, usable={}",
        fetch_start.elapsed().as_secs_f32(),
        raw_count,
        rows.len()
    );

    if rows.is_empty() {
        warn!(
            "No usable reviews in collection {} - the report will carry empty views",
            cfg.reviews_collection
        );
    }

    let mut volume: Vec<(String, usize)> = Vec::new();
    for r in &rows {
        let key = collapse_app_name(&r.app);
        match volume.iter().position(|(k, _)| *k == key) {
            Some(i) => volume[i].1 += 1,
            None => volume.push((key, 1)),
        }
    }
    for (app, n) in &volume {
        debug!("App volume - app={}, reviews={}", app, n);
    }

    // 3) aggregate every view
    let agg_start = std::time::Instant::now();
    let views = build_all_views(&rows);
    info!(
        "Aggregation completed - duration={:.2}s, apps={}, categories={}",
        agg_start.elapsed().as_secs_f32(),
        views.bank.len(),
        views.category_ratios.len()
    );

    // 4) render the report
    let mut report = render::render_report(&opts.ymd, rows.len(), &views);

    // 5) optional per-app overview
    if let Some(app) = &opts.focus_app {
        let overview = app_overview(&rows, app);
        if overview.total_reviews == 0 {
            warn!("No reviews for requested app - app={}", app);
        }
        report.push_str(&render::render_overview(&overview));
    }

    // 6) optional drill-down; app-scoped selections go through the store,
    // with the full predicate re-applied so both routes agree
    let mut drill_rows = None;
    if let Some(sel) = &opts.drill {
        let matched = match sel.app_scope() {
            Some(app) => {
                let fetched = store
                    .select_where(&cfg.reviews_collection, "app", app)
                    .await?;
                let mut subset = ingest_reviews(fetched);
                subset.retain(|r| drilldown::matches(r, sel));
                subset
            }
            None => drilldown::drill_down(&rows, sel),
        };
        info!(
            "Drill-down completed - selection=\"{}\", matches={}",
            sel.describe(),
            matched.len()
        );
        report.push_str(&render::render_drilldown(sel, &matched));
        drill_rows = Some(matched);
    }

    // 7) optional summaries listing
    let mut listing_rows = None;
    if let Some(query) = &opts.listing {
        let summaries = store.select_all(&cfg.summaries_collection).await?;
        let filtered = listing::filter_rows(&summaries, query);
        info!(
            "Summaries listing completed - rows={}, after_filters={}",
            summaries.len(),
            filtered.len()
        );
        report.push_str(&render::render_listing(query, &filtered));
        listing_rows = Some(filtered);
    }

    // 8) persist to the date-scoped directory
    let persist_start = std::time::Instant::now();
    let date_dir = std::path::Path::new(&opts.output_dir).join(&opts.ymd);
    std::fs::create_dir_all(&date_dir).with_context(|| format!("create {:?}", date_dir))?;
    debug!("Output directory: {}", date_dir.display());

    std::fs::write(date_dir.join("report.md"), report.as_bytes())
        .with_context(|| format!("write {:?}", date_dir.join("report.md")))?;
    debug!("Wrote report.md");

    summary_export::write_all_summaries(&date_dir, &opts.ymd, &rows)?;
    debug!("Wrote summary bundle");

    if let (Some(sel), Some(matched)) = (&opts.drill, &drill_rows) {
        summary_export::write_drilldown(&date_dir, sel, matched)?;
        debug!("Wrote summary.drilldown.json");
    }
    if let (Some(query), Some(filtered)) = (&opts.listing, &listing_rows) {
        summary_export::write_listing(&date_dir, query, filtered)?;
        debug!("Wrote summary.listing.json");
    }

    info!(
        "Output persisted - duration={:.2}s, directory={}",
        persist_start.elapsed().as_secs_f32(),
        date_dir.display()
    );

    info!(
        "Pipeline completed successfully - total_duration={:.2}s, reviews={}, apps={}",
        pipeline_start.elapsed().as_secs_f32(),
        rows.len(),
        views.bank.len()
    );
    Ok(())
}
