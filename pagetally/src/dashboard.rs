//! HTML dashboard rendering
//!
//! One self-contained page built by string templating over the
//! aggregate statistics. The breakdown maps arrive in
//! first-occurrence order, so the ranking sort happens here, on the
//! consumer side.

use pagetally_core::analytics::Statistics;

/// Render the dashboard page for the given statistics.
pub fn render(stats: &Statistics) -> String {
    let top_pages = breakdown_rows(&stats.page_views, "No page views yet");
    let top_events = breakdown_rows(&stats.events, "No events yet");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>pagetally</title>
<style>
  body {{ font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 48rem; color: #1a1a2e; }}
  h1 {{ font-size: 1.4rem; }}
  .cards {{ display: flex; gap: 1rem; flex-wrap: wrap; }}
  .card {{ flex: 1 1 8rem; border: 1px solid #ddd; border-radius: 8px; padding: 1rem; text-align: center; }}
  .card .value {{ font-size: 1.8rem; font-weight: 700; }}
  .card .label {{ color: #666; font-size: 0.8rem; }}
  table {{ border-collapse: collapse; width: 100%; margin-top: 0.5rem; }}
  td, th {{ text-align: left; padding: 0.3rem 0.6rem; border-bottom: 1px solid #eee; }}
  td.count {{ text-align: right; }}
</style>
</head>
<body>
<h1>pagetally &mdash; last {hours}h</h1>
<div class="cards">
  <div class="card"><div class="value">{page_views}</div><div class="label">page views</div></div>
  <div class="card"><div class="value">{events}</div><div class="label">events</div></div>
  <div class="card"><div class="value">{unique_users}</div><div class="label">unique users</div></div>
  <div class="card"><div class="value">{total_users}</div><div class="label">registered users</div></div>
</div>
<h2>Top pages</h2>
<table><tr><th>Page</th><th>Views</th></tr>{top_pages}</table>
<h2>Top events</h2>
<table><tr><th>Event</th><th>Count</th></tr>{top_events}</table>
</body>
</html>
"#,
        hours = stats.period_hours,
        page_views = stats.total_page_views,
        events = stats.total_events,
        unique_users = stats.unique_users,
        total_users = stats.total_users,
        top_pages = top_pages,
        top_events = top_events,
    )
}

/// Render a breakdown map as table rows, sorted by count descending.
fn breakdown_rows(map: &serde_json::Map<String, serde_json::Value>, empty: &str) -> String {
    if map.is_empty() {
        return format!(r#"<tr><td colspan="2">{empty}</td></tr>"#);
    }

    let mut entries: Vec<(&String, u64)> = map
        .iter()
        .map(|(key, value)| (key, value.as_u64().unwrap_or(0)))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));

    entries
        .iter()
        .take(10)
        .map(|(key, count)| {
            format!(
                r#"<tr><td>{}</td><td class="count">{}</td></tr>"#,
                escape(key),
                count
            )
        })
        .collect()
}

/// Minimal HTML escaping for client-supplied strings.
fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
