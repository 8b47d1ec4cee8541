//! sitemap.xml rendering

use chrono::{DateTime, Utc};
use dopo_common::models::{Episode, Show};
use dopo_common::time::{parse_cms_datetime, to_iso_millis};
use maud::Escaper;
use std::fmt::Write;

struct StaticPage {
    path: &'static str,
    priority: &'static str,
    changefreq: &'static str,
}

const STATIC_PAGES: [StaticPage; 6] = [
    StaticPage { path: "", priority: "1.0", changefreq: "daily" },
    StaticPage { path: "/episodes", priority: "0.9", changefreq: "daily" },
    StaticPage { path: "/shows", priority: "0.9", changefreq: "weekly" },
    StaticPage { path: "/schedule", priority: "0.8", changefreq: "daily" },
    StaticPage { path: "/about", priority: "0.7", changefreq: "monthly" },
    StaticPage { path: "/partners", priority: "0.7", changefreq: "monthly" },
];

/// Full sitemap document
///
/// Static pages carry `now` as lastmod. Episodes use their update (or
/// creation) time and omit lastmod when they have neither. Records without
/// a slug have no public page and are left out.
pub fn render_sitemap(site_url: &str, shows: &[Show], episodes: &[Episode], now: DateTime<Utc>) -> String {
    let base = site_url.trim_end_matches('/');
    let now = to_iso_millis(now);
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );

    for page in &STATIC_PAGES {
        push_url(&mut xml, &format!("{}{}", base, page.path), Some(&now), page.changefreq, page.priority);
    }

    for slug in shows.iter().filter_map(|show| show.slug.as_deref()) {
        push_url(&mut xml, &format!("{}/shows/{}", base, slug), None, "weekly", "0.6");
    }

    for episode in episodes {
        let Some(slug) = episode.slug.as_deref() else {
            continue;
        };
        let lastmod = episode
            .date_updated
            .as_deref()
            .or(episode.date_created.as_deref())
            .and_then(parse_cms_datetime)
            .map(to_iso_millis);
        push_url(
            &mut xml,
            &format!("{}/episodes/{}", base, slug),
            lastmod.as_deref(),
            "monthly",
            "0.5",
        );
    }

    xml.push_str("</urlset>\n");
    xml
}

fn push_url(xml: &mut String, loc: &str, lastmod: Option<&str>, changefreq: &str, priority: &str) {
    // Writing to a String cannot fail
    xml.push_str("  <url>\n    <loc>");
    let _ = Escaper::new(xml).write_str(loc);
    xml.push_str("</loc>\n");
    if let Some(lastmod) = lastmod {
        let _ = writeln!(xml, "    <lastmod>{}</lastmod>", lastmod);
    }
    let _ = writeln!(
        xml,
        "    <changefreq>{}</changefreq>\n    <priority>{}</priority>\n  </url>",
        changefreq, priority
    );
}
