//! RSS 2.0 feed of publishable posts.
//!
//! The feed carries a `lastBuildDate` that changes every run, so it is
//! written with that element masked out of the comparison: a run that only
//! moved the clock leaves the file alone.

use super::{ComposeError, PublishTally};
use crate::buffer::GrowableBuffer;
use crate::content::{SiteContent, ThemeKind};
use crate::writer::write_if_different_ignoring;
use chrono::DateTime;
use maud::html;

pub const FEED_FILENAME: &str = "feed.rss";

/// `Sun, 07 Jan 2024 10:00:00 +0000`
pub fn rfc822(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .unwrap_or_default()
        .format("%a, %d %b %Y %H:%M:%S %z")
        .to_string()
}

fn escape(text: &str) -> String {
    html! { (text) }.into_string()
}

/// Render the feed for the bright host.
pub fn render_feed(site: &SiteContent, description: &str) -> Result<GrowableBuffer, ComposeError> {
    let host = escape(&site.bright.host);
    let mut feed = GrowableBuffer::new();
    feed.append("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n<rss version=\"2.0\">\n<channel>\n")?;
    feed.append_formatted(format_args!(
        "<lastBuildDate>{}</lastBuildDate>\n",
        rfc822(site.current_time)
    ))?;
    feed.append_formatted(format_args!(
        "<title>{host} posts</title>\n<link>https://{host}/</link>\n<description>{}</description>\n",
        escape(description)
    ))?;

    for (_, post) in site.publishable_posts() {
        let category = post
            .series
            .map(|id| site.series_by_id(id).title.as_str())
            .unwrap_or(&post.series_name);
        feed.append_formatted(format_args!(
            "<item>\n<title>{}</title>\n<category>{}</category>\n<pubDate>{}</pubDate>\n\
             <link>https://{host}/posts/{}</link>\n<description>{}</description>\n</item>\n",
            escape(&post.title),
            escape(category),
            rfc822(post.written_ts.unwrap_or(0)),
            escape(&post.folder_name),
            escape(&post.long_description),
        ))?;
    }
    feed.append("</channel>\n</rss>\n")?;
    Ok(feed)
}

/// Write the feed into both theme roots.
pub fn publish_feeds(
    site: &SiteContent,
    description: &str,
    tally: &mut PublishTally,
) -> Result<(), ComposeError> {
    let feed = render_feed(site, description)?;
    for kind in ThemeKind::ALL {
        let path = site.theme(kind).output_dir.join(FEED_FILENAME);
        let outcome = write_if_different_ignoring(&feed, &path, "lastBuildDate")?;
        tally.record(kind, FEED_FILENAME, outcome);
    }
    Ok(())
}
