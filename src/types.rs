//! Serializable inventory of a loaded site.
//!
//! `spark check --manifest <path>` writes a [`ContentManifest`] as JSON so
//! the linked content graph can be inspected or diffed without generating.
//! Cross references are written as folder names, not indices.

use crate::config::SiteConfiguration;
use crate::content::SiteContent;
use crate::loader::LoadSummary;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ContentManifest {
    pub config: SiteConfiguration,
    /// Resolved "now" of the run, seconds since the epoch.
    pub current_time: i64,
    pub posts: Vec<PostEntry>,
    pub series: Vec<SeriesEntry>,
    pub tags: Vec<TagEntry>,
    pub pages: Vec<PageEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_posts: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_entries: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostEntry {
    pub id: String,
    pub title: String,
    pub series: String,
    pub tags: Vec<String>,
    pub written_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_ts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_ts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_after_ts: Option<i64>,
    pub publishable: bool,
    pub has_code: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggested_next: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggested_prev: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesEntry {
    pub id: String,
    pub title: String,
    pub order: i32,
    /// Publishable posts only.
    pub posts: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagEntry {
    pub tag: String,
    pub posts: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageEntry {
    pub id: String,
    pub filename: String,
    pub title: String,
    pub home: bool,
}

impl ContentManifest {
    pub fn from_site(site: &SiteContent, config: &SiteConfiguration, summary: &LoadSummary) -> Self {
        let names = |ids: &[crate::content::PostId]| -> Vec<String> {
            ids.iter()
                .map(|id| site.post(*id).folder_name.clone())
                .collect()
        };
        Self {
            config: config.clone(),
            current_time: site.current_time,
            posts: site
                .posts
                .iter()
                .map(|post| PostEntry {
                    id: post.folder_name.clone(),
                    title: post.title.clone(),
                    series: post.series_name.clone(),
                    tags: post.tags.iter().map(str::to_string).collect(),
                    written_date: post.written_date.clone(),
                    written_ts: post.written_ts,
                    updated_ts: post.updated_ts,
                    publish_after_ts: post.publish_after_ts,
                    publishable: post.can_publish,
                    has_code: post.has_code,
                    suggested_next: names(&post.suggested_next),
                    suggested_prev: names(&post.suggested_prev),
                })
                .collect(),
            series: site
                .series
                .iter()
                .map(|series| SeriesEntry {
                    id: series.folder_name.clone(),
                    title: series.title.clone(),
                    order: series.order,
                    posts: names(&series.posts),
                })
                .collect(),
            tags: site
                .tags
                .iter()
                .map(|entry| TagEntry {
                    tag: entry.tag.clone(),
                    posts: names(&entry.posts),
                })
                .collect(),
            pages: site
                .misc_pages
                .iter()
                .map(|page| PageEntry {
                    id: page.folder_name.clone(),
                    filename: page.filename.clone(),
                    title: page.title.clone(),
                    home: page.is_home_page(),
                })
                .collect(),
            skipped_posts: summary.skipped_posts.clone(),
            failed_entries: summary.failed_entries.clone(),
        }
    }
}
