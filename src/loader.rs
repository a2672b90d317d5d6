//! Loading the content tree into a [`SiteContent`] graph.
//!
//! ## Directory Structure
//!
//! ```text
//! content/
//! ├── components/{header,footer,trailer}.html
//! ├── themes/
//! │   ├── bright/{main.css, syntax-highlighting.css?}
//! │   └── dark/...
//! ├── series/<id>/{landing-desc.html,short-description,title,order}
//! ├── misc_pages/<id>/{content.html,title,filename,description}
//! ├── posts/<id>/
//! │   ├── generate-post             # without it the post is skipped
//! │   ├── title, content.html, author, tags, series,
//! │   ├── short-description, long-description, written-date
//! │   └── suggested-{next,prev}-reading?, updated-at?, publish-after?,
//! │       publish-when-ready?, has-code?
//! └── generating/                   # lock and date exchange file
//! ```
//!
//! ## Load order
//!
//! Themes and components first, then series, misc pages and posts. Entity
//! directories are visited in name order. Series are sorted by their `order`
//! field. After the batch date resolution, posts are sorted newest first and
//! the graph is linked.
//!
//! A bad entry (missing required file, unparseable field) is logged and
//! skipped so one broken post does not take the site down. Only IO failures
//! other than "not found" abort the scan.

use crate::config::SiteConfiguration;
use crate::content::{
    ContentError, EntityKind, HtmlComponents, LinkError, MiscPage, Post, PostLoad, Series, SiteContent,
    Theme, ThemeKind,
};
use crate::dates::{self, DateError, DateResolver};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot list {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Dates(#[from] DateError),
    #[error(transparent)]
    Link(#[from] LinkError),
}

/// Entries of one collection directory.
#[derive(Debug)]
pub struct CollectionScan<T> {
    pub entries: Vec<T>,
    /// Post directories without the generate marker.
    pub skipped: Vec<String>,
    pub failed: Vec<(String, ContentError)>,
}

impl<T> Default for CollectionScan<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> CollectionScan<T> {
    /// Record a failed entry, or abort the scan if the failure is fatal.
    fn fail(&mut self, name: String, error: ContentError) -> Result<(), LoadError> {
        if error.is_fatal() {
            return Err(error.into());
        }
        warn!(entry = %name, "skipping: {error}");
        self.failed.push((name, error));
        Ok(())
    }
}

/// Immediate subdirectories of `root` in name order, as `(path, name)`.
///
/// A missing `root` yields no entries when `tolerate_missing` is set.
pub fn entity_dirs(root: &Path, tolerate_missing: bool) -> Result<Vec<(PathBuf, String)>, LoadError> {
    if tolerate_missing && !root.exists() {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| LoadError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        dirs.push((entry.into_path(), name));
    }
    Ok(dirs)
}

pub fn load_posts(dir: &Path) -> Result<CollectionScan<Post>, LoadError> {
    let mut scan = CollectionScan::default();
    for (path, name) in entity_dirs(dir, false)? {
        match Post::load(&path, &name) {
            PostLoad::Loaded(post) => scan.entries.push(*post),
            PostLoad::SkippedNotMarked => {
                debug!(post = %name, "no generate marker, skipping");
                scan.skipped.push(name);
            }
            PostLoad::Failed(e) => scan.fail(name, e)?,
        }
    }
    Ok(scan)
}

pub fn load_series(dir: &Path) -> Result<CollectionScan<Series>, LoadError> {
    let mut scan = CollectionScan::default();
    for (path, name) in entity_dirs(dir, false)? {
        match Series::load(&path, &name) {
            Ok(series) => scan.entries.push(series),
            Err(e) => scan.fail(name, e)?,
        }
    }
    scan.entries.sort_by_key(|s| s.order);
    Ok(scan)
}

pub fn load_misc_pages(dir: &Path) -> Result<CollectionScan<MiscPage>, LoadError> {
    let mut scan: CollectionScan<MiscPage> = CollectionScan::default();
    for (path, name) in entity_dirs(dir, false)? {
        match MiscPage::load(&path, &name) {
            Ok(page) => {
                if scan.entries.iter().any(|p| p.filename == page.filename) {
                    let error = ContentError::InvalidField {
                        kind: EntityKind::MiscPage,
                        id: name.clone(),
                        field: "filename",
                        reason: format!("'{}' is used by another page", page.filename),
                    };
                    scan.fail(name, error)?;
                } else {
                    scan.entries.push(page);
                }
            }
            Err(e) => scan.fail(name, e)?,
        }
    }
    Ok(scan)
}

fn load_theme(config: &SiteConfiguration, kind: ThemeKind) -> Result<Theme, ContentError> {
    Theme::load(
        &config.theme_content_dir(kind),
        kind,
        config.host(kind),
        config.theme_name(kind),
        config.output_dir(kind),
    )
}

/// Counts of what a full load saw, for reporting.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub skipped_posts: Vec<String>,
    pub failed_entries: Vec<String>,
}

/// Load, date and link the whole content tree.
pub fn load_site_content(
    config: &SiteConfiguration,
    resolver: &dyn DateResolver,
) -> Result<(SiteContent, LoadSummary), LoadError> {
    let bright = load_theme(config, ThemeKind::Bright)?;
    let dark = load_theme(config, ThemeKind::Dark)?;
    let components = HtmlComponents::load(&config.content_dir("components"))?;

    let series = load_series(&config.content_dir("series"))?;
    let misc_pages = load_misc_pages(&config.content_dir("misc_pages"))?;
    let posts = load_posts(&config.content_dir("posts"))?;

    let mut summary = LoadSummary {
        skipped_posts: posts.skipped,
        failed_entries: Vec::new(),
    };
    for (name, _) in series
        .failed
        .iter()
        .chain(&misc_pages.failed)
        .chain(&posts.failed)
    {
        summary.failed_entries.push(name.clone());
    }

    let mut posts = posts.entries;
    let current_time = dates::resolve_post_dates(&mut posts, resolver)?;
    posts.sort_by(|a, b| b.written_ts.unwrap_or(0).cmp(&a.written_ts.unwrap_or(0)));

    let mut site = SiteContent {
        components,
        bright,
        dark,
        misc_pages: misc_pages.entries,
        series: series.entries,
        posts,
        tags: Vec::new(),
        current_time,
    };
    site.link()?;

    info!(
        posts = site.posts.len(),
        publishable = site.publishable_posts().count(),
        series = site.series.len(),
        pages = site.misc_pages.len(),
        tags = site.tags.len(),
        "content loaded"
    );
    Ok((site, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::BuiltinDateResolver;
    use crate::test_helpers::{PostFixture, SiteFixture, find_post, write_post, write_series};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn unmarked_post_is_skipped_without_error() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), &PostFixture::new("one"));
        write_post(tmp.path(), &PostFixture::new("two"));
        write_post(tmp.path(), &PostFixture::new("three").unmarked());

        let scan = load_posts(tmp.path()).unwrap();
        assert_eq!(scan.entries.len(), 2);
        assert_eq!(scan.skipped, vec!["three"]);
        assert!(scan.failed.is_empty());
    }

    #[test]
    fn broken_post_skipped_and_reported() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), &PostFixture::new("good"));
        let bad = write_post(tmp.path(), &PostFixture::new("bad"));
        fs::remove_file(bad.join("title")).unwrap();

        let scan = load_posts(tmp.path()).unwrap();
        assert_eq!(scan.entries.len(), 1);
        assert_eq!(scan.failed.len(), 1);
        assert_eq!(scan.failed[0].0, "bad");
    }

    #[test]
    fn files_in_collection_dir_are_ignored() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), &PostFixture::new("one"));
        fs::write(tmp.path().join("README"), "notes").unwrap();
        assert_eq!(load_posts(tmp.path()).unwrap().entries.len(), 1);
    }

    #[test]
    fn missing_collection_dir_is_error_unless_tolerated() {
        let tmp = TempDir::new().unwrap();
        let absent = tmp.path().join("absent");
        assert!(matches!(load_posts(&absent), Err(LoadError::Walk { .. })));
        assert!(entity_dirs(&absent, true).unwrap().is_empty());
    }

    #[test]
    fn series_sorted_by_order_and_bad_order_skipped() {
        let tmp = TempDir::new().unwrap();
        write_series(tmp.path(), "a-late", "Late", "20");
        write_series(tmp.path(), "b-early", "Early", "5");
        write_series(tmp.path(), "c-broken", "Broken", "soon");

        let scan = load_series(tmp.path()).unwrap();
        let names: Vec<&str> = scan.entries.iter().map(|s| s.folder_name.as_str()).collect();
        assert_eq!(names, vec!["b-early", "a-late"]);
        assert_eq!(scan.failed.len(), 1);
    }

    #[test]
    fn full_load_sorts_posts_newest_first() {
        let fixture = SiteFixture::new()
            .post(PostFixture::new("old").written("2020-01-01"))
            .post(PostFixture::new("new").written("2023-06-01"))
            .post(PostFixture::new("mid").written("2021-03-01"));
        let (site, summary) =
            load_site_content(&fixture.config(), &BuiltinDateResolver::new()).unwrap();

        let order: Vec<&str> = site.posts.iter().map(|p| p.folder_name.as_str()).collect();
        assert_eq!(order, vec!["new", "mid", "old"]);
        assert!(summary.failed_entries.is_empty());
        assert!(find_post(&site, "mid").can_publish);
    }

    #[test]
    fn full_load_links_series_and_tags() {
        let fixture = SiteFixture::new()
            .post(PostFixture::new("a").tags("rust,web"))
            .post(PostFixture::new("b").tags("rust").not_ready());
        let (site, _) = load_site_content(&fixture.config(), &BuiltinDateResolver::new()).unwrap();

        let rust = site.find_tag("rust").unwrap();
        assert_eq!(rust.posts.len(), 1);
        let series = &site.series[0];
        assert_eq!(series.posts, vec![site.find_post("a").unwrap()]);
        assert!(find_post(&site, "b").series.is_some());
    }

    #[test]
    fn dangling_series_fails_load() {
        let fixture = SiteFixture::new().post(PostFixture::new("lost").series("missing"));
        let result = load_site_content(&fixture.config(), &BuiltinDateResolver::new());
        assert!(matches!(
            result,
            Err(LoadError::Link(LinkError::DanglingReference { .. }))
        ));
    }
}
