//! Page composition and publishing.
//!
//! Every generated page is a [`FragmentTree`](crate::fragments::FragmentTree)
//! built once per page and wrapped in a bright and a dark shell that borrow
//! it. Both variants go through the idempotent writer, so only pages whose
//! bytes changed touch the disk.
//!
//! ## Pages
//!
//! ```text
//! <theme>/
//! ├── index.html            home misc page + five newest posts
//! ├── <misc>.html           other misc pages
//! ├── sitemap.html          all publishable posts grouped by series
//! ├── feed.rss              publishable posts, newest first
//! ├── posts/<id>.html       one per loaded post
//! ├── series/index.html     all series
//! ├── series/<id>/index.html
//! ├── tags/index.html       all tags with counts (written last)
//! └── tags/<tag>.html
//! ```
//!
//! Stale `posts/*.html` and `tags/*.html` files whose post or tag no longer
//! exists are removed before the new pages are written.

pub mod page;
pub mod pages;
pub mod rss;

use crate::buffer::BufferError;
use crate::config::SiteConfiguration;
use crate::content::{SiteContent, ThemeKind};
use crate::writer::{WriteError, WriteOutcome};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

pub use page::{PageSpec, publish_page, render_page, url_path_for};

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("cannot list {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("cannot remove stale page {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Running totals of what publishing did, paths relative to the html base.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PublishTally {
    pub updated: Vec<String>,
    pub created: usize,
    pub unchanged: usize,
    pub removed: Vec<String>,
}

impl PublishTally {
    pub fn record(&mut self, kind: ThemeKind, filename: &str, outcome: WriteOutcome) {
        if !outcome.wrote {
            self.unchanged += 1;
            return;
        }
        if outcome.created {
            self.created += 1;
            info!("Creating {kind} file {filename} as it doesn't exist");
        }
        info!("Updated {kind} page {filename}");
        self.updated.push(format!("{kind}/{filename}"));
    }

    pub fn written(&self) -> usize {
        self.updated.len()
    }
}

/// Publish every page of the site for both themes.
pub fn publish_site(
    site: &SiteContent,
    config: &SiteConfiguration,
) -> Result<PublishTally, ComposeError> {
    let mut tally = PublishTally::default();
    pages::publish_tags(site, &mut tally)?;
    pages::publish_misc_pages(site, &mut tally)?;
    pages::publish_posts(site, &mut tally)?;
    pages::publish_series(site, &mut tally)?;
    pages::publish_sitemap(site, &mut tally)?;
    rss::publish_feeds(site, &config.rss_description, &mut tally)?;
    Ok(tally)
}
