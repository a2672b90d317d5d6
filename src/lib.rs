//! # Spark
//!
//! A static blog generator that writes every page twice, once per theme
//! (bright and dark), and only touches output files whose bytes changed.
//! The content tree is plain directories of small files: no front matter,
//! no templates, no database.
//!
//! # Pipeline
//!
//! ```text
//! 1. Config     spark.conf  →  SiteConfiguration     (KEY value lines)
//! 2. Load       content/    →  SiteContent           (entities, dates, links)
//! 3. Publish    SiteContent →  html/{bright,dark}/   (write-if-different)
//! ```
//!
//! A generation run holds a lock file in `content/generating/` for its whole
//! duration, so two runs against the same tree cannot interleave.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`buffer`] | Growable byte buffer with fallible growth and streamed file comparison |
//! | [`fragments`] | Fragment tree: a page as owned and borrowed pieces, compared without materializing |
//! | [`writer`] | Write-if-different over buffers and fragment trees |
//! | [`content`] | Posts, series, misc pages, themes, components, the tag index and linking |
//! | [`loader`] | Walks the content tree into a linked [`content::SiteContent`] |
//! | [`dates`] | Batch date resolution through `date -f` or in-process chrono |
//! | [`compose`] | Page shell, every page kind, the RSS feed |
//! | [`generate`] | One full run: directories, lock, load, publish |
//! | [`lock`] | Exclusive generation lock file |
//! | [`config`] | `KEY value` configuration and directory pre-validation |
//! | [`types`] | JSON inventory written by `check --manifest` |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Borrow, Don't Copy
//!
//! Post bodies, theme stylesheets and HTML components are read once and
//! borrowed into every page that shows them. A page's body subtree is built
//! once and borrowed by both its bright and dark shells. Nothing is
//! materialized to compare against the existing file; the tree's leaves are
//! streamed against it block by block.
//!
//! ## Unchanged Means Untouched
//!
//! Regenerating an unchanged site performs zero writes and leaves every
//! mtime alone, so rsync and HTTP caches see nothing new. The RSS feed
//! ignores its own `lastBuildDate` when deciding whether it changed.
//!
//! ## Maud for Snippets
//!
//! Listings, footers and navigation are built with
//! [Maud](https://maud.lambda.xyz/), which escapes interpolated text. Author
//! supplied HTML (post bodies, landing descriptions, components) is spliced
//! in as is.

pub mod buffer;
pub mod compose;
pub mod config;
pub mod content;
pub mod dates;
pub mod fragments;
pub mod generate;
pub mod loader;
pub mod lock;
pub mod output;
pub mod types;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_helpers;
