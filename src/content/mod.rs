//! The content graph: every entity of one generation run.
//!
//! [`SiteContent`] owns all posts, series, misc pages, both themes, the HTML
//! components and the tag index. Cross references between entities are
//! indices into those collections ([`PostId`], [`SeriesId`]), and a theme
//! finds its counterpart through [`ThemeKind::alternate`], so the graph has
//! no ownership cycles.
//!
//! Linking happens once, after every entity has been loaded and dates have
//! been resolved:
//!
//! 1. each post's series name and suggested-reading names are resolved,
//!    failing with [`LinkError::DanglingReference`] on an unknown id
//! 2. publishable posts are appended to their series
//! 3. the tag index is built from publishable posts

pub mod components;
pub mod fields;
pub mod misc_page;
pub mod post;
pub mod series;
pub mod tags;
pub mod theme;

pub use components::HtmlComponents;
pub use fields::{ContentError, EntityKind};
pub use misc_page::MiscPage;
pub use post::{Post, PostLoad};
pub use series::Series;
pub use tags::TagPosts;
pub use theme::{Theme, ThemeKind};

use thiserror::Error;

/// Index of a post in [`SiteContent::posts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostId(pub usize);

/// Index of a series in [`SiteContent::series`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesId(pub usize);

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("post '{post}': {field} references unknown {kind} '{target}'")]
    DanglingReference {
        post: String,
        field: &'static str,
        kind: EntityKind,
        target: String,
    },
}

#[derive(Debug)]
pub struct SiteContent {
    pub components: HtmlComponents,
    pub bright: Theme,
    pub dark: Theme,
    pub misc_pages: Vec<MiscPage>,
    /// Sorted by `order`.
    pub series: Vec<Series>,
    /// Sorted by written timestamp, newest first.
    pub posts: Vec<Post>,
    pub tags: Vec<TagPosts>,
    /// Resolved "now" of this run.
    pub current_time: i64,
}

impl SiteContent {
    pub fn post(&self, id: PostId) -> &Post {
        &self.posts[id.0]
    }

    pub fn series_by_id(&self, id: SeriesId) -> &Series {
        &self.series[id.0]
    }

    pub fn theme(&self, kind: ThemeKind) -> &Theme {
        match kind {
            ThemeKind::Bright => &self.bright,
            ThemeKind::Dark => &self.dark,
        }
    }

    pub fn alt_theme(&self, kind: ThemeKind) -> &Theme {
        self.theme(kind.alternate())
    }

    pub fn find_post(&self, folder_name: &str) -> Option<PostId> {
        self.posts
            .iter()
            .position(|p| p.folder_name == folder_name)
            .map(PostId)
    }

    pub fn find_series(&self, folder_name: &str) -> Option<SeriesId> {
        self.series
            .iter()
            .position(|s| s.folder_name == folder_name)
            .map(SeriesId)
    }

    pub fn find_misc_page(&self, filename: &str) -> Option<&MiscPage> {
        self.misc_pages.iter().find(|p| p.filename == filename)
    }

    pub fn find_tag(&self, tag: &str) -> Option<&TagPosts> {
        self.tags.iter().find(|t| t.tag == tag)
    }

    /// Publishable posts in post order.
    pub fn publishable_posts(&self) -> impl Iterator<Item = (PostId, &Post)> + '_ {
        self.posts
            .iter()
            .enumerate()
            .filter(|(_, p)| p.can_publish)
            .map(|(i, p)| (PostId(i), p))
    }

    fn resolve_posts(
        &self,
        post: &Post,
        field: &'static str,
        names: &crate::buffer::SplitText,
    ) -> Result<Vec<PostId>, LinkError> {
        names
            .iter()
            .map(|name| {
                self.find_post(name)
                    .ok_or_else(|| LinkError::DanglingReference {
                        post: post.folder_name.clone(),
                        field,
                        kind: EntityKind::Post,
                        target: name.to_string(),
                    })
            })
            .collect()
    }

    /// Resolve cross references and build the tag index.
    ///
    /// Must run after dates are applied: only publishable posts join their
    /// series and the tag index.
    pub fn link(&mut self) -> Result<(), LinkError> {
        for series in &mut self.series {
            series.posts.clear();
        }
        for i in 0..self.posts.len() {
            let post = &self.posts[i];
            let series = self.find_series(&post.series_name).ok_or_else(|| {
                LinkError::DanglingReference {
                    post: post.folder_name.clone(),
                    field: "series",
                    kind: EntityKind::Series,
                    target: post.series_name.clone(),
                }
            })?;
            let next = self.resolve_posts(post, "suggested-next-reading", &post.suggested_next_names)?;
            let prev = self.resolve_posts(post, "suggested-prev-reading", &post.suggested_prev_names)?;
            let can_publish = post.can_publish;

            let post = &mut self.posts[i];
            post.series = Some(series);
            post.suggested_next = next;
            post.suggested_prev = prev;
            if can_publish {
                self.series[series.0].posts.push(PostId(i));
            }
        }
        self.tags = tags::build_tag_index(&self.posts);
        Ok(())
    }
}
