use super::fields::{ContentError, EntityDir, EntityKind};
use super::{PostId, SeriesId};
use crate::buffer::{GrowableBuffer, SplitText};
use std::path::Path;

/// Marker file that opts a post directory into the build.
pub const GENERATE_MARKER: &str = "generate-post";

#[derive(Debug)]
pub struct Post {
    pub folder_name: String,
    pub title: String,
    pub content: GrowableBuffer,
    pub author: String,
    pub tags: SplitText,
    pub series_name: String,
    pub short_description: String,
    pub long_description: String,
    pub suggested_next_names: SplitText,
    pub suggested_prev_names: SplitText,
    pub written_date: String,
    pub updated_at: Option<String>,
    pub publish_after: Option<String>,
    pub publish_when_ready: bool,
    pub has_code: bool,

    /// Resolved timestamps; `None` until dates are applied or when the
    /// date failed to parse.
    pub written_ts: Option<i64>,
    pub updated_ts: Option<i64>,
    pub publish_after_ts: Option<i64>,
    pub can_publish: bool,

    /// Set during linking.
    pub series: Option<SeriesId>,
    pub suggested_next: Vec<PostId>,
    pub suggested_prev: Vec<PostId>,
}

/// Result of loading one post directory.
#[derive(Debug)]
pub enum PostLoad {
    Loaded(Box<Post>),
    /// The generate marker is absent. Not an error.
    SkippedNotMarked,
    Failed(ContentError),
}

impl Post {
    pub fn load(dir: &Path, folder_name: &str) -> PostLoad {
        let entity = EntityDir::new(dir, EntityKind::Post, folder_name);
        if !entity.has_flag(GENERATE_MARKER) {
            return PostLoad::SkippedNotMarked;
        }
        match Self::read_fields(&entity, folder_name) {
            Ok(post) => PostLoad::Loaded(Box::new(post)),
            Err(e) => PostLoad::Failed(e),
        }
    }

    fn read_fields(entity: &EntityDir<'_>, folder_name: &str) -> Result<Self, ContentError> {
        Ok(Self {
            folder_name: folder_name.to_string(),
            title: entity.required_line("title")?,
            content: entity.required_raw("content.html")?,
            author: entity.required_line("author")?,
            tags: entity.split("tags", b',', true, true)?,
            series_name: entity.required_line("series")?,
            short_description: entity.required_line("short-description")?,
            long_description: entity.required_line("long-description")?,
            written_date: entity.required_line("written-date")?,
            suggested_next_names: entity.split("suggested-next-reading", b'\n', true, false)?,
            suggested_prev_names: entity.split("suggested-prev-reading", b'\n', true, false)?,
            updated_at: entity.optional_line("updated-at")?,
            publish_after: entity.optional_line("publish-after")?,
            publish_when_ready: entity.has_flag("publish-when-ready"),
            has_code: entity.has_flag("has-code"),
            written_ts: None,
            updated_ts: None,
            publish_after_ts: None,
            can_publish: false,
            series: None,
            suggested_next: Vec::new(),
            suggested_prev: Vec::new(),
        })
    }

    /// Most recent of the written and updated timestamps.
    pub fn last_touched(&self) -> i64 {
        self.written_ts
            .unwrap_or(0)
            .max(self.updated_ts.unwrap_or(0))
    }

    pub fn url_path(&self) -> String {
        format!("posts/{}", self.folder_name)
    }
}
