use super::PostId;
use super::fields::{ContentError, EntityDir, EntityKind};
use crate::buffer::GrowableBuffer;
use std::path::Path;

#[derive(Debug)]
pub struct Series {
    pub folder_name: String,
    pub landing_desc: GrowableBuffer,
    pub short_description: String,
    pub title: String,
    pub order: i32,
    /// Publishable posts in this series, in post order. Filled during linking.
    pub posts: Vec<PostId>,
}

impl Series {
    pub fn load(dir: &Path, folder_name: &str) -> Result<Self, ContentError> {
        let entity = EntityDir::new(dir, EntityKind::Series, folder_name);
        let order_text = entity.required_line("order")?;
        let order = order_text
            .trim()
            .parse::<i32>()
            .map_err(|e| entity.invalid("order", format!("'{order_text}' is not an integer: {e}")))?;
        Ok(Self {
            folder_name: folder_name.to_string(),
            landing_desc: entity.required_raw("landing-desc.html")?,
            short_description: entity.required_line("short-description")?,
            title: entity.required_line("title")?,
            order,
            posts: Vec::new(),
        })
    }

    pub fn url_path(&self) -> String {
        format!("series/{}", self.folder_name)
    }
}
