use super::fields::{ContentError, EntityDir, EntityKind};
use crate::buffer::GrowableBuffer;
use std::path::Path;

/// Filename of the misc page that becomes the site's home page.
pub const HOME_PAGE_FILENAME: &str = "index.html";

/// A standalone page such as the home page or an about page.
#[derive(Debug)]
pub struct MiscPage {
    pub folder_name: String,
    pub content: GrowableBuffer,
    pub title: String,
    /// Output filename relative to the theme root, e.g. `about.html`.
    pub filename: String,
    pub description: String,
}

impl MiscPage {
    pub fn load(dir: &Path, folder_name: &str) -> Result<Self, ContentError> {
        let entity = EntityDir::new(dir, EntityKind::MiscPage, folder_name);
        let filename = entity.required_line("filename")?;
        if filename.is_empty() || filename.contains("..") || filename.starts_with('/') {
            return Err(entity.invalid("filename", format!("'{filename}' is not a relative file name")));
        }
        Ok(Self {
            folder_name: folder_name.to_string(),
            content: entity.required_raw("content.html")?,
            title: entity.required_line("title")?,
            filename,
            description: entity.required_line("description")?,
        })
    }

    pub fn is_home_page(&self) -> bool {
        self.filename == HOME_PAGE_FILENAME
    }
}
