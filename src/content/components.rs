use super::fields::{ContentError, EntityDir, EntityKind};
use crate::buffer::GrowableBuffer;
use std::path::Path;

/// Shared HTML pieces spliced into every page.
#[derive(Debug, Default)]
pub struct HtmlComponents {
    /// Everything up to the page's own `<meta>` tags.
    pub header: GrowableBuffer,
    pub footer: GrowableBuffer,
    /// Emitted after `</body>`.
    pub trailer: GrowableBuffer,
}

impl HtmlComponents {
    pub fn load(dir: &Path) -> Result<Self, ContentError> {
        let entity = EntityDir::new(dir, EntityKind::Components, "components");
        Ok(Self {
            header: entity.required_raw("header.html")?,
            footer: entity.required_raw("footer.html")?,
            trailer: entity.required_raw("trailer.html")?,
        })
    }
}
