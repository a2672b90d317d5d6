use super::fields::{ContentError, EntityDir, EntityKind};
use crate::buffer::GrowableBuffer;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// The two visual variants every page is generated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKind {
    Bright,
    Dark,
}

impl ThemeKind {
    pub const ALL: [ThemeKind; 2] = [ThemeKind::Bright, ThemeKind::Dark];

    /// The theme each page links across to.
    pub fn alternate(self) -> ThemeKind {
        match self {
            ThemeKind::Bright => ThemeKind::Dark,
            ThemeKind::Dark => ThemeKind::Bright,
        }
    }

    /// Directory name under both the content themes dir and the html base dir.
    pub fn dir_name(self) -> &'static str {
        match self {
            ThemeKind::Bright => "bright",
            ThemeKind::Dark => "dark",
        }
    }
}

impl fmt::Display for ThemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[derive(Debug)]
pub struct Theme {
    pub kind: ThemeKind,
    pub main_css: GrowableBuffer,
    /// Empty when the theme ships no syntax-highlighting stylesheet.
    pub syntax_css: GrowableBuffer,
    pub host: String,
    pub name: String,
    pub output_dir: PathBuf,
}

impl Theme {
    pub fn load(
        dir: &Path,
        kind: ThemeKind,
        host: &str,
        name: &str,
        output_dir: PathBuf,
    ) -> Result<Self, ContentError> {
        let entity = EntityDir::new(dir, EntityKind::Theme, kind.dir_name());
        Ok(Self {
            kind,
            main_css: entity.required_raw("main.css")?,
            syntax_css: entity
                .optional_raw("syntax-highlighting.css")?
                .unwrap_or_default(),
            host: host.to_string(),
            name: name.to_string(),
            output_dir,
        })
    }
}
