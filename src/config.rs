//! Site configuration module.
//!
//! The configuration file is a list of `KEY value` lines:
//!
//! ```text
//! # hosts the two themes are served from
//! BRIGHT_HOST blog.example.com
//! DARK_HOST dark.blog.example.com
//! BRIGHT_NAME Bright
//! DARK_NAME Dark
//! HTML_BASE_DIR /var/www/blog
//! CONTENT_BASE_DIR /home/me/blog-content
//! SITE_GROUP www-data
//! RSS_DESCRIPTION Notes on systems programming
//! # optional, defaults to `date`
//! DATE_COMMAND gdate
//! ```
//!
//! The key ends at the first whitespace; the rest of the line, trimmed, is
//! the value, so values may contain spaces. Blank lines and lines starting
//! with `#` are ignored.
//!
//! All keys except `DATE_COMMAND` are required. Unknown and repeated keys are
//! rejected to catch typos early.
//!
//! ## Directory layout
//!
//! [`SiteConfiguration::prepare_directories`] checks that the content tree
//! has every directory the loaders read and creates `generating/` for the
//! lock. [`SiteConfiguration::create_output_dirs`] creates the output
//! skeleton once the lock is held:
//!
//! ```text
//! CONTENT_BASE_DIR/                 HTML_BASE_DIR/
//! ├── posts/                        ├── bright/
//! ├── series/                       │   ├── posts/
//! ├── misc_pages/                   │   ├── series/
//! ├── components/                   │   └── tags/
//! ├── themes/{bright,dark}/         └── dark/
//! └── generating/  (created)            └── ...
//! ```

use crate::content::ThemeKind;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing required config key {0}")]
    MissingKey(&'static str),
    #[error("unknown config key '{key}' on line {line}")]
    UnknownKey { key: String, line: usize },
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("required directory {} does not exist", .0.display())]
    MissingDirectory(PathBuf),
}

const BRIGHT_HOST: &str = "BRIGHT_HOST";
const DARK_HOST: &str = "DARK_HOST";
const BRIGHT_NAME: &str = "BRIGHT_NAME";
const DARK_NAME: &str = "DARK_NAME";
const HTML_BASE_DIR: &str = "HTML_BASE_DIR";
const CONTENT_BASE_DIR: &str = "CONTENT_BASE_DIR";
const SITE_GROUP: &str = "SITE_GROUP";
const RSS_DESCRIPTION: &str = "RSS_DESCRIPTION";
const DATE_COMMAND: &str = "DATE_COMMAND";

const KNOWN_KEYS: [&str; 9] = [
    BRIGHT_HOST,
    DARK_HOST,
    BRIGHT_NAME,
    DARK_NAME,
    HTML_BASE_DIR,
    CONTENT_BASE_DIR,
    SITE_GROUP,
    RSS_DESCRIPTION,
    DATE_COMMAND,
];

pub const DEFAULT_DATE_COMMAND: &str = "date";

/// Content subdirectories that must exist before loading.
pub const CONTENT_DIRS: [&str; 6] = [
    "posts",
    "components",
    "series",
    "misc_pages",
    "themes/bright",
    "themes/dark",
];

/// Directories created under each theme's output root.
pub const OUTPUT_SUBDIRS: [&str; 3] = ["posts", "series", "tags"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteConfiguration {
    pub bright_host: String,
    pub dark_host: String,
    pub bright_name: String,
    pub dark_name: String,
    pub html_base_dir: PathBuf,
    pub content_base_dir: PathBuf,
    /// Group owning the published files. Recorded for deployment tooling.
    pub site_group: String,
    pub rss_description: String,
    pub date_command: String,
}

impl SiteConfiguration {
    pub fn host(&self, kind: ThemeKind) -> &str {
        match kind {
            ThemeKind::Bright => &self.bright_host,
            ThemeKind::Dark => &self.dark_host,
        }
    }

    pub fn theme_name(&self, kind: ThemeKind) -> &str {
        match kind {
            ThemeKind::Bright => &self.bright_name,
            ThemeKind::Dark => &self.dark_name,
        }
    }

    pub fn content_dir(&self, sub: &str) -> PathBuf {
        self.content_base_dir.join(sub)
    }

    pub fn theme_content_dir(&self, kind: ThemeKind) -> PathBuf {
        self.content_base_dir.join("themes").join(kind.dir_name())
    }

    pub fn output_dir(&self, kind: ThemeKind) -> PathBuf {
        self.html_base_dir.join(kind.dir_name())
    }

    /// Lock file and date exchange file live here.
    pub fn generating_dir(&self) -> PathBuf {
        self.content_base_dir.join("generating")
    }

    /// Fail on the first content directory the loaders need that is missing.
    pub fn check_content_directories(&self) -> Result<(), ConfigError> {
        for sub in CONTENT_DIRS {
            let dir = self.content_dir(sub);
            if !dir.is_dir() {
                return Err(ConfigError::MissingDirectory(dir));
            }
        }
        Ok(())
    }

    /// Check the content tree and create the directory the lock lives in.
    pub fn prepare_directories(&self) -> Result<(), ConfigError> {
        self.check_content_directories()?;
        fs::create_dir_all(self.generating_dir())?;
        Ok(())
    }

    pub fn create_output_dirs(&self) -> Result<(), ConfigError> {
        for kind in ThemeKind::ALL {
            let root = self.output_dir(kind);
            for sub in OUTPUT_SUBDIRS {
                fs::create_dir_all(root.join(sub))?;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bright_host == self.dark_host {
            return Err(ConfigError::Validation(
                "BRIGHT_HOST and DARK_HOST must differ".into(),
            ));
        }
        if self.html_base_dir == self.content_base_dir {
            return Err(ConfigError::Validation(
                "HTML_BASE_DIR must not be CONTENT_BASE_DIR".into(),
            ));
        }
        if self.date_command.is_empty() {
            return Err(ConfigError::Validation(
                "DATE_COMMAND must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Parse `KEY value` lines into a validated configuration.
pub fn parse_configuration(text: &str) -> Result<SiteConfiguration, ConfigError> {
    let mut values: [Option<String>; KNOWN_KEYS.len()] = Default::default();

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = match line.split_once(char::is_whitespace) {
            Some((key, value)) => (key, value.trim()),
            None => (line, ""),
        };
        let Some(slot) = KNOWN_KEYS.iter().position(|known| *known == key) else {
            return Err(ConfigError::UnknownKey {
                key: key.to_string(),
                line: number + 1,
            });
        };
        if values[slot].is_some() {
            return Err(ConfigError::Validation(format!(
                "{key} is set more than once (line {})",
                number + 1
            )));
        }
        if value.is_empty() {
            return Err(ConfigError::Validation(format!(
                "{key} has no value (line {})",
                number + 1
            )));
        }
        values[slot] = Some(value.to_string());
    }

    let mut take = |key: &'static str| -> Option<String> {
        let slot = KNOWN_KEYS.iter().position(|known| *known == key)?;
        values[slot].take()
    };
    let mut required = |key: &'static str| take(key).ok_or(ConfigError::MissingKey(key));

    let config = SiteConfiguration {
        bright_host: required(BRIGHT_HOST)?,
        dark_host: required(DARK_HOST)?,
        bright_name: required(BRIGHT_NAME)?,
        dark_name: required(DARK_NAME)?,
        html_base_dir: PathBuf::from(required(HTML_BASE_DIR)?),
        content_base_dir: PathBuf::from(required(CONTENT_BASE_DIR)?),
        site_group: required(SITE_GROUP)?,
        rss_description: required(RSS_DESCRIPTION)?,
        date_command: required(DATE_COMMAND).unwrap_or_else(|_| DEFAULT_DATE_COMMAND.to_string()),
    };
    config.validate()?;
    Ok(config)
}

/// Read and parse the configuration file at `path`.
pub fn load_configuration(path: &Path) -> Result<SiteConfiguration, ConfigError> {
    let text = fs::read_to_string(path)?;
    parse_configuration(&text)
}
