//! Reading the one-file-per-field directory convention.
//!
//! Every entity is a directory whose files are its fields:
//!
//! ```text
//! posts/intro-to-rust/
//! ├── generate-post        # marker, content ignored
//! ├── title                # single line, trailing CR/LF stripped
//! ├── content.html         # kept verbatim
//! └── has-code             # flag: present or absent
//! ```
//!
//! [`EntityDir`] reads those files and turns a missing required file into
//! [`ContentError::MissingRequiredField`] naming the entity and the field.

use crate::buffer::{BufferError, GrowableBuffer, SplitText};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Post,
    Series,
    MiscPage,
    Theme,
    Components,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Post => "post",
            EntityKind::Series => "series",
            EntityKind::MiscPage => "misc page",
            EntityKind::Theme => "theme",
            EntityKind::Components => "components",
        })
    }
}

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("{kind} '{id}': missing required file '{field}'")]
    MissingRequiredField {
        kind: EntityKind,
        id: String,
        field: &'static str,
    },
    #[error("{kind} '{id}': invalid '{field}': {reason}")]
    InvalidField {
        kind: EntityKind,
        id: String,
        field: &'static str,
        reason: String,
    },
    #[error("{kind} '{id}': {source}")]
    Buffer {
        kind: EntityKind,
        id: String,
        #[source]
        source: BufferError,
    },
}

impl ContentError {
    /// True for failures that should stop a whole collection scan.
    pub fn is_fatal(&self) -> bool {
        match self {
            ContentError::Buffer { source, .. } => !source.is_not_found(),
            _ => false,
        }
    }
}

/// An entity directory and the identity used in error messages.
pub struct EntityDir<'p> {
    dir: &'p Path,
    kind: EntityKind,
    id: &'p str,
}

impl<'p> EntityDir<'p> {
    pub fn new(dir: &'p Path, kind: EntityKind, id: &'p str) -> Self {
        Self { dir, kind, id }
    }

    pub fn path(&self, field: &str) -> PathBuf {
        self.dir.join(field)
    }

    fn buffer_error(&self, source: BufferError) -> ContentError {
        ContentError::Buffer {
            kind: self.kind,
            id: self.id.to_string(),
            source,
        }
    }

    pub fn invalid(&self, field: &'static str, reason: impl Into<String>) -> ContentError {
        ContentError::InvalidField {
            kind: self.kind,
            id: self.id.to_string(),
            field,
            reason: reason.into(),
        }
    }

    /// Raw file content, or `None` when the file does not exist.
    pub fn optional_raw(&self, field: &'static str) -> Result<Option<GrowableBuffer>, ContentError> {
        match GrowableBuffer::from_file(&self.path(field)) {
            Ok(buffer) => Ok(Some(buffer)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(self.buffer_error(e)),
        }
    }

    /// Raw file content kept verbatim.
    pub fn required_raw(&self, field: &'static str) -> Result<GrowableBuffer, ContentError> {
        self.optional_raw(field)?
            .ok_or_else(|| ContentError::MissingRequiredField {
                kind: self.kind,
                id: self.id.to_string(),
                field,
            })
    }

    fn to_line(&self, field: &'static str, mut buffer: GrowableBuffer) -> Result<String, ContentError> {
        buffer.trim_trailing_newlines();
        buffer
            .as_str()
            .map(str::to_string)
            .map_err(|_| self.invalid(field, "not valid UTF-8"))
    }

    /// Single-line text with trailing CR/LF stripped.
    pub fn required_line(&self, field: &'static str) -> Result<String, ContentError> {
        let buffer = self.required_raw(field)?;
        self.to_line(field, buffer)
    }

    pub fn optional_line(&self, field: &'static str) -> Result<Option<String>, ContentError> {
        self.optional_raw(field)?
            .map(|buffer| self.to_line(field, buffer))
            .transpose()
    }

    /// Split a field on `delimiter` without copying the segments.
    pub fn split(
        &self,
        field: &'static str,
        delimiter: u8,
        trim: bool,
        required: bool,
    ) -> Result<SplitText, ContentError> {
        let buffer = if required {
            self.required_raw(field)?
        } else {
            match self.optional_raw(field)? {
                Some(buffer) => buffer,
                None => return Ok(SplitText::default()),
            }
        };
        let mut buffer = buffer;
        if trim {
            buffer.trim_trailing_newlines();
        }
        buffer
            .into_split(delimiter)
            .map_err(|_| self.invalid(field, "not valid UTF-8"))
    }

    /// Flag files only matter by their presence.
    pub fn has_flag(&self, field: &str) -> bool {
        self.path(field).is_file()
    }
}
