//! Write-if-different: only touch files whose bytes would change.
//!
//! Regenerating an unchanged site must leave every output file's mtime alone,
//! so rsync and HTTP caches see nothing new. [`write_if_different`] stats the
//! target, compares the prospective content against it without loading it
//! whole, and writes only when the file is missing or differs.

use crate::buffer::{BufferError, FileComparison, GrowableBuffer};
use crate::fragments::FragmentTree;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("cannot stat {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot compare {}: {source}", path.display())]
    Compare {
        path: PathBuf,
        #[source]
        source: BufferError,
    },
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: BufferError,
    },
}

/// What [`write_if_different`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOutcome {
    pub wrote: bool,
    pub created: bool,
}

impl WriteOutcome {
    const UNCHANGED: Self = Self {
        wrote: false,
        created: false,
    };
}

/// Anything that can be compared with and written to a file.
pub trait PageContent {
    fn compare_to_file(&self, path: &Path) -> Result<FileComparison, BufferError>;
    fn write_to_file(&self, path: &Path) -> Result<(), BufferError>;
}

impl PageContent for GrowableBuffer {
    fn compare_to_file(&self, path: &Path) -> Result<FileComparison, BufferError> {
        GrowableBuffer::compare_to_file(self, path)
    }

    fn write_to_file(&self, path: &Path) -> Result<(), BufferError> {
        self.write_whole_file(path)
    }
}

impl PageContent for FragmentTree<'_> {
    fn compare_to_file(&self, path: &Path) -> Result<FileComparison, BufferError> {
        self.equals_file(path)
    }

    /// Materializes once so the file is written in a single call.
    fn write_to_file(&self, path: &Path) -> Result<(), BufferError> {
        self.materialize()?.write_whole_file(path)
    }
}

impl PageContent for str {
    fn compare_to_file(&self, path: &Path) -> Result<FileComparison, BufferError> {
        let existing = fs::read(path).map_err(|e| BufferError::io(path, e))?;
        Ok(if existing == self.as_bytes() {
            FileComparison::Same
        } else {
            FileComparison::Distinct
        })
    }

    fn write_to_file(&self, path: &Path) -> Result<(), BufferError> {
        fs::write(path, self).map_err(|e| BufferError::io(path, e))
    }
}

fn exists(path: &Path) -> Result<bool, WriteError> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(WriteError::Stat {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write(content: &(impl PageContent + ?Sized), path: &Path) -> Result<(), WriteError> {
    content
        .write_to_file(path)
        .map_err(|source| WriteError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Write `content` to `path` unless the file already holds exactly those bytes.
pub fn write_if_different(
    content: &(impl PageContent + ?Sized),
    path: &Path,
) -> Result<WriteOutcome, WriteError> {
    if !exists(path)? {
        write(content, path)?;
        return Ok(WriteOutcome {
            wrote: true,
            created: true,
        });
    }
    let comparison = content
        .compare_to_file(path)
        .map_err(|source| WriteError::Compare {
            path: path.to_path_buf(),
            source,
        })?;
    match comparison {
        FileComparison::Same => Ok(WriteOutcome::UNCHANGED),
        FileComparison::Distinct => {
            write(content, path)?;
            Ok(WriteOutcome {
                wrote: true,
                created: false,
            })
        }
    }
}

/// Like [`write_if_different`], but the text of the first `<element>` in each
/// side is left out of the comparison.
///
/// Feeds stamp their build time in `<lastBuildDate>`; a feed whose items are
/// unchanged is not rewritten just because that stamp moved.
pub fn write_if_different_ignoring(
    content: &GrowableBuffer,
    path: &Path,
    element: &str,
) -> Result<WriteOutcome, WriteError> {
    if !exists(path)? {
        write(content, path)?;
        return Ok(WriteOutcome {
            wrote: true,
            created: true,
        });
    }
    let existing = GrowableBuffer::from_file(path).map_err(|source| WriteError::Compare {
        path: path.to_path_buf(),
        source,
    })?;
    if mask_element(existing.as_bytes(), element) == mask_element(content.as_bytes(), element) {
        return Ok(WriteOutcome::UNCHANGED);
    }
    write(content, path)?;
    Ok(WriteOutcome {
        wrote: true,
        created: false,
    })
}

/// Split `bytes` around the body of the first `<element>…</element>`.
fn mask_element<'b>(bytes: &'b [u8], element: &str) -> (&'b [u8], &'b [u8]) {
    let open = format!("<{element}>");
    let close = format!("</{element}>");
    let Some(start) = find(bytes, open.as_bytes()) else {
        return (bytes, &[]);
    };
    let body_start = start + open.len();
    match find(&bytes[body_start..], close.as_bytes()) {
        Some(end) => (&bytes[..body_start], &bytes[body_start + end..]),
        None => (bytes, &[]),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn set_old_mtime(path: &Path) -> SystemTime {
        let old = SystemTime::now() - Duration::from_secs(3600);
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(old).unwrap();
        fs::metadata(path).unwrap().modified().unwrap()
    }

    #[test]
    fn creates_missing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("new.html");
        let outcome = write_if_different("<p>hi</p>", &path).unwrap();
        assert_eq!(
            outcome,
            WriteOutcome {
                wrote: true,
                created: true
            }
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>hi</p>");
    }

    #[test]
    fn identical_content_leaves_mtime_alone() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("page.html");
        fs::write(&path, "<p>same</p>").unwrap();
        let before = set_old_mtime(&path);

        let buf = GrowableBuffer::from_text("<p>same</p>").unwrap();
        let outcome = write_if_different(&buf, &path).unwrap();
        assert!(!outcome.wrote);
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), before);
    }

    #[test]
    fn different_content_is_rewritten() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("page.html");
        fs::write(&path, "<p>old</p>").unwrap();

        let buf = GrowableBuffer::from_text("<p>new</p>").unwrap();
        let outcome = write_if_different(&buf, &path).unwrap();
        assert!(outcome.wrote);
        assert!(!outcome.created);
        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>new</p>");
    }

    #[test]
    fn fragment_tree_written_and_then_unchanged() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("page.html");
        let shared = GrowableBuffer::from_text("<style>x</style>").unwrap();
        let mut tree = FragmentTree::new();
        tree.append_owned_text("<head>").unwrap();
        tree.append_borrowed_buffer(&shared).unwrap();
        tree.append_owned_text("</head>").unwrap();

        assert!(write_if_different(&tree, &path).unwrap().created);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "<head><style>x</style></head>"
        );
        let before = set_old_mtime(&path);
        assert!(!write_if_different(&tree, &path).unwrap().wrote);
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), before);
    }

    #[test]
    fn directory_in_the_way_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("dir");
        fs::create_dir(&path).unwrap();
        assert!(write_if_different("x", &path).is_err());
    }

    #[test]
    fn ignoring_build_date_skips_rewrite() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("feed.rss");
        fs::write(
            &path,
            "<rss><lastBuildDate>Mon</lastBuildDate><item>a</item></rss>",
        )
        .unwrap();

        let same_items = GrowableBuffer::from_text(
            "<rss><lastBuildDate>Tue, later</lastBuildDate><item>a</item></rss>",
        )
        .unwrap();
        let outcome = write_if_different_ignoring(&same_items, &path, "lastBuildDate").unwrap();
        assert!(!outcome.wrote);

        let new_items = GrowableBuffer::from_text(
            "<rss><lastBuildDate>Tue</lastBuildDate><item>b</item></rss>",
        )
        .unwrap();
        let outcome = write_if_different_ignoring(&new_items, &path, "lastBuildDate").unwrap();
        assert!(outcome.wrote);
        assert!(
            fs::read_to_string(&path)
                .unwrap()
                .contains("<item>b</item>")
        );
    }

    #[test]
    fn mask_without_element_compares_everything() {
        assert_eq!(mask_element(b"abc", "x"), (&b"abc"[..], &b""[..]));
        let (head, tail) = mask_element(b"1<x>2</x>3", "x");
        assert_eq!(head, b"1<x>");
        assert_eq!(tail, b"</x>3");
    }
}
