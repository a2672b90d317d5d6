//! Growable byte buffer used as the substrate for every text operation.
//!
//! A [`GrowableBuffer`] starts out [`Empty`](Storage::Empty) without touching
//! the allocator and materializes storage on the first append. Growth is
//! two-tiered: small buffers grow by [`SMALL_GROWTH_STEP`] past what the
//! append needs, buffers past [`GROWTH_TIER_THRESHOLD`] grow by
//! [`LARGE_GROWTH_STEP`]. Page bodies are appended to hundreds of times, so
//! the large step keeps reallocations rare without bloating one-line fields
//! like titles.
//!
//! ## Allocation failure
//!
//! Every growing operation reserves through `Vec::try_reserve_exact`. When
//! the allocator refuses, the operation returns [`BufferError::OutOfMemory`]
//! and the buffer keeps its previous content and capacity untouched.
//!
//! ## Comparing against files
//!
//! [`GrowableBuffer::compare_to_file`] never loads the file whole: it checks
//! the on-disk size first and then reads [`FILE_BLOCK_SIZE`] chunks, stopping
//! at the first difference. The same [`StreamComparer`] drives the fragment
//! tree's comparison.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extra bytes reserved beyond what an append needs, for small buffers.
pub const SMALL_GROWTH_STEP: usize = 256;

/// Extra bytes reserved beyond what an append needs, once the buffer holds
/// at least [`GROWTH_TIER_THRESHOLD`] bytes.
pub const LARGE_GROWTH_STEP: usize = 8 * 1024;

/// Length at which growth switches from the small step to the large step.
pub const GROWTH_TIER_THRESHOLD: usize = 4 * 1024;

/// Block size used when streaming a file for comparison.
pub const FILE_BLOCK_SIZE: usize = 8 * 1024;

#[derive(Error, Debug)]
pub enum BufferError {
    #[error("out of memory while growing buffer by {requested} bytes")]
    OutOfMemory { requested: usize },
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("formatting failed while appending to buffer")]
    Format,
    #[error("buffer content is not valid UTF-8")]
    InvalidUtf8,
}

impl BufferError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        BufferError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True when the error is an IO error for a path that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BufferError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Outcome of comparing prospective content with a file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileComparison {
    Same,
    Distinct,
}

#[derive(Debug, Clone, Default)]
enum Storage {
    #[default]
    Empty,
    Allocated(Vec<u8>),
}

/// A resizable byte buffer with explicit length.
#[derive(Debug, Clone, Default)]
pub struct GrowableBuffer {
    storage: Storage,
}

/// Extra capacity to reserve on top of `needed` for a buffer of `len` bytes.
fn growth_step(len: usize) -> usize {
    if len >= GROWTH_TIER_THRESHOLD {
        LARGE_GROWTH_STEP
    } else {
        SMALL_GROWTH_STEP
    }
}

impl GrowableBuffer {
    /// An empty buffer. Does not allocate.
    pub const fn new() -> Self {
        Self {
            storage: Storage::Empty,
        }
    }

    /// A buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Result<Self, BufferError> {
        let mut buffer = Self::new();
        if capacity > 0 {
            let mut bytes = Vec::new();
            bytes
                .try_reserve_exact(capacity)
                .map_err(|_| BufferError::OutOfMemory {
                    requested: capacity,
                })?;
            buffer.storage = Storage::Allocated(bytes);
        }
        Ok(buffer)
    }

    /// A buffer holding a copy of `text`.
    pub fn from_text(text: &str) -> Result<Self, BufferError> {
        let mut buffer = Self::new();
        buffer.append(text)?;
        Ok(buffer)
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Empty => 0,
            Storage::Allocated(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        match &self.storage {
            Storage::Empty => 0,
            Storage::Allocated(bytes) => bytes.capacity(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.storage {
            Storage::Empty => &[],
            Storage::Allocated(bytes) => bytes,
        }
    }

    /// The content as text. Fails if the bytes are not valid UTF-8.
    pub fn as_str(&self) -> Result<&str, BufferError> {
        std::str::from_utf8(self.as_bytes()).map_err(|_| BufferError::InvalidUtf8)
    }

    /// The content as text, replacing invalid sequences.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }

    /// Run `fill` on the storage after making sure `needed` more bytes fit
    /// without reallocating.
    ///
    /// If the reservation fails the old storage is put back unmodified and
    /// `fill` never runs.
    fn with_reserved<T>(
        &mut self,
        needed: usize,
        fill: impl FnOnce(&mut Vec<u8>) -> T,
    ) -> Result<T, BufferError> {
        let was_empty = matches!(self.storage, Storage::Empty);
        let mut bytes = match std::mem::take(&mut self.storage) {
            Storage::Empty => Vec::new(),
            Storage::Allocated(bytes) => bytes,
        };
        if bytes.capacity() - bytes.len() < needed {
            let reserved = needed
                .checked_add(growth_step(bytes.len()))
                .and_then(|additional| bytes.try_reserve_exact(additional).ok());
            if reserved.is_none() {
                if !was_empty {
                    self.storage = Storage::Allocated(bytes);
                }
                return Err(BufferError::OutOfMemory { requested: needed });
            }
        }
        let out = fill(&mut bytes);
        self.storage = Storage::Allocated(bytes);
        Ok(out)
    }

    pub fn append(&mut self, text: &str) -> Result<(), BufferError> {
        self.append_bytes(text.as_bytes())
    }

    pub fn append_bytes(&mut self, data: &[u8]) -> Result<(), BufferError> {
        if data.is_empty() {
            return Ok(());
        }
        self.with_reserved(data.len(), |bytes| bytes.extend_from_slice(data))
    }

    /// Append formatted text, e.g. `buf.append_formatted(format_args!("{id}.html"))`.
    ///
    /// The output is measured first so the buffer grows at most once.
    pub fn append_formatted(&mut self, args: fmt::Arguments<'_>) -> Result<(), BufferError> {
        let mut counter = LengthCounter(0);
        fmt::write(&mut counter, args).map_err(|_| BufferError::Format)?;
        if counter.0 == 0 {
            return Ok(());
        }
        let written = self.with_reserved(counter.0, |bytes| {
            let start = bytes.len();
            let mut sink = VecSink(bytes);
            let result = fmt::write(&mut sink, args);
            if result.is_err() {
                sink.0.truncate(start);
            }
            result
        })?;
        written.map_err(|_| BufferError::Format)
    }

    /// Shrink the length by `suffix.len()` bytes, stopping at zero.
    ///
    /// Undoes a temporary append of `suffix`; the bytes are not checked.
    pub fn truncate_suffix(&mut self, suffix: &str) {
        if let Storage::Allocated(bytes) = &mut self.storage {
            let keep = bytes.len().saturating_sub(suffix.len());
            bytes.truncate(keep);
        }
    }

    pub fn clear(&mut self) {
        if let Storage::Allocated(bytes) = &mut self.storage {
            bytes.clear();
        }
    }

    /// Strip every trailing `\r` and `\n`.
    pub fn trim_trailing_newlines(&mut self) {
        if let Storage::Allocated(bytes) = &mut self.storage {
            while matches!(bytes.last(), Some(b'\n' | b'\r')) {
                bytes.pop();
            }
        }
    }

    /// Append the whole content of `path`. Returns the number of bytes read.
    ///
    /// On a read error the buffer is restored to its previous length.
    pub fn read_whole_file(&mut self, path: &Path) -> Result<usize, BufferError> {
        let mut file = File::open(path).map_err(|e| BufferError::io(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| BufferError::io(path, e))?
            .len() as usize;
        let read = self.with_reserved(size, |bytes| {
            let start = bytes.len();
            let result = file.read_to_end(bytes);
            if result.is_err() {
                bytes.truncate(start);
            }
            result
        })?;
        read.map_err(|e| BufferError::io(path, e))
    }

    /// Load `path` into a fresh buffer.
    pub fn from_file(path: &Path) -> Result<Self, BufferError> {
        let mut buffer = Self::new();
        buffer.read_whole_file(path)?;
        Ok(buffer)
    }

    /// Overwrite `path` with the buffer's content in one write.
    pub fn write_whole_file(&self, path: &Path) -> Result<(), BufferError> {
        fs::write(path, self.as_bytes()).map_err(|e| BufferError::io(path, e))
    }

    /// Compare against `path` block by block without loading it.
    pub fn compare_to_file(&self, path: &Path) -> Result<FileComparison, BufferError> {
        let Some(mut comparer) = StreamComparer::open(path, self.len())? else {
            return Ok(FileComparison::Distinct);
        };
        if !comparer.feed(self.as_bytes())? {
            return Ok(FileComparison::Distinct);
        }
        comparer.finish()
    }

    /// Split on `delimiter` into views that borrow from the raw text.
    ///
    /// Consumes the buffer: the returned [`SplitText`] owns the raw text and
    /// the spans, so no view can outlive it.
    pub fn into_split(self, delimiter: u8) -> Result<SplitText, BufferError> {
        let raw = match self.storage {
            Storage::Empty => String::new(),
            Storage::Allocated(bytes) => {
                String::from_utf8(bytes).map_err(|_| BufferError::InvalidUtf8)?
            }
        };
        Ok(SplitText::split(raw, delimiter))
    }
}

impl PartialEq for GrowableBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for GrowableBuffer {}

struct LengthCounter(usize);

impl fmt::Write for LengthCounter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}

struct VecSink<'v>(&'v mut Vec<u8>);

impl fmt::Write for VecSink<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

// ============================================================================
// Streaming comparison
// ============================================================================

/// Compares a sequence of byte slices against a file, one block at a time.
///
/// Callers [`feed`](Self::feed) consecutive pieces of the expected content
/// and call [`finish`](Self::finish) once everything has been fed.
pub struct StreamComparer {
    path: PathBuf,
    file: File,
    block: Box<[u8]>,
    filled: usize,
    pos: usize,
}

impl StreamComparer {
    /// Open `path` for comparison against `expected_len` bytes.
    ///
    /// Returns `Ok(None)` when the file's size already rules out equality.
    pub fn open(path: &Path, expected_len: usize) -> Result<Option<Self>, BufferError> {
        let file = File::open(path).map_err(|e| BufferError::io(path, e))?;
        let size = file.metadata().map_err(|e| BufferError::io(path, e))?.len();
        if size != expected_len as u64 {
            return Ok(None);
        }
        Ok(Some(Self {
            path: path.to_path_buf(),
            file,
            block: vec![0u8; FILE_BLOCK_SIZE].into_boxed_slice(),
            filled: 0,
            pos: 0,
        }))
    }

    /// Refill the block. Returns false at end of file.
    fn refill(&mut self) -> Result<bool, BufferError> {
        loop {
            match self.file.read(&mut self.block) {
                Ok(0) => return Ok(false),
                Ok(n) => {
                    self.filled = n;
                    self.pos = 0;
                    return Ok(true);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(BufferError::io(&self.path, e)),
            }
        }
    }

    /// Compare the next `expected.len()` bytes of the file with `expected`.
    /// Returns false at the first difference or if the file ends early.
    pub fn feed(&mut self, mut expected: &[u8]) -> Result<bool, BufferError> {
        while !expected.is_empty() {
            if self.pos == self.filled && !self.refill()? {
                return Ok(false);
            }
            let take = (self.filled - self.pos).min(expected.len());
            if self.block[self.pos..self.pos + take] != expected[..take] {
                return Ok(false);
            }
            self.pos += take;
            expected = &expected[take..];
        }
        Ok(true)
    }

    /// Same only if the file has no bytes left.
    pub fn finish(mut self) -> Result<FileComparison, BufferError> {
        if self.pos < self.filled || self.refill()? {
            return Ok(FileComparison::Distinct);
        }
        Ok(FileComparison::Same)
    }
}

// ============================================================================
// Split views
// ============================================================================

/// Raw text plus the spans of its delimited segments.
///
/// Segments are never copied: [`iter`](Self::iter) hands out `&str` views
/// into the owned raw text. A segment starts at the beginning of the text and
/// after every delimiter that is followed by more text, so a trailing
/// delimiter does not produce an empty final segment and empty text yields no
/// segments. When splitting on `\n`, a `\r` also ends a segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitText {
    raw: String,
    spans: Vec<Range<usize>>,
}

impl SplitText {
    pub fn split(raw: String, delimiter: u8) -> Self {
        let bytes = raw.as_bytes();
        let mut spans = Vec::new();
        let mut start: Option<usize> = None;
        let mut prev_was_delimiter = true;
        let mut end_of_current: Option<usize> = None;
        for (i, &b) in bytes.iter().enumerate() {
            if prev_was_delimiter {
                if let Some(s) = start.take() {
                    spans.push(s..end_of_current.take().unwrap_or(i));
                }
                start = Some(i);
                end_of_current = None;
            }
            prev_was_delimiter = b == delimiter;
            let terminates = b == delimiter || (delimiter == b'\n' && b == b'\r');
            if terminates && end_of_current.is_none() {
                end_of_current = Some(i);
            }
        }
        if let Some(s) = start {
            spans.push(s..end_of_current.unwrap_or(bytes.len()));
        }
        Self { raw, spans }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.spans.get(index).map(|span| &self.raw[span.clone()])
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.spans.iter().map(|span| &self.raw[span.clone()])
    }
}
