//! Batch date resolution.
//!
//! Posts carry dates as free-form text (`2024-03-01`, `last tuesday`, ...).
//! Every date of a run is resolved in one round trip:
//!
//! ```text
//! DateBatch            line 0: "now"
//!   ├── post 0         written-date, publish-after?, updated-at?
//!   ├── post 1         written-date, ...
//!   └── ...
//!        │
//!        ▼  DateResolver::resolve_timestamps (one call)
//! Vec<Result<i64, DateParseError>>   aligned 1:1 with the batch
//!        │
//!        ▼  apply_resolved_dates
//! Post::{written_ts, publish_after_ts, updated_ts, can_publish}
//! ```
//!
//! A single unparseable date only costs that field: it stays `None`, a
//! warning names the post and field, and the rest of the batch applies. A
//! resolver that answers with the wrong number of lines breaks the
//! positional mapping and fails the whole run with
//! [`DateError::BatchSizeMismatch`].
//!
//! Two resolvers exist. [`ExternalDateResolver`] writes the batch to a scratch
//! file and runs `date -f <file> +%s`, which understands everything GNU date
//! does. [`BuiltinDateResolver`] parses a fixed set of formats in-process
//! with chrono. Only the builtin resolver can report a single bad date:
//! GNU `date -f` prints nothing for a line it cannot parse, so one bad date
//! under the external resolver fails the run with a batch size mismatch.

use crate::content::{Post, PostId};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, warn};

/// Request line that resolves to the current time.
pub const NOW: &str = "now";

/// Scratch file name used by [`ExternalDateResolver`].
pub const EXCHANGE_FILE: &str = "post_dates";

#[derive(Error, Debug)]
pub enum DateError {
    #[error("date resolver returned {actual} results for {expected} dates")]
    BatchSizeMismatch { expected: usize, actual: usize },
    #[error("failed to run date command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not resolve the current time: {0}")]
    NowUnresolved(DateParseError),
}

/// A single date the resolver could not understand.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognised date '{input}'")]
pub struct DateParseError {
    pub input: String,
}

/// Which post field a batch line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Written,
    PublishAfter,
    UpdatedAt,
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DateField::Written => "written-date",
            DateField::PublishAfter => "publish-after",
            DateField::UpdatedAt => "updated-at",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSlot {
    Now,
    Field(PostId, DateField),
}

/// Every date string of a run, with the origin of each line.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DateBatch {
    pub lines: Vec<String>,
    pub slots: Vec<DateSlot>,
}

impl DateBatch {
    pub fn build(posts: &[Post]) -> Self {
        let mut batch = Self::default();
        batch.push(NOW, DateSlot::Now);
        for (i, post) in posts.iter().enumerate() {
            let id = PostId(i);
            batch.push(&post.written_date, DateSlot::Field(id, DateField::Written));
            if let Some(after) = &post.publish_after {
                batch.push(after, DateSlot::Field(id, DateField::PublishAfter));
            }
            if let Some(updated) = &post.updated_at {
                batch.push(updated, DateSlot::Field(id, DateField::UpdatedAt));
            }
        }
        batch
    }

    fn push(&mut self, line: &str, slot: DateSlot) {
        self.lines.push(line.to_string());
        self.slots.push(slot);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Converts date strings to Unix timestamps, one result per input, in order.
pub trait DateResolver {
    fn resolve_timestamps(
        &self,
        batch: &[String],
    ) -> Result<Vec<Result<i64, DateParseError>>, DateError>;
}

// ============================================================================
// External resolver
// ============================================================================

/// Shells out once to a GNU-date-compatible command.
///
/// `date -f` writes no line for an input it cannot parse and exits non-zero,
/// so a single bad date surfaces as [`DateError::BatchSizeMismatch`] rather
/// than a per-entry [`DateParseError`].
#[derive(Debug, Clone)]
pub struct ExternalDateResolver {
    command: String,
    exchange_file: PathBuf,
}

impl ExternalDateResolver {
    /// `scratch_dir` receives the batch file; normally `<content>/generating`.
    pub fn new(command: impl Into<String>, scratch_dir: &Path) -> Self {
        Self {
            command: command.into(),
            exchange_file: scratch_dir.join(EXCHANGE_FILE),
        }
    }
}

impl DateResolver for ExternalDateResolver {
    fn resolve_timestamps(
        &self,
        batch: &[String],
    ) -> Result<Vec<Result<i64, DateParseError>>, DateError> {
        let mut request = batch.join("\n");
        request.push('\n');
        fs::write(&self.exchange_file, request).map_err(|source| DateError::Io {
            path: self.exchange_file.clone(),
            source,
        })?;

        debug!(command = %self.command, count = batch.len(), "resolving dates");
        let output = Command::new(&self.command)
            .arg("-f")
            .arg(&self.exchange_file)
            .arg("+%s")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|source| DateError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let lines: Vec<&str> = stdout.lines().collect();
        if lines.len() != batch.len() {
            return Err(DateError::BatchSizeMismatch {
                expected: batch.len(),
                actual: lines.len(),
            });
        }
        if !output.status.success() {
            warn!(status = %output.status, "date command reported failures");
        }
        Ok(batch
            .iter()
            .zip(lines)
            .map(|(input, line)| {
                line.trim().parse::<i64>().map_err(|_| DateParseError {
                    input: input.clone(),
                })
            })
            .collect())
    }
}

// ============================================================================
// Builtin resolver
// ============================================================================

/// In-process resolver for the common machine-readable formats.
///
/// Accepts `now`, `@<seconds>`, RFC 3339, RFC 2822, `%Y-%m-%d %H:%M:%S`,
/// `%Y-%m-%dT%H:%M:%S` and `%Y-%m-%d`. Dates without an offset are local
/// time, as `date` reads them.
#[derive(Debug, Clone, Default)]
pub struct BuiltinDateResolver {
    fixed_now: Option<i64>,
}

impl BuiltinDateResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `now` to `timestamp` instead of the clock.
    pub fn with_now(timestamp: i64) -> Self {
        Self {
            fixed_now: Some(timestamp),
        }
    }

    pub fn parse(&self, input: &str) -> Option<i64> {
        let input = input.trim();
        if input.eq_ignore_ascii_case(NOW) {
            return Some(self.fixed_now.unwrap_or_else(|| Local::now().timestamp()));
        }
        if let Some(seconds) = input.strip_prefix('@') {
            return seconds.parse().ok();
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Some(dt.timestamp());
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(input) {
            return Some(dt.timestamp());
        }
        let naive = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(input, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.timestamp())
    }
}

impl DateResolver for BuiltinDateResolver {
    fn resolve_timestamps(
        &self,
        batch: &[String],
    ) -> Result<Vec<Result<i64, DateParseError>>, DateError> {
        Ok(batch
            .iter()
            .map(|input| {
                self.parse(input).ok_or_else(|| DateParseError {
                    input: input.clone(),
                })
            })
            .collect())
    }
}

// ============================================================================
// Applying results
// ============================================================================

/// Resolve every post date in one batch and decide publishability.
///
/// Returns the resolved current time.
pub fn resolve_post_dates(
    posts: &mut [Post],
    resolver: &dyn DateResolver,
) -> Result<i64, DateError> {
    let batch = DateBatch::build(posts);
    let results = resolver.resolve_timestamps(&batch.lines)?;
    apply_resolved_dates(posts, &batch, results)
}

/// Map resolver results back onto the posts they came from.
pub fn apply_resolved_dates(
    posts: &mut [Post],
    batch: &DateBatch,
    results: Vec<Result<i64, DateParseError>>,
) -> Result<i64, DateError> {
    if results.len() != batch.len() {
        return Err(DateError::BatchSizeMismatch {
            expected: batch.len(),
            actual: results.len(),
        });
    }
    let mut now = None;
    for (slot, result) in batch.slots.iter().zip(results) {
        match (slot, result) {
            (DateSlot::Now, Ok(ts)) => now = Some(ts),
            (DateSlot::Now, Err(e)) => return Err(DateError::NowUnresolved(e)),
            (DateSlot::Field(id, field), Ok(ts)) => {
                let post = &mut posts[id.0];
                match field {
                    DateField::Written => post.written_ts = Some(ts),
                    DateField::PublishAfter => post.publish_after_ts = Some(ts),
                    DateField::UpdatedAt => post.updated_ts = Some(ts),
                }
            }
            (DateSlot::Field(id, field), Err(e)) => {
                warn!(post = %posts[id.0].folder_name, %field, "{e}");
            }
        }
    }
    let now = now.ok_or(DateError::BatchSizeMismatch {
        expected: batch.len(),
        actual: 0,
    })?;
    for post in posts.iter_mut() {
        post.can_publish = can_publish(post, now);
    }
    Ok(now)
}

/// A post is publishable once it is marked ready, its written date parsed,
/// and its publish-after date (if any) parsed and has passed.
pub fn can_publish(post: &Post, now: i64) -> bool {
    if !post.publish_when_ready || post.written_ts.is_none() {
        return false;
    }
    match (&post.publish_after, post.publish_after_ts) {
        (None, _) => true,
        (Some(_), Some(after)) => after <= now,
        (Some(_), None) => false,
    }
}
