//! CLI output formatting for `check` and `generate`.
//!
//! # Information-First Display
//!
//! Entities are listed by positional index and title, with their source
//! directory as an indented `Source:` line, so the output reads as a content
//! inventory while still pointing back at the files.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Series
//! 001 Learning Rust (2 posts)
//!     Source: series/rust/
//!
//! Posts
//! 001 Ownership explained
//!     Source: posts/ownership/
//!     Series: rust
//!     Written: 2024-03-01
//! 002 Lifetimes (draft)
//!     Source: posts/lifetimes/
//!     Series: rust
//!     Written: next week
//!
//! Pages
//! 001 Home → index.html
//!
//! Tags
//! rust (1)
//!
//! Skipped
//!     posts/scratch/ (no generate-post marker)
//! ```
//!
//! ## Generate
//!
//! ```text
//! Updated
//!     bright/posts/ownership.html
//!     dark/posts/ownership.html
//! Removed
//!     bright/tags/cobol.html
//!
//! 2 pages written (0 new), 38 unchanged, 1 removed
//! ```
//!
//! Each command has a `format_*` function returning `Vec<String>` for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::content::post::GENERATE_MARKER;
use crate::content::SiteContent;
use crate::generate::GenerationReport;
use crate::loader::LoadSummary;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

pub fn format_check_output(site: &SiteContent, summary: &LoadSummary) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Series".to_string());
    for (i, series) in site.series.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            series.title,
            plural(series.posts.len(), "post")
        ));
        lines.push(format!("{}Source: series/{}/", indent(1), series.folder_name));
    }

    lines.push(String::new());
    lines.push("Posts".to_string());
    for (i, post) in site.posts.iter().enumerate() {
        let status = if post.can_publish { "" } else { " (draft)" };
        lines.push(format!("{} {}{status}", format_index(i + 1), post.title));
        lines.push(format!("{}Source: posts/{}/", indent(1), post.folder_name));
        lines.push(format!("{}Series: {}", indent(1), post.series_name));
        lines.push(format!("{}Written: {}", indent(1), post.written_date));
        if let Some(updated) = &post.updated_at {
            lines.push(format!("{}Updated: {updated}", indent(1)));
        }
        if let Some(after) = &post.publish_after {
            lines.push(format!("{}Publish after: {after}", indent(1)));
        }
    }

    lines.push(String::new());
    lines.push("Pages".to_string());
    for (i, page) in site.misc_pages.iter().enumerate() {
        lines.push(format!("{} {} → {}", format_index(i + 1), page.title, page.filename));
    }

    if !site.tags.is_empty() {
        lines.push(String::new());
        lines.push("Tags".to_string());
        for entry in &site.tags {
            lines.push(format!("{} ({})", entry.tag, entry.posts.len()));
        }
    }

    if !summary.skipped_posts.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for name in &summary.skipped_posts {
            lines.push(format!("{}posts/{name}/ (no {GENERATE_MARKER} marker)", indent(1)));
        }
    }

    if !summary.failed_entries.is_empty() {
        lines.push(String::new());
        lines.push("Failed".to_string());
        for name in &summary.failed_entries {
            lines.push(format!("{}{name}", indent(1)));
        }
    }

    lines
}

pub fn print_check_output(site: &SiteContent, summary: &LoadSummary) {
    for line in format_check_output(site, summary) {
        println!("{}", line);
    }
}

pub fn format_generate_report(report: &GenerationReport) -> Vec<String> {
    let tally = &report.tally;
    let mut lines = Vec::new();

    if !tally.updated.is_empty() {
        lines.push("Updated".to_string());
        for path in &tally.updated {
            lines.push(format!("{}{path}", indent(1)));
        }
    }
    if !tally.removed.is_empty() {
        lines.push("Removed".to_string());
        for path in &tally.removed {
            lines.push(format!("{}{path}", indent(1)));
        }
    }
    if !lines.is_empty() {
        lines.push(String::new());
    }

    lines.push(format!(
        "{} written ({} new), {} unchanged, {} removed",
        plural(tally.written(), "page"),
        tally.created,
        tally.unchanged,
        tally.removed.len()
    ));
    lines.push(format!(
        "{} of {} published",
        report.publishable,
        plural(report.posts, "post")
    ));
    if !report.summary.failed_entries.is_empty() {
        lines.push(format!(
            "Skipped after errors: {}",
            report.summary.failed_entries.join(", ")
        ));
    }
    lines
}

pub fn print_generate_report(report: &GenerationReport) {
    for line in format_generate_report(report) {
        println!("{}", line);
    }
}
