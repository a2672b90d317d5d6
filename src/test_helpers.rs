//! Shared test utilities for the spark test suite.
//!
//! Two kinds of fixtures:
//!
//! - **On disk**: [`write_post`], [`write_series`], [`write_misc_page`] and
//!   [`SiteFixture`] lay out content directories in a [`TempDir`] for the
//!   loaders and the full pipeline.
//! - **In memory**: [`loaded_post`], [`site_with`] and [`site_in`] build the
//!   graph directly, for composer and linking tests that don't care how the
//!   content was read.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let fixture = SiteFixture::new()
//!     .post(PostFixture::new("intro").tags("rust,web"))
//!     .post(PostFixture::new("draft").not_ready());
//! let (site, _) = load_site_content(&fixture.config(), &BuiltinDateResolver::new()).unwrap();
//!
//! assert!(find_post(&site, "intro").can_publish);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::buffer::{GrowableBuffer, SplitText};
use crate::config::{CONTENT_DIRS, DEFAULT_DATE_COMMAND, SiteConfiguration};
use crate::content::post::GENERATE_MARKER;
use crate::content::{HtmlComponents, MiscPage, Post, Series, SiteContent, Theme, ThemeKind};

pub const BRIGHT_HOST: &str = "bright.test";
pub const DARK_HOST: &str = "dark.test";

fn buffer(text: &str) -> GrowableBuffer {
    GrowableBuffer::from_text(text).unwrap()
}

// =========================================================================
// On-disk fixtures
// =========================================================================

/// Files of one post directory. Defaults produce a publishable post in
/// series `main` written on 2024-01-01.
#[derive(Debug, Clone)]
pub struct PostFixture {
    pub id: String,
    pub tags: String,
    pub series: String,
    pub written: String,
    pub updated: Option<String>,
    pub publish_after: Option<String>,
    pub next_reading: Vec<String>,
    pub prev_reading: Vec<String>,
    pub marked: bool,
    pub ready: bool,
    pub has_code: bool,
}

impl PostFixture {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            tags: "general".to_string(),
            series: "main".to_string(),
            written: "2024-01-01".to_string(),
            updated: None,
            publish_after: None,
            next_reading: Vec::new(),
            prev_reading: Vec::new(),
            marked: true,
            ready: true,
            has_code: false,
        }
    }

    pub fn tags(mut self, tags: &str) -> Self {
        self.tags = tags.to_string();
        self
    }

    pub fn series(mut self, series: &str) -> Self {
        self.series = series.to_string();
        self
    }

    pub fn written(mut self, date: &str) -> Self {
        self.written = date.to_string();
        self
    }

    pub fn updated(mut self, date: &str) -> Self {
        self.updated = Some(date.to_string());
        self
    }

    pub fn publish_after(mut self, date: &str) -> Self {
        self.publish_after = Some(date.to_string());
        self
    }

    pub fn next_reading(mut self, ids: &[&str]) -> Self {
        self.next_reading = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn prev_reading(mut self, ids: &[&str]) -> Self {
        self.prev_reading = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn has_code(mut self) -> Self {
        self.has_code = true;
        self
    }

    /// Without the generate marker the loader skips the post.
    pub fn unmarked(mut self) -> Self {
        self.marked = false;
        self
    }

    pub fn not_ready(mut self) -> Self {
        self.ready = false;
        self
    }
}

fn write_field(dir: &Path, name: &str, value: &str) {
    fs::write(dir.join(name), format!("{value}\n")).unwrap();
}

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), "").unwrap();
}

/// Write `<dir>/<id>/` with every file of `post`, returning the post dir.
pub fn write_post(dir: &Path, post: &PostFixture) -> PathBuf {
    let root = dir.join(&post.id);
    fs::create_dir_all(&root).unwrap();
    if post.marked {
        touch(&root, GENERATE_MARKER);
    }
    if post.ready {
        touch(&root, "publish-when-ready");
    }
    if post.has_code {
        touch(&root, "has-code");
    }
    write_field(&root, "title", &format!("Title of {}", post.id));
    fs::write(root.join("content.html"), format!("<p>Body of {}</p>\n", post.id)).unwrap();
    write_field(&root, "author", "tester");
    write_field(&root, "tags", &post.tags);
    write_field(&root, "series", &post.series);
    write_field(&root, "short-description", &format!("Short {}", post.id));
    write_field(&root, "long-description", &format!("Long {}", post.id));
    write_field(&root, "written-date", &post.written);
    if let Some(updated) = &post.updated {
        write_field(&root, "updated-at", updated);
    }
    if let Some(after) = &post.publish_after {
        write_field(&root, "publish-after", after);
    }
    if !post.next_reading.is_empty() {
        write_field(&root, "suggested-next-reading", &post.next_reading.join("\n"));
    }
    if !post.prev_reading.is_empty() {
        write_field(&root, "suggested-prev-reading", &post.prev_reading.join("\n"));
    }
    root
}

pub fn write_series(dir: &Path, id: &str, title: &str, order: &str) -> PathBuf {
    let root = dir.join(id);
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("landing-desc.html"), format!("<p>About {id}</p>\n")).unwrap();
    write_field(&root, "short-description", &format!("Short {id}"));
    write_field(&root, "title", title);
    write_field(&root, "order", order);
    root
}

pub fn write_misc_page(dir: &Path, id: &str, filename: &str, title: &str) -> PathBuf {
    let root = dir.join(id);
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("content.html"), "<p>Welcome</p>\n").unwrap();
    write_field(&root, "title", title);
    write_field(&root, "filename", filename);
    write_field(&root, "description", &format!("Description of {id}"));
    root
}

/// A complete content tree in a temp dir: components, both themes, series
/// `main` and a home page, plus whatever posts are added.
pub struct SiteFixture {
    pub tmp: TempDir,
}

impl SiteFixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let content = tmp.path().join("content");
        for sub in CONTENT_DIRS {
            fs::create_dir_all(content.join(sub)).unwrap();
        }
        let components = content.join("components");
        fs::write(components.join("header.html"), "<html><head>\n").unwrap();
        fs::write(components.join("footer.html"), "<footer>f</footer>\n").unwrap();
        fs::write(components.join("trailer.html"), "</html>\n").unwrap();
        let themes = content.join("themes");
        fs::write(themes.join("bright/main.css"), "body{color:black}").unwrap();
        fs::write(themes.join("bright/syntax-highlighting.css"), ".kw{}").unwrap();
        fs::write(themes.join("dark/main.css"), "body{color:white}").unwrap();
        write_series(&content.join("series"), "main", "Main series", "1");
        write_misc_page(&content.join("misc_pages"), "home", "index.html", "Home");
        Self { tmp }
    }

    pub fn content_dir(&self) -> PathBuf {
        self.tmp.path().join("content")
    }

    pub fn post(self, post: PostFixture) -> Self {
        write_post(&self.content_dir().join("posts"), &post);
        self
    }

    /// Configuration pointing at this tree; the html dir is not created.
    pub fn config(&self) -> SiteConfiguration {
        SiteConfiguration {
            bright_host: BRIGHT_HOST.to_string(),
            dark_host: DARK_HOST.to_string(),
            bright_name: "Bright".to_string(),
            dark_name: "Dark".to_string(),
            html_base_dir: self.tmp.path().join("html"),
            content_base_dir: self.content_dir(),
            site_group: "www-data".to_string(),
            rss_description: "Test posts".to_string(),
            date_command: DEFAULT_DATE_COMMAND.to_string(),
        }
    }
}

// =========================================================================
// In-memory fixtures
// =========================================================================

/// A post as the loader would produce it, before dates and linking.
pub fn loaded_post(id: &str, tags: &str) -> Post {
    Post {
        folder_name: id.to_string(),
        title: format!("Title of {id}"),
        content: buffer(&format!("<p>Body of {id}</p>\n")),
        author: "tester".to_string(),
        tags: SplitText::split(tags.to_string(), b','),
        series_name: "main".to_string(),
        short_description: format!("Short {id}"),
        long_description: format!("Long {id}"),
        suggested_next_names: SplitText::default(),
        suggested_prev_names: SplitText::default(),
        written_date: "2024-01-01".to_string(),
        updated_at: None,
        publish_after: None,
        publish_when_ready: true,
        has_code: false,
        written_ts: None,
        updated_ts: None,
        publish_after_ts: None,
        can_publish: false,
        series: None,
        suggested_next: Vec::new(),
        suggested_prev: Vec::new(),
    }
}

fn theme(kind: ThemeKind, css: &str, host: &str, name: &str, output_dir: PathBuf) -> Theme {
    Theme {
        kind,
        main_css: buffer(css),
        syntax_css: buffer(".kw{}"),
        host: host.to_string(),
        name: name.to_string(),
        output_dir,
    }
}

fn build_site(output_root: &Path, posts: Vec<Post>) -> SiteContent {
    SiteContent {
        components: HtmlComponents {
            header: buffer("<html><head>\n"),
            footer: buffer("<footer>f</footer>\n"),
            trailer: buffer("</html>\n"),
        },
        bright: theme(
            ThemeKind::Bright,
            "body{color:black}",
            BRIGHT_HOST,
            "Bright",
            output_root.join("bright"),
        ),
        dark: theme(
            ThemeKind::Dark,
            "body{color:white}",
            DARK_HOST,
            "Dark",
            output_root.join("dark"),
        ),
        misc_pages: vec![MiscPage {
            folder_name: "home".to_string(),
            content: buffer("<p>Welcome</p>\n"),
            title: "Home".to_string(),
            filename: "index.html".to_string(),
            description: "Home page".to_string(),
        }],
        series: vec![Series {
            folder_name: "main".to_string(),
            landing_desc: buffer("<p>About main</p>\n"),
            short_description: "Short main".to_string(),
            title: "Main series".to_string(),
            order: 1,
            posts: Vec::new(),
        }],
        posts,
        tags: Vec::new(),
        current_time: 1_700_000_000,
    }
}

/// An unlinked site whose output dirs don't exist.
pub fn site_with(posts: Vec<Post>) -> SiteContent {
    build_site(Path::new("out"), posts)
}

/// An unlinked site writing under `root/html`, output skeleton created.
pub fn site_in(root: &Path, posts: Vec<Post>) -> SiteContent {
    let site = build_site(&root.join("html"), posts);
    for kind in ThemeKind::ALL {
        for sub in crate::config::OUTPUT_SUBDIRS {
            fs::create_dir_all(site.theme(kind).output_dir.join(sub)).unwrap();
        }
    }
    site
}

// =========================================================================
// Lookups — panics with a clear message on miss
// =========================================================================

/// Find a post by folder name. Panics if not found.
pub fn find_post<'a>(site: &'a SiteContent, name: &str) -> &'a Post {
    site.posts
        .iter()
        .find(|p| p.folder_name == name)
        .unwrap_or_else(|| {
            let names: Vec<&str> = site.posts.iter().map(|p| p.folder_name.as_str()).collect();
            panic!("post '{name}' not found. Available: {names:?}")
        })
}
