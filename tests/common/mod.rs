//! Content-tree fixtures for the integration tests.

#![allow(dead_code)]

use spark::config::{CONTENT_DIRS, SiteConfiguration};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::TempDir;
use walkdir::WalkDir;

/// A content tree with components, both themes, series `main` and a home
/// page. Posts are added with [`ContentTree::post`].
pub struct ContentTree {
    pub tmp: TempDir,
}

impl ContentTree {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let content = tmp.path().join("content");
        for sub in CONTENT_DIRS {
            fs::create_dir_all(content.join(sub)).unwrap();
        }
        let tree = Self { tmp };
        tree.write("components/header.html", "<!DOCTYPE html>\n<html><head>\n");
        tree.write("components/footer.html", "<footer>spark</footer>\n");
        tree.write("components/trailer.html", "</html>\n");
        tree.write("themes/bright/main.css", "body{background:#fff}");
        tree.write("themes/bright/syntax-highlighting.css", ".kw{color:blue}");
        tree.write("themes/dark/main.css", "body{background:#000}");
        tree.write("themes/dark/syntax-highlighting.css", ".kw{color:cyan}");
        tree.write("series/main/title", "Main series\n");
        tree.write("series/main/order", "1\n");
        tree.write("series/main/short-description", "Everything\n");
        tree.write("series/main/landing-desc.html", "<p>All the posts.</p>\n");
        tree.write("misc_pages/home/title", "Home\n");
        tree.write("misc_pages/home/filename", "index.html\n");
        tree.write("misc_pages/home/description", "Front page\n");
        tree.write("misc_pages/home/content.html", "<p>Hello there.</p>\n");
        tree
    }

    pub fn content(&self) -> PathBuf {
        self.tmp.path().join("content")
    }

    pub fn html(&self) -> PathBuf {
        self.tmp.path().join("html")
    }

    /// Write `text` to a path relative to the content root.
    pub fn write(&self, relative: &str, text: &str) {
        let path = self.content().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    /// A marked, publishable post in series `main`.
    pub fn post(&self, id: &str, tags: &str, written: &str) {
        self.write(&format!("posts/{id}/generate-post"), "");
        self.write(&format!("posts/{id}/publish-when-ready"), "");
        self.write(&format!("posts/{id}/title"), &format!("{id} title\n"));
        self.write(&format!("posts/{id}/author"), "writer\n");
        self.write(&format!("posts/{id}/tags"), &format!("{tags}\n"));
        self.write(&format!("posts/{id}/series"), "main\n");
        self.write(&format!("posts/{id}/short-description"), &format!("{id} in short\n"));
        self.write(&format!("posts/{id}/long-description"), &format!("{id} at length\n"));
        self.write(&format!("posts/{id}/written-date"), &format!("{written}\n"));
        self.write(&format!("posts/{id}/content.html"), &format!("<p>{id} body</p>\n"));
    }

    pub fn config(&self) -> SiteConfiguration {
        SiteConfiguration {
            bright_host: "blog.test".to_string(),
            dark_host: "dark.blog.test".to_string(),
            bright_name: "Bright".to_string(),
            dark_name: "Dark".to_string(),
            html_base_dir: self.html(),
            content_base_dir: self.content(),
            site_group: "www-data".to_string(),
            rss_description: "Test blog".to_string(),
            date_command: "date".to_string(),
        }
    }
}

/// Every file under `root` with its modification time, in path order.
pub fn snapshot(root: &Path) -> Vec<(PathBuf, SystemTime)> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let modified = entry.metadata().unwrap().modified().unwrap();
            (entry.into_path(), modified)
        })
        .collect()
}

/// Output files under `root` with the given extension.
pub fn files_with_extension(root: &Path, extension: &str) -> Vec<PathBuf> {
    if !root.exists() {
        return Vec::new();
    }
    snapshot(root)
        .into_iter()
        .map(|(path, _)| path)
        .filter(|path| path.extension().is_some_and(|ext| ext == extension))
        .collect()
}
