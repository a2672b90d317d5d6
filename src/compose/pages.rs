use super::page::{PageSpec, publish_page};
use super::{ComposeError, PublishTally};
use crate::content::{MiscPage, Post, PostId, SiteContent, ThemeKind, tags};
use crate::fragments::FragmentTree;
use maud::{Markup, html};
use std::fs;
use std::path::Path;
use tracing::info;
use walkdir::WalkDir;

/// Number of posts listed on the home page.
pub const HOME_PAGE_POSTS: usize = 5;

fn series_title<'s>(site: &'s SiteContent, post: &'s Post) -> &'s str {
    post.series
        .map(|id| site.series_by_id(id).title.as_str())
        .unwrap_or(&post.series_name)
}

/// Remove `<section>/<stem>.html` files whose stem fails `keep`.
///
/// `index.html` and misc pages published into `section` are never stale.
fn remove_stale_pages(
    site: &SiteContent,
    kind: ThemeKind,
    section: &str,
    keep: impl Fn(&str) -> bool,
    tally: &mut PublishTally,
) -> Result<(), ComposeError> {
    let dir = site.theme(kind).output_dir.join(section);
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in WalkDir::new(&dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ComposeError::Walk {
            path: dir.clone(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name == "index.html" {
            continue;
        }
        let Some(stem) = name.strip_suffix(".html") else {
            continue;
        };
        let relative = format!("{section}/{name}");
        if keep(stem) || site.misc_pages.iter().any(|page| page.filename == relative) {
            continue;
        }
        fs::remove_file(entry.path()).map_err(|source| ComposeError::Remove {
            path: entry.path().to_path_buf(),
            source,
        })?;
        info!(path = %entry.path().display(), "removed stale page");
        tally.removed.push(format!("{kind}/{relative}"));
    }
    Ok(())
}

// ============================================================================
// Posts
// ============================================================================

fn suggested_reading(site: &SiteContent, ids: &[PostId], which: &str) -> Markup {
    let targets: Vec<&Post> = ids
        .iter()
        .map(|id| site.post(*id))
        .filter(|post| post.can_publish)
        .collect();
    html! {
        @if !targets.is_empty() {
            div.s_p_reading {
                "Suggested " (which) " reading: "
                @for (i, post) in targets.iter().enumerate() {
                    @if i > 0 { ", " }
                    a href=(format!("/posts/{}", post.folder_name)) { (post.title) }
                }
            }
        }
    }
}

fn post_footer(site: &SiteContent, post: &Post) -> Markup {
    html! {
        footer.flexcontainer.postfooter {
            "\n"
            div {
                "\n"
                div {
                    "Series: "
                    a href=(format!("/series/{}", post.series_name)) { (series_title(site, post)) }
                }
                "\n"
                div { "Author: @" (post.author) }
                "\n"
                div {
                    "Tags: "
                    @for (i, tag) in post.tags.iter().filter(|tag| !tag.is_empty()).enumerate() {
                        @if i > 0 { ", " }
                        @if tags::is_page_name(tag) {
                            a href=(format!("/tags/{tag}")) { (tag) }
                        } @else {
                            (tag)
                        }
                    }
                }
                "\n"
            }
            "\n"
            div {
                "\n"
                div { "Written: " (post.written_date) }
                "\n"
                @if let Some(updated) = &post.updated_at {
                    div { "Updated: " (updated) }
                    "\n"
                }
            }
            "\n"
        }
        "\n"
    }
}

/// The `<article>` of a post page; the post body is borrowed.
pub fn post_body(site: &SiteContent, id: PostId) -> Result<FragmentTree<'_>, ComposeError> {
    let post = site.post(id);
    let mut body = FragmentTree::new();
    body.append_owned_text("<article>\n<header>\n")?;
    let heading = html! {
        h1 { (post.title) }
        "\n"
        (suggested_reading(site, &post.suggested_prev, "previous"))
    };
    body.append_owned_text(&heading.into_string())?;
    body.append_owned_text("</header>\n")?;
    body.append_borrowed_buffer(&post.content)?;
    let closing = html! {
        (suggested_reading(site, &post.suggested_next, "next"))
        (post_footer(site, post))
    };
    body.append_owned_text(&closing.into_string())?;
    body.append_owned_text("</article>\n")?;
    Ok(body)
}

pub fn post_page_spec(post: &Post) -> PageSpec {
    PageSpec {
        filename: format!("{}.html", post.url_path()),
        title: post.title.clone(),
        description: Some(post.short_description.clone()),
        author: Some(post.author.clone()),
        keywords: Some(post.tags.iter().collect::<Vec<_>>().join(",")),
        has_code: post.has_code,
        is_post: true,
    }
}

/// Sweep pages of removed posts, then write a page for every loaded post.
pub fn publish_posts(site: &SiteContent, tally: &mut PublishTally) -> Result<(), ComposeError> {
    for kind in ThemeKind::ALL {
        remove_stale_pages(site, kind, "posts", |stem| site.find_post(stem).is_some(), tally)?;
    }
    for i in 0..site.posts.len() {
        let id = PostId(i);
        let body = post_body(site, id)?;
        publish_page(site, &post_page_spec(site.post(id)), &body, tally)?;
    }
    Ok(())
}

// ============================================================================
// Tags
// ============================================================================

fn post_summary(post: &Post) -> Markup {
    html! {
        div {
            h3 { a href=(format!("/posts/{}", post.folder_name)) { (post.title) } }
            "\n"
            p { (post.long_description) }
            "\n"
        }
        "\n"
    }
}

/// Sweep pages of vanished tags, write one page per tag, then the index.
pub fn publish_tags(site: &SiteContent, tally: &mut PublishTally) -> Result<(), ComposeError> {
    for kind in ThemeKind::ALL {
        remove_stale_pages(site, kind, "tags", |stem| site.find_tag(stem).is_some(), tally)?;
    }

    for entry in &site.tags {
        let title = format!("{} tag listing", entry.tag);
        let spec = PageSpec::new(format!("tags/{}.html", entry.tag), title.clone()).description(title);
        let markup = html! {
            header { h1 { "Tag: " (entry.tag) } }
            "\n"
            section {
                "\n"
                @for id in &entry.posts {
                    (post_summary(site.post(*id)))
                }
            }
            "\n"
        };
        let mut body = FragmentTree::new();
        body.append_owned_text(&markup.into_string())?;
        publish_page(site, &spec, &body, tally)?;
    }

    // Last, so the index never links to a tag page that failed to write.
    let markup = html! {
        header { h1 { "All tags" } }
        "\n"
        section {
            "\n"
            @for entry in &site.tags {
                div {
                    a href=(format!("/tags/{}", entry.tag)) { (entry.tag) }
                    " (" (entry.posts.len()) ")"
                }
                "\n"
            }
        }
        "\n"
    };
    let mut body = FragmentTree::new();
    body.append_owned_text(&markup.into_string())?;
    let spec = PageSpec::new("tags/index.html", "All tags").description("All tags");
    publish_page(site, &spec, &body, tally)
}

// ============================================================================
// Misc pages
// ============================================================================

/// Publishable posts ordered by their latest written or updated time.
pub fn newest_posts(site: &SiteContent, limit: usize) -> Vec<&Post> {
    let mut posts: Vec<&Post> = site.publishable_posts().map(|(_, post)| post).collect();
    posts.sort_by_key(|post| std::cmp::Reverse(post.last_touched()));
    posts.truncate(limit);
    posts
}

fn home_page_body<'s>(site: &'s SiteContent, page: &'s MiscPage) -> Result<FragmentTree<'s>, ComposeError> {
    let mut body = FragmentTree::new();
    body.append_owned_text("<article>\n")?;
    body.append_borrowed_buffer(&page.content)?;
    let listing = html! {
        section {
            "\n"
            h2 { "New and updated posts" }
            "\n"
            @for post in newest_posts(site, HOME_PAGE_POSTS) {
                div {
                    h3 { a href=(format!("/posts/{}", post.folder_name)) { (post.title) } }
                    "\n"
                    p { (post.long_description) }
                    "\n"
                    ul {
                        "\n"
                        li { "Written: " (post.written_date) }
                        "\n"
                        @if let Some(updated) = &post.updated_at {
                            li { "Updated at: " (updated) }
                            "\n"
                        }
                        li {
                            "Series: "
                            a href=(format!("/series/{}", post.series_name)) { (series_title(site, post)) }
                        }
                        "\n"
                    }
                    "\n"
                }
                "\n"
            }
        }
        "\n"
    };
    body.append_owned_text(&listing.into_string())?;
    body.append_owned_text("</article>\n")?;
    Ok(body)
}

pub fn publish_misc_pages(site: &SiteContent, tally: &mut PublishTally) -> Result<(), ComposeError> {
    for page in &site.misc_pages {
        let spec = PageSpec::new(page.filename.clone(), page.title.clone())
            .description(page.description.clone());
        let body = if page.is_home_page() {
            home_page_body(site, page)?
        } else {
            let mut body = FragmentTree::new();
            body.append_borrowed_buffer(&page.content)?;
            body
        };
        if let Some(parent) = Path::new(&page.filename).parent() {
            for kind in ThemeKind::ALL {
                let dir = site.theme(kind).output_dir.join(parent);
                fs::create_dir_all(&dir).map_err(|source| ComposeError::CreateDir { path: dir, source })?;
            }
        }
        publish_page(site, &spec, &body, tally)?;
    }
    Ok(())
}

// ============================================================================
// Series and sitemap
// ============================================================================

fn series_post_entry(post: &Post) -> Markup {
    html! {
        div {
            h3 { a href=(format!("/posts/{}", post.folder_name)) { (post.title) } }
            "\n"
            p { "\n" (post.long_description) }
        }
        "\n"
    }
}

pub fn publish_series(site: &SiteContent, tally: &mut PublishTally) -> Result<(), ComposeError> {
    for series in &site.series {
        for kind in ThemeKind::ALL {
            let dir = site.theme(kind).output_dir.join(series.url_path());
            fs::create_dir_all(&dir).map_err(|source| ComposeError::CreateDir { path: dir, source })?;
        }
        let spec = PageSpec::new(
            format!("{}/index.html", series.url_path()),
            format!("{} listing", series.title),
        )
        .description(format!("Landing page for {}", series.title));

        let mut body = FragmentTree::new();
        let heading = html! { header { h1 { (series.title) } } "\n" };
        body.append_owned_text(&heading.into_string())?;
        body.append_owned_text("<p>")?;
        body.append_borrowed_buffer(&series.landing_desc)?;
        body.append_owned_text("</p><br />\n<section>\n")?;
        let entries = html! {
            @for id in &series.posts {
                (series_post_entry(site.post(*id)))
            }
        };
        body.append_owned_text(&entries.into_string())?;
        body.append_owned_text("</section>\n")?;
        publish_page(site, &spec, &body, tally)?;
    }

    let listing = html! {
        header { h1 { "Post series" } }
        "\n"
        @for series in &site.series {
            section {
                "\n"
                h3 { a href=(format!("/{}", series.url_path())) { (series.title) } }
                "\n"
                p { (series.short_description) }
                "\n"
            }
            "\n"
        }
    };
    let mut body = FragmentTree::new();
    body.append_owned_text(&listing.into_string())?;
    let spec = PageSpec::new("series/index.html", "All series").description("List of all series");
    publish_page(site, &spec, &body, tally)
}

pub fn publish_sitemap(site: &SiteContent, tally: &mut PublishTally) -> Result<(), ComposeError> {
    let mut body = FragmentTree::new();
    body.append_owned_text("<header><h1>All posts</h1></header>\n")?;
    for series in &site.series {
        let heading = html! { header { h2 { (series.title) } } "\n" };
        body.append_owned_text(&heading.into_string())?;
        body.append_owned_text("<p>")?;
        body.append_borrowed_buffer(&series.landing_desc)?;
        body.append_owned_text("</p><br />\n<section>\n")?;
        let entries = html! {
            @for id in &series.posts {
                (series_post_entry(site.post(*id)))
            }
        };
        body.append_owned_text(&entries.into_string())?;
        body.append_owned_text("</section>\n")?;
    }
    let spec = PageSpec::new("sitemap.html", "Sitemap").description("Sitemap");
    publish_page(site, &spec, &body, tally)
}
