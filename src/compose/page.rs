use super::{ComposeError, PublishTally};
use crate::buffer::{BufferError, GrowableBuffer};
use crate::content::{SiteContent, ThemeKind};
use crate::fragments::FragmentTree;
use crate::writer::write_if_different;
use maud::{Markup, html};

/// Per-page settings for the page shell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSpec {
    /// Output path relative to the theme root, e.g. `posts/intro.html`.
    pub filename: String,
    pub title: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub keywords: Option<String>,
    pub has_code: bool,
    pub is_post: bool,
}

impl PageSpec {
    pub fn new(filename: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Strip the extension of the last path component: `tags/rust.html` → `tags/rust`.
pub fn url_path_for(filename: &str) -> Result<String, BufferError> {
    let mut path = GrowableBuffer::from_text(filename)?;
    let name_start = filename.rfind('/').map_or(0, |i| i + 1);
    if let Some(dot) = filename[name_start..].rfind('.') {
        path.truncate_suffix(&filename[name_start + dot..]);
    }
    path.as_str().map(str::to_string)
}

fn head_markup(spec: &PageSpec, canonical: &str) -> Markup {
    html! {
        @if let Some(author) = &spec.author {
            meta name="author" content=(author);
            "\n"
        }
        @if let Some(keywords) = &spec.keywords {
            meta name="keywords" content=(keywords);
            "\n"
        }
        @if let Some(description) = &spec.description {
            meta name="description" content=(description);
            "\n"
        }
        title { (spec.title) }
        "\n"
        link rel="canonical" href=(canonical);
        "\n"
    }
}

fn nav_markup(site_name: &str, alt_href: &str, alt_name: &str) -> Markup {
    html! {
        header.nheader {
            "\n"
            a.leftfloat href="/" { (site_name) }
            " "
            a.rightfloat href=(alt_href) { "[" (alt_name) "]" }
            "\n"
        }
        "\n"
    }
}

/// Wrap `main` in the full page shell for one theme.
///
/// The theme CSS, components and `main` are borrowed, not copied.
pub fn render_page<'a>(
    site: &'a SiteContent,
    kind: ThemeKind,
    spec: &PageSpec,
    url_path: &str,
    main: &'a FragmentTree<'a>,
) -> Result<FragmentTree<'a>, BufferError> {
    let theme = site.theme(kind);
    let alt = site.alt_theme(kind);
    let canonical = format!("https://{}/{url_path}", site.bright.host);
    let alt_href = format!("https://{}/{url_path}", alt.host);

    let mut page = FragmentTree::new();
    page.append_borrowed_buffer(&site.components.header)?;
    page.append_owned_text(&head_markup(spec, &canonical).into_string())?;
    page.append_owned_text("</head><style>")?;
    page.append_borrowed_buffer(&theme.main_css)?;
    if spec.has_code {
        page.append_borrowed_buffer(&theme.syntax_css)?;
    }
    page.append_owned_text("</style><body>")?;
    page.append_owned_text(&nav_markup(&site.bright.host, &alt_href, &alt.name).into_string())?;
    page.append_borrowed_subtree(main)?;
    page.append_borrowed_buffer(&site.components.footer)?;
    page.append_owned_text("</body>")?;
    page.append_borrowed_buffer(&site.components.trailer)?;
    Ok(page)
}

/// Write `body` as a bright and a dark page, each only if it changed.
pub fn publish_page(
    site: &SiteContent,
    spec: &PageSpec,
    body: &FragmentTree<'_>,
    tally: &mut PublishTally,
) -> Result<(), ComposeError> {
    let url_path = url_path_for(&spec.filename)?;
    let mut main = FragmentTree::new();
    main.append_owned_text(if spec.is_post {
        "<main class='post'>\n"
    } else {
        "<main>\n"
    })?;
    main.append_borrowed_subtree(body)?;
    main.append_owned_text("</main>\n")?;

    for kind in ThemeKind::ALL {
        let page = render_page(site, kind, spec, &url_path, &main)?;
        let path = site.theme(kind).output_dir.join(&spec.filename);
        let outcome = write_if_different(&page, &path)?;
        tally.record(kind, &spec.filename, outcome);
    }
    Ok(())
}
