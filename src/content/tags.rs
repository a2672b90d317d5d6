use super::PostId;
use super::post::Post;
use tracing::warn;

/// Whether `tag` can name its own page, `tags/<tag>.html`.
///
/// Separators and dot segments would leave `tags/`, and `index` is the
/// listing of all tags.
pub fn is_page_name(tag: &str) -> bool {
    !tag.is_empty()
        && !tag.contains(['/', '\\'])
        && tag != "."
        && tag != ".."
        && tag != "index"
}

/// One tag and the publishable posts carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPosts {
    pub tag: String,
    pub posts: Vec<PostId>,
}

/// Build the tag index from publishable posts.
///
/// Tags appear in order of first use across `posts`; each tag's posts keep
/// post order. Empty tags are ignored, tags that cannot name a page are
/// skipped with a warning, and a post listing a tag twice is indexed once.
pub fn build_tag_index(posts: &[Post]) -> Vec<TagPosts> {
    let mut index: Vec<TagPosts> = Vec::new();
    for (i, post) in posts.iter().enumerate() {
        if !post.can_publish {
            continue;
        }
        let id = PostId(i);
        for tag in post.tags.iter().filter(|tag| !tag.is_empty()) {
            if !is_page_name(tag) {
                warn!(post = %post.folder_name, tag, "tag cannot be used as a page name, skipped");
                continue;
            }
            match index.iter_mut().find(|entry| entry.tag == tag) {
                Some(entry) => {
                    if entry.posts.last() != Some(&id) {
                        entry.posts.push(id);
                    }
                }
                None => index.push(TagPosts {
                    tag: tag.to_string(),
                    posts: vec![id],
                }),
            }
        }
    }
    index
}
