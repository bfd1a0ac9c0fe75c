//! Chapter content and the fetch seam the preloader depends on

use crate::error::Result;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// One chapter as served by the reader backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterContent {
    /// Chapter title
    pub title: String,

    /// Chapter body text
    pub content: String,

    /// Link to the following chapter, if the server provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_url: Option<String>,

    /// Link to the preceding chapter, if the server provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_url: Option<String>,
}

impl ChapterContent {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            next_url: None,
            prev_url: None,
        }
    }
}

/// Source of chapter content
///
/// Implementations perform no retries and enforce no deadline of their own;
/// the preload manager layers both on top of speculative fetches.
pub trait ContentFetcher: Send + Sync {
    /// Fetch chapter `chapter_index` of the book identified by `book_id`
    fn fetch_chapter<'a>(
        &'a self,
        book_id: &'a str,
        chapter_index: usize,
    ) -> BoxFuture<'a, Result<ChapterContent>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_content_wire_format() {
        let json = r#"{"title":"Chapter 1","content":"It was a dark night.","nextUrl":"/c/2"}"#;
        let chapter: ChapterContent = serde_json::from_str(json).unwrap();

        assert_eq!(chapter.title, "Chapter 1");
        assert_eq!(chapter.next_url.as_deref(), Some("/c/2"));
        assert!(chapter.prev_url.is_none());

        let encoded = serde_json::to_string(&ChapterContent::new("t", "c")).unwrap();
        assert!(!encoded.contains("nextUrl"));
    }
}
