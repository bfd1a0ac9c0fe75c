//! HTTP client for the reader server
//!
//! Endpoints answer either with a bare JSON payload or with an envelope
//! `{ "isSuccess": bool, "errorMsg": string, "data": ... }`; both shapes are
//! accepted.

use crate::error::{PreloadError, Result};
use crate::fetcher::{ChapterContent, ContentFetcher};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const USER_AGENT: &str = concat!("readmate/", env!("CARGO_PKG_VERSION"));

/// Characters of an undecodable body kept in the error message
const BODY_PREVIEW_CHARS: usize = 200;

/// A book on the server's bookshelf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub name: String,
    pub author: String,
    /// Identifier used by every other endpoint
    pub book_url: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    /// Chapter the reader last stopped at
    #[serde(default)]
    pub dur_chapter_index: Option<usize>,
    #[serde(default)]
    pub total_chapter_num: Option<usize>,
    #[serde(default)]
    pub latest_chapter_title: Option<String>,
}

/// One entry of a book's table of contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub title: String,
    pub url: String,
    pub index: usize,
}

/// Client for the reader server's book API
#[derive(Debug, Clone)]
pub struct ReaderApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ReaderApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Use a preconfigured `reqwest::Client` (proxies, timeouts, TLS)
    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let mut base_url = base_url.into();
        if base_url.ends_with('/') {
            base_url.pop();
        }

        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Books on the bookshelf
    pub async fn get_bookshelf(&self) -> Result<Vec<Book>> {
        let books = self.request("/getBookshelf", &[]).await?;
        Ok(books.unwrap_or_default())
    }

    /// Table of contents of a book
    pub async fn get_chapter_list(&self, book_url: &str) -> Result<Vec<Chapter>> {
        let chapters = self
            .request("/getChapterList", &[("url", book_url.to_string())])
            .await?;
        Ok(chapters.unwrap_or_default())
    }

    /// Text of one chapter
    pub async fn get_book_content(
        &self,
        book_url: &str,
        chapter_index: usize,
    ) -> Result<ChapterContent> {
        let query = [
            ("url", book_url.to_string()),
            ("index", chapter_index.to_string()),
        ];

        self.request("/getBookContent", &query)
            .await?
            .ok_or_else(|| {
                PreloadError::ApiError(format!(
                    "no content for chapter {} of {}",
                    chapter_index, book_url
                ))
            })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);

        let response = self
            .http
            .get(&url)
            .query(query)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("{} answered {} ({} bytes)", path, status, body.len());

        decode_envelope(&body)
    }
}

impl ContentFetcher for ReaderApiClient {
    fn fetch_chapter<'a>(
        &'a self,
        book_id: &'a str,
        chapter_index: usize,
    ) -> BoxFuture<'a, Result<ChapterContent>> {
        Box::pin(self.get_book_content(book_id, chapter_index))
    }
}

/// Decode a response body, unwrapping the `isSuccess` envelope when present
///
/// Returns `None` when the payload is `null` or missing.
pub fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<Option<T>> {
    let value: Value = serde_json::from_str(body).map_err(|_| {
        let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
        PreloadError::SerializationError(format!("failed to parse response: {}...", preview))
    })?;

    let payload = match value {
        Value::Object(mut map) if map.contains_key("isSuccess") => {
            let success = map.get("isSuccess").and_then(Value::as_bool).unwrap_or(false);
            if !success {
                let message = map
                    .get("errorMsg")
                    .and_then(Value::as_str)
                    .filter(|msg| !msg.is_empty())
                    .unwrap_or("request failed")
                    .to_string();
                return Err(PreloadError::ApiError(message));
            }
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };

    if payload.is_null() {
        return Ok(None);
    }

    serde_json::from_value(payload)
        .map(Some)
        .map_err(|e| PreloadError::SerializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_stripped() {
        let client = ReaderApiClient::new("http://localhost:1122/reader3/");
        assert_eq!(client.base_url(), "http://localhost:1122/reader3");

        let client = ReaderApiClient::new("http://localhost:1122/reader3");
        assert_eq!(client.base_url(), "http://localhost:1122/reader3");
    }

    #[test]
    fn test_decode_successful_envelope() {
        let body = r#"{"isSuccess":true,"errorMsg":"","data":[{"title":"One","url":"/c/1","index":0}]}"#;
        let chapters: Option<Vec<Chapter>> = decode_envelope(body).unwrap();

        let chapters = chapters.unwrap();
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "One");
    }

    #[test]
    fn test_decode_failed_envelope() {
        let body = r#"{"isSuccess":false,"errorMsg":"book not found","data":null}"#;
        let err = decode_envelope::<Vec<Chapter>>(body).unwrap_err();
        assert!(matches!(err, PreloadError::ApiError(ref msg) if msg == "book not found"));

        let body = r#"{"isSuccess":false}"#;
        let err = decode_envelope::<Vec<Chapter>>(body).unwrap_err();
        assert!(matches!(err, PreloadError::ApiError(ref msg) if msg == "request failed"));
    }

    #[test]
    fn test_decode_bare_payload_and_null() {
        let body = r#"{"title":"T","content":"C"}"#;
        let content: Option<ChapterContent> = decode_envelope(body).unwrap();
        assert_eq!(content, Some(ChapterContent::new("T", "C")));

        let body = r#"{"isSuccess":true,"data":null}"#;
        assert!(decode_envelope::<Vec<Book>>(body).unwrap().is_none());
        assert!(decode_envelope::<Vec<Book>>("null").unwrap().is_none());
    }

    #[test]
    fn test_decode_malformed_body_truncated() {
        let body = format!("<html>{}</html>", "x".repeat(500));
        let err = decode_envelope::<Vec<Book>>(&body).unwrap_err();

        match err {
            PreloadError::SerializationError(msg) => {
                assert!(msg.starts_with("failed to parse response: <html>"));
                assert!(msg.len() < 260);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_book_optional_fields() {
        let json = r#"{"name":"N","author":"A","bookUrl":"u","durChapterIndex":3}"#;
        let book: Book = serde_json::from_str(json).unwrap();
        assert_eq!(book.dur_chapter_index, Some(3));
        assert!(book.cover_url.is_none());
        assert!(book.total_chapter_num.is_none());
    }
}
