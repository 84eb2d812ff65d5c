//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent
//! - GET requests with retry on transient transport failures
//! - Decoding response bodies against an ordered list of charsets
//! - Error classification

use crate::config::CrawlerConfig;
use crate::crawler::retry::{RetryPolicy, Transient};
use encoding_rs::{Encoding, GBK, UTF_8};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Character encodings a page body may be decoded with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Charset {
    /// EUC-CN; only accepts bytes inside the GB2312 code ranges
    Gb2312,
    Utf8,
    Gbk,
}

impl Charset {
    /// Looks up a charset by label, ignoring case, `-` and `_`
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "gb2312" | "euccn" => Some(Self::Gb2312),
            "utf8" => Some(Self::Utf8),
            "gbk" | "cp936" => Some(Self::Gbk),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Gb2312 => "GB2312",
            Self::Utf8 => "UTF-8",
            Self::Gbk => "GBK",
        }
    }

    /// Decodes `bytes` strictly; returns `None` on any malformed sequence
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Self::Gb2312 if !is_euc_cn(bytes) => None,
            Self::Gb2312 | Self::Gbk => decode_strict(GBK, bytes),
            Self::Utf8 => decode_strict(UTF_8, bytes),
        }
    }
}

impl TryFrom<String> for Charset {
    type Error = String;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        Self::from_label(&label).ok_or_else(|| format!("unsupported charset '{}'", label))
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}

/// Returns true if `bytes` is ASCII mixed with EUC-CN double-byte characters
fn is_euc_cn(bytes: &[u8]) -> bool {
    let mut i = 0;
    while i < bytes.len() {
        let lead = bytes[i];
        if lead < 0x80 {
            i += 1;
            continue;
        }
        match bytes.get(i + 1) {
            Some(&trail) if (0xA1..=0xF7).contains(&lead) && (0xA1..=0xFE).contains(&trail) => {
                i += 2;
            }
            _ => return false,
        }
    }
    true
}

/// Decodes a page body with the first charset that accepts it
pub fn decode_page(bytes: &[u8], charsets: &[Charset]) -> Option<(String, Charset)> {
    charsets.iter().find_map(|charset| {
        let decoded = charset.decode(bytes);
        if decoded.is_none() {
            tracing::trace!("Body is not valid {}", charset);
        }
        decoded.map(|text| (text, *charset))
    })
}

/// Errors produced while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection refused/reset, timeout, or a malformed HTTP exchange
    #[error("Network error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with something other than 200
    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    /// No candidate charset could decode the body
    #[error("No candidate charset could decode {url}")]
    Decode { url: String },
}

impl Transient for FetchError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Network { source, .. } => !source.is_builder(),
            Self::Http { .. } | Self::Decode { .. } => false,
        }
    }
}

/// A fetched and decoded page
#[derive(Debug, Clone)]
pub struct Page {
    /// The URL that was requested
    pub url: String,

    /// Decoded markup
    pub html: String,

    /// Charset that decoded the body
    pub charset: Charset,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty()
    }
}

/// Builds an HTTP client sending `user_agent` with every request
///
/// # Example
///
/// ```no_run
/// use motto_harvest::crawler::build_http_client;
///
/// let client = build_http_client("Mozilla/5.0 (compatible; MottoHarvest/1.0)").unwrap();
/// ```
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages and decodes them
pub struct Fetcher {
    client: Client,
    charsets: Vec<Charset>,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new(client: Client, charsets: Vec<Charset>, retry: RetryPolicy) -> Self {
        Self {
            client,
            charsets,
            retry,
        }
    }

    /// Builds a fetcher from crawler settings and a network retry policy
    pub fn from_config(config: &CrawlerConfig, retry: RetryPolicy) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.user_agent)?;
        Ok(Self::new(client, config.charsets.clone(), retry))
    }

    /// Fetches `url`, retrying transient network failures
    ///
    /// # Failure Handling
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Connection refused/reset, timeout | Retry up to the policy bound |
    /// | Status other than 200 | Immediate `FetchError::Http` |
    /// | No charset decodes the body | Immediate `FetchError::Decode` |
    pub async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
        self.retry.run("fetch", move || self.fetch_once(url)).await
    }

    /// Performs a single GET without retrying
    pub async fn fetch_once(&self, url: &str) -> Result<Page, FetchError> {
        let network = |source| FetchError::Network {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(network)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(network)?;

        let (html, charset) = decode_page(&bytes, &self.charsets).ok_or_else(|| {
            FetchError::Decode {
                url: url.to_string(),
            }
        })?;

        tracing::debug!("Fetched {} ({} bytes, {})", url, bytes.len(), charset);

        Ok(Page {
            url: url.to_string(),
            html,
            charset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_ORDER: [Charset; 3] = [Charset::Gb2312, Charset::Utf8, Charset::Gbk];

    fn gbk_bytes(text: &str) -> Vec<u8> {
        let (bytes, _, had_errors) = GBK.encode(text);
        assert!(!had_errors);
        bytes.into_owned()
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client("TestCrawler/1.0").is_ok());
    }

    #[test]
    fn test_from_label() {
        assert_eq!(Charset::from_label("GB2312"), Some(Charset::Gb2312));
        assert_eq!(Charset::from_label("gb_2312"), Some(Charset::Gb2312));
        assert_eq!(Charset::from_label("UTF-8"), Some(Charset::Utf8));
        assert_eq!(Charset::from_label("utf8"), Some(Charset::Utf8));
        assert_eq!(Charset::from_label("GBK"), Some(Charset::Gbk));
        assert_eq!(Charset::from_label("latin1"), None);
    }

    #[test]
    fn test_ascii_decodes_with_first_charset() {
        let (text, charset) = decode_page(b"<html>hi</html>", &DEFAULT_ORDER).unwrap();
        assert_eq!(text, "<html>hi</html>");
        assert_eq!(charset, Charset::Gb2312);
    }

    #[test]
    fn test_gb2312_page() {
        let bytes = gbk_bytes("<p>一、前进</p>");
        let (text, charset) = decode_page(&bytes, &DEFAULT_ORDER).unwrap();
        assert_eq!(text, "<p>一、前进</p>");
        assert_eq!(charset, Charset::Gb2312);
    }

    #[test]
    fn test_utf8_page_is_not_mistaken_for_gb2312() {
        let html = "<p>一、前进</p>";
        let (text, charset) = decode_page(html.as_bytes(), &DEFAULT_ORDER).unwrap();
        assert_eq!(text, html);
        assert_eq!(charset, Charset::Utf8);
    }

    #[test]
    fn test_gbk_only_character_falls_through_to_gbk() {
        // 亍 (0x81 0x41 in GBK) lies outside the GB2312 ranges
        let bytes = gbk_bytes("亍");
        assert!(Charset::Gb2312.decode(&bytes).is_none());
        let (text, charset) = decode_page(&bytes, &DEFAULT_ORDER).unwrap();
        assert_eq!(text, "亍");
        assert_eq!(charset, Charset::Gbk);
    }

    #[test]
    fn test_undecodable_body() {
        assert!(decode_page(&[0xFF, 0xFF, 0xFF], &DEFAULT_ORDER).is_none());
    }

    #[test]
    fn test_charset_order_is_respected() {
        let (_, charset) = decode_page(b"plain", &[Charset::Utf8, Charset::Gb2312]).unwrap();
        assert_eq!(charset, Charset::Utf8);
    }

    #[test]
    fn test_is_euc_cn() {
        assert!(is_euc_cn(b"ascii only"));
        assert!(is_euc_cn(&[0xD2, 0xBB]));
        assert!(!is_euc_cn(&[0xD2]));
        assert!(!is_euc_cn(&[0x81, 0x41]));
    }

    #[test]
    fn test_error_classification() {
        let http = FetchError::Http {
            url: "http://a/".to_string(),
            status: 404,
        };
        let decode = FetchError::Decode {
            url: "http://a/".to_string(),
        };
        assert!(!http.is_transient());
        assert!(!decode.is_transient());
    }

    #[test]
    fn test_page_is_empty() {
        let page = Page {
            url: "http://a/".to_string(),
            html: "  \n".to_string(),
            charset: Charset::Utf8,
        };
        assert!(page.is_empty());
    }
}
