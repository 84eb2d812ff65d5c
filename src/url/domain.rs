use url::Url;

/// Extracts the network location (lowercase host plus any non-default port) from a URL
///
/// Two URLs on the same site compare equal under this function regardless of
/// host case, and an explicit default port (`:80` for http) disappears
/// because `Url` already drops it while parsing.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use motto_harvest::url::netloc;
///
/// let url = Url::parse("https://WWW.Example.com/path").unwrap();
/// assert_eq!(netloc(&url), Some("www.example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(netloc(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn netloc(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}
