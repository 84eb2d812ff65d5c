use crate::url::domain::netloc;
use url::Url;

/// Turns raw hrefs found on site pages into comparable absolute URLs
///
/// # Canonicalization Rules
///
/// 1. Empty and fragment-only hrefs produce nothing
/// 2. Pagination links (`list_<digits>_<digits>.html`) resolve against the
///    directory of the page they were found on
/// 3. Every other href resolves against `http://<domain>/`, so a missing
///    scheme becomes `http` and a missing host becomes the site domain
/// 4. Anything that is not http(s) after resolution (`javascript:`,
///    `mailto:`, ...) or lives on another host produces nothing
/// 5. Output is rebuilt as `scheme://host/path`; query and fragment are dropped
///
/// # Examples
///
/// ```
/// use motto_harvest::url::Canonicalizer;
///
/// let canon = Canonicalizer::new("www.geyanw.com").unwrap();
/// assert_eq!(
///     canon.canonicalize("/lizhi/123.html?from=nav", "https://www.geyanw.com/"),
///     Some("http://www.geyanw.com/lizhi/123.html".to_string())
/// );
/// assert_eq!(canon.canonicalize("javascript:void(0)", "https://www.geyanw.com/"), None);
/// ```
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    domain: String,
    site_root: Url,
}

impl Canonicalizer {
    /// Creates a canonicalizer scoped to one site
    ///
    /// `domain` is a network location: a host, optionally followed by `:port`.
    pub fn new(domain: &str) -> Result<Self, url::ParseError> {
        let site_root = Url::parse(&format!("http://{}/", domain))?;
        let domain = netloc(&site_root).ok_or(url::ParseError::EmptyHost)?;
        Ok(Self { domain, site_root })
    }

    /// The site domain links are scoped to
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Canonicalizes `href` found on the page at `current_url`
    ///
    /// Returns `None` when the link is out of scope or cannot be resolved.
    pub fn canonicalize(&self, href: &str, current_url: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        let resolved = if is_pagination_link(href) {
            Url::parse(current_url).ok()?.join(href).ok()?
        } else {
            self.site_root.join(href).ok()?
        };

        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            return None;
        }

        let host = netloc(&resolved)?;
        if host != self.domain {
            return None;
        }

        Some(format!("{}://{}{}", resolved.scheme(), host, resolved.path()))
    }
}

/// Returns true for bare pagination hrefs such as `list_2_13.html`
pub fn is_pagination_link(href: &str) -> bool {
    let Some(numbers) = href
        .strip_prefix("list_")
        .and_then(|rest| rest.strip_suffix(".html"))
    else {
        return false;
    };

    match numbers.split_once('_') {
        Some((category, page)) => is_digits(category) && is_digits(page),
        None => false,
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
