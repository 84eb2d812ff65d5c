//! Page classification and record extraction
//!
//! Detail pages are recognised by their content container. Their category
//! comes from the second breadcrumb link, their title from the heading inside
//! the title block, and each numbered paragraph (`一、...`) of the content
//! container becomes one record.

use crate::state::Record;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use thiserror::Error;

const CONTENT_SELECTOR: &str = r#"div[class="content"]"#;
const CATEGORY_SELECTOR: &str = r#"div[class="position"] a"#;
const TITLE_SELECTOR: &str = r#"div [class="title"] h2"#;
const PARAGRAPH_SELECTOR: &str = r#"div[class="content"] p"#;
const LINK_SELECTOR: &str = "body a[href]";

/// Full-width enumeration comma separating the numbering from the quote
const DELIMITER: char = '、';

/// Kind of page, decided by the presence of the content container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Listing,
    Detail,
}

/// What to do with a paragraph lacking the numbering delimiter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MalformedParagraphPolicy {
    /// Stop examining the page; records from earlier paragraphs are kept
    #[default]
    AbortPage,

    /// Skip only the offending paragraph
    SkipParagraph,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Detail page has no {field} (selector `{selector}`)")]
    MissingField {
        field: &'static str,
        selector: &'static str,
    },

    #[error("Paragraph has no '、' delimiter: {0:?}")]
    MalformedParagraph(String),

    #[error("Invalid selector `{0}`")]
    Selector(&'static str),
}

/// Records pulled from one detail page
#[derive(Debug, Default)]
pub struct Extraction {
    pub records: Vec<Record>,

    /// Paragraphs rejected as malformed, in document order
    pub rejected: Vec<ExtractError>,
}

impl Extraction {
    /// Returns true if extraction stopped early on a malformed paragraph
    pub fn aborted(&self, policy: MalformedParagraphPolicy) -> bool {
        policy == MalformedParagraphPolicy::AbortPage && !self.rejected.is_empty()
    }
}

/// Everything a worker needs from one page, detached from the parsed DOM
#[derive(Debug)]
pub struct PageAnalysis {
    pub kind: PageKind,

    /// Raw hrefs, in document order
    pub links: Vec<String>,

    /// `None` for listing pages
    pub extraction: Option<Result<Extraction, ExtractError>>,
}

/// Compiled selectors plus the malformed-paragraph policy
#[derive(Debug)]
pub struct Extractor {
    content: Selector,
    category: Selector,
    title: Selector,
    paragraph: Selector,
    link: Selector,
    policy: MalformedParagraphPolicy,
}

fn compile(css: &'static str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|_| ExtractError::Selector(css))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

impl Extractor {
    pub fn new(policy: MalformedParagraphPolicy) -> Result<Self, ExtractError> {
        Ok(Self {
            content: compile(CONTENT_SELECTOR)?,
            category: compile(CATEGORY_SELECTOR)?,
            title: compile(TITLE_SELECTOR)?,
            paragraph: compile(PARAGRAPH_SELECTOR)?,
            link: compile(LINK_SELECTOR)?,
            policy,
        })
    }

    pub fn policy(&self) -> MalformedParagraphPolicy {
        self.policy
    }

    /// Parses `html` once and runs classification, link and record extraction
    pub fn analyze(&self, html: &str) -> PageAnalysis {
        let document = Html::parse_document(html);
        let kind = self.classify(&document);
        let links = self.extract_links(&document);
        let extraction = match kind {
            PageKind::Detail => Some(self.extract_records(&document)),
            PageKind::Listing => None,
        };

        PageAnalysis {
            kind,
            links,
            extraction,
        }
    }

    /// Classifies a parsed page
    pub fn classify(&self, document: &Html) -> PageKind {
        if document.select(&self.content).next().is_some() {
            PageKind::Detail
        } else {
            PageKind::Listing
        }
    }

    /// Returns the raw `href` of every hyperlink in the page body, in document order
    ///
    /// Hrefs are not resolved or filtered here; that is the canonicalizer's job.
    pub fn extract_links(&self, document: &Html) -> Vec<String> {
        document
            .select(&self.link)
            .filter_map(|element| element.value().attr("href"))
            .map(str::to_string)
            .collect()
    }

    /// Extracts records from a detail page
    ///
    /// # Rules
    ///
    /// 1. Category is the text of the second breadcrumb link, title the text
    ///    of the heading in the title block. Either missing is an error.
    /// 2. Each content paragraph is trimmed; empty and `&nbsp;`-only
    ///    paragraphs are skipped.
    /// 3. A paragraph is split on `、` and the second segment becomes the
    ///    record body. A paragraph with no delimiter is handled per the policy.
    /// 4. The record id is the SHA-256 of the body.
    ///
    /// # Example
    ///
    /// ```
    /// use motto_harvest::crawler::{Extractor, MalformedParagraphPolicy};
    /// use scraper::Html;
    ///
    /// let html = r#"<div class="position"><a>首页</a><a>励志格言</a></div>
    ///     <div><div class="title"><h2>坚持</h2></div></div>
    ///     <div class="content"><p>一、前进</p></div>"#;
    /// let extractor = Extractor::new(MalformedParagraphPolicy::AbortPage).unwrap();
    /// let extraction = extractor.extract_records(&Html::parse_document(html)).unwrap();
    /// assert_eq!(extraction.records[0].body, "前进");
    /// ```
    pub fn extract_records(&self, document: &Html) -> Result<Extraction, ExtractError> {
        let kind = document
            .select(&self.category)
            .nth(1)
            .map(|element| element_text(element).trim().to_string())
            .ok_or(ExtractError::MissingField {
                field: "category",
                selector: CATEGORY_SELECTOR,
            })?;

        let title = document
            .select(&self.title)
            .next()
            .map(|element| element_text(element).trim().to_string())
            .ok_or(ExtractError::MissingField {
                field: "title",
                selector: TITLE_SELECTOR,
            })?;

        let mut extraction = Extraction::default();

        for paragraph in document.select(&self.paragraph) {
            let text = element_text(paragraph);
            let text = text.trim();
            if text.is_empty() || text == "\u{a0}" {
                continue;
            }

            match text.split(DELIMITER).nth(1) {
                Some(body) => {
                    extraction
                        .records
                        .push(Record::new(kind.as_str(), title.as_str(), body.trim()));
                }
                None => {
                    extraction
                        .rejected
                        .push(ExtractError::MalformedParagraph(text.to_string()));
                    if self.policy == MalformedParagraphPolicy::AbortPage {
                        break;
                    }
                }
            }
        }

        Ok(extraction)
    }
}
