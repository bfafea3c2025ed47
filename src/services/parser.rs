// src/services/parser.rs

//! Page parser for year listings and paper detail pages.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{
    NO_ABSTRACT, NO_AUTHORS, PaperDetail, PaperLink, SiteSchema, sanitize_title,
};
use crate::utils::{normalize_whitespace, resolve_url};

const PAPER_LIST: &str = "ul.paper-list";
const TITLE: &str = "title";
const HEADING: &str = "h4";

/// Extracts structured data from proceedings pages of one markup variant.
#[derive(Debug, Clone)]
pub struct PageParser {
    base: Url,
    paper_list: Selector,
    listing: Selector,
    title: Selector,
    pdf: Selector,
    heading: Selector,
    italic: Selector,
}

impl PageParser {
    /// Build a parser for `schema`, resolving links against `base_url`.
    pub fn new(schema: SiteSchema, base_url: &str) -> Result<Self> {
        Ok(Self {
            base: Url::parse(base_url)?,
            paper_list: Self::parse_selector(PAPER_LIST)?,
            listing: Self::parse_selector(schema.listing_selector())?,
            title: Self::parse_selector(TITLE)?,
            pdf: Self::parse_selector(schema.pdf_selector())?,
            heading: Self::parse_selector(HEADING)?,
            italic: Self::parse_selector("i")?,
        })
    }

    /// Extract paper links from a year listing page.
    ///
    /// Returns `None` when the page has no paper list at all, and an empty
    /// vector when the list exists but nothing matches this variant.
    pub fn parse_listing(&self, html: &str) -> Option<Vec<PaperLink>> {
        let document = Html::parse_document(html);
        if document.select(&self.paper_list).next().is_none() {
            return None;
        }

        let links = document
            .select(&self.listing)
            .filter_map(|anchor| {
                let href = anchor.value().attr("href")?;
                let title = element_text(&anchor);
                if title.is_empty() {
                    return None;
                }
                Some(PaperLink {
                    title,
                    url: resolve_url(&self.base, href),
                })
            })
            .collect();
        Some(links)
    }

    /// Extract title, authors, abstract and PDF link from a detail page.
    ///
    /// Returns `None` when the page has no usable `<title>`. Missing authors
    /// or abstract fall back to sentinels, a missing PDF link to `None`.
    pub fn parse_detail(&self, html: &str) -> Option<PaperDetail> {
        let document = Html::parse_document(html);

        let title = document
            .select(&self.title)
            .next()
            .map(|t| sanitize_title(&element_text(&t)))
            .filter(|t| !t.is_empty())?;

        let pdf_url = document
            .select(&self.pdf)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| resolve_url(&self.base, href));

        let authors = self
            .section_after(&document, "Authors")
            .map(|p| {
                p.select(&self.italic)
                    .next()
                    .map(|i| element_text(&i))
                    .unwrap_or_else(|| element_text(&p))
            })
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| NO_AUTHORS.to_string());

        let abstract_text = self
            .section_after(&document, "Abstract")
            .map(|p| element_text(&p))
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| NO_ABSTRACT.to_string());

        Some(PaperDetail {
            title,
            authors,
            abstract_text,
            pdf_url,
        })
    }

    /// First `<p>` directly following an `<h4>` whose text contains `label`.
    fn section_after<'a>(&self, document: &'a Html, label: &str) -> Option<ElementRef<'a>> {
        document
            .select(&self.heading)
            .filter(|h| h.text().any(|t| t.contains(label)))
            .find_map(|h| {
                h.next_siblings()
                    .find_map(ElementRef::wrap)
                    .filter(|sibling| sibling.value().name() == "p")
            })
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

fn element_text(element: &ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}
