//! Markup variants of the proceedings site.

use std::fmt;

/// Last year published with the legacy markup.
const LEGACY_LAST_YEAR: i32 = 2021;

/// Markup variant the proceedings site uses for a given year.
///
/// The site switched its page layout after 2021. Each variant owns the
/// selectors that differ between layouts, so supporting a future layout
/// means adding a variant rather than touching the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteSchema {
    /// Layout used up to and including 2021
    Legacy,
    /// Layout used from 2022 on
    Conference,
}

impl SiteSchema {
    /// Resolve the variant for a conference year.
    pub fn for_year(year: i32) -> Self {
        if year <= LEGACY_LAST_YEAR {
            Self::Legacy
        } else {
            Self::Conference
        }
    }

    /// Selector for paper anchors on a year listing page.
    pub fn listing_selector(self) -> &'static str {
        match self {
            Self::Legacy => r#"ul.paper-list li a[href$="-Abstract.html"]"#,
            Self::Conference => r#"ul.paper-list li a[href$="-Abstract-Conference.html"]"#,
        }
    }

    /// Selector for the PDF button on a paper detail page.
    pub fn pdf_selector(self) -> &'static str {
        match self {
            Self::Legacy => r#"a.btn.btn-light.btn-spacer[href$="Paper.pdf"]"#,
            Self::Conference => r#"a.btn.btn-primary.btn-spacer[href$="Paper-Conference.pdf"]"#,
        }
    }
}

impl fmt::Display for SiteSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Conference => write!(f, "conference"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_boundary() {
        assert_eq!(SiteSchema::for_year(2017), SiteSchema::Legacy);
        assert_eq!(SiteSchema::for_year(2021), SiteSchema::Legacy);
        assert_eq!(SiteSchema::for_year(2022), SiteSchema::Conference);
        assert_eq!(SiteSchema::for_year(2025), SiteSchema::Conference);
    }

    #[test]
    fn test_selectors_parse() {
        for schema in [SiteSchema::Legacy, SiteSchema::Conference] {
            assert!(scraper::Selector::parse(schema.listing_selector()).is_ok());
            assert!(scraper::Selector::parse(schema.pdf_selector()).is_ok());
        }
    }
}
