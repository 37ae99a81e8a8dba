//! Generic listing extraction over a rendered DOM.
//!
//! Each field is described by an ordered list of [`Strategy`] values. For
//! every container element, the strategies are tried in order and the first
//! one that matches a descendant supplies the field.

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use super::types::ExtractedItem;

/// Container selector used when the job supplies none.
pub const DEFAULT_CONTAINER_SELECTOR: &str = ".card, .movie-card, .item";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid container selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// One way of locating a field inside a container element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Element with this tag name.
    Tag(&'static str),
    /// Element carrying exactly this class token.
    Class(&'static str),
    /// Element whose class attribute contains this substring (case-sensitive).
    ClassContains(&'static str),
    /// Anchor with an `href` attribute.
    LinkHref,
    /// Image element.
    Image,
}

impl Strategy {
    pub fn matches(&self, element: &ElementRef<'_>) -> bool {
        let el = element.value();
        match *self {
            Strategy::Tag(name) => el.name() == name,
            Strategy::Class(class) => el.classes().any(|c| c == class),
            Strategy::ClassContains(fragment) => {
                el.attr("class").is_some_and(|c| c.contains(fragment))
            }
            Strategy::LinkHref => el.name() == "a" && el.attr("href").is_some(),
            Strategy::Image => el.name() == "img",
        }
    }

    /// First descendant of `container` (in document order) this strategy matches.
    pub fn find<'a>(&self, container: &ElementRef<'a>) -> Option<ElementRef<'a>> {
        container
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .find(|el| self.matches(el))
    }
}

pub const TITLE: &[Strategy] = &[
    Strategy::Tag("h2"),
    Strategy::Tag("h3"),
    Strategy::Class("title"),
    Strategy::ClassContains("title"),
    Strategy::ClassContains("Title"),
];

pub const LINK: &[Strategy] = &[Strategy::LinkHref];

pub const POSTER: &[Strategy] = &[Strategy::Image];

pub const DESCRIPTION: &[Strategy] = &[
    Strategy::Tag("p"),
    Strategy::Class("description"),
    Strategy::ClassContains("description"),
    Strategy::ClassContains("Description"),
];

// French sites say "note" where English ones say "rating"
pub const RATING: &[Strategy] = &[
    Strategy::Class("rating"),
    Strategy::Class("note"),
    Strategy::ClassContains("rating"),
    Strategy::ClassContains("Rating"),
    Strategy::ClassContains("note"),
    Strategy::ClassContains("Note"),
];

pub const YEAR: &[Strategy] = &[
    Strategy::Class("year"),
    Strategy::Class("date"),
    Strategy::ClassContains("year"),
    Strategy::ClassContains("Year"),
    Strategy::ClassContains("date"),
    Strategy::ClassContains("Date"),
];

/// First element matched by any strategy, trying strategies in order.
pub fn first_match<'a>(container: &ElementRef<'a>, strategies: &[Strategy]) -> Option<ElementRef<'a>> {
    strategies.iter().find_map(|s| s.find(container))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn field_text(container: &ElementRef<'_>, strategies: &[Strategy]) -> String {
    first_match(container, strategies)
        .map(text_of)
        .unwrap_or_default()
}

/// Resolve `raw` against `base`. An empty value resolves to the base itself,
/// as a browser's `href` property does. Unresolvable values are returned
/// trimmed but otherwise untouched.
pub fn resolve_url(base: Option<&Url>, raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() && base.is_none() {
        return String::new();
    }
    let resolved = match base {
        Some(base) => base.join(raw),
        None => Url::parse(raw),
    };
    resolved.map(String::from).unwrap_or_else(|_| raw.to_string())
}

fn link_of(container: &ElementRef<'_>, base: Option<&Url>) -> String {
    first_match(container, LINK)
        .and_then(|a| a.value().attr("href"))
        .map(|href| resolve_url(base, href))
        .unwrap_or_default()
}

/// `src` of the first image, or its `data-src` when `src` is empty.
fn poster_of(container: &ElementRef<'_>, base: Option<&Url>) -> String {
    let Some(img) = first_match(container, POSTER) else {
        return String::new();
    };
    let el = img.value();
    let src = el.attr("src").map(str::trim).unwrap_or_default();
    let raw = if src.is_empty() {
        el.attr("data-src").unwrap_or_default()
    } else {
        src
    };
    if raw.trim().is_empty() {
        return String::new();
    }
    resolve_url(base, raw)
}

/// Base URL for relative links: the document's `<base href>` resolved
/// against the page URL, else the page URL.
pub fn document_base(document: &Html, page_url: &str) -> Option<Url> {
    let page = Url::parse(page_url).ok();
    let base_href = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "base" && el.value().attr("href").is_some())
        .and_then(|el| el.value().attr("href"));

    match (base_href, page) {
        (Some(href), Some(page)) => page.join(href).ok().or(Some(page)),
        (Some(href), None) => Url::parse(href).ok(),
        (None, page) => page,
    }
}

/// Build an item from one container element.
pub fn extract_item(container: &ElementRef<'_>, base: Option<&Url>) -> ExtractedItem {
    ExtractedItem {
        id: Uuid::new_v4().to_string(),
        title: field_text(container, TITLE),
        link: link_of(container, base),
        poster_url: poster_of(container, base),
        description: field_text(container, DESCRIPTION),
        rating: field_text(container, RATING),
        year: field_text(container, YEAR),
    }
}

/// Extract one item per element matched by `container_selector` (or the
/// default selector when absent or blank), in document order.
pub fn extract(
    document: &Html,
    base: Option<&Url>,
    container_selector: Option<&str>,
) -> Result<Vec<ExtractedItem>, ExtractError> {
    let selector_text = container_selector
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            tracing::debug!(
                "No container selector given, using default {}",
                DEFAULT_CONTAINER_SELECTOR
            );
            DEFAULT_CONTAINER_SELECTOR
        });

    let selector = Selector::parse(selector_text).map_err(|e| ExtractError::InvalidSelector {
        selector: selector_text.to_string(),
        reason: e.to_string(),
    })?;

    Ok(document
        .select(&selector)
        .map(|container| extract_item(&container, base))
        .collect())
}

/// Parse rendered HTML from `page_url` and extract its items.
pub fn extract_from_html(
    html: &str,
    page_url: &str,
    container_selector: Option<&str>,
) -> Result<Vec<ExtractedItem>, ExtractError> {
    let document = Html::parse_document(html);
    let base = document_base(&document, page_url);
    extract(&document, base.as_ref(), container_selector)
}
