//! Static HTML → [`Article`] extraction.
//!
//! Extraction is a pure function of the document and its URL, so the same
//! page always yields the same article.
//!
//! - Title: `og:title`, then `<title>`, then the first `<h1>`.
//! - Body: the first known article container with text, else `<body>`.
//!   Text keeps block-level line breaks and drops navigation chrome.
//! - Images: `og:image`, `twitter:image`, JSON-LD `image`, then `<img>`
//!   inside the body container. Relative URLs are resolved, decorative
//!   assets and small images skipped, duplicates removed.

use std::collections::HashSet;
use std::sync::LazyLock;

use pressethics_core::Article;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

/// Article containers, most specific first. Covers Naver news and the
/// common Korean CMS layouts before the generic HTML5 elements.
const BODY_CONTAINERS: &[&str] = &[
    "#dic_area",
    "#newsct_article",
    "[itemprop='articleBody']",
    "#articleBodyContents",
    "#article-view-content-div",
    "#articleBody",
    "#article_body",
    ".article_body",
    ".article-body",
    "#news_body_area",
    "article",
    "main",
];

const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "figcaption", "button",
    "form", "iframe", "svg",
];

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6",
    "blockquote", "table", "tr", "figure", "pre",
];

/// Substrings in an image URL that mark site chrome rather than content.
const DECORATIVE_MARKERS: &[&str] = &["logo", "icon", "avatar", "profile", "banner", "sprite"];

const MIN_IMAGE_SIDE: u32 = 200;

struct Selectors {
    og_title: Selector,
    title: Selector,
    h1: Selector,
    og_image: Selector,
    twitter_image: Selector,
    json_ld: Selector,
    img: Selector,
    body: Selector,
    containers: Vec<Selector>,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| {
    let parse = |s: &str| Selector::parse(s).expect("static selector parses");
    Selectors {
        og_title: parse("meta[property='og:title']"),
        title: parse("title"),
        h1: parse("h1"),
        og_image: parse("meta[property='og:image']"),
        twitter_image: parse("meta[name='twitter:image'], meta[property='twitter:image']"),
        json_ld: parse("script[type='application/ld+json']"),
        img: parse("img"),
        body: parse("body"),
        containers: BODY_CONTAINERS.iter().map(|s| parse(s)).collect(),
    }
});

/// Extract an article from `html` fetched from `url`.
///
/// The returned body may be empty; callers decide whether that is an error.
pub fn extract_article(html: &str, url: &Url, max_images: usize) -> Article {
    let document = Html::parse_document(html);
    let sel = &*SELECTORS;

    let container = find_container(&document, sel);
    let body_text = container
        .map(element_text)
        .unwrap_or_default();

    Article {
        url: url.to_string(),
        title: extract_title(&document, sel),
        body_text,
        image_urls: extract_images(&document, container, url, max_images, sel),
    }
}

fn extract_title(document: &Html, sel: &Selectors) -> String {
    let og = document
        .select(&sel.og_title)
        .filter_map(|m| m.value().attr("content"))
        .map(normalize_inline)
        .find(|t| !t.is_empty());
    if let Some(title) = og {
        return title;
    }

    [&sel.title, &sel.h1]
        .into_iter()
        .filter_map(|s| document.select(s).next())
        .map(|el| normalize_inline(&el.text().collect::<String>()))
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

fn find_container<'a>(document: &'a Html, sel: &Selectors) -> Option<ElementRef<'a>> {
    sel.containers
        .iter()
        .filter_map(|s| document.select(s).next())
        .find(|el| !element_text(*el).is_empty())
        .or_else(|| document.select(&sel.body).next())
}

/// Visible text of `el` with one line per block element.
fn element_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(el, &mut raw);
    raw.lines()
        .map(normalize_inline)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            let name = child_el.value().name();
            if SKIPPED_TAGS.contains(&name) {
                continue;
            }
            if name == "br" {
                out.push('\n');
                continue;
            }
            let block = BLOCK_TAGS.contains(&name);
            if block {
                out.push('\n');
            }
            collect_text(child_el, out);
            if block {
                out.push('\n');
            }
        }
    }
}

/// Collapse whitespace runs (including `&nbsp;`) to single spaces.
fn normalize_inline(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_images(
    document: &Html,
    container: Option<ElementRef<'_>>,
    base: &Url,
    max_images: usize,
    sel: &Selectors,
) -> Vec<String> {
    if max_images == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<String> = Vec::new();
    for s in [&sel.og_image, &sel.twitter_image] {
        candidates.extend(
            document
                .select(s)
                .filter_map(|m| m.value().attr("content"))
                .map(str::to_string),
        );
    }
    for script in document.select(&sel.json_ld) {
        let raw: String = script.text().collect();
        if let Ok(value) = serde_json::from_str::<Value>(&raw) {
            json_ld_images(&value, &mut candidates);
        }
    }
    if let Some(root) = container {
        candidates.extend(
            root.select(&sel.img)
                .filter(|img| !is_small(*img))
                .filter_map(img_source)
                .filter(|src| !is_decorative(src))
                .map(str::to_string),
        );
    }

    let mut seen = HashSet::new();
    candidates
        .iter()
        .filter_map(|c| resolve(base, c))
        .filter(|u| seen.insert(u.clone()))
        .take(max_images)
        .collect()
}

/// Collect `image` values from a JSON-LD document: a string, an object with
/// `url`, or a list of either. Follows top-level arrays and `@graph`.
fn json_ld_images(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Array(items) => items.iter().for_each(|v| json_ld_images(v, out)),
        Value::Object(map) => {
            if let Some(image) = map.get("image") {
                image_value(image, out);
            }
            if let Some(graph) = map.get("@graph") {
                json_ld_images(graph, out);
            }
        }
        _ => {}
    }
}

fn image_value(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Object(map) => {
            if let Some(Value::String(s)) = map.get("url") {
                out.push(s.clone());
            }
        }
        Value::Array(items) => items.iter().for_each(|v| image_value(v, out)),
        _ => {}
    }
}

/// `data-src` wins over `src` for lazy-loaded images with placeholder sources.
fn img_source(img: ElementRef<'_>) -> Option<&str> {
    let el = img.value();
    let src = el.attr("src").filter(|s| !s.trim().is_empty() && !s.starts_with("data:"));
    el.attr("data-src")
        .filter(|s| !s.trim().is_empty())
        .or(src)
}

fn is_decorative(src: &str) -> bool {
    let lower = src.to_ascii_lowercase();
    if DECORATIVE_MARKERS.iter().any(|m| lower.contains(m)) {
        return true;
    }
    // "ad" only as a whole path or file-name token, so `upload/` survives.
    lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| token == "ad" || token == "ads")
}

/// Declared size below the minimum. With both sides declared, both must be
/// small; a lone declared side is judged by itself. Undeclared sizes pass.
fn is_small(img: ElementRef<'_>) -> bool {
    let dim = |name| {
        img.value()
            .attr(name)
            .and_then(|v| v.trim().trim_end_matches("px").parse::<u32>().ok())
    };
    match (dim("width"), dim("height")) {
        (Some(w), Some(h)) => w < MIN_IMAGE_SIDE && h < MIN_IMAGE_SIDE,
        (Some(side), None) | (None, Some(side)) => side < MIN_IMAGE_SIDE,
        (None, None) => false,
    }
}

fn resolve(base: &Url, candidate: &str) -> Option<String> {
    let joined = base.join(candidate.trim()).ok()?;
    matches!(joined.scheme(), "http" | "https").then(|| joined.to_string())
}
