//! Static DOM text extraction.
//!
//! Declarative shadow roots (`<template shadowrootmode="open">`) are walked
//! like ordinary children, which covers server-rendered Lightning pages.
//! Shadow trees attached by scripts at runtime are invisible here.

use reqwest::Url;
use scraper::{ElementRef, Html, Node, Selector};

use crate::error::{Result, SfDocsError};

const SKIPPED: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "svg", "button", "form", "head",
    "iframe",
];

const BLOCKS: &[&str] = &[
    "p", "div", "section", "article", "main", "aside", "h1", "h2", "h3", "h4", "h5", "h6", "li",
    "ul", "ol", "dl", "dt", "dd", "tr", "table", "pre", "blockquote", "figure", "figcaption",
    "details", "summary", "hr",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlContent {
    pub title: Option<String>,
    pub text: String,
}

pub struct HtmlExtractor {
    selectors: Vec<Selector>,
    min_chars: usize,
}

impl HtmlExtractor {
    pub fn new(selectors: &[String], min_chars: usize) -> Result<Self> {
        let selectors = selectors
            .iter()
            .map(|s| {
                Selector::parse(s)
                    .map_err(|e| SfDocsError::Config(format!("invalid content selector {s:?}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            selectors,
            min_chars,
        })
    }

    /// Extract the title and main text of an HTML document. The first
    /// content root that yields enough text wins; otherwise the longest.
    pub fn extract(&self, html: &str) -> HtmlContent {
        let document = Html::parse_document(html);
        let title = document_title(&document);

        let mut best = String::new();
        for selector in &self.selectors {
            let Some(root) = document.select(selector).next() else {
                continue;
            };
            let text = element_text(root);
            if text.chars().count() >= self.min_chars {
                return HtmlContent { title, text };
            }
            if text.len() > best.len() {
                best = text;
            }
        }

        HtmlContent { title, text: best }
    }
}

fn document_title(document: &Html) -> Option<String> {
    ["title", "h1"].iter().find_map(|tag| {
        let selector = Selector::parse(tag).ok()?;
        let element = document.select(&selector).next()?;
        let title = normalize_text(&element.text().collect::<String>());
        (!title.is_empty()).then_some(title)
    })
}

/// Tree node as exposed by `ElementRef`; template contents live under a
/// `Node::Fragment` child that `ElementRef::wrap` cannot represent.
type NodeRef<'a> = <ElementRef<'a> as std::ops::Deref>::Target;

/// Flattened, normalized text of an element subtree.
pub fn element_text(root: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(*root, &mut raw);
    normalize_text(&raw)
}

fn collect_text(node: NodeRef<'_>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Fragment => collect_text(child, out),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED.contains(&name) {
                    continue;
                }
                if name == "template" {
                    if el.attr("shadowrootmode").is_some() || el.attr("shadowroot").is_some() {
                        collect_text(child, out);
                    }
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                let block = BLOCKS.contains(&name);
                if block {
                    out.push('\n');
                }
                collect_text(child, out);
                if block {
                    out.push('\n');
                } else if matches!(name, "td" | "th") {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

/// Absolute http(s) iframe sources, de-duplicated, at most `max`.
pub fn iframe_sources(html: &str, base: &Url, max: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("iframe[src]") else {
        return Vec::new();
    };

    let mut sources: Vec<String> = Vec::new();
    for iframe in document.select(&selector) {
        let Some(src) = iframe.value().attr("src") else {
            continue;
        };
        let Ok(url) = base.join(src.trim()) else {
            continue;
        };
        if !matches!(url.scheme(), "http" | "https") {
            continue;
        }
        let url = url.to_string();
        if !sources.contains(&url) {
            sources.push(url);
        }
        if sources.len() >= max {
            break;
        }
    }
    sources
}

/// Collapse horizontal whitespace, trim lines, and keep at most one blank
/// line between paragraphs.
pub fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0;

    for line in raw.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        out.push_str(&line);
        blank_run = 0;
    }

    out
}
