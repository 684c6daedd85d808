//! HTML to plain text conversion for post bodies and bios.
//!
//! Fixed behavior: anchors keep their text and drop the href, nothing is
//! wrapped, whitespace collapses like a browser would render it.

use regex::Regex;
use scraper::{ElementRef, Html, Node};
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Elements followed and preceded by a blank line.
const PARAGRAPH_ELEMENTS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "ul", "ol", "table",
];

/// Elements that start on their own line.
const LINE_ELEMENTS: &[&str] = &["div", "li", "tr", "dt", "dd", "section", "article"];

/// Elements whose text is never rendered.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "head", "template"];

/// Convert an HTML fragment to plain text.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut builder = TextBuilder::default();
    walk(fragment.root_element(), &mut builder);
    builder.finish()
}

fn walk(element: ElementRef<'_>, builder: &mut TextBuilder) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => builder.push_text(text),
            Node::Element(_) => {
                let Some(child_element) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = child_element.value().name();

                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                if name == "br" {
                    builder.line_break();
                    continue;
                }

                let breaks = if PARAGRAPH_ELEMENTS.contains(&name) {
                    2
                } else if LINE_ELEMENTS.contains(&name) {
                    1
                } else {
                    0
                };

                builder.block(breaks);
                walk(child_element, builder);
                builder.block(breaks);
            }
            _ => {}
        }
    }
}

/// Accumulates text, deferring separators until the next visible word.
#[derive(Default)]
struct TextBuilder {
    out: String,
    pending_breaks: usize,
    pending_space: bool,
}

impl TextBuilder {
    fn push_text(&mut self, text: &str) {
        let collapsed = WHITESPACE.replace_all(text, " ");
        let trimmed = collapsed.trim();

        if trimmed.is_empty() {
            if !collapsed.is_empty() && self.pending_breaks == 0 {
                self.pending_space = true;
            }
            return;
        }

        if collapsed.starts_with(' ') && self.pending_breaks == 0 {
            self.pending_space = true;
        }
        self.flush();
        self.out.push_str(trimmed);
        self.pending_space = collapsed.ends_with(' ');
    }

    fn block(&mut self, breaks: usize) {
        if breaks > 0 {
            self.pending_breaks = self.pending_breaks.max(breaks);
            self.pending_space = false;
        }
    }

    fn line_break(&mut self) {
        self.flush_breaks();
        self.out.push('\n');
        self.pending_space = false;
    }

    fn flush(&mut self) {
        if self.pending_breaks > 0 {
            self.flush_breaks();
        } else if self.pending_space && !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push(' ');
        }
        self.pending_space = false;
    }

    fn flush_breaks(&mut self) {
        if self.pending_breaks > 0 && !self.out.is_empty() {
            let trailing = self.out.chars().rev().take_while(|c| *c == '\n').count();
            for _ in trailing..self.pending_breaks {
                self.out.push('\n');
            }
        }
        self.pending_breaks = 0;
    }

    fn finish(self) -> String {
        self.out.trim().to_string()
    }
}
