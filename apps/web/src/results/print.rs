//! Print rendering for generated documents.
//!
//! The conversion is a best-effort line heuristic (headings, bullet lists,
//! paragraphs, bold) good enough for a browser print dialog. Callers only see
//! [`PrintRenderer`], so a real document renderer can replace it.

use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintKind {
    Resume,
    CoverLetter,
}

impl PrintKind {
    pub fn title_prefix(self) -> &'static str {
        match self {
            PrintKind::Resume => "Resume",
            PrintKind::CoverLetter => "Cover Letter",
        }
    }
}

pub trait PrintRenderer: Send + Sync {
    /// HTML for the `<body>` of a print document. Input is untrusted text.
    fn render_body(&self, kind: PrintKind, source: &str) -> String;
}

pub struct HeuristicRenderer;

impl PrintRenderer for HeuristicRenderer {
    fn render_body(&self, kind: PrintKind, source: &str) -> String {
        match kind {
            PrintKind::Resume => render_markdown(source),
            PrintKind::CoverLetter => render_letter(source),
        }
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes, then applies `**bold**` and turns `|` separators into bullets.
fn render_inline(text: &str) -> String {
    let escaped = escape_html(text).replace('|', " • ");
    let segments: Vec<&str> = escaped.split("**").collect();
    // An even segment count means an unmatched marker; leave it literal.
    if segments.len() < 3 || segments.len() % 2 == 0 {
        return escaped;
    }
    let mut out = String::with_capacity(escaped.len() + 16);
    for (i, segment) in segments.iter().enumerate() {
        if i % 2 == 1 {
            let _ = write!(out, "<strong>{segment}</strong>");
        } else {
            out.push_str(segment);
        }
    }
    out
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|&c| c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let text = line[level..].strip_prefix(' ')?;
    Some((level.min(3), text.trim()))
}

fn list_item(line: &str) -> Option<&str> {
    line.strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .map(str::trim)
}

#[derive(Default)]
struct Builder {
    out: String,
    paragraph: Vec<String>,
    in_list: bool,
}

impl Builder {
    fn flush_paragraph(&mut self) {
        if !self.paragraph.is_empty() {
            let _ = write!(self.out, "<p>{}</p>\n", self.paragraph.join("<br>\n"));
            self.paragraph.clear();
        }
    }

    fn close_list(&mut self) {
        if self.in_list {
            self.out.push_str("</ul>\n");
            self.in_list = false;
        }
    }

    fn close_blocks(&mut self) {
        self.flush_paragraph();
        self.close_list();
    }
}

/// Markdown-ish text to HTML. Also used for the on-page resume preview.
pub fn render_markdown(source: &str) -> String {
    let mut b = Builder::default();

    for raw in source.lines() {
        let line = raw.trim();
        if line.is_empty() {
            b.close_blocks();
            continue;
        }
        if let Some((level, text)) = heading(line) {
            b.close_blocks();
            let _ = write!(b.out, "<h{level}>{}</h{level}>\n", render_inline(text));
            continue;
        }
        if let Some(item) = list_item(line) {
            b.flush_paragraph();
            if !b.in_list {
                b.out.push_str("<ul>\n");
                b.in_list = true;
            }
            let _ = write!(b.out, "<li>{}</li>\n", render_inline(item));
            continue;
        }
        b.close_list();
        b.paragraph.push(render_inline(line));
    }

    b.close_blocks();
    b.out
}

/// One paragraph per non-empty line.
pub fn render_letter(source: &str) -> String {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("<p>{}</p>\n", escape_html(line)))
        .collect()
}
