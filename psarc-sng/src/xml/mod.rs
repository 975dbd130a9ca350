//! Arrangement XML emission.
//!
//! The output mirrors the editor-facing song XML: UTF-8, two-space indent,
//! self-closed childless elements, and fixed three-decimal time formatting.
//! Vocal-type files produce a flat `<vocals>` document; everything else
//! produces the full `<song version="8">` document.

mod song;
mod vocals;

use std::fmt::Display;

use crate::manifest::SongManifest;
use crate::structs::SongData;

/// Render a parsed SNG to its XML document.
pub fn render(song: &SongData, manifest: Option<&SongManifest>) -> String {
    if song.vocals.is_empty() {
        song::render_instrumental(song, manifest)
    } else {
        vocals::render_vocals(song)
    }
}

/// Fixed three-decimal form used for times, sustains, and lengths.
pub(crate) fn format_fixed(value: f32) -> String {
    format!("{value:.3}")
}

/// Shortest plain form used for bend amounts and the cent offset.
pub(crate) fn format_plain(value: f32) -> String {
    format!("{value}")
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

/// Minimal indenting XML builder.
///
/// Elements are opened, given attributes while their start tag is still
/// open, and closed in stack order; an element closed before it acquires
/// children collapses to a self-closing tag.
pub(crate) struct XmlWriter {
    buf: String,
    stack: Vec<&'static str>,
    tag_open: bool,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self {
            buf: String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n"),
            stack: Vec::new(),
            tag_open: false,
        }
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.buf.push_str("  ");
        }
    }

    fn seal_start_tag(&mut self) {
        if self.tag_open {
            self.buf.push_str(">\n");
            self.tag_open = false;
        }
    }

    pub fn open(&mut self, name: &'static str) -> &mut Self {
        self.seal_start_tag();
        self.indent(self.stack.len());
        self.buf.push('<');
        self.buf.push_str(name);
        self.stack.push(name);
        self.tag_open = true;
        self
    }

    pub fn attr(&mut self, name: &str, value: impl Display) -> &mut Self {
        debug_assert!(self.tag_open, "attribute written outside a start tag");
        self.buf.push(' ');
        self.buf.push_str(name);
        self.buf.push_str("=\"");
        escape_into(&mut self.buf, &value.to_string());
        self.buf.push('"');
        self
    }

    pub fn close(&mut self) -> &mut Self {
        let name = self.stack.pop().unwrap_or_default();
        if self.tag_open {
            self.buf.push_str(" />\n");
            self.tag_open = false;
        } else {
            self.indent(self.stack.len());
            self.buf.push_str("</");
            self.buf.push_str(name);
            self.buf.push_str(">\n");
        }
        self
    }

    /// `<name>text</name>` on a single line.
    pub fn text_element(&mut self, name: &str, text: impl Display) -> &mut Self {
        self.seal_start_tag();
        self.indent(self.stack.len());
        self.buf.push('<');
        self.buf.push_str(name);
        self.buf.push('>');
        escape_into(&mut self.buf, &text.to_string());
        self.buf.push_str("</");
        self.buf.push_str(name);
        self.buf.push_str(">\n");
        self
    }

    pub fn finish(mut self) -> String {
        while !self.stack.is_empty() {
            self.close();
        }
        self.buf
    }
}
