//! Minimal PDF 1.4 writer for text-only documents.
//!
//! Pages carry positioned text runs in the two standard Helvetica faces plus
//! horizontal rules. No timestamps or ids are embedded, so the same document
//! always serializes to the same bytes.

use std::io::Write;

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

/// Helvetica advance widths for `' '..='~'`, in 1/1000 em.
const REGULAR_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..='/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // digits
    278, 278, 584, 584, 584, 556, 1015, // ':'..='@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722,
    667, 611, 722, 667, 944, 667, 667, 611, // 'A'..='Z'
    278, 278, 278, 469, 556, 333, // '['..='`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333,
    500, 278, 556, 500, 722, 500, 500, 500, // 'a'..='z'
    334, 260, 334, 584, // '{'..='~'
];

/// Helvetica-Bold advance widths for `' '..='~'`, in 1/1000 em.
const BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..='/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // digits
    333, 333, 584, 584, 584, 611, 975, // ':'..='@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778, 722,
    667, 611, 722, 667, 944, 667, 667, 611, // 'A'..='Z'
    333, 278, 333, 584, 556, 333, // '['..='`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389,
    556, 333, 611, 556, 778, 556, 556, 500, // 'a'..='z'
    389, 280, 389, 584, // '{'..='~'
];

/// Upper bound used for the non-ASCII WinAnsi glyphs.
const WIDEST_GLYPH: u16 = 1000;

impl Font {
    fn resource(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }

    /// Advance width of `text` in points when set at `size`.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|ch| u32::from(self.glyph_width(ch))).sum();
        units as f32 * size / 1000.0
    }

    fn glyph_width(&self, ch: char) -> u16 {
        let widths = match self {
            Font::Regular => &REGULAR_WIDTHS,
            Font::Bold => &BOLD_WIDTHS,
        };
        // Mirrors `encode_text`: tabs print as spaces, unmapped chars as `?`.
        let ch = if ch == '\t' { ' ' } else { ch };
        match ch {
            ' '..='~' => widths[ch as usize - 32],
            _ if win_ansi_byte(ch).is_some() => WIDEST_GLYPH,
            _ => widths[usize::from(b'?' - b' ')],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub font: Font,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub x1: f32,
    pub x2: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub runs: Vec<TextRun>,
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PdfDocument {
    pub title: String,
    pub pages: Vec<Page>,
}

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const REGULAR_FONT_ID: usize = 3;
const BOLD_FONT_ID: usize = 4;
const INFO_ID: usize = 5;
const FIRST_PAGE_ID: usize = 6;

impl PdfDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            pages: Vec::new(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = Vec::new();

        out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        let page_ids: Vec<usize> = (0..self.pages.len())
            .map(|index| FIRST_PAGE_ID + index * 2)
            .collect();
        let kids = page_ids
            .iter()
            .map(|id| format!("{id} 0 R"))
            .collect::<Vec<_>>()
            .join(" ");

        push_object(
            &mut out,
            &mut offsets,
            format!("<< /Type /Catalog /Pages {PAGES_ID} 0 R >>").as_bytes(),
        );
        push_object(
            &mut out,
            &mut offsets,
            format!(
                "<< /Type /Pages /Kids [{kids}] /Count {} >>",
                self.pages.len()
            )
            .as_bytes(),
        );
        push_object(&mut out, &mut offsets, font_object("Helvetica").as_bytes());
        push_object(&mut out, &mut offsets, font_object("Helvetica-Bold").as_bytes());

        let mut info = b"<< /Title (".to_vec();
        info.extend(encode_text(&self.title));
        info.extend_from_slice(b") /Producer (PulseView) >>");
        push_object(&mut out, &mut offsets, &info);

        for (page, page_id) in self.pages.iter().zip(page_ids.iter()) {
            let content_id = page_id + 1;
            push_object(
                &mut out,
                &mut offsets,
                format!(
                    "<< /Type /Page /Parent {PAGES_ID} 0 R /MediaBox [0 0 {PAGE_WIDTH:.0} {PAGE_HEIGHT:.0}] \
                     /Resources << /Font << /F1 {REGULAR_FONT_ID} 0 R /F2 {BOLD_FONT_ID} 0 R >> >> \
                     /Contents {content_id} 0 R >>"
                )
                .as_bytes(),
            );

            let stream = page_stream(page);
            let mut body = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
            body.extend_from_slice(&stream);
            body.extend_from_slice(b"\nendstream");
            push_object(&mut out, &mut offsets, &body);
        }

        let xref_offset = out.len();
        let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1);
        for offset in offsets.iter() {
            let _ = write!(out, "{offset:010} 00000 n \n");
        }
        let _ = write!(
            out,
            "trailer\n<< /Size {} /Root {CATALOG_ID} 0 R /Info {INFO_ID} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            offsets.len() + 1
        );

        out
    }
}

fn push_object(out: &mut Vec<u8>, offsets: &mut Vec<usize>, body: &[u8]) {
    offsets.push(out.len());
    let _ = write!(out, "{} 0 obj\n", offsets.len());
    out.extend_from_slice(body);
    out.extend_from_slice(b"\nendobj\n");
}

fn font_object(base: &str) -> String {
    format!("<< /Type /Font /Subtype /Type1 /BaseFont /{base} /Encoding /WinAnsiEncoding >>")
}

fn page_stream(page: &Page) -> Vec<u8> {
    let mut stream: Vec<u8> = Vec::new();

    if !page.rules.is_empty() {
        stream.extend_from_slice(b"0.6 w\n");
        for rule in page.rules.iter() {
            let _ = write!(
                stream,
                "{:.2} {:.2} m {:.2} {:.2} l S\n",
                rule.x1, rule.y, rule.x2, rule.y
            );
        }
    }

    for run in page.runs.iter() {
        let _ = write!(
            stream,
            "BT\n/{} {:.1} Tf\n{:.2} {:.2} Td\n(",
            run.font.resource(),
            run.size,
            run.x,
            run.y
        );
        stream.extend(encode_text(&run.text));
        stream.extend_from_slice(b") Tj\nET\n");
    }

    stream
}

/// Encodes `text` as the body of a PDF literal string in WinAnsiEncoding.
/// Characters outside that encoding become `?`.
pub fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' | '(' | ')' => {
                out.push(b'\\');
                out.push(ch as u8);
            }
            '\t' => out.push(b' '),
            ' '..='~' => out.push(ch as u8),
            _ => match win_ansi_byte(ch) {
                Some(byte) => {
                    let _ = write!(out, "\\{byte:03o}");
                }
                None => out.push(b'?'),
            },
        }
    }
    out
}

fn win_ansi_byte(ch: char) -> Option<u8> {
    match ch {
        '\u{A0}'..='\u{FF}' => Some(ch as u32 as u8),
        '\u{20AC}' => Some(0x80),
        '\u{2026}' => Some(0x85),
        '\u{2018}' => Some(0x91),
        '\u{2019}' => Some(0x92),
        '\u{201C}' => Some(0x93),
        '\u{201D}' => Some(0x94),
        '\u{2022}' => Some(0x95),
        '\u{2013}' => Some(0x96),
        '\u{2014}' => Some(0x97),
        _ => None,
    }
}
