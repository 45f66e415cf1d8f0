//! Minimal PDF 1.4 writer for tabular reports
//!
//! Helvetica with WinAnsiEncoding on A4 landscape pages. Every byte of the
//! document is ASCII; characters above 0x7F are written as octal escapes and
//! characters outside Latin-1 are replaced.

use std::fmt::Write as _;

use super::{ReportRow, REPORT_COLUMNS};

const PAGE_WIDTH: f32 = 842.0;
const PAGE_HEIGHT: f32 = 595.0;
const MARGIN: f32 = 36.0;
const FONT_SIZE: f32 = 8.0;
const LEADING: f32 = 11.0;
const TITLE_SIZE: f32 = 13.0;
/// Average Helvetica glyph width relative to the font size
const GLYPH_WIDTH: f32 = 0.5;
const ROW_GAP: f32 = 4.0;

/// Column widths in points, summing to the printable width
const COLUMN_WIDTHS: [f32; 6] = [95.0, 90.0, 50.0, 105.0, 140.0, 290.0];

/// Map a char to a WinAnsi code point
fn win_ansi(c: char) -> u8 {
    match c {
        '\t' | '\n' | '\r' => b' ',
        '€' => 0x80,
        '…' => 0x85,
        '–' => 0x96,
        '—' => 0x97,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        c if (' '..='~').contains(&c) => c as u8,
        c if ('\u{a0}'..='\u{ff}').contains(&c) => c as u32 as u8,
        _ => b'?',
    }
}

/// Encode text as the body of a PDF literal string
fn pdf_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.replace('→', "->").chars() {
        match win_ansi(c) {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b if b < 0x80 => out.push(b as char),
            b => {
                let _ = write!(out, "\\{b:03o}");
            }
        }
    }
    out
}

/// Clip text to the number of glyphs fitting a column
fn fit(text: &str, width: f32, size: f32) -> String {
    let max_chars = ((width - 4.0) / (size * GLYPH_WIDTH)).floor().max(1.0) as usize;
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    clipped.push_str("...");
    clipped
}

/// Lines of a cell; change summaries span several lines
fn cell_lines(text: &str, width: f32) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }
    text.lines().map(|line| fit(line, width, FONT_SIZE)).collect()
}

/// Content stream under construction for one page
struct PageContent {
    ops: String,
}

impl PageContent {
    fn new() -> Self {
        Self { ops: String::new() }
    }

    fn text(&mut self, font: &str, size: f32, x: f32, y: f32, text: &str) {
        if text.is_empty() {
            return;
        }
        let _ = writeln!(
            self.ops,
            "BT /{font} {size} Tf {x:.2} {y:.2} Td ({}) Tj ET",
            pdf_string(text)
        );
    }

    fn rule(&mut self, y: f32) {
        let _ = writeln!(
            self.ops,
            "0.5 w {MARGIN:.2} {y:.2} m {:.2} {y:.2} l S",
            PAGE_WIDTH - MARGIN
        );
    }
}

fn header(page: &mut PageContent, title: &str) -> f32 {
    let mut y = PAGE_HEIGHT - MARGIN - TITLE_SIZE;
    page.text("F2", TITLE_SIZE, MARGIN, y, title);
    y -= LEADING * 2.0;

    let mut x = MARGIN;
    for (name, width) in REPORT_COLUMNS.iter().zip(COLUMN_WIDTHS) {
        page.text("F2", FONT_SIZE, x, y, name);
        x += width;
    }
    page.rule(y - 3.0);
    y - LEADING - ROW_GAP
}

/// Close the current page and start the next one below its header
fn next_page(pages: &mut Vec<String>, page: &mut PageContent, title: &str) -> f32 {
    pages.push(std::mem::replace(page, PageContent::new()).ops);
    header(page, title)
}

/// Lay rows out on pages, returning one content stream per page
///
/// A row that fits on a fresh page is never split. Taller rows continue
/// line by line on the following pages.
fn layout(title: &str, rows: &[ReportRow]) -> Vec<String> {
    let bottom = MARGIN + LEADING;
    let mut pages = Vec::new();
    let mut page = PageContent::new();
    let mut y = header(&mut page, title);
    let mut rows_on_page = 0usize;

    for row in rows {
        let cells: Vec<Vec<String>> = row
            .cells()
            .iter()
            .zip(COLUMN_WIDTHS)
            .map(|(text, width)| cell_lines(text, width))
            .collect();
        let line_count = cells.iter().map(Vec::len).max().unwrap_or(1);

        if y - line_count as f32 * LEADING < bottom && rows_on_page > 0 {
            y = next_page(&mut pages, &mut page, title);
            rows_on_page = 0;
        }

        for i in 0..line_count {
            if y - LEADING < bottom {
                y = next_page(&mut pages, &mut page, title);
            }
            let mut x = MARGIN;
            for (lines, width) in cells.iter().zip(COLUMN_WIDTHS) {
                if let Some(line) = lines.get(i) {
                    page.text("F1", FONT_SIZE, x, y, line);
                }
                x += width;
            }
            y -= LEADING;
        }
        y -= ROW_GAP;
        rows_on_page += 1;
    }
    pages.push(page.ops);
    pages
}

/// Serialize indirect objects with a cross-reference table
fn assemble(objects: &[String]) -> Vec<u8> {
    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        let _ = write!(out, "{} 0 obj\n{body}\nendobj\n", i + 1);
    }

    let xref = out.len();
    let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = writeln!(out, "{offset:010} 00000 n ");
    }
    let _ = write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
        objects.len() + 1
    );
    out.into_bytes()
}

/// Render a titled table as a PDF document
pub fn render_pdf(title: &str, rows: &[ReportRow]) -> Vec<u8> {
    let streams = layout(title, rows);
    let page_count = streams.len();

    // 1 catalog, 2 page tree, 3-4 fonts, then (page, content) pairs
    let first_page = 5;
    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", first_page + i * 2))
        .collect();

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {page_count} >>",
            kids.join(" ")
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    for (i, mut stream) in streams.into_iter().enumerate() {
        let footer = format!("Page {} / {page_count}", i + 1);
        let _ = writeln!(
            stream,
            "BT /F1 {FONT_SIZE} Tf {:.2} {:.2} Td ({}) Tj ET",
            PAGE_WIDTH - MARGIN - 50.0,
            MARGIN - LEADING,
            pdf_string(&footer)
        );

        let content_id = first_page + i * 2 + 1;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {content_id} 0 R >>"
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{stream}endstream",
            stream.len()
        ));
    }

    assemble(&objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_rows;

    fn as_text(bytes: &[u8]) -> &str {
        std::str::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_pdf_string_escapes() {
        assert_eq!(pdf_string("a (b) \\ c"), "a \\(b\\) \\\\ c");
        assert_eq!(pdf_string("High → Low"), "High -> Low");
        assert_eq!(pdf_string("café"), "caf\\351");
        assert_eq!(pdf_string("日本"), "??");
    }

    #[test]
    fn test_fit_clips_long_text() {
        let clipped = fit(&"x".repeat(200), 50.0, FONT_SIZE);
        assert!(clipped.ends_with("..."));
        assert!(clipped.chars().count() < 200);
        assert_eq!(fit("short", 50.0, FONT_SIZE), "short");
    }

    #[test]
    fn test_document_structure() {
        let pdf = render_pdf("Audit Log", &sample_rows());
        let text = as_text(&pdf);

        assert!(text.starts_with("%PDF-1.4\n"));
        assert!(text.ends_with("%%EOF\n"));
        assert!(text.contains("/BaseFont /Helvetica "));
        assert!(text.contains("/MediaBox [0 0 842 595]"));
        assert!(text.contains("(Ship \\(it\\)) Tj"));
        assert!(text.contains("(Priority: High -> Low) Tj"));
        assert!(text.contains("(Page 1 / 1) Tj"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let pdf = render_pdf("Audit Log", &sample_rows());
        let text = as_text(&pdf);

        let xref_start: usize = text
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .unwrap()
            .parse()
            .unwrap();
        assert!(text[xref_start..].starts_with("xref\n"));

        let entries: Vec<&str> = text[xref_start..].lines().skip(3).take(4).collect();
        for (i, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            assert!(text[offset..].starts_with(&format!("{} 0 obj", i + 1)));
        }
    }

    #[test]
    fn test_long_reports_paginate() {
        let rows: Vec<ReportRow> = sample_rows().into_iter().cycle().take(120).collect();
        let pdf = render_pdf("Audit Log", &rows);
        let text = as_text(&pdf);

        assert!(!text.contains("/Count 1 "));
        assert!(text.contains("(Page 2 / "));
    }

    fn text_positions(stream: &str) -> Vec<(f32, &str)> {
        stream
            .lines()
            .filter_map(|op| {
                let (_, rest) = op.split_once(" Tf ")?;
                let mut parts = rest.splitn(4, ' ');
                let _x = parts.next()?;
                let y: f32 = parts.next()?.parse().ok()?;
                let _td = parts.next()?;
                Some((y, parts.next()?))
            })
            .collect()
    }

    #[test]
    fn test_tall_row_continues_on_next_page() {
        let changes: Vec<String> = (1..=80).map(|i| format!("Field{i}: a -> b")).collect();
        let mut row = sample_rows().remove(0);
        row.changes = changes.join("\n");

        let pages = layout("Audit Log", &[row.clone()]);
        assert!(pages.len() > 1);

        let positions: Vec<(f32, &str)> = pages.iter().flat_map(|p| text_positions(p)).collect();
        assert!(positions.iter().all(|(y, _)| *y >= MARGIN + LEADING));
        for line in &changes {
            let drawn = format!("({line}) Tj ET");
            assert_eq!(positions.iter().filter(|(_, t)| *t == drawn).count(), 1);
        }

        let pdf = render_pdf("Audit Log", &[row]);
        assert!(!as_text(&pdf).contains("/Count 1 "));
    }
}
