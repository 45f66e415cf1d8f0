//! SpreadsheetML 2003 workbook writer

use std::fmt::Write as _;

use super::{ReportRow, REPORT_COLUMNS};

/// Escape text for XML content and attributes; newlines become cell breaks
fn xml_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => {}
            c if c.is_control() && c != '\t' => {}
            c => out.push(c),
        }
    }
    out
}

fn push_row<'a>(out: &mut String, style: &str, cells: impl IntoIterator<Item = &'a str>) {
    out.push_str("   <Row>\n");
    for cell in cells {
        let _ = writeln!(
            out,
            "    <Cell ss:StyleID=\"{style}\"><Data ss:Type=\"String\">{}</Data></Cell>",
            xml_escape(cell)
        );
    }
    out.push_str("   </Row>\n");
}

/// Render a titled table as a single-sheet workbook
pub fn render_spreadsheet(title: &str, rows: &[ReportRow]) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <?mso-application progid=\"Excel.Sheet\"?>\n\
         <Workbook xmlns=\"urn:schemas-microsoft-com:office:spreadsheet\"\n \
         xmlns:o=\"urn:schemas-microsoft-com:office:office\"\n \
         xmlns:x=\"urn:schemas-microsoft-com:office:excel\"\n \
         xmlns:ss=\"urn:schemas-microsoft-com:office:spreadsheet\">\n \
         <Styles>\n  \
         <Style ss:ID=\"title\"><Font ss:Bold=\"1\" ss:Size=\"13\"/></Style>\n  \
         <Style ss:ID=\"header\"><Font ss:Bold=\"1\"/><Interior ss:Color=\"#D9D9D9\" ss:Pattern=\"Solid\"/></Style>\n  \
         <Style ss:ID=\"cell\"><Alignment ss:Vertical=\"Top\" ss:WrapText=\"1\"/></Style>\n \
         </Styles>\n",
    );

    let _ = writeln!(out, " <Worksheet ss:Name=\"Audit Log\">\n  <Table>");
    for width in [110, 120, 60, 120, 160, 360] {
        let _ = writeln!(out, "   <Column ss:Width=\"{width}\"/>");
    }

    push_row(&mut out, "title", [title]);
    push_row(&mut out, "header", REPORT_COLUMNS);
    for row in rows {
        push_row(&mut out, "cell", row.cells());
    }

    out.push_str("  </Table>\n </Worksheet>\n</Workbook>\n");
    out
}
