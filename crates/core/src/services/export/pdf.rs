//! Paginated document rendering.
//!
//! The engine is a trait so deployments without PDF support (or tests) can
//! install one that always fails, which routes exports to the JSON fallback.

use mozsolidaria_common::{AppError, AppResult};

/// Page size in points (A4).
const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const MARGIN: u32 = 50;

const TITLE_SIZE: u32 = 16;
const TITLE_LEADING: u32 = 20;
const BODY_SIZE: u32 = 9;
const BODY_LEADING: u32 = 12;

/// Text content of a paginated export, already wrapped to the page width.
#[derive(Debug, Clone, Default)]
pub struct PdfDocument {
    pub title_lines: Vec<String>,
    pub body_lines: Vec<String>,
}

/// Renders a [`PdfDocument`] to bytes.
pub trait PdfEngine: Send + Sync {
    /// Engine name for logs.
    fn name(&self) -> &'static str;

    /// Render the document. Failure makes the caller fall back to JSON.
    fn render(&self, document: &PdfDocument) -> AppResult<Vec<u8>>;
}

/// Engine used when PDF output is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailablePdfEngine;

impl PdfEngine for UnavailablePdfEngine {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn render(&self, _document: &PdfDocument) -> AppResult<Vec<u8>> {
        Err(AppError::RenderFailure(
            "PDF rendering is disabled on this server".to_string(),
        ))
    }
}

/// Writes a plain PDF 1.4 file with the standard Helvetica font.
///
/// Text is encoded as WinAnsi; characters outside Latin-1 print as `?`.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinPdfEngine {
    lines_per_page: usize,
}

impl BuiltinPdfEngine {
    #[must_use]
    pub fn new(lines_per_page: usize) -> Self {
        // Anything above this would run off the bottom margin.
        let max_lines = ((PAGE_HEIGHT - 2 * MARGIN) / BODY_LEADING) as usize;
        Self {
            lines_per_page: lines_per_page.clamp(1, max_lines),
        }
    }

    fn paginate<'a>(&self, document: &'a PdfDocument) -> Vec<&'a [String]> {
        // Title lines take roughly two body lines each, plus a gap.
        let title_cost = document.title_lines.len() * 2 + 1;
        let first_capacity = self.lines_per_page.saturating_sub(title_cost).max(1);

        let body = document.body_lines.as_slice();
        let (first, mut rest) = body.split_at(first_capacity.min(body.len()));

        let mut pages = vec![first];
        while !rest.is_empty() {
            let (page, tail) = rest.split_at(self.lines_per_page.min(rest.len()));
            pages.push(page);
            rest = tail;
        }
        pages
    }

    fn page_stream(title: &[String], lines: &[String], page: usize, total: usize) -> Vec<u8> {
        let top = PAGE_HEIGHT - MARGIN;
        let mut stream = Vec::new();

        stream.extend_from_slice(format!("BT\n{MARGIN} {top} Td\n").as_bytes());
        if !title.is_empty() {
            stream.extend_from_slice(format!("/F1 {TITLE_SIZE} Tf\n{TITLE_LEADING} TL\n").as_bytes());
            for line in title {
                push_text_line(&mut stream, line);
            }
            stream.extend_from_slice(b"T*\n");
        }
        stream.extend_from_slice(format!("/F1 {BODY_SIZE} Tf\n{BODY_LEADING} TL\n").as_bytes());
        for line in lines {
            push_text_line(&mut stream, line);
        }
        stream.extend_from_slice(b"ET\n");

        let footer = format!("Page {page} of {total}");
        stream.extend_from_slice(format!("BT\n/F1 8 Tf\n{MARGIN} {} Td\n", MARGIN / 2).as_bytes());
        push_text_line(&mut stream, &footer);
        stream.extend_from_slice(b"ET\n");

        stream
    }
}

impl PdfEngine for BuiltinPdfEngine {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn render(&self, document: &PdfDocument) -> AppResult<Vec<u8>> {
        let pages = self.paginate(document);
        let total = pages.len();

        // Objects: 1 catalog, 2 page tree, 3 font, then (page, content) pairs.
        let mut objects: Vec<Vec<u8>> = Vec::with_capacity(3 + total * 2);
        let kids: Vec<String> = (0..total).map(|i| format!("{} 0 R", 4 + i * 2)).collect();

        objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());
        objects.push(
            format!(
                "<< /Type /Pages /Kids [{}] /Count {total} >>",
                kids.join(" ")
            )
            .into_bytes(),
        );
        objects.push(
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_vec(),
        );

        for (index, lines) in pages.iter().enumerate() {
            let title: &[String] = if index == 0 {
                &document.title_lines
            } else {
                &[]
            };
            let content_id = 5 + index * 2;
            objects.push(
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                     /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R >>"
                )
                .into_bytes(),
            );

            let stream = Self::page_stream(title, lines, index + 1, total);
            let mut content = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
            content.extend_from_slice(&stream);
            content.extend_from_slice(b"endstream");
            objects.push(content);
        }

        let mut out = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_at = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
        for offset in offsets {
            out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
                objects.len() + 1
            )
            .as_bytes(),
        );

        Ok(out)
    }
}

fn push_text_line(stream: &mut Vec<u8>, line: &str) {
    stream.push(b'(');
    for ch in line.chars() {
        let byte = u8::try_from(u32::from(ch)).unwrap_or(b'?');
        match byte {
            b'(' | b')' | b'\\' => {
                stream.push(b'\\');
                stream.push(byte);
            }
            0..=31 | 127..=159 => stream.push(b' '),
            _ => stream.push(byte),
        }
    }
    stream.extend_from_slice(b") Tj T*\n");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn document(body: usize) -> PdfDocument {
        PdfDocument {
            title_lines: vec!["Projects Report".to_string()],
            body_lines: (0..body).map(|i| format!("line {i}")).collect(),
        }
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn test_builtin_renders_pdf_header_and_trailer() {
        let bytes = BuiltinPdfEngine::new(60).render(&document(3)).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert_eq!(count(&bytes, b"/Type /Page "), 1);
    }

    #[test]
    fn test_builtin_paginates() {
        // First page holds 10 - 3 = 7 lines, the rest 10 each.
        let bytes = BuiltinPdfEngine::new(10).render(&document(25)).unwrap();

        assert_eq!(count(&bytes, b"/Type /Page "), 3);
        assert_eq!(count(&bytes, b"(Page 3 of 3)"), 1);
    }

    #[test]
    fn test_text_is_escaped_and_latin1() {
        let mut stream = Vec::new();
        push_text_line(&mut stream, "Doação (MZN) \u{2713}");

        assert_eq!(stream, b"(Doa\xE7\xE3o \\(MZN\\) ?) Tj T*\n");
    }

    #[test]
    fn test_unavailable_engine_fails() {
        let result = UnavailablePdfEngine.render(&document(1));
        assert!(matches!(result, Err(AppError::RenderFailure(_))));
    }
}
