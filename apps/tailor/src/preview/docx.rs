//! DOCX to HTML conversion for the in-terminal document preview.
//!
//! DOCX files are ZIP archives of Open XML; the visible content lives in
//! `word/document.xml`. This walks the XML event stream once, collecting
//! paragraphs with their run formatting, then renders a small HTML fragment:
//! headings, paragraphs, bullet lists, bold/italic/underline. Anything
//! fancier (tables, images, fonts) is out of scope for a preview pane.

use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use super::PreviewError;

#[derive(Debug, Default, Clone)]
struct TextRun {
    text: String,
    bold: bool,
    italic: bool,
    underline: bool,
}

#[derive(Debug, Default, Clone)]
struct Paragraph {
    heading_level: Option<u8>,
    is_list_item: bool,
    runs: Vec<TextRun>,
}

/// Convert DOCX bytes to an HTML fragment.
pub fn convert_to_html(bytes: &[u8]) -> Result<String, PreviewError> {
    let cursor = Cursor::new(bytes);
    let mut archive = ZipArchive::new(cursor)
        .map_err(|e| PreviewError::Convert(format!("not a DOCX archive: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|_| PreviewError::Convert("missing word/document.xml".into()))?
        .read_to_string(&mut xml)
        .map_err(|e| PreviewError::Convert(format!("failed to read document.xml: {e}")))?;

    let paragraphs = parse_paragraphs(&xml)?;
    Ok(render_html(&paragraphs))
}

fn parse_paragraphs(xml: &str) -> Result<Vec<Paragraph>, PreviewError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut paragraphs = Vec::new();
    let mut current_paragraph = Paragraph::default();
    let mut current_run = TextRun::default();
    let mut in_paragraph = false;
    let mut in_run = false;
    let mut in_text = false;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                match e.local_name().as_ref() {
                    b"p" => {
                        in_paragraph = true;
                        current_paragraph = Paragraph::default();
                    }
                    b"r" => {
                        in_run = true;
                        current_run = TextRun::default();
                    }
                    b"t" => in_text = true,
                    other => handle_property(other, e, in_paragraph, in_run, &mut current_paragraph, &mut current_run),
                }
            }
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"br" => {
                    if in_run {
                        current_run.text.push('\n');
                    }
                }
                b"tab" => {
                    if in_run {
                        current_run.text.push('\t');
                    }
                }
                other => handle_property(other, e, in_paragraph, in_run, &mut current_paragraph, &mut current_run),
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"p" => {
                    in_paragraph = false;
                    if !current_paragraph.runs.is_empty() {
                        paragraphs.push(std::mem::take(&mut current_paragraph));
                    }
                }
                b"r" => {
                    in_run = false;
                    if !current_run.text.is_empty() {
                        current_paragraph.runs.push(std::mem::take(&mut current_run));
                    }
                }
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text && in_run {
                    current_run.text.push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PreviewError::Convert(format!("XML parse error: {e}")));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

/// Paragraph- and run-property elements occur both as start tags and as
/// self-closing tags, so both event arms funnel here.
fn handle_property(
    name: &[u8],
    e: &BytesStart,
    in_paragraph: bool,
    in_run: bool,
    paragraph: &mut Paragraph,
    run: &mut TextRun,
) {
    match name {
        b"b" | b"bCs" => {
            if in_run {
                run.bold = true;
            }
        }
        b"i" | b"iCs" => {
            if in_run {
                run.italic = true;
            }
        }
        b"u" => {
            if in_run {
                run.underline = true;
            }
        }
        b"pStyle" => {
            if in_paragraph {
                if let Some(val) = get_attribute(e, "val") {
                    if val.starts_with("Heading") || val.starts_with("heading") {
                        let level = val
                            .chars()
                            .filter(|c| c.is_ascii_digit())
                            .collect::<String>()
                            .parse::<u8>()
                            .unwrap_or(1);
                        paragraph.heading_level = Some(level.clamp(1, 6));
                    }
                }
            }
        }
        b"numPr" => {
            if in_paragraph {
                paragraph.is_list_item = true;
            }
        }
        _ => {}
    }
}

fn render_html(paragraphs: &[Paragraph]) -> String {
    let mut out = String::new();
    let mut in_list = false;

    for paragraph in paragraphs {
        if paragraph.is_list_item && !in_list {
            out.push_str("<ul>");
            in_list = true;
        } else if !paragraph.is_list_item && in_list {
            out.push_str("</ul>");
            in_list = false;
        }

        let body: String = paragraph.runs.iter().map(render_run).collect();
        if paragraph.is_list_item {
            out.push_str(&format!("<li>{body}</li>"));
        } else if let Some(level) = paragraph.heading_level {
            out.push_str(&format!("<h{level}>{body}</h{level}>"));
        } else {
            out.push_str(&format!("<p>{body}</p>"));
        }
    }
    if in_list {
        out.push_str("</ul>");
    }
    out
}

fn render_run(run: &TextRun) -> String {
    let mut text = escape_html(&run.text)
        .replace('\n', "<br/>")
        .replace('\t', "&emsp;");
    if run.underline {
        text = format!("<u>{text}</u>");
    }
    if run.italic {
        text = format!("<em>{text}</em>");
    }
    if run.bold {
        text = format!("<strong>{text}</strong>");
    }
    text
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Helper to get an attribute value from an XML element, ignoring any
/// namespace prefix.
fn get_attribute(e: &BytesStart, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return Some(String::from_utf8_lossy(&attr.value).to_string());
        }
    }
    None
}

#[cfg(test)]
pub(super) fn docx_bytes(document_xml: &str) -> Vec<u8> {
    use std::io::Write;

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap();
    }
    cursor.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Jane Doe</w:t></w:r></w:p>
    <w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Senior Engineer</w:t></w:r><w:r><w:t>at Acme &amp; Co</w:t></w:r></w:p>
    <w:p><w:pPr><w:numPr><w:ilvl w:val="0"/></w:numPr></w:pPr><w:r><w:t>shipped things</w:t></w:r></w:p>
    <w:p><w:pPr><w:numPr><w:ilvl w:val="0"/></w:numPr></w:pPr><w:r><w:rPr><w:i/></w:rPr><w:t>kept shipping</w:t></w:r></w:p>
    <w:p><w:r><w:t>closing line</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

    #[test]
    fn test_convert_renders_headings_lists_and_formatting() {
        let html = convert_to_html(&docx_bytes(SAMPLE)).unwrap();
        assert!(html.contains("<h1>Jane Doe</h1>"));
        assert!(html.contains("<strong>Senior Engineer</strong>"));
        assert!(html.contains("at Acme &amp; Co"));
        assert!(html.contains("<ul><li>shipped things</li><li><em>kept shipping</em></li></ul>"));
        assert!(html.ends_with("<p>closing line</p>"));
    }

    #[test]
    fn test_convert_rejects_non_zip_payload() {
        let err = convert_to_html(b"this is not a docx").unwrap_err();
        assert!(matches!(err, PreviewError::Convert(_)));
    }

    #[test]
    fn test_convert_rejects_zip_without_document_xml() {
        use std::io::Write;
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Stored);
            writer.start_file("unrelated.txt", options).unwrap();
            writer.write_all(b"hi").unwrap();
            writer.finish().unwrap();
        }
        let err = convert_to_html(&cursor.into_inner()).unwrap_err();
        assert!(matches!(err, PreviewError::Convert(msg) if msg.contains("document.xml")));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }
}
