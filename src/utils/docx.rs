// src/utils/docx.rs

use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::AppError;

/// Result of converting an uploaded document.
#[derive(Debug)]
pub struct Conversion {
    /// HTML fragment (unsanitized; callers run it through the cleaner).
    pub html: String,
    /// Converter diagnostics. Logged by the caller, never surfaced to
    /// clients.
    pub messages: Vec<String>,
}

/// Convert a `.docx` document to an HTML fragment.
///
/// A `.docx` file is a zip archive; the body text lives in
/// `word/document.xml` as WordprocessingML. The archive is opened with
/// `zip` and the XML stream-parsed with `quick-xml`.
///
/// Mapping: paragraphs -> `<p>`, `Heading1..6`/`Title` styles ->
/// `<h1>..<h6>`, numbered/list paragraphs -> `<ul><li>`, bold/italic/
/// underline runs -> `<strong>`/`<em>`/`<u>`, line breaks -> `<br />`,
/// tables -> `<table><tr><td>`. Drawings, embedded pictures and math are
/// dropped with a diagnostic message.
pub fn convert_to_html(bytes: &[u8]) -> Result<Conversion, AppError> {
    let xml = read_document_xml(bytes)?;
    parse_document_xml(&xml)
}

fn read_document_xml(bytes: &[u8]) -> Result<String, AppError> {
    let reader = Cursor::new(bytes);
    let mut zip = zip::ZipArchive::new(reader)
        .map_err(|e| AppError::InternalServerError(format!("not a valid .docx archive: {}", e)))?;
    let mut file = zip.by_name("word/document.xml").map_err(|_| {
        AppError::InternalServerError("word/document.xml missing from archive".to_string())
    })?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| AppError::InternalServerError(format!("failed to read document.xml: {}", e)))?;
    Ok(xml)
}

/// In-flight state for the paragraph currently being assembled.
struct Para {
    tag: &'static str,
    buf: String,
    list_item: bool,
}

impl Para {
    fn new() -> Self {
        Para {
            tag: "p",
            buf: String::new(),
            list_item: false,
        }
    }
}

fn parse_document_xml(xml: &str) -> Result<Conversion, AppError> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    // No trim_text here: run text whitespace is significant
    // (<w:t xml:space="preserve">).

    let mut buf = Vec::new();

    let mut out = String::new();
    let mut messages: Vec<String> = Vec::new();

    let mut para: Option<Para> = None;
    let mut in_list = false;
    let mut in_text = false;

    // current run formatting
    let mut bold = false;
    let mut italic = false;
    let mut underline = false;

    // >0 while inside a construct we do not convert (drawings, math)
    let mut skip_depth: usize = 0;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                if skip_depth > 0 {
                    if is_skipped(&name) {
                        skip_depth += 1;
                    }
                    buf.clear();
                    continue;
                }
                match name.as_str() {
                    "p" => {
                        para = Some(Para::new());
                        bold = false;
                        italic = false;
                        underline = false;
                    }
                    "r" => {
                        bold = false;
                        italic = false;
                        underline = false;
                    }
                    "t" => in_text = true,
                    "b" => bold = flag_on(&e),
                    "i" => italic = flag_on(&e),
                    "u" => underline = flag_on(&e),
                    "numPr" => {
                        if let Some(p) = para.as_mut() {
                            p.list_item = true;
                        }
                    }
                    "tbl" => {
                        if in_list {
                            out.push_str("</ul>");
                            in_list = false;
                        }
                        out.push_str("<table>");
                    }
                    "tr" => out.push_str("<tr>"),
                    "tc" => out.push_str("<td>"),
                    _ if is_skipped(&name) => {
                        skip_depth += 1;
                        messages.push(dropped_message(&name));
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let name = local_name(&e);
                if skip_depth > 0 {
                    buf.clear();
                    continue;
                }
                match name.as_str() {
                    "pStyle" => {
                        if let (Some(p), Some(val)) = (para.as_mut(), get_attr(&e, "val")) {
                            match heading_tag(&val) {
                                Some(tag) => p.tag = tag,
                                None if val == "ListParagraph" => p.list_item = true,
                                None => {}
                            }
                        }
                    }
                    "b" => bold = flag_on(&e),
                    "i" => italic = flag_on(&e),
                    "u" => underline = flag_on(&e),
                    "numPr" => {
                        if let Some(p) = para.as_mut() {
                            p.list_item = true;
                        }
                    }
                    "br" => {
                        if let Some(p) = para.as_mut() {
                            p.buf.push_str("<br />");
                        }
                    }
                    "tab" => {
                        if let Some(p) = para.as_mut() {
                            p.buf.push('\t');
                        }
                    }
                    _ if is_skipped(&name) => messages.push(dropped_message(&name)),
                    _ => {}
                }
            }
            Ok(Event::Text(t)) => {
                if skip_depth == 0 && in_text {
                    if let Some(p) = para.as_mut() {
                        let text = t.unescape().map_err(|e| {
                            AppError::InternalServerError(format!(
                                "failed to parse document.xml: {}",
                                e
                            ))
                        })?;
                        push_run(&mut p.buf, &text, bold, italic, underline);
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let name = name.split(':').last().unwrap_or(&name).to_string();
                if skip_depth > 0 {
                    if is_skipped(&name) {
                        skip_depth -= 1;
                    }
                    buf.clear();
                    continue;
                }
                match name.as_str() {
                    "p" => {
                        if let Some(p) = para.take() {
                            flush_paragraph(&mut out, &mut in_list, p);
                        }
                    }
                    "r" => {
                        bold = false;
                        italic = false;
                        underline = false;
                    }
                    "t" => in_text = false,
                    "tc" => out.push_str("</td>"),
                    "tr" => out.push_str("</tr>"),
                    "tbl" => out.push_str("</table>"),
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(AppError::InternalServerError(format!(
                    "failed to parse document.xml: {}",
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if in_list {
        out.push_str("</ul>");
    }

    Ok(Conversion {
        html: out,
        messages,
    })
}

// ------------- helpers -------------

fn flush_paragraph(out: &mut String, in_list: &mut bool, p: Para) {
    // Empty paragraphs produce no output, mirroring common converters.
    if p.buf.is_empty() {
        return;
    }
    if p.list_item && !*in_list {
        out.push_str("<ul>");
        *in_list = true;
    } else if !p.list_item && *in_list {
        out.push_str("</ul>");
        *in_list = false;
    }
    let tag = if p.list_item { "li" } else { p.tag };
    out.push('<');
    out.push_str(tag);
    out.push('>');
    out.push_str(&p.buf);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn push_run(buf: &mut String, text: &str, bold: bool, italic: bool, underline: bool) {
    if bold {
        buf.push_str("<strong>");
    }
    if italic {
        buf.push_str("<em>");
    }
    if underline {
        buf.push_str("<u>");
    }
    buf.push_str(&escape_html(text));
    if underline {
        buf.push_str("</u>");
    }
    if italic {
        buf.push_str("</em>");
    }
    if bold {
        buf.push_str("</strong>");
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn heading_tag(style: &str) -> Option<&'static str> {
    match style {
        "Title" | "Heading1" => Some("h1"),
        "Heading2" => Some("h2"),
        "Heading3" => Some("h3"),
        "Heading4" => Some("h4"),
        "Heading5" => Some("h5"),
        "Heading6" => Some("h6"),
        _ => None,
    }
}

fn is_skipped(name: &str) -> bool {
    matches!(name, "drawing" | "pict" | "object" | "oMath" | "oMathPara")
}

fn dropped_message(name: &str) -> String {
    match name {
        "drawing" => "dropped a drawing (images are not converted)".to_string(),
        "pict" => "dropped an embedded picture".to_string(),
        "object" => "dropped an embedded object".to_string(),
        _ => "dropped math content".to_string(),
    }
}

fn local_name(tag: &BytesStart<'_>) -> String {
    let full = String::from_utf8_lossy(tag.name().as_ref()).to_string();
    full.split(':').last().unwrap_or(&full).to_string()
}

fn get_attr(e: &BytesStart<'_>, key_local: &str) -> Option<String> {
    for a in e.attributes().flatten() {
        let key = std::str::from_utf8(a.key.as_ref()).unwrap_or_default();
        let key = key.split(':').last().unwrap_or(key);
        if key == key_local {
            return Some(a.unescape_value().ok()?.into_owned());
        }
    }
    None
}

/// Toggle elements like <w:b/> may carry w:val="false" to switch the
/// property off again.
fn flag_on(e: &BytesStart<'_>) -> bool {
    match get_attr(e, "val") {
        Some(v) => !matches!(v.as_str(), "0" | "false" | "none"),
        None => true,
    }
}
