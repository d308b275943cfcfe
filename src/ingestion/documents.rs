//! Text and image extraction for PDF, DOCX, PPTX and XLSX documents.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{DlpError, Result};

/// Plain extracted text together with the method that produced it.
#[derive(Debug, Clone)]
pub struct TextExtraction {
    pub text: String,
    pub method: &'static str,
}

/// Extract the text layer of a PDF via `pdf-extract`.
pub fn extract_pdf_text(path: &Path) -> Result<TextExtraction> {
    let text = pdf_extract::extract_text(path)
        .map_err(|e| DlpError::archive(format!("pdf text extraction failed: {e}")))?;
    Ok(TextExtraction {
        text,
        method: "pdf_text",
    })
}

/// Rasterize up to `max_pages` pages of a PDF to PNG files under
/// `destination`, for downstream OCR. Returns the rendered file paths in
/// page order.
pub fn render_pdf_to_images(
    path: &Path,
    destination: &Path,
    max_pages: u32,
) -> Result<Vec<PathBuf>> {
    use pdfium_render::prelude::*;

    std::fs::create_dir_all(destination)?;

    let pdfium = Pdfium::new(
        Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| DlpError::archive(format!("failed to bind pdfium library: {e}")))?,
    );

    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| DlpError::archive(format!("failed to open pdf: {e}")))?;

    let render_config = PdfRenderConfig::new()
        .set_target_width(1600)
        .set_maximum_height(2200);

    let mut rendered = Vec::new();
    for (index, page) in document.pages().iter().enumerate() {
        if index as u32 >= max_pages {
            break;
        }
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| DlpError::archive(format!("failed to render pdf page: {e}")))?;
        let image = bitmap.as_image();
        let target = destination.join(format!("page-{:04}.png", index + 1));
        image
            .save_with_format(&target, image::ImageFormat::Png)
            .map_err(|e| DlpError::archive(format!("failed to save rendered page: {e}")))?;
        rendered.push(target);
    }

    Ok(rendered)
}

fn read_zip_entry(zip_path: &Path, entry_name: &str) -> Result<Option<String>> {
    let file = File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| DlpError::archive(format!("failed to open archive: {e}")))?;
    let mut entry = match archive.by_name(entry_name) {
        Ok(entry) => entry,
        Err(_) => return Ok(None),
    };
    let mut buf = String::new();
    entry.read_to_string(&mut buf)?;
    Ok(Some(buf))
}

fn extract_xml_tag_text(xml: &str, tag_local_name: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut collecting = false;
    let mut out = String::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| DlpError::archive(format!("xml parse error: {e}")))?
        {
            Event::Start(ref e) if local_name_matches(e.name().as_ref(), tag_local_name) => {
                collecting = true;
            }
            Event::End(ref e) if local_name_matches(e.name().as_ref(), tag_local_name) => {
                collecting = false;
                out.push(' ');
            }
            Event::Text(e) if collecting => {
                out.push_str(&e.unescape().unwrap_or_default());
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(out.trim().to_string())
}

fn local_name_matches(qname: &[u8], local: &str) -> bool {
    let qname = String::from_utf8_lossy(qname);
    qname
        .rsplit(':')
        .next()
        .map(|n| n == local)
        .unwrap_or(false)
}

/// Extract paragraph text from a `.docx` by walking `word/document.xml`.
pub fn extract_docx_text(path: &Path) -> Result<TextExtraction> {
    let xml = read_zip_entry(path, "word/document.xml")?
        .ok_or_else(|| DlpError::archive("docx missing word/document.xml"))?;
    let text = extract_xml_tag_text(&xml, "t")?;
    Ok(TextExtraction {
        text,
        method: "docx_xml",
    })
}

/// Extract shape text from every slide of a `.pptx`.
pub fn extract_pptx_text(path: &Path) -> Result<TextExtraction> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| DlpError::archive(format!("failed to open archive: {e}")))?;

    let mut slide_names: Vec<String> = (0..archive.len())
        .filter_map(|i| archive.by_index(i).ok().map(|f| f.name().to_string()))
        .filter(|name| {
            name.starts_with("ppt/slides/slide") && name.ends_with(".xml") && !name.contains("rels")
        })
        .collect();
    slide_names.sort();

    let mut text = String::new();
    for name in slide_names {
        let mut entry = archive
            .by_name(&name)
            .map_err(|e| DlpError::archive(format!("failed to read {name}: {e}")))?;
        let mut xml = String::new();
        entry.read_to_string(&mut xml)?;
        let slide_text = extract_xml_tag_text(&xml, "t")?;
        if !slide_text.is_empty() {
            text.push_str(&slide_text);
            text.push('\n');
        }
    }

    Ok(TextExtraction {
        text: text.trim().to_string(),
        method: "pptx_xml",
    })
}

/// Extract tab-joined row text from every sheet of a `.xlsx`.
pub fn extract_xlsx_text(path: &Path) -> Result<TextExtraction> {
    use calamine::{open_workbook, Reader as _, Xlsx};

    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| DlpError::archive(format!("failed to open xlsx: {e}")))?;

    let mut text = String::new();
    let sheet_names = workbook.sheet_names().to_owned();
    for sheet_name in sheet_names {
        if let Ok(range) = workbook.worksheet_range(&sheet_name) {
            for row in range.rows() {
                let joined = row
                    .iter()
                    .map(|cell| cell.to_string())
                    .collect::<Vec<_>>()
                    .join("\t");
                if !joined.trim().is_empty() {
                    text.push_str(&joined);
                    text.push('\n');
                }
            }
        }
    }

    Ok(TextExtraction {
        text: text.trim().to_string(),
        method: "xlsx_rows",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_text_from_w_t_tags() {
        let xml = r#"<w:document xmlns:w="ns"><w:body><w:p><w:r><w:t>Hello</w:t></w:r></w:p><w:p><w:r><w:t>World</w:t></w:r></w:p></w:body></w:document>"#;
        let text = extract_xml_tag_text(xml, "t").unwrap();
        assert_eq!(text, "Hello World");
    }
}
