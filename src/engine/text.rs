//! PDF-to-text: plain text, Word, or RTF when Word output is unavailable.

use tracing::{debug, instrument, warn};

use super::{
    DOCX_MEDIA_TYPE, RTF_MEDIA_TYPE, TEXT_MEDIA_TYPE, TransformEngine, TransformResult,
    TransformSummary,
};
use crate::backend::{DocumentReader, DocumentWriter, PageText, ParsedDocument, TextFragment};
use crate::config::{TextFormat, TextOptions};
use crate::document::DocumentHandle;
use crate::error::Result;
use crate::progress::Progress;
use crate::utils::{format_file_size, word_count};

const RTF_HEADER: &str =
    "{\\rtf1\\ansi\\deff0\n{\\fonttbl{\\f0\\fswiss Arial;}}\n{\\colortbl;\\red0\\green0\\blue0;}\n\\f0\\fs24\n";

/// Join fragments into page text.
///
/// With `preserve_line_breaks`, a baseline change larger than `threshold`
/// points starts a new line and other runs are separated by one space.
/// Without it, runs are concatenated as they are. The result is trimmed.
pub fn reconstruct_page_text(
    fragments: &[TextFragment],
    preserve_line_breaks: bool,
    threshold: f32,
) -> String {
    let mut text = String::new();
    let mut last_y: Option<f32> = None;

    for fragment in fragments.iter().filter(|f| !f.text.is_empty()) {
        if let (true, Some(y)) = (preserve_line_breaks, last_y) {
            if (fragment.y - y).abs() > threshold {
                text.push('\n');
            } else if !text.is_empty() && !text.ends_with(' ') {
                text.push(' ');
            }
        }
        text.push_str(&fragment.text);
        last_y = Some(fragment.y);
    }

    text.trim().to_string()
}

/// Wrap text in a minimal RTF document.
///
/// Backslashes and braces are escaped before line breaks become `\par`
/// control words.
pub fn render_rtf(text: &str) -> String {
    let mut rtf = String::from(RTF_HEADER);
    for c in text.chars() {
        match c {
            '\\' | '{' | '}' => {
                rtf.push('\\');
                rtf.push(c);
            }
            '\n' => rtf.push_str("\\par\n"),
            c if c.is_ascii() => rtf.push(c),
            // \uN with a '?' replacement for readers without Unicode support.
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    rtf.push_str(&format!("\\u{}?", *unit as i16));
                }
            }
        }
    }
    rtf.push_str("\n}");
    rtf
}

impl<R, W> TransformEngine<R, W>
where
    R: DocumentReader,
    W: DocumentWriter,
{
    #[instrument(skip(self, document, progress), fields(document = document.display_name()))]
    pub(super) async fn pdf_to_text(
        &self,
        document: &DocumentHandle,
        options: TextOptions,
        progress: &Progress<'_>,
    ) -> Result<TransformResult> {
        progress.report(0);
        let parsed = self.reader.parse(document.bytes(), document.display_name())?;
        let page_count = parsed.page_count();

        let mut pages = Vec::with_capacity(page_count as usize);
        for index in 0..page_count {
            let fragments = parsed.text_content(index)?;
            let text = reconstruct_page_text(
                &fragments,
                options.preserve_line_breaks,
                self.config.line_break_threshold,
            );
            pages.push(PageText {
                number: index + 1,
                text,
            });

            progress.report_fraction(0, 80, index as usize + 1, page_count as usize);
            tokio::task::yield_now().await;
        }

        let full_text = pages
            .iter()
            .map(|page| {
                if options.include_page_numbers {
                    format!("--- Page {} ---\n\n{}", page.number, page.text)
                } else {
                    page.text.clone()
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        let words = word_count(&full_text);
        progress.report(90);
        debug!(words, "text extracted");

        let base = document.base_name();
        let (bytes, name, media_type, rtf_fallback) = match options.format {
            TextFormat::Plain => (
                full_text.into_bytes(),
                format!("{base}.txt"),
                TEXT_MEDIA_TYPE,
                false,
            ),
            TextFormat::Docx => match self.rich_writer.as_deref().map(|w| w.write_document(&pages)) {
                Some(Ok(bytes)) => (bytes, format!("{base}.docx"), DOCX_MEDIA_TYPE, false),
                failed => {
                    if let Some(Err(e)) = failed {
                        warn!("Word output failed, writing RTF instead: {e}");
                    }
                    (
                        render_rtf(&full_text).into_bytes(),
                        format!("{base}.rtf"),
                        RTF_MEDIA_TYPE,
                        true,
                    )
                }
            },
        };

        let mut label = format!("{page_count} pages, ~{words} words");
        if rtf_fallback {
            label.push_str(" (saved as RTF)");
        }
        debug!(size = %format_file_size(bytes.len() as u64), "text document written");

        Ok(TransformResult::new(
            bytes,
            name,
            media_type,
            TransformSummary {
                label,
                page_count,
                word_count: Some(words),
                rtf_fallback,
                ..Default::default()
            },
        ))
    }
}
