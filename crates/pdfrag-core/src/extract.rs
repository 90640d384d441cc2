//! PDF to plain text.

use std::path::Path;

use crate::error::{Error, Result};

/// Extract the text layer of every page, in page order.
///
/// Each page that yields text contributes its text followed by a newline.
/// Pages without a text layer (scans) contribute nothing.
pub fn pdf_to_text(path: &Path) -> Result<String> {
    // pdf-extract panics on some malformed font tables; treat that as a parse failure.
    let pages = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| pdf_extract::extract_text_by_pages(path)))
        .map_err(|panic| Error::Pdf { path: path.to_path_buf(), reason: panic_message(panic.as_ref()) })?
        .map_err(|e| Error::Pdf { path: path.to_path_buf(), reason: e.to_string() })?;
    tracing::debug!(path = %path.display(), pages = pages.len(), "extracted pdf pages");
    Ok(pages_to_text(&pages))
}

pub fn pages_to_text<S: AsRef<str>>(pages: &[S]) -> String {
    let mut full_text = String::new();
    for page in pages {
        let page = page.as_ref();
        if page.trim().is_empty() {
            continue;
        }
        full_text.push_str(page);
        full_text.push('\n');
    }
    full_text
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "pdf parser panicked".to_string()
    }
}
