//! Utilities for path collection, output naming and size formatting.

use crate::Result;
use anyhow::Context;
use std::io;
use std::path::PathBuf;

/// Base name used when a display name has nothing left after stripping.
pub const DEFAULT_BASE_NAME: &str = "document";

/// Expand multiple glob patterns into filesystem paths.
///
/// Accepts anything iterable with items that convert to `&str`, e.g.:
/// `&[&str]`, `Vec<String>`, or `Vec<&str>`. Paths keep the order of the
/// patterns; within one pattern they come in glob order.
///
/// Errors:
/// - Invalid patterns and unreadable matches are reported as `Other`.
/// - A literal path (no wildcards) that does not exist is reported as
///   not found instead of silently expanding to nothing.
pub fn collect_paths_for_patterns<T>(patterns: T) -> Result<Vec<PathBuf>>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut resolved_paths = Vec::new();

    for pattern in patterns.into_iter() {
        let pattern = pattern.as_ref();
        let paths = collect_paths_for_pattern(pattern)?;

        if paths.is_empty() && !has_wildcards(pattern) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {pattern}"),
            )
            .into());
        }
        resolved_paths.extend(paths);
    }

    Ok(resolved_paths)
}

fn collect_paths_for_pattern(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern).with_context(|| format!("invalid pattern '{pattern}'"))?;

    paths
        .map(|entry| entry.with_context(|| format!("cannot read a match of '{pattern}'")))
        .collect()
}

fn has_wildcards(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Format file size as human-readable string.
///
/// # Examples
///
/// ```
/// use pdfworks::utils::format_file_size;
///
/// assert_eq!(format_file_size(1536), "1.50 KB");
/// ```
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}

/// Strip a trailing `.pdf` (any case) from a display name.
///
/// Falls back to [`DEFAULT_BASE_NAME`] when nothing is left.
pub fn base_file_name(display_name: &str) -> String {
    let name = display_name.trim();
    let stem = match name.len().checked_sub(4) {
        Some(cut) if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".pdf") => {
            &name[..cut]
        }
        _ => name,
    };

    if stem.is_empty() {
        DEFAULT_BASE_NAME.to_string()
    } else {
        stem.to_string()
    }
}

/// `{base}{suffix}.{extension}`.
pub fn suffixed_name(base: &str, suffix: &str, extension: &str) -> String {
    format!("{base}{suffix}.{extension}")
}

/// Count whitespace-separated tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
