use sha2::{Digest, Sha256};

use crate::params::Window;

/// Deterministic per-job output filename:
/// `{sanitized_dataset}--{short_hash(dataset|window)}.{extension}`.
/// Re-running the same job always targets the same file.
pub fn output_filename(dataset: &str, window: &Window, extension: &str) -> String {
    let stem = sanitize(dataset);
    let hash = short_hash(&format!("{dataset}|{}|{}", window.start, window.end));
    format!("{stem}--{hash}.{extension}")
}

fn sanitize(input: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());
    let mut prev_sep = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '-' | '.') {
            cleaned.push(c);
            prev_sep = false;
        } else if !prev_sep {
            // Collapse runs of anything else into one underscore.
            cleaned.push('_');
            prev_sep = true;
        }
    }
    let mut cleaned = cleaned.trim_matches(&['_', '.'][..]).to_string();
    if cleaned.is_empty() {
        cleaned = "dataset".to_string();
    }
    cleaned.truncate(64);
    cleaned
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
