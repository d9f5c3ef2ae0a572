//! Format detection heuristics for import.

use std::io::{self, BufRead};
use std::path::Path;

use super::ImportFormat;

/// Picks a concrete format from the file extension, falling back to a peek
/// at the first bytes (a leading `{` or `[` means JSON, anything else CSV).
pub fn detect_format<R: BufRead>(reader: &mut R, path: &Path) -> io::Result<ImportFormat> {
    if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
        match ext.to_lowercase().as_str() {
            "jsonl" | "ndjson" | "json" => return Ok(ImportFormat::Ndjson),
            "csv" | "tsv" => return Ok(ImportFormat::Csv),
            _ => {}
        }
    }
    let buf = reader.fill_buf()?; // peek without consuming
    let s = String::from_utf8_lossy(&buf[..buf.len().min(256)]);
    let head = s.trim_start_matches('\u{feff}').trim_start();
    if head.starts_with('{') || head.starts_with('[') {
        return Ok(ImportFormat::Ndjson);
    }
    Ok(ImportFormat::Csv)
}
