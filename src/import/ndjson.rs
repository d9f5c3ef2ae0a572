use bson::Document as BsonDocument;
use std::io::{BufRead, BufReader, Read};

use super::options::{ImportOptions, ImportReport};
use super::util::{open_sidecar, record_error};
use crate::errors::DbError;

fn to_document(v: &serde_json::Value) -> Result<BsonDocument, DbError> {
    if !v.is_object() {
        return Err(DbError::InvalidArgument(format!("expected a JSON object, got {v}")));
    }
    Ok(bson::serialize_to_document(v)?)
}

/// Reads newline-delimited JSON objects, or a single JSON array of objects
/// when the input starts with `[`.
pub fn read_ndjson<R: Read>(
    reader: R,
    opts: &ImportOptions,
    report: &mut ImportReport,
) -> Result<Vec<BsonDocument>, DbError> {
    let mut reader = BufReader::new(reader);
    let array_mode = reader.fill_buf()?.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'[');
    let mut sidecar = open_sidecar(opts)?;
    let mut docs = Vec::new();

    if array_mode {
        let mut s = String::new();
        reader.read_to_string(&mut s)?;
        let val: serde_json::Value = serde_json::from_str(&s)?;
        let arr = val
            .as_array()
            .ok_or_else(|| DbError::InvalidArgument("expected a JSON array".into()))?;
        for (i, v) in arr.iter().enumerate() {
            match to_document(v) {
                Ok(d) => docs.push(d),
                Err(e) if opts.skip_errors => {
                    record_error(sidecar.as_mut(), i as u64 + 1, &e.to_string(), None)?;
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        return Ok(docs);
    }

    let mut line_no: u64 = 0;
    let mut buf = String::with_capacity(8 * 1024);
    loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim();
        if line.is_empty() {
            continue;
        }
        let parsed = serde_json::from_str::<serde_json::Value>(line)
            .map_err(DbError::from)
            .and_then(|v| to_document(&v));
        match parsed {
            Ok(d) => docs.push(d),
            Err(e) if opts.skip_errors => {
                log::warn!("skipping line {line_no}: {e}");
                record_error(sidecar.as_mut(), line_no, &e.to_string(), Some(line))?;
                report.skipped += 1;
            }
            Err(e) => {
                log::error!("line {line_no}: {e}");
                return Err(e);
            }
        }
    }
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_lines_and_skips_bad_ones() {
        let input = "{\"id\":1}\n\nnot json\n[1,2]\n{\"id\":2,\"price\":20.5}\n";
        let mut report = ImportReport::default();
        let docs = read_ndjson(input.as_bytes(), &ImportOptions::default(), &mut report).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(docs[1].get_f64("price").unwrap(), 20.5);
    }

    #[test]
    fn strict_mode_stops_at_first_error() {
        let opts = ImportOptions { skip_errors: false, ..Default::default() };
        let mut report = ImportReport::default();
        let err = read_ndjson("{\"id\":1}\n{oops\n".as_bytes(), &opts, &mut report).unwrap_err();
        assert!(matches!(err, DbError::Json(_)));
    }

    #[test]
    fn reads_json_array() {
        let mut report = ImportReport::default();
        let docs =
            read_ndjson(" [{\"id\":1},{\"id\":2}]".as_bytes(), &ImportOptions::default(), &mut report)
                .unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(report.skipped, 0);
    }
}
