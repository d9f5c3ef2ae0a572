use bson::Document as BsonDocument;
use std::io::Read;

use super::options::{ImportOptions, ImportReport};
use super::util::{field_to_bson, open_sidecar, record_error};
use crate::errors::DbError;

/// Reads CSV rows into documents keyed by the header row, or `field_N`
/// without headers.
pub fn read_csv<R: Read>(
    reader: R,
    opts: &ImportOptions,
    report: &mut ImportReport,
) -> Result<Vec<BsonDocument>, DbError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(opts.csv.has_headers)
        .delimiter(opts.csv.delimiter)
        .from_reader(reader);
    let headers: Vec<String> = if opts.csv.has_headers {
        rdr.headers()?.iter().map(|h| h.trim_start_matches('\u{feff}').to_string()).collect()
    } else {
        Vec::new()
    };
    let mut sidecar = open_sidecar(opts)?;
    let mut docs = Vec::new();
    let mut row_no: u64 = 0;
    for rec in rdr.records() {
        row_no += 1;
        let rec = match rec {
            Ok(r) => r,
            Err(e) if opts.skip_errors => {
                log::warn!("skipping row {row_no}: {e}");
                record_error(sidecar.as_mut(), row_no, &e.to_string(), None)?;
                report.skipped += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let mut map = BsonDocument::new();
        for (i, field) in rec.iter().enumerate() {
            let key = headers.get(i).cloned().unwrap_or_else(|| format!("field_{i}"));
            map.insert(key, field_to_bson(field, opts.csv.type_infer));
        }
        docs.push(map);
    }
    Ok(docs)
}
