// Primitives for reading and writing the monthly TSV files.

use std::fs;
use std::io::Read;
use std::path::Path;

use log::{debug, warn};
use snafu::prelude::*;

use crate::dashboard::*;

/// The columns of the monthly files, in order. The files have no header.
pub const COLUMN_NAMES: [&str; 11] = [
    "wiki_db",
    "project",
    "country",
    "country_code",
    "activity_level",
    "count_eps",
    "sum_eps",
    "count_release_thresh",
    "editors",
    "edits",
    "month",
];

/// Reads a month file from disk.
pub fn read_month_file(path: &Path) -> GeoResult<Vec<EditorCountRow>> {
    let path_s = path.display().to_string();
    let file = fs::File::open(path).context(OpeningFileSnafu {
        path: path_s.clone(),
    })?;
    read_rows(file, &path_s)
}

/// Reads rows in the dataset format. `origin` is only used for messages.
pub fn read_rows<R: Read>(input: R, origin: &str) -> GeoResult<Vec<EditorCountRow>> {
    let rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(input);
    let mut res: Vec<EditorCountRow> = Vec::new();
    let mut not_numeric: usize = 0;
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = (idx + 1) as u64;
        let line = line_r.context(TsvReadSnafu {
            path: origin,
            lineno,
        })?;
        // Trailing empty lines.
        if line.len() == 1 && line.get(0).map(|s| s.trim().is_empty()).unwrap_or(false) {
            continue;
        }
        let row = record_to_row(&line, origin, lineno)?;
        if row.editors == EditorCount::Missing {
            warn!(
                "read_rows: {}:{}: editors value {:?} is not a number",
                origin,
                lineno,
                line.get(8).unwrap_or("")
            );
            not_numeric += 1;
        }
        res.push(row);
    }
    debug!(
        "read_rows: {}: {} rows, {} with a non-numeric editors value",
        origin,
        res.len(),
        not_numeric
    );
    Ok(res)
}

fn record_to_row(line: &csv::StringRecord, origin: &str, lineno: u64) -> GeoResult<EditorCountRow> {
    ensure!(
        line.len() >= COLUMN_NAMES.len(),
        TsvLineTooShortSnafu {
            path: origin,
            lineno,
            found: line.len(),
            expected: COLUMN_NAMES.len(),
        }
    );
    let field = |idx: usize| line.get(idx).unwrap_or("").to_string();
    let month_s = field(10);
    let month = month_s.parse::<YearMonth>().context(TsvMonthSnafu {
        path: origin,
        lineno,
    })?;
    Ok(EditorCountRow {
        wiki_db: field(0),
        project: field(1),
        country: field(2),
        country_code: field(3).trim().to_string(),
        activity_level: field(4),
        count_eps: parse_u64(&field(5)),
        sum_eps: field(6).trim().parse::<f64>().ok(),
        count_release_thresh: parse_u64(&field(7)),
        editors: EditorCount::parse(&field(8)),
        edits: parse_u64(&field(9)),
        month,
    })
}

fn parse_u64(s: &str) -> Option<u64> {
    let t = s.trim();
    match t.parse::<u64>() {
        Ok(x) => Some(x),
        Err(_) => match t.parse::<f64>() {
            Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => Some(f as u64),
            _ => None,
        },
    }
}

fn opt_to_raw<T: ToString>(x: &Option<T>) -> String {
    x.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

fn row_to_record(r: &EditorCountRow) -> [String; 11] {
    [
        r.wiki_db.clone(),
        r.project.clone(),
        r.country.clone(),
        r.country_code.clone(),
        r.activity_level.clone(),
        opt_to_raw(&r.count_eps),
        opt_to_raw(&r.sum_eps),
        opt_to_raw(&r.count_release_thresh),
        r.editors.to_raw(),
        opt_to_raw(&r.edits),
        r.month.to_string(),
    ]
}

/// Writes a month file. The rows are first written to a temporary file next to
/// the target, which is then renamed: a reader never sees a partial month.
pub fn write_month_file(path: &Path, rows: &[EditorCountRow]) -> GeoResult<()> {
    let path_s = path.display().to_string();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context(WritingFileSnafu {
            path: parent.display().to_string(),
        })?;
    }
    let tmp_p = path.with_extension("tsv.tmp");
    let res = write_records(&tmp_p, rows)
        .and_then(|_| fs::rename(&tmp_p, path).context(WritingFileSnafu { path: path_s }));
    if res.is_err() && tmp_p.exists() {
        debug!("write_month_file: removing {:?}", tmp_p);
        if let Err(e) = fs::remove_file(&tmp_p) {
            warn!("write_month_file: could not remove {:?}: {}", tmp_p, e);
        }
    }
    res
}

fn write_records(tmp_p: &Path, rows: &[EditorCountRow]) -> GeoResult<()> {
    let tmp_s = tmp_p.display().to_string();
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(tmp_p)
        .context(TsvWriteSnafu {
            path: tmp_s.clone(),
        })?;
    for r in rows.iter() {
        wtr.write_record(row_to_record(r).iter())
            .context(TsvWriteSnafu {
                path: tmp_s.clone(),
            })?;
    }
    wtr.flush().context(WritingFileSnafu { path: tmp_s })?;
    Ok(())
}
