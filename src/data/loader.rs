use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::coerce::{self, clean_cell, clean_header};
use super::derive::{derive, derived_columns};
use super::model::{Dataset, Record, Value};
use super::schema::{Capabilities, ColumnKind, Domain, Schema};

// ---------------------------------------------------------------------------
// Inputs and outcome
// ---------------------------------------------------------------------------

/// One CSV input: a file on disk or bytes handed over by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Path(PathBuf),
    Memory { name: String, bytes: Vec<u8> },
}

impl Source {
    pub fn name(&self) -> String {
        match self {
            Source::Path(p) => p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.display().to_string()),
            Source::Memory { name, .. } => name.clone(),
        }
    }
}

/// A file that could not be read; the load skips it and carries on.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV in {name}: {source}")]
    Csv {
        name: String,
        #[source]
        source: csv::Error,
    },
    #[error("{name} has no header row")]
    Empty { name: String },
}

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Year ages are computed against.
    pub reference_year: i32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            reference_year: 2025,
        }
    }
}

/// Everything a load produced. `dataset` is `None` when there was nothing to
/// load at all (no sources, or every source failed).
#[derive(Debug)]
pub struct LoadReport {
    pub domain: Domain,
    pub dataset: Option<Dataset>,
    pub capabilities: Capabilities,
    /// Names of the sources that were read successfully.
    pub files: Vec<String>,
    pub warnings: Vec<LoadError>,
    pub duplicates_removed: usize,
    pub undated_dropped: usize,
}

impl LoadReport {
    fn no_data(domain: Domain, warnings: Vec<LoadError>) -> Self {
        LoadReport {
            domain,
            dataset: None,
            capabilities: Capabilities::empty(domain),
            files: Vec::new(),
            warnings,
            duplicates_removed: 0,
            undated_dropped: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// The sources a load would read: the uploads if there are any, otherwise
/// whatever the default path resolves to.
pub fn resolve_sources(domain: Domain, uploads: &[Source], default_path: &Path) -> Vec<Source> {
    if !uploads.is_empty() {
        return uploads.to_vec();
    }
    default_sources(default_path).unwrap_or_else(|e| {
        log::warn!("{domain}: default data unavailable: {e:#}");
        Vec::new()
    })
}

/// Resolve a default path: a single file, or every `*.csv` in a directory
/// sorted by name. A path that does not exist resolves to no sources.
pub fn default_sources(path: &Path) -> Result<Vec<Source>> {
    if path.is_dir() {
        let mut files: Vec<PathBuf> = std::fs::read_dir(path)
            .with_context(|| format!("listing {}", path.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
            })
            .collect();
        files.sort();
        Ok(files.into_iter().map(Source::Path).collect())
    } else if path.is_file() {
        Ok(vec![Source::Path(path.to_path_buf())])
    } else {
        Ok(Vec::new())
    }
}

/// Load and merge `sources` in order.
///
/// Malformed files are skipped and recorded in [`LoadReport::warnings`].
pub fn load_sources(domain: Domain, sources: &[Source], options: LoadOptions) -> LoadReport {
    let schema = domain.schema();
    let mut tables = Vec::with_capacity(sources.len());
    let mut warnings = Vec::new();

    for source in sources {
        match read_table(source, schema) {
            Ok(table) => {
                log::info!(
                    "{domain}: read {} rows from {} ({} columns)",
                    table.rows.len(),
                    table.name,
                    table.headers.len()
                );
                tables.push(table);
            }
            Err(e) => {
                log::warn!("{domain}: skipping file: {e}");
                warnings.push(e);
            }
        }
    }

    if tables.is_empty() {
        return LoadReport::no_data(domain, warnings);
    }

    let files = tables.iter().map(|t| t.name.clone()).collect();
    let merged = merge(tables);
    let (rows, duplicates_removed) = dedup(schema, &merged.columns, merged.rows);
    if duplicates_removed > 0 {
        log::info!("{domain}: removed {duplicates_removed} duplicate rows");
    }

    let mut records = coerce_rows(schema, &merged.columns, &rows);
    for rec in &mut records {
        derive(domain, rec, options.reference_year);
    }

    let mut undated_dropped = 0;
    if domain == Domain::Enquiry && merged.columns.iter().any(|c| c == "Enquiry Date") {
        let before = records.len();
        records.retain(|r| !r.get("Enquiry Date").is_null());
        undated_dropped = before - records.len();
        if undated_dropped > 0 {
            log::warn!("{domain}: dropped {undated_dropped} rows without a parsable enquiry date");
        }
    }

    let mut columns = merged.columns;
    for derived in derived_columns(domain) {
        if !columns.iter().any(|c| c == *derived) {
            columns.push(derived.to_string());
        }
    }

    let capabilities = schema.check(columns.iter().map(String::as_str));
    if !capabilities.missing.is_empty() {
        log::info!("{domain}: columns not provided: {:?}", capabilities.missing);
    }

    LoadReport {
        domain,
        dataset: Some(Dataset::new(records, columns)),
        capabilities,
        files,
        warnings,
        duplicates_removed,
        undated_dropped,
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

type RawRow = BTreeMap<String, Option<String>>;

struct RawTable {
    name: String,
    headers: Vec<String>,
    rows: Vec<RawRow>,
}

struct Merged {
    columns: Vec<String>,
    rows: Vec<RawRow>,
}

/// Parse one source with a strict field count, cleaning export artifacts
/// and resolving column aliases.
fn read_table(source: &Source, schema: &Schema) -> Result<RawTable, LoadError> {
    let name = source.name();
    let reader: Box<dyn Read + '_> = match source {
        Source::Path(p) => Box::new(File::open(p).map_err(|e| LoadError::Io {
            name: name.clone(),
            source: e,
        })?),
        Source::Memory { bytes, .. } => Box::new(bytes.as_slice()),
    };
    let csv_err = |e| LoadError::Csv {
        name: name.clone(),
        source: e,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let cleaned: Vec<String> = rdr
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| clean_header(h.trim_start_matches('\u{feff}')))
        .collect();
    if cleaned.iter().all(String::is_empty) {
        return Err(LoadError::Empty { name: name.clone() });
    }
    let headers: Vec<String> = cleaned
        .iter()
        .map(|h| schema.canonical_name(h, &cleaned).to_string())
        .collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(csv_err)?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(h, cell)| (h.clone(), clean_cell(cell)))
            .collect();
        rows.push(row);
    }

    Ok(RawTable {
        name,
        headers,
        rows,
    })
}

/// Concatenate tables in arrival order; columns are the first-seen union.
fn merge(tables: Vec<RawTable>) -> Merged {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    let mut rows = Vec::new();
    for table in tables {
        for h in &table.headers {
            if seen.insert(h.clone()) {
                columns.push(h.clone());
            }
        }
        rows.extend(table.rows);
    }
    Merged { columns, rows }
}

/// Keep the first row for each key value. A missing key counts as one more
/// value, so only the first row without a key survives.
fn dedup(schema: &Schema, columns: &[String], rows: Vec<RawRow>) -> (Vec<RawRow>, usize) {
    let Some(key) = schema.key.filter(|k| columns.iter().any(|c| c == k)) else {
        return (rows, 0);
    };
    let before = rows.len();
    let mut seen: HashSet<Option<String>> = HashSet::new();
    let kept: Vec<RawRow> = rows
        .into_iter()
        .filter(|row| seen.insert(row.get(key).cloned().flatten()))
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}

/// Turn raw cells into typed values, column by column.
fn coerce_rows(schema: &Schema, columns: &[String], rows: &[RawRow]) -> Vec<Record> {
    let mut records = vec![Record::new(); rows.len()];

    for column in columns {
        let cells: Vec<Option<String>> = rows
            .iter()
            .map(|r| r.get(column).cloned().flatten())
            .collect();

        let values: Vec<Value> = match schema.column(column).map(|c| c.kind) {
            Some(ColumnKind::StampedDate) => coerce::parse_stamped_column(&cells),
            kind => cells
                .iter()
                .map(|cell| match cell.as_deref() {
                    None => Value::Null,
                    Some(text) => coerce_cell(kind, text),
                })
                .collect(),
        };

        for (rec, value) in records.iter_mut().zip(values) {
            rec.insert(column.clone(), value);
        }
    }
    records
}

fn coerce_cell(kind: Option<ColumnKind>, text: &str) -> Value {
    let parsed = match kind {
        Some(ColumnKind::Category) => Some(Value::Text(text.to_string())),
        Some(ColumnKind::Date) | Some(ColumnKind::StampedDate) => {
            coerce::parse_date(text).map(Value::Date)
        }
        Some(ColumnKind::Currency) => coerce::parse_currency(text).map(Value::Number),
        Some(ColumnKind::Percentage) => coerce::parse_percentage(text).map(Value::Number),
        None => Some(coerce::guess(text)),
    };
    parsed.unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn memory(name: &str, text: &str) -> Source {
        Source::Memory {
            name: name.to_string(),
            bytes: text.as_bytes().to_vec(),
        }
    }

    fn load(domain: Domain, sources: &[Source]) -> LoadReport {
        load_sources(domain, sources, LoadOptions::default())
    }

    fn load_with_default(domain: Domain, uploads: &[Source], default_path: &Path) -> LoadReport {
        load(domain, &resolve_sources(domain, uploads, default_path))
    }

    #[test]
    fn duplicate_enquiries_keep_first_file() {
        let a = memory("a.csv", "Enquiry No.,Enquiry Date,College\nE1,20-Feb-2025 10:00,North\n");
        let b = memory(
            "b.csv",
            "Enquiry No.,Enquiry Date,College\nE1,20-Feb-2025 11:00,South\nE2,21-Feb-2025 09:00,South\n",
        );
        let report = load(Domain::Enquiry, &[a, b]);
        let ds = report.dataset.unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(report.duplicates_removed, 1);
        let first = &ds.records[0];
        assert_eq!(first.get("Enquiry No."), &Value::from("E1"));
        assert_eq!(first.get("College"), &Value::from("North"));
        assert_eq!(first.get("Enquiry Date").as_date().unwrap().hour(), 10);
        assert_eq!(first.get("Hour"), &Value::Number(10.0));
    }

    #[test]
    fn rows_without_enquiry_number_collapse_to_first() {
        let text = "Enquiry No.,Enquiry Date,College\n\
                    ,20-Feb-2025 10:00,North\n\
                    E1,20-Feb-2025 11:00,North\n\
                    ,21-Feb-2025 09:00,South\n";
        let report = load(Domain::Enquiry, &[memory("enq.csv", text)]);
        let ds = report.dataset.unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(report.duplicates_removed, 1);
        assert!(ds.records[0].get("Enquiry No.").is_null());
        assert_eq!(ds.records[0].get("College"), &Value::from("North"));
        assert_eq!(ds.records[1].get("Enquiry No."), &Value::from("E1"));
    }

    #[test]
    fn no_dedup_without_key_column() {
        let text = "College,Specialization\nNorth,CSE\nNorth,CSE\n";
        let report = load(Domain::Enquiry, &[memory("enq.csv", text)]);
        assert_eq!(report.duplicates_removed, 0);
        assert_eq!(report.dataset.unwrap().len(), 2);
    }

    #[test]
    fn malformed_file_is_skipped() {
        let good = memory("good.csv", "Level,College\nUG,North\n");
        let ragged = memory("ragged.csv", "Level,College\nUG,North,extra\n");
        let report = load(Domain::Applicant, &[ragged, good]);

        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(report.warnings[0], LoadError::Csv { .. }));
        assert_eq!(report.files, vec!["good.csv".to_string()]);
        assert_eq!(report.dataset.unwrap().len(), 1);
    }

    #[test]
    fn empty_file_is_reported() {
        let report = load(Domain::Applicant, &[memory("blank.csv", "")]);
        assert!(report.dataset.is_none());
        assert!(matches!(report.warnings[0], LoadError::Empty { .. }));
    }

    #[test]
    fn no_sources_means_no_data() {
        let report = load_with_default(Domain::Admission, &[], Path::new("definitely/not/here.csv"));
        assert!(report.dataset.is_none());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn spreadsheet_artifacts_are_removed() {
        let text = "=\"Allotment Status\",=\"Level\",=\"Discipline\",=\"College\"\n\
                    =\"Allotted\",=\"UG\",=\"Physics\",=\"North\"\n";
        let report = load(Domain::Applicant, &[memory("export.csv", text)]);
        assert!(report.capabilities.missing_required.is_empty());

        let ds = report.dataset.unwrap();
        assert_eq!(ds.records[0].get("Allotment Status"), &Value::from("Allotted"));
        assert_eq!(ds.records[0].get("College"), &Value::from("North"));
    }

    #[test]
    fn typed_columns_coerce_best_effort() {
        let text = "Date of Admission,Date of Birth,enquiry date,Family Annual Income,Prequalification Percentage,Gender\n\
                    2025-07-10,2006-08-01,2025-06-30,\"2,50,000\",78.5%,Male\n\
                    garbage,,2025-06-30,unknown,n/a,Female\n";
        let report = load(Domain::Admission, &[memory("adm.csv", text)]);
        let ds = report.dataset.unwrap();

        let ok = &ds.records[0];
        assert_eq!(ok.get("Family Annual Income"), &Value::Number(250000.0));
        assert_eq!(ok.get("Prequalification Percentage"), &Value::Number(78.5));
        assert_eq!(ok.get("Age"), &Value::Number(19.0));
        assert_eq!(ok.get("Days_to_Admission"), &Value::Number(10.0));

        let bad = &ds.records[1];
        assert!(bad.get("Date of Admission").is_null());
        assert!(bad.get("Family Annual Income").is_null());
        assert!(bad.get("Month").is_null());
        assert!(bad.get("Days_to_Admission").is_null());
        assert_eq!(bad.get("Gender"), &Value::from("Female"));
    }

    #[test]
    fn legacy_headers_are_aliased() {
        let text = "Date of Joining,State,Guardian Annual Income\n2025-07-01,Kerala,100000\n";
        let report = load(Domain::Admission, &[memory("new.csv", text)]);

        assert!(report.capabilities.has("Date of Admission"));
        assert!(report.capabilities.has("erp20may_State"));
        let ds = report.dataset.unwrap();
        assert_eq!(ds.records[0].get("erp20may_State"), &Value::from("Kerala"));
        assert_eq!(ds.records[0].get("Family Annual Income"), &Value::Number(100000.0));
    }

    #[test]
    fn undated_enquiries_are_dropped() {
        let text = "Enquiry No.,Enquiry Date\nE1,20-Feb-2025 2:40 PM\nE2,someday\n";
        let report = load(Domain::Enquiry, &[memory("enq.csv", text)]);

        assert_eq!(report.undated_dropped, 1);
        assert_eq!(report.dataset.unwrap().len(), 1);
    }

    #[test]
    fn columns_missing_from_one_file_read_as_null() {
        let a = memory("a.csv", "Level,College,Program\nUG,North,B.Sc\n");
        let b = memory("b.csv", "Level,College\nPG,South\n");
        let ds = load(Domain::Applicant, &[a, b]).dataset.unwrap();

        assert!(ds.has_column("Program"));
        assert!(ds.records[1].get("Program").is_null());
    }

    #[test]
    fn default_directory_loads_every_csv() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.csv"), "Level,College\nPG,South\n").unwrap();
        std::fs::write(dir.path().join("a.csv"), "Level,College\nUG,North\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let report = load_with_default(Domain::Applicant, &[], dir.path());
        assert_eq!(report.files, vec!["a.csv".to_string(), "b.csv".to_string()]);
        let ds = report.dataset.unwrap();
        assert_eq!(ds.records[0].get("Level"), &Value::from("UG"));
    }

    #[test]
    fn uploads_take_precedence_over_default_file() {
        let mut default = NamedTempFile::new().unwrap();
        write!(default, "Level,College\nUG,North\nPG,South\n").unwrap();

        let upload = memory("upload.csv", "Level,College\nPhD,East\n");
        let report =
            load_with_default(Domain::Applicant, &[upload], default.path());
        assert_eq!(report.dataset.unwrap().len(), 1);

        let report = load_with_default(Domain::Applicant, &[], default.path());
        assert_eq!(report.dataset.unwrap().len(), 2);
    }
}
