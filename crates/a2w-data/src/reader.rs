//! JSON export discovery and record extraction.
//!
//! Finds A2W `.json` exports in a directory and turns each one into an
//! ordered list of [`TimeValueRecord`]s.

use std::path::{Path, PathBuf};

use a2w_core::error::{ConvertError, Result};
use a2w_core::models::{FieldNames, TimeValueRecord};
use a2w_core::timestamps::TimestampParser;
use serde_json::Value;
use tracing::{debug, warn};

const SHAPE_HINT: &str = "expected a top-level array or an object with a \"values\" array";

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.json` files in `dir`, sorted by path.
///
/// Only the directory itself is scanned unless `recursive` is set. A missing
/// or unreadable `dir` is a [`ConvertError::Directory`]; an empty one is not
/// an error.
pub fn find_json_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let directory_error = |source: std::io::Error| ConvertError::Directory {
        path: dir.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(dir).map_err(directory_error)?;
    if !metadata.is_dir() {
        return Err(directory_error(std::io::Error::other("not a directory")));
    }
    // Surface permission problems before walking.
    std::fs::read_dir(dir).map_err(directory_error)?;

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in walkdir::WalkDir::new(dir)
        .follow_links(true)
        .max_depth(max_depth)
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                if e.depth() == 0 {
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
                    return Err(directory_error(source));
                }
                warn!("Skipping unreadable entry under {}: {}", dir.display(), e);
                continue;
            }
        };

        if entry.file_type().is_file() && is_json(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    debug!("Found {} JSON files in {}", files.len(), dir.display());
    Ok(files)
}

/// Read `path` and extract its time-series records in source order.
pub fn read_series(path: &Path, fields: &FieldNames) -> Result<Vec<TimeValueRecord>> {
    let bytes = std::fs::read(path).map_err(|source| ConvertError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let document: Value = serde_json::from_slice(&bytes).map_err(|source| ConvertError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    extract_records(&document, path, fields)
}

/// Extract records from an already-parsed export document.
///
/// Every entry yields exactly one record; an entry without a value becomes a
/// record with a null value. The first malformed entry fails the whole file.
pub fn extract_records(
    document: &Value,
    path: &Path,
    fields: &FieldNames,
) -> Result<Vec<TimeValueRecord>> {
    let entries = locate_entries(document).map_err(|reason| ConvertError::Shape {
        path: path.to_path_buf(),
        reason,
    })?;

    let records = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            entry_to_record(entry, fields).map_err(|reason| ConvertError::Record {
                path: path.to_path_buf(),
                index,
                reason,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("{}: {} records", path.display(), records.len());
    Ok(records)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Find the array of time-series entries inside the document.
fn locate_entries(document: &Value) -> std::result::Result<&Vec<Value>, String> {
    match document {
        Value::Array(entries) => Ok(entries),
        Value::Object(map) => match map.get("values") {
            Some(Value::Array(entries)) => Ok(entries),
            Some(other) => Err(format!(
                "\"values\" is {}, not an array",
                json_type_name(other)
            )),
            None => Err(SHAPE_HINT.to_string()),
        },
        other => Err(format!("{}, found {}", SHAPE_HINT, json_type_name(other))),
    }
}

/// Convert one entry, either `{"time": .., "value": ..}` or `[time, value, ..]`.
fn entry_to_record(
    entry: &Value,
    fields: &FieldNames,
) -> std::result::Result<TimeValueRecord, String> {
    let (raw_time, raw_value) = match entry {
        Value::Object(map) => {
            let time = map
                .get(&fields.time)
                .ok_or_else(|| format!("missing timestamp field \"{}\"", fields.time))?;
            (time, map.get(&fields.value))
        }
        Value::Array(items) => {
            let time = items
                .first()
                .ok_or_else(|| "empty entry array".to_string())?;
            (time, items.get(1))
        }
        other => {
            return Err(format!(
                "expected an object or an array, found {}",
                json_type_name(other)
            ))
        }
    };

    let timestamp = TimestampParser::parse(raw_time)
        .ok_or_else(|| format!("unparseable timestamp {}", raw_time))?;
    let value = parse_value(raw_value)?;

    Ok(TimeValueRecord::new(timestamp, value))
}

fn parse_value(raw: Option<&Value>) -> std::result::Result<Option<f64>, String> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| format!("value {} is not representable as f64", n)),
        Some(other) => Err(format!(
            "value must be a number or null, found {} {}",
            json_type_name(other),
            other
        )),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn extract(document: Value) -> Result<Vec<TimeValueRecord>> {
        extract_records(&document, Path::new("test.json"), &FieldNames::default())
    }

    // ── find_json_files ───────────────────────────────────────────────────────

    #[test]
    fn test_find_json_files_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "c.json", "[]");
        write_file(dir.path(), "a.json", "[]");
        write_file(dir.path(), "b.JSON", "[]");
        write_file(dir.path(), "notes.txt", "");
        write_file(dir.path(), "a.xlsx", "");

        let files = find_json_files(dir.path(), false).unwrap();
        let names: Vec<&str> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.json", "b.JSON", "c.json"]);
    }

    #[test]
    fn test_find_json_files_not_recursive_by_default() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("archive");
        std::fs::create_dir_all(&sub).unwrap();
        write_file(dir.path(), "top.json", "[]");
        write_file(&sub, "nested.json", "[]");

        assert_eq!(find_json_files(dir.path(), false).unwrap().len(), 1);
        assert_eq!(find_json_files(dir.path(), true).unwrap().len(), 2);
    }

    #[test]
    fn test_find_json_files_ignores_json_named_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("old.json")).unwrap();

        assert!(find_json_files(dir.path(), false).unwrap().is_empty());
    }

    #[test]
    fn test_find_json_files_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(find_json_files(dir.path(), false).unwrap().is_empty());
    }

    #[test]
    fn test_find_json_files_missing_directory() {
        let err = find_json_files(Path::new("/tmp/does-not-exist-a2w-test-xyz"), false)
            .unwrap_err();
        assert!(matches!(err, ConvertError::Directory { .. }));
    }

    #[test]
    fn test_find_json_files_path_is_a_file() {
        let dir = TempDir::new().unwrap();
        let file = write_file(dir.path(), "a.json", "[]");
        let err = find_json_files(&file, false).unwrap_err();
        assert!(matches!(err, ConvertError::Directory { .. }));
    }

    // ── read_series ───────────────────────────────────────────────────────────

    #[test]
    fn test_read_series_scenario() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            dir.path(),
            "KANS.Flow-In.Ave.1Day.1Day.json",
            r#"[{"time":"2025-01-01T00:00:00Z","value":120.5},{"time":"2025-01-02T00:00:00Z","value":null}]"#,
        );

        let records = read_series(&path, &FieldNames::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].timestamp.to_rfc3339(), "2025-01-01T00:00:00+00:00");
        assert_eq!(records[0].value, Some(120.5));
        assert_eq!(records[1].timestamp.to_rfc3339(), "2025-01-02T00:00:00+00:00");
        assert_eq!(records[1].value, None);
    }

    #[test]
    fn test_read_series_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "bad.json", "{not valid json");

        let err = read_series(&path, &FieldNames::default()).unwrap_err();
        assert!(matches!(err, ConvertError::Json { .. }));
    }

    #[test]
    fn test_read_series_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_series(&dir.path().join("gone.json"), &FieldNames::default()).unwrap_err();
        assert!(matches!(err, ConvertError::FileRead { .. }));
    }

    // ── extract_records ───────────────────────────────────────────────────────

    #[test]
    fn test_extract_preserves_source_order() {
        let records = extract(json!([
            {"time": "2025-01-03T00:00:00Z", "value": 3.0},
            {"time": "2025-01-01T00:00:00Z", "value": 1.0},
            {"time": "2025-01-02T00:00:00Z", "value": 2.0},
        ]))
        .unwrap();

        let values: Vec<Option<f64>> = records.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![Some(3.0), Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_extract_missing_value_field_is_null() {
        let records = extract(json!([
            {"time": "2025-01-01T00:00:00Z"},
            {"time": "2025-01-02T00:00:00Z", "value": 7},
        ]))
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value, None);
        assert_eq!(records[1].value, Some(7.0));
    }

    #[test]
    fn test_extract_values_object_with_pairs() {
        let records = extract(json!({
            "name": "KANS.Flow-In.Ave.1Day.1Day",
            "units": "cfs",
            "values": [
                ["2025-01-01T00:00:00-06:00", 3.5, 0],
                [1_735_776_000_000_i64, null, 5],
                ["2025-01-03T00:00:00-06:00"],
            ]
        }))
        .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].value, Some(3.5));
        assert_eq!(records[0].timestamp.naive_local().to_string(), "2025-01-01 00:00:00");
        assert_eq!(records[1].timestamp.to_rfc3339(), "2025-01-02T00:00:00+00:00");
        assert_eq!(records[1].value, None);
        assert_eq!(records[2].value, None);
    }

    #[test]
    fn test_extract_field_names_are_case_sensitive() {
        let err = extract(json!([{"Time": "2025-01-01T00:00:00Z", "value": 1}])).unwrap_err();
        match err {
            ConvertError::Record { index, reason, .. } => {
                assert_eq!(index, 0);
                assert!(reason.contains("\"time\""));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extract_custom_field_names() {
        let fields = FieldNames {
            time: "date-time".to_string(),
            value: "flow".to_string(),
        };
        let document = json!([{"date-time": "2025-01-01T00:00:00Z", "flow": 42.0}]);
        let records = extract_records(&document, Path::new("x.json"), &fields).unwrap();
        assert_eq!(records[0].value, Some(42.0));
    }

    #[test]
    fn test_extract_bad_timestamp_names_entry() {
        let err = extract(json!([
            {"time": "2025-01-01T00:00:00Z", "value": 1},
            {"time": "not a date", "value": 2},
        ]))
        .unwrap_err();
        match err {
            ConvertError::Record { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extract_non_numeric_value_rejected() {
        let err = extract(json!([{"time": "2025-01-01T00:00:00Z", "value": "high"}])).unwrap_err();
        assert!(matches!(err, ConvertError::Record { .. }));
    }

    #[test]
    fn test_extract_unexpected_shapes() {
        for document in [
            json!({"data": []}),
            json!({"values": "nope"}),
            json!("just a string"),
            json!(12),
        ] {
            let err = extract(document).unwrap_err();
            assert!(matches!(err, ConvertError::Shape { .. }), "got {err}");
        }
    }

    #[test]
    fn test_extract_scalar_entry_rejected() {
        let err = extract(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ConvertError::Record { index: 0, .. }));
    }

    #[test]
    fn test_extract_empty_array_is_ok() {
        assert!(extract(json!([])).unwrap().is_empty());
        assert!(extract(json!({"values": []})).unwrap().is_empty());
    }
}
