//! Snapshot files - the in-memory graph as YAML or JSON on disk
//!
//! A snapshot is either one file holding `work_centers`, `items` and `boms`,
//! or a directory of such files whose sections are concatenated.

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::entities::{Bom, Item, WorkCenter};

/// Items, BOMs and work centers as handed over by the owning system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub work_centers: Vec<WorkCenter>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub boms: Vec<Bom>,
}

impl Snapshot {
    /// Builder helper: add a work center
    pub fn work_center(mut self, wc: WorkCenter) -> Self {
        self.work_centers.push(wc);
        self
    }

    /// Builder helper: add an item
    pub fn item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    /// Builder helper: add a BOM
    pub fn bom(mut self, bom: Bom) -> Self {
        self.boms.push(bom);
        self
    }

    /// Append another snapshot's sections to this one
    pub fn extend(&mut self, other: Snapshot) {
        self.work_centers.extend(other.work_centers);
        self.items.extend(other.items);
        self.boms.extend(other.boms);
    }
}

/// File encoding of a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Yaml,
    Json,
}

impl SnapshotFormat {
    /// Pick the format from a file extension, YAML unless it is `.json`
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SnapshotFormat::Json,
            _ => SnapshotFormat::Yaml,
        }
    }
}

/// Parse error with source location
#[derive(Debug, Error, Diagnostic)]
#[error("Cannot parse snapshot: {message}")]
#[diagnostic(code(bomsim::snapshot::syntax))]
pub struct SnapshotParseError {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    message: String,
}

impl SnapshotParseError {
    fn at(message: String, source: &str, filename: &str, line: usize, column: usize) -> Self {
        let offset = line_col_to_offset(source, line, column);
        let help = generate_help(&message);

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help,
            message,
        }
    }

    fn from_yaml(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));
        Self::at(err.to_string(), source, filename, line, column)
    }

    fn from_json(err: &serde_json::Error, source: &str, filename: &str) -> Self {
        Self::at(err.to_string(), source, filename, err.line().max(1), err.column().max(1))
    }
}

/// Errors reading or writing snapshot files
#[derive(Debug, Error, Diagnostic)]
pub enum SnapshotError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] SnapshotParseError),

    #[error("Snapshot not found: {0}")]
    #[diagnostic(code(bomsim::snapshot::not_found))]
    NotFound(String),

    #[error("Cannot serialize snapshot: {0}")]
    #[diagnostic(code(bomsim::snapshot::serialize))]
    Serialize(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load a snapshot from a file or a directory of files
pub fn load_snapshot(path: &Path) -> Result<Snapshot, SnapshotError> {
    if !path.exists() {
        return Err(SnapshotError::NotFound(path.display().to_string()));
    }

    let snapshot = if path.is_dir() {
        let mut merged = Snapshot::default();
        let mut files: Vec<_> = walkdir::WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                matches!(
                    e.path().extension().and_then(|x| x.to_str()),
                    Some("yaml") | Some("yml") | Some("json")
                )
            })
            .map(|e| e.into_path())
            .collect();
        files.sort();

        for file in files {
            debug!(file = %file.display(), "reading snapshot fragment");
            merged.extend(parse_file(&file)?);
        }
        merged
    } else {
        parse_file(path)?
    };

    info!(
        items = snapshot.items.len(),
        boms = snapshot.boms.len(),
        work_centers = snapshot.work_centers.len(),
        "loaded snapshot from {}",
        path.display()
    );
    Ok(snapshot)
}

/// Parse snapshot text in the given format
pub fn parse_snapshot(
    content: &str,
    format: SnapshotFormat,
    filename: &str,
) -> Result<Snapshot, SnapshotError> {
    if content.trim().is_empty() {
        return Ok(Snapshot::default());
    }
    match format {
        SnapshotFormat::Yaml => serde_yml::from_str(content)
            .map_err(|e| SnapshotParseError::from_yaml(&e, content, filename).into()),
        SnapshotFormat::Json => serde_json::from_str(content)
            .map_err(|e| SnapshotParseError::from_json(&e, content, filename).into()),
    }
}

fn parse_file(path: &Path) -> Result<Snapshot, SnapshotError> {
    let content = fs::read_to_string(path)?;
    parse_snapshot(
        &content,
        SnapshotFormat::from_path(path),
        &path.display().to_string(),
    )
}

/// Render a snapshot in the given format
pub fn render_snapshot(snapshot: &Snapshot, format: SnapshotFormat) -> Result<String, SnapshotError> {
    match format {
        SnapshotFormat::Yaml => {
            serde_yml::to_string(snapshot).map_err(|e| SnapshotError::Serialize(e.to_string()))
        }
        SnapshotFormat::Json => serde_json::to_string_pretty(snapshot)
            .map_err(|e| SnapshotError::Serialize(e.to_string())),
    }
}

/// Write a snapshot, choosing the format from the file extension
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    let content = render_snapshot(snapshot, SnapshotFormat::from_path(path))?;
    fs::write(path, content)?;
    Ok(())
}

/// Convert line/column to byte offset
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let mut line_start = 0;
    for (idx, text) in source.split_inclusive('\n').enumerate() {
        if idx + 1 == line {
            let within = text
                .char_indices()
                .nth(column.saturating_sub(1))
                .map(|(i, _)| i)
                .unwrap_or(text.len().saturating_sub(1));
            return line_start + within;
        }
        line_start += text.len();
    }
    source.len().saturating_sub(1)
}

/// Suggestions for the mistakes people make when hand-editing snapshots
fn generate_help(message: &str) -> Option<String> {
    let msg = message.to_lowercase();

    if msg.contains("unknown variant") && msg.contains("part") && msg.contains("assembly") {
        return Some("Item kind must be `part` or `assembly` (or `P` / `A`)".to_string());
    }
    if msg.contains("unknown variant") && msg.contains("simple") {
        return Some("Complexity must be simple, moderate, complex or part".to_string());
    }
    if msg.contains("missing field `cost_per_min`") {
        return Some("Every work center needs a `cost_per_min` rate".to_string());
    }
    if msg.contains("invalid value") && msg.contains("u32") {
        return Some("Quantities and depths are whole, non-negative numbers".to_string());
    }
    if msg.contains("tab") {
        return Some("YAML requires spaces for indentation, not tabs.".to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Complexity, ItemKind};
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
work_centers:
  - wc_no: WC01
    name: Cutting
    cost_per_min: 0.15
items:
  - item_no: P0001
    description: Fastener 0001
    kind: part
    base_cost: 0.25
  - item_no: A001
    description: Assembly A001
    kind: A
    base_cost: 5.0
boms:
  - bom_no: BOM_S1_A001
    parent: A001
    depth: 0
    complexity: simple
    lines:
      - component: P0001
        quantity: 4
    routing:
      - step_no: 1
        wc: WC01
        run_time_min: 10
"#;

    #[test]
    fn test_parse_yaml_snapshot() {
        let snap = parse_snapshot(SAMPLE, SnapshotFormat::Yaml, "sample.yaml").unwrap();
        assert_eq!(snap.work_centers.len(), 1);
        assert_eq!(snap.items[1].kind, ItemKind::Assembly);
        assert_eq!(snap.boms[0].complexity, Complexity::Simple);
        assert_eq!(snap.boms[0].routing[0].run_time_min, 10.0);
    }

    #[test]
    fn test_empty_content_is_empty_snapshot() {
        let snap = parse_snapshot("  \n", SnapshotFormat::Yaml, "empty.yaml").unwrap();
        assert_eq!(snap, Snapshot::default());
    }

    #[test]
    fn test_parse_error_carries_help() {
        let bad = "items:\n  - item_no: P1\n    kind: widget\n";
        let err = parse_snapshot(bad, SnapshotFormat::Yaml, "bad.yaml").unwrap_err();
        match err {
            SnapshotError::Parse(parse) => {
                assert!(parse.help.unwrap().contains("part"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_directory_fragments_are_merged() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a_work_centers.yaml"),
            "work_centers:\n  - wc_no: WC01\n    cost_per_min: 0.1\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("b_items.json"),
            r#"{"items": [{"item_no": "P1", "kind": "part", "base_cost": 1.0}]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let snap = load_snapshot(dir.path()).unwrap();
        assert_eq!(snap.work_centers.len(), 1);
        assert_eq!(snap.items.len(), 1);
    }

    #[test]
    fn test_missing_path() {
        let err = load_snapshot(Path::new("/nonexistent/snapshot.yaml")).unwrap_err();
        assert!(matches!(err, SnapshotError::NotFound(_)));
    }

    #[test]
    fn test_save_and_reload_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");
        let snap = parse_snapshot(SAMPLE, SnapshotFormat::Yaml, "sample.yaml").unwrap();

        save_snapshot(&path, &snap).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.trim_start().starts_with('{'));
        assert_eq!(load_snapshot(&path).unwrap(), snap);
    }

    #[test]
    fn test_line_col_to_offset() {
        let source = "line1\nline2\nline3";
        assert_eq!(line_col_to_offset(source, 1, 1), 0);
        assert_eq!(line_col_to_offset(source, 2, 1), 6);
        assert_eq!(line_col_to_offset(source, 3, 3), 14);
    }
}
