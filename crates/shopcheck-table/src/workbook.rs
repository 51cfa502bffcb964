//! In-memory workbook model and its on-disk encodings.
//!
//! `.csv` files carry a single sheet. Anything else is a JSON workbook:
//!
//! ```json
//! {"sheets": [{"name": "Sheet1", "header": ["email", "password"], "rows": [["a@x.com", "p1"]]}]}
//! ```

use crate::error::TableError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Csv,
    Json,
}

impl DocumentFormat {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => DocumentFormat::Csv,
            _ => DocumentFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    #[serde(default)]
    pub header: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, header: Vec<String>) -> Self {
        Self {
            name: name.into(),
            header,
            rows: Vec::new(),
        }
    }

    /// Index of the first header cell whose text contains `name`, ignoring case.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let needle = name.trim().to_lowercase();
        self.header
            .iter()
            .position(|cell| cell.trim().to_lowercase().contains(&needle))
    }

    /// Data rows, trimmed and padded to the header width.
    pub fn data_rows(&self) -> Vec<Row> {
        let columns: Arc<[String]> = self.header.iter().map(|c| c.trim().to_string()).collect();
        self.rows
            .iter()
            .map(|raw| {
                let width = raw.len().max(columns.len());
                let values = (0..width)
                    .map(|i| raw.get(i).map(|v| v.trim().to_string()).unwrap_or_default())
                    .collect();
                Row {
                    columns: Arc::clone(&columns),
                    values,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Locate a sheet. `None` picks the first one; a CSV document has only
    /// one sheet, so any name resolves to it.
    pub fn position(&self, format: DocumentFormat, name: Option<&str>) -> Option<usize> {
        match (format, name) {
            (DocumentFormat::Csv, _) | (_, None) => (!self.sheets.is_empty()).then_some(0),
            (DocumentFormat::Json, Some(name)) => self.sheets.iter().position(|s| s.name == name),
        }
    }

    /// The named sheet, created with `header` when absent.
    pub fn sheet_or_create(
        &mut self,
        format: DocumentFormat,
        name: &str,
        header: &[String],
    ) -> &mut Sheet {
        let index = match self.position(format, Some(name)) {
            Some(index) => index,
            None => {
                self.sheets.push(Sheet::new(name, header.to_vec()));
                self.sheets.len() - 1
            }
        };
        &mut self.sheets[index]
    }
}

/// One data row: ordered values plus the header they line up with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<String>,
}

impl Row {
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }

    pub fn into_values(self) -> Vec<String> {
        self.values
    }
}

pub fn decode(format: DocumentFormat, path: &Path, bytes: &[u8]) -> Result<Workbook, TableError> {
    match format {
        DocumentFormat::Json => {
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(Workbook::default());
            }
            serde_json::from_slice(bytes).map_err(|e| TableError::malformed(path, e))
        }
        DocumentFormat::Csv => decode_csv(path, bytes),
    }
}

fn decode_csv(path: &Path, bytes: &[u8]) -> Result<Workbook, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record
            .map_err(|e| TableError::malformed(path, e))?
            .iter()
            .map(str::to_string)
            .collect(),
        None => return Ok(Workbook::default()),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record.map_err(|e| TableError::malformed(path, e))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1")
        .to_string();
    Ok(Workbook {
        sheets: vec![Sheet { name, header, rows }],
    })
}

pub fn encode(
    format: DocumentFormat,
    path: &Path,
    workbook: &Workbook,
) -> Result<Vec<u8>, TableError> {
    match format {
        DocumentFormat::Json => {
            serde_json::to_vec_pretty(workbook).map_err(|e| TableError::malformed(path, e))
        }
        DocumentFormat::Csv => {
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_writer(Vec::new());
            if let Some(sheet) = workbook.sheets.first() {
                writer
                    .write_record(&sheet.header)
                    .map_err(|e| TableError::malformed(path, e))?;
                for row in &sheet.rows {
                    writer
                        .write_record(row)
                        .map_err(|e| TableError::malformed(path, e))?;
                }
            }
            writer
                .into_inner()
                .map_err(|e| TableError::malformed(path, e.error()))
        }
    }
}
