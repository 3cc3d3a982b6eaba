//! Header-plus-rows table; an empty cell is a missing value
//!
//! Tables are read and written as CSV, or as an Excel workbook (first sheet)
//! when the path ends in `.xlsx`.

use crate::{BatchError, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::Workbook;
use std::io::{Read, Write};
use std::path::Path;

/// On-disk table encodings, told apart by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Xlsx,
}

impl TableFormat {
    /// `.xlsx` is a workbook; everything else is treated as CSV
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => TableFormat::Xlsx,
            _ => TableFormat::Csv,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Every row is brought to one width: short rows are padded with missing
    /// cells, and cells past the header get unnamed columns of their own
    pub fn new(mut headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).fold(headers.len(), usize::max);
        headers.resize(width, String::new());
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Read in the format implied by the extension
    pub fn read(path: &Path) -> Result<Self> {
        match TableFormat::from_path(path) {
            TableFormat::Csv => Self::read_csv(path),
            TableFormat::Xlsx => Self::read_xlsx(path),
        }
    }

    /// Write in the format implied by the extension
    pub fn write(&self, path: &Path) -> Result<()> {
        match TableFormat::from_path(path) {
            TableFormat::Csv => self.write_csv(path),
            TableFormat::Xlsx => self.write_xlsx(path),
        }
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self::new(headers, rows))
    }

    /// First worksheet; its first row holds the headers
    pub fn read_xlsx(path: &Path) -> Result<Self> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| BatchError::MissingSheet(path.to_path_buf()))??;

        let mut rows = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
        let headers = match rows.next() {
            Some(headers) => headers.into_iter().map(|h| h.trim().to_string()).collect(),
            None => Vec::new(),
        };
        Ok(Self::new(headers, rows.collect()))
    }

    /// Write atomically, so a failed run never leaves a truncated table
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
            .write(|file| -> std::result::Result<(), csv::Error> {
                let mut writer = csv::Writer::from_writer(file);
                writer.write_record(&self.headers)?;
                for row in &self.rows {
                    writer.write_record(row)?;
                }
                writer.flush().map_err(csv::Error::from)
            })
            .map_err(|e| BatchError::Write {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Single-sheet workbook; cells holding a plain number are stored as numbers
    pub fn write_xlsx(&self, path: &Path) -> Result<()> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in std::iter::once(&self.headers).chain(&self.rows).enumerate() {
            let r = u32::try_from(r).map_err(|_| too_large(path))?;
            for (c, cell) in row.iter().enumerate() {
                let c = u16::try_from(c).map_err(|_| too_large(path))?;
                match as_number(cell).filter(|_| r > 0) {
                    Some(value) => sheet.write_number(r, c, value)?,
                    None if cell.is_empty() => continue,
                    None => sheet.write_string(r, c, cell.as_str())?,
                };
            }
        }
        let bytes = workbook.save_to_buffer()?;

        AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
            .write(|file| file.write_all(&bytes))
            .map_err(|e| BatchError::Write {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell value, `None` when empty
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)?
            .get(column)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Replace the column `name`, appending it if absent
    pub fn set_column(&mut self, name: &str, values: &[Option<f64>]) {
        let column = match self.column(name) {
            Some(column) => column,
            None => {
                self.headers.push(name.to_string());
                for row in &mut self.rows {
                    row.push(String::new());
                }
                self.headers.len() - 1
            }
        };

        for (row, value) in self.rows.iter_mut().zip(values) {
            row[column] = value.map(|v| v.to_string()).unwrap_or_default();
        }
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        other => other.to_string(),
    }
}

/// A cell whose text is exactly how the number prints, so "007" stays text
fn as_number(cell: &str) -> Option<f64> {
    cell.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.to_string() == cell)
}

fn too_large(path: &Path) -> BatchError {
    BatchError::Write {
        path: path.to_path_buf(),
        reason: "table exceeds worksheet limits".to_string(),
    }
}
