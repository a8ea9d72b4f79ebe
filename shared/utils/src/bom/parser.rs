//! BOM Export Reader
//!
//! Reads level-indented BOM exports (CSV, Excel, XML) into ordered [`BomRow`]s.
//! Row order is preserved exactly; it encodes the tree shape.

use anyhow::{bail, Context, Result};
use ion_models::{BomRow, PartAttributes};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::ImportError;
use crate::validation::{normalize_revision, parse_quantity, validate_file_type};

/// Supported BOM file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BomFormat {
    Csv,
    Excel, // XLSX
    Xml,
}

impl BomFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Excel),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }
}

/// How the level column encodes depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelFormat {
    /// Dotted item numbers ("1", "1.2", "1.2.3"); depth is the segment count
    Outline,
    /// Plain integer depth
    Depth,
}

impl std::str::FromStr for LevelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "outline" => Ok(Self::Outline),
            "depth" => Ok(Self::Depth),
            other => Err(format!(
                "Unsupported level format: '{}'. Supported: outline, depth",
                other
            )),
        }
    }
}

impl LevelFormat {
    /// Converts a level cell into a depth below the top-level part
    pub fn parse(&self, raw: &str, row: usize) -> Result<u32, ImportError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ImportError::validation("level", format!("Row {}: missing level", row)));
        }

        match self {
            Self::Outline => {
                // A bare "0" names the top-level part itself
                if trimmed == "0" {
                    return Ok(0);
                }
                let segments: Vec<&str> = trimmed.split('.').collect();
                let well_formed = segments
                    .iter()
                    .all(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()));
                if !well_formed {
                    return Err(ImportError::validation(
                        "level",
                        format!("Row {}: '{}' is not an outline item number", row, trimmed),
                    ));
                }
                Ok(segments.len() as u32)
            }
            Self::Depth => trimmed.parse::<u32>().map_err(|_| {
                ImportError::validation(
                    "level",
                    format!("Row {}: '{}' is not a level number", row, trimmed),
                )
            }),
        }
    }
}

/// Lower-cased headers plus (source row, column -> cell) records
type RawRecords = (Vec<String>, Vec<(usize, HashMap<String, String>)>);

/// Complete parsed BOM with metadata
#[derive(Debug, Clone)]
pub struct ParsedBom {
    pub filename: String,
    pub format: BomFormat,
    pub rows: Vec<BomRow>,
    pub total_rows: usize,
    pub parse_warnings: Vec<String>,
}

/// Reader for level-indented BOM exports
pub struct BomReader {
    level_format: LevelFormat,
    top_level: Option<String>,
    /// Column name mappings for different exporters
    part_number_columns: Vec<String>,
    level_columns: Vec<String>,
    quantity_columns: Vec<String>,
    description_columns: Vec<String>,
    vendor_columns: Vec<String>,
    revision_columns: Vec<String>,
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

impl Default for BomReader {
    fn default() -> Self {
        Self {
            level_format: LevelFormat::Outline,
            top_level: None,
            part_number_columns: columns(&[
                "part number",
                "part_number",
                "partnumber",
                "part no",
                "part no.",
                "pn",
            ]),
            level_columns: columns(&["level", "lvl", "indent", "item no.", "item no"]),
            quantity_columns: columns(&["qty", "qty.", "quantity"]),
            description_columns: columns(&["description", "desc", "part description"]),
            vendor_columns: columns(&[
                "vendorno",
                "vendor no",
                "vendor no.",
                "vendor_part_number",
                "supplier part number",
                "supplier_part_number",
            ]),
            revision_columns: columns(&["revision", "rev"]),
        }
    }
}

impl BomReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level_format(mut self, level_format: LevelFormat) -> Self {
        self.level_format = level_format;
        self
    }

    /// Part number of the governing top-level part, used when the export
    /// starts below level 0
    pub fn with_top_level(mut self, part_number: impl Into<String>) -> Self {
        self.top_level = Some(part_number.into());
        self
    }

    /// Read a BOM export from disk
    pub fn read_file(&self, path: &Path) -> Result<ParsedBom> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .context("Invalid file name")?
            .to_string();
        validate_file_type(&filename, &["csv", "xlsx", "xml"])?;

        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        self.parse_bytes(&filename, &data, None)
    }

    /// Parse BOM file from bytes
    pub fn parse_bytes(
        &self,
        filename: &str,
        data: &[u8],
        format: Option<BomFormat>,
    ) -> Result<ParsedBom> {
        let format = format
            .or_else(|| BomFormat::from_extension(Path::new(filename)))
            .context("Could not determine file format")?;

        let (column_headers, records) = match format {
            BomFormat::Csv => self.read_csv(data)?,
            BomFormat::Excel => self.read_excel(data)?,
            BomFormat::Xml => self.read_xml(data)?,
        };

        self.require_column(&column_headers, &self.part_number_columns, "part number")?;
        self.require_column(&column_headers, &self.level_columns, "level")?;

        let mut warnings = Vec::new();
        let mut rows = Vec::with_capacity(records.len() + 1);
        for (row_number, raw_data) in records {
            rows.push(self.map_row(row_number, &raw_data, &mut warnings)?);
        }

        if let Some(top_level) = &self.top_level {
            if rows.first().map_or(true, |r| r.level != 0) {
                let root = BomRow::top_level(top_level.as_str())
                    .map_err(|e| ImportError::validation("top_level", e))?;
                rows.insert(0, root);
            }
        }

        Ok(ParsedBom {
            filename: filename.to_string(),
            format,
            total_rows: rows.len(),
            rows,
            parse_warnings: warnings,
        })
    }

    /// Parse CSV format
    fn read_csv(&self, data: &[u8]) -> Result<RawRecords> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(data);

        let headers: Vec<String> = reader.headers()
            .context("Failed to read CSV headers")?
            .iter()
            .map(|h| h.to_lowercase().trim().to_string())
            .collect();

        let mut records = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            // A broken record would shift the hierarchy, so it is fatal
            let record = result.with_context(|| format!("Row {}: parse error", idx + 2))?;
            let raw_data: HashMap<String, String> = headers.iter()
                .enumerate()
                .filter_map(|(i, h)| record.get(i).map(|v| (h.clone(), v.to_string())))
                .collect();

            if raw_data.values().all(|v| v.trim().is_empty()) {
                continue;
            }
            let row_number = record.position().map_or(idx + 2, |p| p.line() as usize);
            records.push((row_number, raw_data));
        }

        Ok((headers, records))
    }

    /// Parse Excel format (first worksheet)
    fn read_excel(&self, data: &[u8]) -> Result<RawRecords> {
        use calamine::{open_workbook_from_rs, DataType, Reader, Xlsx};

        let cursor = std::io::Cursor::new(data);
        let mut workbook: Xlsx<_> = open_workbook_from_rs(cursor)
            .context("Failed to open Excel workbook")?;

        let sheet_name = workbook.sheet_names()
            .first()
            .cloned()
            .context("No sheets found in workbook")?;

        let range = workbook.worksheet_range(&sheet_name)
            .context("Failed to read worksheet")??;

        let range_start = range.start();
        let mut rows_iter = range.rows();

        // First row is headers
        let headers: Vec<String> = rows_iter.next()
            .context("Empty worksheet")?
            .iter()
            .map(|cell: &DataType| cell.to_string().to_lowercase().trim().to_string())
            .collect();

        let mut records = Vec::new();
        for (idx, row) in rows_iter.enumerate() {
            let raw_data: HashMap<String, String> = headers.iter()
                .enumerate()
                .filter_map(|(i, h): (usize, &String)| {
                    row.get(i).map(|v: &DataType| (h.clone(), v.to_string()))
                })
                .collect();

            if raw_data.values().all(|v| v.trim().is_empty()) {
                continue;
            }
            records.push((sheet_row_number(range_start, idx), raw_data));
        }

        Ok((headers, records))
    }

    /// Parse XML format: one `<row>`/`<item>` element per line, one child
    /// element per column
    fn read_xml(&self, data: &[u8]) -> Result<RawRecords> {
        use quick_xml::events::Event;
        use quick_xml::Reader;

        let mut reader = Reader::from_reader(data);
        reader.trim_text(true);

        let mut records = Vec::new();
        let mut headers: Vec<String> = Vec::new();
        let mut current_row: Option<HashMap<String, String>> = None;
        let mut current_element = String::new();
        let mut row_number = 1;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();

                    if is_row_tag(&tag_name) {
                        current_row = Some(HashMap::new());
                        row_number += 1;
                    } else if current_row.is_some() {
                        // XML tags cannot hold spaces, so part_number maps to "part number"
                        current_element = tag_name.replace('_', " ");
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(ref mut row) = current_row {
                        if !current_element.is_empty() {
                            let text = e.unescape().context("Invalid XML text")?.to_string();
                            row.insert(current_element.clone(), text);
                        }
                    }
                }
                Ok(Event::End(ref e)) => {
                    let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();

                    if is_row_tag(&tag_name) {
                        if let Some(raw_data) = current_row.take() {
                            for key in raw_data.keys() {
                                if !headers.contains(key) {
                                    headers.push(key.clone());
                                }
                            }
                            records.push((row_number, raw_data));
                        }
                    }
                    current_element.clear();
                }
                Ok(Event::Eof) => break,
                Err(e) => bail!("XML parse error at position {}: {}", reader.buffer_position(), e),
                _ => {}
            }
            buf.clear();
        }

        Ok((headers, records))
    }

    fn require_column(
        &self,
        headers: &[String],
        candidates: &[String],
        name: &str,
    ) -> Result<(), ImportError> {
        if candidates.iter().any(|c| headers.contains(c)) {
            Ok(())
        } else {
            Err(ImportError::parse(format!(
                "No {} column found (expected one of: {})",
                name,
                candidates.join(", ")
            )))
        }
    }

    /// Map raw data to a validated BomRow
    fn map_row(
        &self,
        row_number: usize,
        raw_data: &HashMap<String, String>,
        warnings: &mut Vec<String>,
    ) -> Result<BomRow, ImportError> {
        let part_number = self.find_value(&self.part_number_columns, raw_data)
            .ok_or_else(|| {
                ImportError::validation(
                    "part_number",
                    format!("Row {}: missing part number", row_number),
                )
            })?;

        let level_raw = self.find_value(&self.level_columns, raw_data).unwrap_or_default();
        let level = self.level_format.parse(&level_raw, row_number)?;

        let quantity_raw = self.find_value(&self.quantity_columns, raw_data).unwrap_or_default();
        let quantity = parse_quantity(&quantity_raw, row_number)?;

        let revision = match self.find_value(&self.revision_columns, raw_data) {
            Some(raw) => {
                let normalized = normalize_revision(&raw);
                if normalized.is_none() {
                    warnings.push(format!("Row {}: revision '{}' ignored", row_number, raw));
                }
                normalized
            }
            None => None,
        };

        let attributes = PartAttributes {
            description: self.find_value(&self.description_columns, raw_data),
            vendor_ref: self.find_value(&self.vendor_columns, raw_data),
            revision,
        };

        BomRow::with_attributes(row_number, part_number, level, quantity, attributes)
            .map_err(|e| ImportError::validation("row", e))
    }

    /// Find value by checking multiple possible column names
    fn find_value(&self, candidates: &[String], data: &HashMap<String, String>) -> Option<String> {
        for candidate in candidates {
            if let Some(value) = data.get(candidate) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
        None
    }
}

/// 1-based sheet line of the `idx`-th data row. The used range may start
/// below the first line, and its first row holds the headers.
fn sheet_row_number(range_start: Option<(u32, u32)>, idx: usize) -> usize {
    range_start.map_or(0, |(row, _)| row as usize) + idx + 2
}

/// Element names that open one BOM line in XML exports
fn is_row_tag(tag_name: &str) -> bool {
    matches!(tag_name, "row" | "item" | "component" | "entry" | "record")
}
