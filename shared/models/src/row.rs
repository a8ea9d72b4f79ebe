//! BOM row models for the ION importers.
//!
//! A row is one line of a level-indented BOM export after it has been
//! normalized by a reader. Rows are immutable once built.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Optional attributes carried by a row and used when creating a missing part.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
pub struct PartAttributes {
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Vendor reference must be between 1 and 255 characters"))]
    pub vendor_ref: Option<String>,
    #[validate(length(min = 1, max = 20, message = "Revision must be between 1 and 20 characters"))]
    pub revision: Option<String>,
}

/// One normalized line of a level-indented BOM export.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct BomRow {
    /// Source line, header counted as line 1. Zero for a synthesized root row.
    pub row_number: usize,
    #[validate(length(min = 1, max = 255, message = "Part number must be between 1 and 255 characters"))]
    pub part_number: String,
    pub level: u32,
    #[validate(range(min = 0.0, message = "Quantity must not be negative"))]
    pub quantity: f64,
    #[validate]
    pub attributes: PartAttributes,
}

impl BomRow {
    /// Creates a validated row with no optional attributes
    pub fn new(
        row_number: usize,
        part_number: impl Into<String>,
        level: u32,
        quantity: f64,
    ) -> Result<Self, String> {
        Self::with_attributes(row_number, part_number, level, quantity, PartAttributes::default())
    }

    /// Creates a validated row
    pub fn with_attributes(
        row_number: usize,
        part_number: impl Into<String>,
        level: u32,
        quantity: f64,
        attributes: PartAttributes,
    ) -> Result<Self, String> {
        let row = Self {
            row_number,
            part_number: part_number.into().trim().to_string(),
            level,
            quantity,
            attributes,
        };

        if !row.quantity.is_finite() {
            return Err(format!("Row {}: quantity must be a finite number", row_number));
        }
        row.validate()
            .map_err(|e| format!("Row {}: {}", row_number, e))?;

        Ok(row)
    }

    /// Synthesized level-0 row for the governing top-level part
    pub fn top_level(part_number: impl Into<String>) -> Result<Self, String> {
        Self::new(0, part_number, 0, 1.0)
    }

    pub fn is_synthesized(&self) -> bool {
        self.row_number == 0
    }
}
