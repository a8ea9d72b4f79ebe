//! BOM (Bill of Materials) Processing Module
//!
//! Reads level-indented BOM exports and rebuilds the assembly tree they encode.
//! Supports CSV, Excel (XLSX), and XML exports.

pub mod parser;
pub mod tree;

pub use parser::{BomFormat, BomReader, LevelFormat, ParsedBom};
pub use tree::{BuildIssue, BuiltBom, TreeBuilder};
