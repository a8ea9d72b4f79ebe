//! # ION Importer Domain Models
//!
//! Core data structures shared by the ION importers. All models implement
//! serde serialization; row models are validated with the validator crate.
//!
//! ## Key Models
//!
//! - **BomRow**: one normalized line of a level-indented BOM export
//! - **BomNode**: a part instantiated at one position of the reconstructed tree
//! - **PartHandle / LinkHandle**: references to records that exist in ION
//! - **ImportReport**: per-row outcomes of an import run

pub mod row;
pub mod node;
pub mod part;
pub mod report;

#[cfg(test)]
pub mod property_tests;

pub use row::*;
pub use node::*;
pub use part::*;
pub use report::*;
