use serde::{Deserialize, Serialize};
use thiserror::Error;

use ion_models::FailureKind;

#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ImportError {
    #[error("Malformed hierarchy at row {row}: {message}")]
    MalformedHierarchy { row: usize, message: String },

    #[error("Duplicate part {part_number} under {parent} at row {row}")]
    DuplicatePartAtLevel { row: usize, part_number: String, parent: String },

    #[error("Failed to create part {part_number}: {reason}")]
    PartCreation { part_number: String, reason: String },

    #[error("Failed to link {child} under {parent}: {reason}")]
    LinkCreation { parent: String, child: String, reason: String },

    /// Link skipped because an ancestor's part failed. `part_error` is set
    /// when this node's own part failed as well.
    #[error("Parent of {part_number} was not resolved")]
    ParentUnresolved {
        part_number: String,
        part_error: Option<String>,
    },

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Authentication error: {message}")]
    Authentication { message: String },
}

impl ImportError {
    pub fn malformed(row: usize, message: impl Into<String>) -> Self {
        Self::MalformedHierarchy {
            row,
            message: message.into(),
        }
    }

    pub fn duplicate(
        row: usize,
        part_number: impl Into<String>,
        parent: impl Into<String>,
    ) -> Self {
        Self::DuplicatePartAtLevel {
            row,
            part_number: part_number.into(),
            parent: parent.into(),
        }
    }

    pub fn part_creation(part_number: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PartCreation {
            part_number: part_number.into(),
            reason: reason.into(),
        }
    }

    pub fn link_creation(
        parent: impl Into<String>,
        child: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::LinkCreation {
            parent: parent.into(),
            child: child.into(),
            reason: reason.into(),
        }
    }

    pub fn parent_unresolved(part_number: impl Into<String>, part_error: Option<String>) -> Self {
        Self::ParentUnresolved {
            part_number: part_number.into(),
            part_error,
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedHierarchy { .. } => "MALFORMED_HIERARCHY",
            Self::DuplicatePartAtLevel { .. } => "DUPLICATE_PART_AT_LEVEL",
            Self::PartCreation { .. } => "PART_CREATION_ERROR",
            Self::LinkCreation { .. } => "LINK_CREATION_ERROR",
            Self::ParentUnresolved { .. } => "PARENT_UNRESOLVED",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Transport { .. } => "TRANSPORT_ERROR",
            Self::Authentication { .. } => "AUTHENTICATION_ERROR",
        }
    }

    /// Fatal errors abort the run; the rest are recorded against a row.
    pub fn is_fatal(&self) -> bool {
        self.failure_kind().is_none()
    }

    /// Report classification for recorded (non-fatal) errors
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::DuplicatePartAtLevel { .. } => Some(FailureKind::DuplicatePartAtLevel),
            Self::PartCreation { .. } => Some(FailureKind::PartCreation),
            Self::LinkCreation { .. } => Some(FailureKind::LinkCreation),
            Self::ParentUnresolved { .. } => Some(FailureKind::ParentUnresolved),
            _ => None,
        }
    }

    /// Text stored in the report's `reason` column
    pub fn reason(&self) -> String {
        match self {
            Self::PartCreation { reason, .. } | Self::LinkCreation { reason, .. } => reason.clone(),
            Self::ParentUnresolved {
                part_error: Some(part_error),
                ..
            } => format!("{}; part: {}", ion_models::PARENT_UNRESOLVED, part_error),
            Self::ParentUnresolved { part_error: None, .. } => {
                ion_models::PARENT_UNRESOLVED.to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type ImportResult<T> = Result<T, ImportError>;
