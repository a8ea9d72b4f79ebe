use crate::error::{ImportError, ImportResult};
use regex::Regex;
use std::sync::OnceLock;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

pub fn validate_model<T: Validate>(model: &T) -> ImportResult<()> {
    match model.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let error_messages = format_validation_errors(&errors);
            Err(ImportError::validation("model", error_messages))
        }
    }
}

/// Joins every field error, nested ones included, into one stable line.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_messages("", errors, &mut messages);
    messages.sort();
    messages.join(", ")
}

fn collect_messages(prefix: &str, errors: &ValidationErrors, messages: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                messages.extend(field_errors.iter().map(|error| describe(&path, error)));
            }
            ValidationErrorsKind::Struct(nested) => collect_messages(&path, nested, messages),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_messages(&format!("{}[{}]", path, index), nested, messages);
                }
            }
        }
    }
}

fn describe(path: &str, error: &ValidationError) -> String {
    match (&error.message, &*error.code) {
        (Some(message), _) => format!("{}: {}", path, message),
        (None, "length") => format!("{} has an invalid length", path),
        (None, "range") => format!("{} is out of range", path),
        (None, "required") => format!("{} is required", path),
        (None, code) => format!("{} failed {}", path, code),
    }
}

/// Exporters put numeric placeholders in the revision column; only letters count.
pub fn normalize_revision(raw: &str) -> Option<String> {
    static REVISION: OnceLock<Regex> = OnceLock::new();
    let regex = REVISION.get_or_init(|| Regex::new(r"^[A-Za-z]+$").expect("static regex"));

    let trimmed = raw.trim();
    regex.is_match(trimmed).then(|| trimmed.to_string())
}

/// Parses a quantity cell; blank means one.
pub fn parse_quantity(raw: &str, row: usize) -> ImportResult<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(1.0);
    }

    let quantity: f64 = trimmed.parse().map_err(|_| {
        ImportError::validation("quantity", format!("Row {}: '{}' is not a number", row, trimmed))
    })?;

    if !quantity.is_finite() || quantity < 0.0 {
        return Err(ImportError::validation(
            "quantity",
            format!("Row {}: quantity {} must be a non-negative number", row, trimmed),
        ));
    }

    Ok(quantity)
}

pub fn validate_file_type(file_name: &str, allowed_types: &[&str]) -> ImportResult<()> {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    if !allowed_types.contains(&extension.to_lowercase().as_str()) {
        return Err(ImportError::validation(
            "file_type",
            format!(
                "File type '{}' not allowed. Allowed types: {}",
                extension,
                allowed_types.join(", ")
            ),
        ));
    }

    Ok(())
}
