//! ION Parts API contract
//!
//! The importer only needs three operations from ION. Implementations are the
//! GraphQL client and the in-memory remote used for dry runs.

use ion_models::{LinkHandle, PartHandle, PartInput};
use ion_utils::ImportError;
use thiserror::Error;

/// Failure reported by the remote system.
///
/// `Rejected` is a semantic answer (validation, uniqueness) and is recorded
/// against a row. The other variants mean ION cannot be reached or will not
/// accept our credentials, which aborts the run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

/// Maps faults to fatal importer errors; rejections are handled by callers.
impl From<RemoteError> for ImportError {
    fn from(error: RemoteError) -> Self {
        match error {
            RemoteError::Rejected(reason) => ImportError::validation("remote", reason),
            RemoteError::Transport(message) => ImportError::transport(message),
            RemoteError::Unauthorized(message) => ImportError::authentication(message),
        }
    }
}

pub trait PartsApi {
    fn find_part(&mut self, part_number: &str) -> Result<Option<PartHandle>, RemoteError>;

    /// Batched lookup; parts that do not exist are simply absent.
    fn find_parts(&mut self, part_numbers: &[String]) -> Result<Vec<PartHandle>, RemoteError> {
        let mut found = Vec::new();
        for part_number in part_numbers {
            if let Some(handle) = self.find_part(part_number)? {
                found.push(handle);
            }
        }
        Ok(found)
    }

    fn create_part(&mut self, input: &PartInput) -> Result<PartHandle, RemoteError>;

    fn create_link(
        &mut self,
        parent: &PartHandle,
        child: &PartHandle,
        quantity: f64,
    ) -> Result<LinkHandle, RemoteError>;
}

impl<T: PartsApi + ?Sized> PartsApi for &mut T {
    fn find_part(&mut self, part_number: &str) -> Result<Option<PartHandle>, RemoteError> {
        (**self).find_part(part_number)
    }

    fn find_parts(&mut self, part_numbers: &[String]) -> Result<Vec<PartHandle>, RemoteError> {
        (**self).find_parts(part_numbers)
    }

    fn create_part(&mut self, input: &PartInput) -> Result<PartHandle, RemoteError> {
        (**self).create_part(input)
    }

    fn create_link(
        &mut self,
        parent: &PartHandle,
        child: &PartHandle,
        quantity: f64,
    ) -> Result<LinkHandle, RemoteError> {
        (**self).create_link(parent, child, quantity)
    }
}

impl<T: PartsApi + ?Sized> PartsApi for Box<T> {
    fn find_part(&mut self, part_number: &str) -> Result<Option<PartHandle>, RemoteError> {
        (**self).find_part(part_number)
    }

    fn find_parts(&mut self, part_numbers: &[String]) -> Result<Vec<PartHandle>, RemoteError> {
        (**self).find_parts(part_numbers)
    }

    fn create_part(&mut self, input: &PartInput) -> Result<PartHandle, RemoteError> {
        (**self).create_part(input)
    }

    fn create_link(
        &mut self,
        parent: &PartHandle,
        child: &PartHandle,
        quantity: f64,
    ) -> Result<LinkHandle, RemoteError> {
        (**self).create_link(parent, child, quantity)
    }
}
