//! Part Resolver
//!
//! Ensures a part exists in ION: reuse when the part number is already there,
//! create it from the row's attributes otherwise. Every answer is cached for
//! the lifetime of the resolver, which is one import run.

use std::collections::HashMap;

use ion_models::{PartAttributes, PartHandle, PartInput};
use ion_utils::{ImportError, ImportResult};
use tracing::{debug, info, warn};

use crate::remote::{PartsApi, RemoteError};

#[derive(Debug, Clone)]
enum Resolution {
    Resolved(PartHandle),
    /// Creation was rejected; repeated lookups fail the same way
    Rejected(String),
}

#[derive(Debug, Default)]
pub struct PartResolver {
    cache: HashMap<String, Resolution>,
    parts_created: usize,
    parts_reused: usize,
}

impl PartResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parts_created(&self) -> usize {
        self.parts_created
    }

    pub fn parts_reused(&self) -> usize {
        self.parts_reused
    }

    /// Primes the cache with the parts ION already has, in one lookup.
    pub fn prefetch<A: PartsApi>(
        &mut self,
        api: &mut A,
        part_numbers: &[String],
    ) -> ImportResult<usize> {
        let pending: Vec<String> = part_numbers
            .iter()
            .filter(|pn| !self.cache.contains_key(pn.as_str()))
            .cloned()
            .collect();
        if pending.is_empty() {
            return Ok(0);
        }

        let found = api.find_parts(&pending).map_err(fatal)?;
        let count = found.len();
        for handle in found {
            // Only accept answers for part numbers we asked about
            if pending.contains(&handle.part_number) {
                self.parts_reused += 1;
                self.cache
                    .insert(handle.part_number.clone(), Resolution::Resolved(handle));
            }
        }

        info!(requested = pending.len(), existing = count, "prefetched existing parts");
        Ok(count)
    }

    /// Returns the handle for `part_number`, creating the part if ION lacks it.
    ///
    /// Existing parts are returned untouched; attributes are only used on creation.
    pub fn ensure_part<A: PartsApi>(
        &mut self,
        api: &mut A,
        part_number: &str,
        attributes: &PartAttributes,
    ) -> ImportResult<PartHandle> {
        if let Some(resolution) = self.cache.get(part_number) {
            return match resolution {
                Resolution::Resolved(handle) => Ok(handle.clone()),
                Resolution::Rejected(reason) => {
                    Err(ImportError::part_creation(part_number, reason.clone()))
                }
            };
        }

        if let Some(handle) = api.find_part(part_number).map_err(fatal)? {
            debug!(part_number, id = handle.id, "reusing existing part");
            self.parts_reused += 1;
            self.cache
                .insert(part_number.to_string(), Resolution::Resolved(handle.clone()));
            return Ok(handle);
        }

        let input = PartInput::new(part_number, attributes);
        match api.create_part(&input) {
            Ok(handle) => {
                info!(part_number, id = handle.id, "created part");
                self.parts_created += 1;
                self.cache
                    .insert(part_number.to_string(), Resolution::Resolved(handle.clone()));
                Ok(handle)
            }
            Err(RemoteError::Rejected(reason)) => {
                warn!(part_number, %reason, "part creation rejected");
                self.cache
                    .insert(part_number.to_string(), Resolution::Rejected(reason.clone()));
                Err(ImportError::part_creation(part_number, reason))
            }
            Err(fault) => Err(fault.into()),
        }
    }
}

/// Lookups have no semantic rejection; anything they return aborts the run.
fn fatal(error: RemoteError) -> ImportError {
    match error {
        RemoteError::Rejected(reason) => {
            ImportError::transport(format!("part lookup rejected: {}", reason))
        }
        fault => fault.into(),
    }
}
