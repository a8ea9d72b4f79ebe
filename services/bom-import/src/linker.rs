//! Link Materializer
//!
//! Creates one MBOM item per parent/child edge. There is no update path: an
//! edge ION already holds comes back as a rejection and is reported.

use ion_models::{LinkHandle, PartHandle};
use ion_utils::{ImportError, ImportResult};
use tracing::{debug, warn};

use crate::remote::{PartsApi, RemoteError};

#[derive(Debug, Default)]
pub struct LinkMaterializer {
    links_created: usize,
}

impl LinkMaterializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn links_created(&self) -> usize {
        self.links_created
    }

    pub fn ensure_link<A: PartsApi>(
        &mut self,
        api: &mut A,
        parent: &PartHandle,
        child: &PartHandle,
        quantity: f64,
    ) -> ImportResult<LinkHandle> {
        match api.create_link(parent, child, quantity) {
            Ok(link) => {
                debug!(
                    parent = %parent.part_number,
                    child = %child.part_number,
                    quantity,
                    id = link.id,
                    "created MBOM item"
                );
                self.links_created += 1;
                Ok(link)
            }
            Err(RemoteError::Rejected(reason)) => {
                let reason = describe_rejection(parent, child, &reason);
                warn!(
                    parent = %parent.part_number,
                    child = %child.part_number,
                    %reason,
                    "MBOM item rejected"
                );
                Err(ImportError::link_creation(&parent.part_number, &child.part_number, reason))
            }
            Err(fault) => Err(fault.into()),
        }
    }
}

/// Uniqueness violations on (part, parent) mean the edge already exists.
fn describe_rejection(parent: &PartHandle, child: &PartHandle, reason: &str) -> String {
    if reason.contains("not unique") {
        format!(
            "item with part number {} and parent {} already exists",
            child.part_number, parent.part_number
        )
    } else {
        reason.to_string()
    }
}
