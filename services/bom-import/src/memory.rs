//! In-memory ION stand-in
//!
//! Backs `--dry-run` and the test suites. Behaves like ION where the importer
//! can observe it: sequential ids, "not unique" rejections for repeated
//! parent/child links, and configurable rejections or faults.

use std::collections::{HashMap, HashSet};

use ion_models::{LinkHandle, PartHandle, PartInput};
use tracing::debug;

use crate::remote::{PartsApi, RemoteError};

/// Number of remote calls issued, per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub find_part: usize,
    pub find_parts: usize,
    pub create_part: usize,
    pub create_link: usize,
}

#[derive(Debug, Default)]
pub struct InMemoryPartsApi {
    parts: HashMap<String, PartHandle>,
    created: HashMap<String, PartInput>,
    links: Vec<LinkHandle>,
    link_keys: HashSet<(i64, i64)>,
    next_id: i64,
    rejected_parts: HashMap<String, String>,
    rejected_links: HashMap<(String, String), String>,
    faults: HashMap<String, RemoteError>,
    calls: CallCounts,
}

impl InMemoryPartsApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Seeds a part that already exists before the import
    pub fn with_part(mut self, part_number: &str) -> Self {
        let id = self.allocate_id();
        self.parts.insert(
            part_number.to_string(),
            PartHandle {
                id,
                part_number: part_number.to_string(),
            },
        );
        self
    }

    /// Makes `create_part` reject this part number
    pub fn reject_part(mut self, part_number: &str, reason: &str) -> Self {
        self.rejected_parts.insert(part_number.to_string(), reason.to_string());
        self
    }

    /// Makes `create_link` reject this parent/child pair
    pub fn reject_link(mut self, parent: &str, child: &str, reason: &str) -> Self {
        self.rejected_links
            .insert((parent.to_string(), child.to_string()), reason.to_string());
        self
    }

    /// Fails any call that touches this part number with a fault
    pub fn fault_on(mut self, part_number: &str, fault: RemoteError) -> Self {
        self.faults.insert(part_number.to_string(), fault);
        self
    }

    pub fn calls(&self) -> CallCounts {
        self.calls
    }

    pub fn part(&self, part_number: &str) -> Option<&PartHandle> {
        self.parts.get(part_number)
    }

    /// Payload sent when the importer created this part
    pub fn created_input(&self, part_number: &str) -> Option<&PartInput> {
        self.created.get(part_number)
    }

    pub fn links(&self) -> &[LinkHandle] {
        &self.links
    }

    pub fn link_between(&self, parent: &str, child: &str) -> Option<&LinkHandle> {
        let parent_id = self.parts.get(parent)?.id;
        let child_id = self.parts.get(child)?.id;
        self.links
            .iter()
            .find(|l| l.parent_id == parent_id && l.child_id == child_id)
    }

    fn check_fault(&self, part_number: &str) -> Result<(), RemoteError> {
        match self.faults.get(part_number) {
            Some(fault) => Err(fault.clone()),
            None => Ok(()),
        }
    }
}

impl PartsApi for InMemoryPartsApi {
    fn find_part(&mut self, part_number: &str) -> Result<Option<PartHandle>, RemoteError> {
        self.calls.find_part += 1;
        self.check_fault(part_number)?;
        Ok(self.parts.get(part_number).cloned())
    }

    fn find_parts(&mut self, part_numbers: &[String]) -> Result<Vec<PartHandle>, RemoteError> {
        self.calls.find_parts += 1;
        for part_number in part_numbers {
            self.check_fault(part_number)?;
        }
        Ok(part_numbers
            .iter()
            .filter_map(|pn| self.parts.get(pn).cloned())
            .collect())
    }

    fn create_part(&mut self, input: &PartInput) -> Result<PartHandle, RemoteError> {
        self.calls.create_part += 1;
        self.check_fault(&input.part_number)?;

        if let Some(reason) = self.rejected_parts.get(&input.part_number) {
            return Err(RemoteError::Rejected(reason.clone()));
        }
        if self.parts.contains_key(&input.part_number) {
            return Err(RemoteError::Rejected(format!(
                "partNumber {} is not unique",
                input.part_number
            )));
        }

        let handle = PartHandle {
            id: self.allocate_id(),
            part_number: input.part_number.clone(),
        };
        debug!(part_number = %handle.part_number, id = handle.id, "dry-run part created");
        self.parts.insert(input.part_number.clone(), handle.clone());
        self.created.insert(input.part_number.clone(), input.clone());
        Ok(handle)
    }

    fn create_link(
        &mut self,
        parent: &PartHandle,
        child: &PartHandle,
        quantity: f64,
    ) -> Result<LinkHandle, RemoteError> {
        self.calls.create_link += 1;
        self.check_fault(&child.part_number)?;

        let key = (parent.part_number.clone(), child.part_number.clone());
        if let Some(reason) = self.rejected_links.get(&key) {
            return Err(RemoteError::Rejected(reason.clone()));
        }
        if !self.link_keys.insert((parent.id, child.id)) {
            return Err(RemoteError::Rejected(
                "duplicate key value violates unique constraint: (part_id, parent_id) is not unique".to_string(),
            ));
        }

        let link = LinkHandle {
            id: self.allocate_id(),
            parent_id: parent.id,
            child_id: child.id,
            quantity,
        };
        self.links.push(link.clone());
        Ok(link)
    }
}
