//! Import Driver
//!
//! Walks the BOM tree in pre-order, resolving each node's part and linking it
//! under its parent. Per-row failures are recorded and the walk continues;
//! transport and authentication faults stop it.

use std::collections::HashSet;

use ion_models::{BomNode, BomRow, FailureKind, ImportReport, PartHandle, RowOutcome};
use ion_utils::{ImportError, TreeBuilder};
use thiserror::Error;
use tracing::{info, warn};

use crate::linker::LinkMaterializer;
use crate::remote::PartsApi;
use crate::resolver::PartResolver;

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Look up every part number in one batched call before walking
    pub prefetch_existing: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            prefetch_existing: true,
        }
    }
}

/// A run stopped by a fatal error, with whatever was recorded before it.
#[derive(Error, Debug)]
#[error("import aborted after {recorded} rows: {error}", recorded = .partial.outcomes.len())]
pub struct ImportAborted {
    pub error: ImportError,
    pub partial: ImportReport,
}

pub struct ImportDriver<A: PartsApi> {
    api: A,
    options: ImportOptions,
    resolver: PartResolver,
    linker: LinkMaterializer,
}

impl<A: PartsApi> ImportDriver<A> {
    pub fn new(api: A, options: ImportOptions) -> Self {
        Self {
            api,
            options,
            resolver: PartResolver::new(),
            linker: LinkMaterializer::new(),
        }
    }

    /// Imports the tree rooted at `root`, one outcome per node in pre-order.
    pub fn import(mut self, root: &BomNode) -> Result<ImportReport, ImportAborted> {
        let mut report = ImportReport::new();
        info!(
            run_id = %report.run_id,
            root = %root.part_number,
            nodes = root.node_count(),
            "starting import"
        );

        if let Err(error) = self.walk(root, &mut report) {
            warn!(run_id = %report.run_id, error = %error, "import aborted");
            self.tally(&mut report);
            return Err(ImportAborted { error, partial: report });
        }

        self.tally(&mut report);
        let summary = report.summary();
        info!(
            run_id = %report.run_id,
            succeeded = summary.succeeded,
            failed = summary.failed,
            parts_created = report.parts_created,
            links_created = report.links_created,
            "import finished"
        );
        Ok(report)
    }

    fn walk(&mut self, root: &BomNode, report: &mut ImportReport) -> Result<(), ImportError> {
        if self.options.prefetch_existing {
            let mut seen = HashSet::new();
            let part_numbers: Vec<String> = root
                .iter()
                .map(|(node, _)| node.part_number.clone())
                .filter(|pn| seen.insert(pn.clone()))
                .collect();
            self.resolver.prefetch(&mut self.api, &part_numbers)?;
        }

        // (parent handle, whether this node or an ancestor failed to resolve)
        let mut ancestors: Vec<(Option<PartHandle>, bool)> = Vec::new();

        for (node, depth) in root.iter() {
            ancestors.truncate(depth);

            let resolved = self
                .resolver
                .ensure_part(&mut self.api, &node.part_number, &node.attributes);
            if let Err(error) = &resolved {
                if error.is_fatal() {
                    return Err(error.clone());
                }
            }

            let parent = ancestors.last();
            let ancestor_failed = parent.map_or(false, |(_, failed)| *failed);

            let outcome = match (&resolved, parent) {
                // The link is skipped either way; keep the part's own failure in the reason
                _ if ancestor_failed => {
                    let part_error = resolved.as_ref().err().map(ImportError::reason);
                    failed_row(node, &ImportError::parent_unresolved(&node.part_number, part_error))
                }
                (Err(error), _) => failed_row(node, error),
                (Ok(child), Some((Some(parent_handle), _))) => {
                    match self
                        .linker
                        .ensure_link(&mut self.api, parent_handle, child, node.quantity)
                    {
                        Ok(_) => RowOutcome::success(node),
                        Err(error) if error.is_fatal() => return Err(error),
                        Err(error) => failed_row(node, &error),
                    }
                }
                (Ok(_), _) => RowOutcome::success(node),
            };
            report.record(outcome);

            let failed = ancestor_failed || resolved.is_err();
            ancestors.push((resolved.ok(), failed));
        }

        Ok(())
    }

    fn tally(&self, report: &mut ImportReport) {
        report.parts_created = self.resolver.parts_created();
        report.parts_reused = self.resolver.parts_reused();
        report.links_created = self.linker.links_created();
    }
}

fn failed_row(node: &BomNode, error: &ImportError) -> RowOutcome {
    RowOutcome::failure(
        node.row_number,
        &node.part_number,
        node.level,
        error.failure_kind().unwrap_or(FailureKind::PartCreation),
        error.reason(),
    )
}

/// Builds the tree from `rows` and imports it.
///
/// A malformed hierarchy fails before any remote call, with an empty partial
/// report. Rows dropped while building are merged into the report, partial or not.
pub fn run_import<A, I>(
    rows: I,
    api: A,
    options: ImportOptions,
) -> Result<ImportReport, ImportAborted>
where
    A: PartsApi,
    I: IntoIterator<Item = BomRow>,
{
    let built = TreeBuilder::new().build(rows).map_err(|error| {
        let mut partial = ImportReport::new();
        partial.finish();
        ImportAborted { error, partial }
    })?;

    let issues = built.issues.into_iter().map(RowOutcome::from);
    match ImportDriver::new(api, options).import(&built.root) {
        Ok(mut report) => {
            report.merge(issues);
            report.finish();
            Ok(report)
        }
        Err(mut aborted) => {
            aborted.partial.merge(issues);
            aborted.partial.finish();
            Err(aborted)
        }
    }
}
