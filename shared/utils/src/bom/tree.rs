//! BOM Tree Builder
//!
//! Rebuilds the assembly hierarchy from level-indented rows in one pass,
//! keeping a stack of open ancestors ordered from the root to the deepest.
//!
//! For each row, entries at the same or a deeper level are closed (attached to
//! the entry below them), and the row is attached to whatever remains on top.
//! A row that would close the root is a second root and fails the build.
//! Skipped levels attach to the nearest shallower ancestor; no placeholder
//! nodes are created.

use ion_models::{BomNode, BomRow, FailureKind, RowOutcome};
use tracing::{debug, warn};

use crate::error::{ImportError, ImportResult};
use crate::validation::validate_model;

/// A row that was left out of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildIssue {
    pub row_number: usize,
    pub part_number: String,
    pub level: u32,
    pub kind: FailureKind,
    pub message: String,
}

impl From<BuildIssue> for RowOutcome {
    fn from(issue: BuildIssue) -> Self {
        RowOutcome::failure(
            issue.row_number,
            issue.part_number,
            issue.level,
            issue.kind,
            issue.message,
        )
    }
}

/// Single-rooted tree plus the rows that were dropped while building it.
#[derive(Debug, Clone)]
pub struct BuiltBom {
    pub root: BomNode,
    pub issues: Vec<BuildIssue>,
}

struct OpenNode {
    node: BomNode,
    /// Set for a duplicate and everything below it; dropped on close
    discarded: bool,
}

/// Level-stack tree reconstruction
#[derive(Debug, Default)]
pub struct TreeBuilder;

impl TreeBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Builds the tree, failing on anything that is not a single-rooted hierarchy.
    pub fn build<I>(&self, rows: I) -> ImportResult<BuiltBom>
    where
        I: IntoIterator<Item = BomRow>,
    {
        let mut rows = rows.into_iter();
        let first = rows
            .next()
            .ok_or_else(|| ImportError::malformed(0, "BOM contains no rows"))?;
        validate_model(&first)?;

        let root_level = first.level;
        let mut issues = Vec::new();
        let mut stack = vec![OpenNode {
            node: BomNode::from(first),
            discarded: false,
        }];

        for row in rows {
            validate_model(&row)?;

            if row.level <= root_level {
                return Err(ImportError::malformed(
                    row.row_number,
                    format!(
                        "{} at level {} would be a second root (top-level part {} is at level {})",
                        row.part_number, row.level, stack[0].node.part_number, root_level
                    ),
                ));
            }

            // Close siblings and deeper cousins; the root is never closed here
            while stack.last().map_or(false, |top| top.node.level >= row.level) {
                close_top(&mut stack);
            }

            let Some(parent) = stack.last() else {
                return Err(ImportError::malformed(row.row_number, "no open ancestor"));
            };
            if parent.node.level + 1 < row.level {
                debug!(
                    row = row.row_number,
                    from = parent.node.level,
                    to = row.level,
                    "level skipped, attaching to nearest ancestor"
                );
            }

            let discarded = if parent.discarded {
                issues.push(BuildIssue {
                    row_number: row.row_number,
                    part_number: row.part_number.clone(),
                    level: row.level,
                    kind: FailureKind::DiscardedWithDuplicate,
                    message: format!("skipped with duplicate ancestor {}", parent.node.part_number),
                });
                true
            } else if parent.node.has_child(&row.part_number) {
                let error = ImportError::duplicate(
                    row.row_number,
                    &row.part_number,
                    &parent.node.part_number,
                );
                warn!(row = row.row_number, part_number = %row.part_number, "{}", error);
                issues.push(BuildIssue {
                    row_number: row.row_number,
                    part_number: row.part_number.clone(),
                    level: row.level,
                    kind: FailureKind::DuplicatePartAtLevel,
                    message: error.to_string(),
                });
                true
            } else {
                false
            };

            stack.push(OpenNode {
                node: BomNode::from(row),
                discarded,
            });
        }

        while stack.len() > 1 {
            close_top(&mut stack);
        }
        let root = stack
            .pop()
            .map(|open| open.node)
            .ok_or_else(|| ImportError::malformed(0, "BOM contains no rows"))?;

        debug!(
            root = %root.part_number,
            nodes = root.node_count(),
            depth = root.max_depth(),
            issues = issues.len(),
            "BOM tree built"
        );

        Ok(BuiltBom { root, issues })
    }
}

/// Pops the deepest open node and attaches it to its parent unless discarded.
fn close_top(stack: &mut Vec<OpenNode>) {
    if let Some(closed) = stack.pop() {
        if closed.discarded {
            return;
        }
        if let Some(parent) = stack.last_mut() {
            parent.node.children.push(closed.node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rows(layout: &[(&str, u32, f64)]) -> Vec<BomRow> {
        layout.iter()
            .enumerate()
            .map(|(i, (pn, level, qty))| BomRow::new(i + 2, *pn, *level, *qty).unwrap())
            .collect()
    }

    fn shape(node: &BomNode) -> String {
        if node.children.is_empty() {
            node.part_number.clone()
        } else {
            let children: Vec<String> = node.children.iter().map(shape).collect();
            format!("{}[{}]", node.part_number, children.join(","))
        }
    }

    #[test]
    fn test_builds_nested_tree() {
        let built = TreeBuilder::new()
            .build(rows(&[("P1", 0, 1.0), ("P2", 1, 2.0), ("P3", 2, 3.0), ("P4", 1, 4.0)]))
            .unwrap();

        assert_eq!(shape(&built.root), "P1[P2[P3],P4]");
        assert_eq!(built.root.children[0].quantity, 2.0);
        assert_eq!(built.root.children[0].children[0].quantity, 3.0);
        assert_eq!(built.root.children[1].quantity, 4.0);
        assert!(built.issues.is_empty());
    }

    #[test]
    fn test_two_roots_are_malformed() {
        let err = TreeBuilder::new()
            .build(rows(&[("P1", 0, 1.0), ("P2", 0, 1.0)]))
            .unwrap_err();

        assert!(matches!(err, ImportError::MalformedHierarchy { row: 3, .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_return_above_root_is_malformed() {
        let err = TreeBuilder::new()
            .build(rows(&[("P1", 1, 1.0), ("P2", 2, 1.0), ("P3", 0, 1.0)]))
            .unwrap_err();
        assert!(matches!(err, ImportError::MalformedHierarchy { row: 4, .. }));
    }

    #[test]
    fn test_empty_input_is_malformed() {
        let err = TreeBuilder::new().build(Vec::new()).unwrap_err();
        assert!(matches!(err, ImportError::MalformedHierarchy { .. }));
    }

    #[test]
    fn test_duplicate_sibling_is_skipped() {
        let built = TreeBuilder::new()
            .build(rows(&[("A", 0, 1.0), ("P", 1, 1.0), ("P", 1, 5.0)]))
            .unwrap();

        assert_eq!(shape(&built.root), "A[P]");
        assert_eq!(built.root.children[0].quantity, 1.0);
        assert_eq!(built.issues.len(), 1);
        assert_eq!(built.issues[0].row_number, 4);
        assert_eq!(built.issues[0].kind, FailureKind::DuplicatePartAtLevel);
    }

    #[test]
    fn test_duplicate_subtree_is_discarded() {
        let built = TreeBuilder::new()
            .build(rows(&[
                ("A", 0, 1.0),
                ("P", 1, 1.0),
                ("P", 1, 1.0),
                ("X", 2, 1.0),
                ("Q", 1, 1.0),
            ]))
            .unwrap();

        assert_eq!(shape(&built.root), "A[P,Q]");
        let kinds: Vec<FailureKind> = built.issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![FailureKind::DuplicatePartAtLevel, FailureKind::DiscardedWithDuplicate]
        );
    }

    #[test]
    fn test_same_part_under_different_parents_is_allowed() {
        let built = TreeBuilder::new()
            .build(rows(&[
                ("A", 0, 1.0),
                ("B", 1, 1.0),
                ("S", 2, 2.0),
                ("C", 1, 1.0),
                ("S", 2, 3.0),
            ]))
            .unwrap();

        assert_eq!(shape(&built.root), "A[B[S],C[S]]");
        assert!(built.issues.is_empty());
    }

    #[test]
    fn test_skipped_levels_attach_to_nearest_ancestor() {
        let built = TreeBuilder::new()
            .build(rows(&[("A", 0, 1.0), ("B", 3, 1.0), ("C", 1, 1.0), ("D", 2, 1.0)]))
            .unwrap();

        // B (level 3) closes when C (level 1) arrives, so D lands under C
        assert_eq!(shape(&built.root), "A[B,C[D]]");
    }

    #[test]
    fn test_root_need_not_be_level_zero() {
        let built = TreeBuilder::new()
            .build(rows(&[("A", 1, 1.0), ("B", 2, 1.0), ("C", 2, 1.0)]))
            .unwrap();
        assert_eq!(shape(&built.root), "A[B,C]");
    }

    #[test]
    fn test_invalid_row_is_rejected() {
        let mut input = rows(&[("A", 0, 1.0), ("B", 1, 1.0)]);
        input[1].quantity = -2.0;
        let err = TreeBuilder::new().build(input).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    /// Level sequences where each level is at most one deeper than the last,
    /// all below a single level-0 root.
    fn arb_levels() -> impl Strategy<Value = Vec<u32>> {
        prop::collection::vec(0..4u32, 0..40).prop_map(|steps| {
            let mut levels = vec![0];
            let mut current: u32 = 0;
            for step in steps {
                // step 0 goes one deeper, otherwise climb back `step - 1` levels
                current = if step == 0 {
                    current + 1
                } else {
                    current.saturating_sub(step - 1).max(1)
                };
                levels.push(current);
            }
            levels
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Every non-root node's parent is its nearest preceding row at a lower level
        #[test]
        fn prop_parent_is_nearest_enclosing_row(levels in arb_levels()) {
            // Unique part numbers keep duplicate detection out of the picture
            let input: Vec<BomRow> = levels.iter()
                .enumerate()
                .map(|(i, level)| BomRow::new(i + 2, format!("P{}", i), *level, 1.0).unwrap())
                .collect();

            let built = TreeBuilder::new().build(input.clone()).unwrap();
            prop_assert!(built.issues.is_empty());
            prop_assert_eq!(built.root.node_count(), input.len());

            let mut stack: Vec<&BomNode> = Vec::new();
            for (node, depth) in built.root.iter() {
                stack.truncate(depth);
                if let Some(parent) = stack.last() {
                    let expected = input[..node.row_number - 2]
                        .iter()
                        .rev()
                        .find(|r| r.level < node.level)
                        .unwrap();
                    prop_assert_eq!(&parent.part_number, &expected.part_number);
                }
                stack.push(node);
            }
        }

        /// Building twice yields the same tree
        #[test]
        fn prop_build_is_deterministic(levels in arb_levels()) {
            let input: Vec<BomRow> = levels.iter()
                .enumerate()
                .map(|(i, level)| {
                    BomRow::new(i + 2, format!("P{}", i % 5), *level, i as f64).unwrap()
                })
                .collect();

            let first = TreeBuilder::new().build(input.clone()).unwrap();
            let second = TreeBuilder::new().build(input).unwrap();
            prop_assert_eq!(first.root, second.root);
            prop_assert_eq!(first.issues, second.issues);
        }

        /// Pre-order of the built tree follows source row order
        #[test]
        fn prop_preorder_matches_source_order(levels in arb_levels()) {
            let input: Vec<BomRow> = levels.iter()
                .enumerate()
                .map(|(i, level)| BomRow::new(i + 2, format!("P{}", i), *level, 1.0).unwrap())
                .collect();

            let built = TreeBuilder::new().build(input).unwrap();
            let order: Vec<usize> = built.root.iter().map(|(n, _)| n.row_number).collect();
            let mut sorted = order.clone();
            sorted.sort_unstable();
            prop_assert_eq!(order, sorted);
        }
    }
}
