//! Property-based tests for the importer domain models
//!
//! Covers tree traversal accounting and report summary invariants.

use proptest::prelude::*;

use crate::{BomNode, BomRow, FailureKind, ImportReport, RowOutcome};

prop_compose! {
    fn arb_part_number()(prefix in "[A-Z]{2,4}", number in 1..99999u32) -> String {
        format!("{}-{:05}", prefix, number)
    }
}

prop_compose! {
    fn arb_leaf()(part_number in arb_part_number(), quantity in 0.0..100.0f64) -> BomNode {
        BomNode::from(BomRow::new(2, part_number, 0, quantity).unwrap())
    }
}

fn arb_tree() -> impl Strategy<Value = BomNode> {
    arb_leaf().prop_recursive(4, 32, 4, |inner| {
        (arb_leaf(), prop::collection::vec(inner, 0..4)).prop_map(|(mut node, children)| {
            node.children = children;
            node
        })
    })
}

fn arb_failure_kind() -> impl Strategy<Value = FailureKind> {
    prop_oneof![
        Just(FailureKind::DuplicatePartAtLevel),
        Just(FailureKind::DiscardedWithDuplicate),
        Just(FailureKind::PartCreation),
        Just(FailureKind::LinkCreation),
        Just(FailureKind::ParentUnresolved),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_preorder_visits_every_node_once(tree in arb_tree()) {
        let visited = tree.iter().count();
        prop_assert_eq!(visited, tree.node_count());

        let deepest = tree.iter().map(|(_, depth)| depth).max().unwrap_or(0);
        prop_assert_eq!(deepest, tree.max_depth());
    }

    #[test]
    fn prop_preorder_starts_at_root(tree in arb_tree()) {
        let (first, depth) = tree.iter().next().unwrap();
        prop_assert_eq!(&first.part_number, &tree.part_number);
        prop_assert_eq!(depth, 0);
    }

    #[test]
    fn prop_summary_accounts_for_every_outcome(
        successes in 0..20usize,
        failures in prop::collection::vec(arb_failure_kind(), 0..20),
    ) {
        let mut report = ImportReport::new();
        let node = BomNode::from(BomRow::new(2, "PN-1", 0, 1.0).unwrap());
        for _ in 0..successes {
            report.record(RowOutcome::success(&node));
        }
        for (i, kind) in failures.iter().enumerate() {
            report.record(RowOutcome::failure(i + 3, "PN-2", 1, *kind, "rejected"));
        }

        let summary = report.summary();
        prop_assert_eq!(summary.total, successes + failures.len());
        prop_assert_eq!(summary.succeeded + summary.failed, summary.total);
        prop_assert_eq!(summary.failed, report.failures().count());
    }
}
