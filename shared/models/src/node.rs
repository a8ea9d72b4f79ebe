//! BOM tree node.

use serde::{Deserialize, Serialize};

use crate::row::{BomRow, PartAttributes};

/// A part instantiated at one position of a BOM tree.
///
/// The same part number may appear at several positions; each is a distinct
/// node with its own quantity. Children are owned by their parent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BomNode {
    pub row_number: usize,
    pub level: u32,
    pub part_number: String,
    /// Units of this part per one unit of the parent
    pub quantity: f64,
    pub attributes: PartAttributes,
    pub children: Vec<BomNode>,
}

impl From<BomRow> for BomNode {
    fn from(row: BomRow) -> Self {
        Self {
            row_number: row.row_number,
            level: row.level,
            part_number: row.part_number,
            quantity: row.quantity,
            attributes: row.attributes,
            children: Vec::new(),
        }
    }
}

impl BomNode {
    /// Checks whether a direct child already carries this part number
    pub fn has_child(&self, part_number: &str) -> bool {
        self.children.iter().any(|c| c.part_number == part_number)
    }

    /// Total number of nodes in this subtree, self included
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(BomNode::node_count).sum::<usize>()
    }

    /// Depth of the deepest node below this one (0 for a leaf)
    pub fn max_depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.max_depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Pre-order traversal yielding each node with its depth below `self`
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![(self, 0)] }
    }
}

/// Pre-order iterator over a [`BomNode`] subtree.
pub struct PreOrder<'a> {
    stack: Vec<(&'a BomNode, usize)>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = (&'a BomNode, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.stack.pop()?;
        // Reversed so the first child is visited first
        for child in node.children.iter().rev() {
            self.stack.push((child, depth + 1));
        }
        Some((node, depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(pn: &str, children: Vec<BomNode>) -> BomNode {
        let mut n = BomNode::from(BomRow::new(2, pn, 0, 1.0).unwrap());
        n.children = children;
        n
    }

    #[test]
    fn test_preorder_visits_parents_first() {
        let tree = node("A", vec![node("B", vec![node("C", vec![])]), node("D", vec![])]);
        let order: Vec<(&str, usize)> = tree
            .iter()
            .map(|(n, d)| (n.part_number.as_str(), d))
            .collect();
        assert_eq!(order, vec![("A", 0), ("B", 1), ("C", 2), ("D", 1)]);
        assert_eq!(tree.node_count(), 4);
        assert_eq!(tree.max_depth(), 2);
        assert!(tree.has_child("D"));
        assert!(!tree.has_child("C"));
    }
}
