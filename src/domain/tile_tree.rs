// ============================================================
// Layer 3 — TileTree
// ============================================================
// A 4-ary tree whose node indices name the slots of a patch
// pyramid. Index 0 is the full image; every split allocates
// four consecutive indices for the quadrants (TL, TR, BL, BR)
// and then descends into them one at a time, so the first
// quadrant's whole subtree is numbered before the second
// quadrant's children.
//
// Example, depth 2:
//
//   0
//   ├── 1 ── 5  6  7  8
//   ├── 2 ── 9 10 11 12
//   ├── 3 ── 13 14 15 16
//   └── 4 ── 17 18 19 20
//
// Nodes live in an arena (a Vec) and point at their parent by
// index, so walking from a leaf back to the root never needs
// shared ownership. Because indices are handed out in the
// same order nodes are pushed, arena position == node index.
//
// The tree is built once per dataset configuration and only
// read afterwards.

/// Index of the root (full-image) tile
pub const ROOT_INDEX: usize = 0;

/// Every split produces this many children
pub const BRANCHING: usize = 4;

/// One node of the tile tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileNode {
    /// Pyramid slot this node names
    pub index: usize,

    /// Parent slot, `None` for the root
    pub parent: Option<usize>,

    /// Child slots in quadrant order (TL, TR, BL, BR); empty for leaves
    pub children: Vec<usize>,
}

/// Arena-backed tile index tree
#[derive(Debug, Clone, Default)]
pub struct TileTree {
    nodes:  Vec<TileNode>,
    leaves: Vec<usize>,
    depth:  usize,
}

impl TileTree {
    /// Build a tree with `depth` levels of subdivision below the root.
    ///
    /// * `depth < 0`  → an empty tree (no root, no leaves)
    /// * `depth == 0` → the root alone, no leaves
    /// * `depth >= 1` → `4^depth` leaves
    pub fn build(depth: i32) -> Self {
        let mut tree = Self::default();
        if depth < 0 {
            tracing::debug!("TileTree requested with negative depth {}; returning empty tree", depth);
            return tree;
        }

        tree.nodes.push(TileNode { index: ROOT_INDEX, parent: None, children: Vec::new() });
        tree.depth = depth as usize;

        if depth > 0 {
            let next = tree.expand(depth as usize, ROOT_INDEX + 1, ROOT_INDEX);
            debug_assert_eq!(next, tree.nodes.len());
        }

        tracing::debug!(
            "Built TileTree: depth={}, nodes={}, leaves={}",
            tree.depth,
            tree.nodes.len(),
            tree.leaves.len()
        );
        tree
    }

    /// Allocate the four children of `node`, then descend into each
    /// of them in order. Returns the next free index.
    fn expand(&mut self, remaining: usize, mut next: usize, node: usize) -> usize {
        let children: Vec<usize> = (next..next + BRANCHING).collect();
        for &child in &children {
            self.nodes.push(TileNode { index: child, parent: Some(node), children: Vec::new() });
        }
        self.nodes[node].children = children.clone();
        next += BRANCHING;

        if remaining == 1 {
            self.leaves.extend_from_slice(&children);
        } else {
            for child in children {
                next = self.expand(remaining - 1, next, child);
            }
        }
        next
    }

    /// Leaf indices in allocation order
    pub fn leaves(&self) -> &[usize] {
        &self.leaves
    }

    /// Levels of subdivision below the root
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> Option<&TileNode> {
        self.nodes.get(index)
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.nodes.get(index).and_then(|n| n.parent)
    }

    pub fn children(&self, index: usize) -> &[usize] {
        self.nodes.get(index).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Walk from `index` towards the root, excluding `index` itself.
    /// The last item is always the root.
    pub fn ancestors(&self, index: usize) -> Ancestors<'_> {
        Ancestors { tree: self, current: self.parent(index) }
    }

    /// The chain `index → parent → … → root`, both ends included.
    /// Used to pull the increasingly zoomed-out tiles of one region
    /// out of a pyramid.
    pub fn path_to_root(&self, index: usize) -> Vec<usize> {
        if index >= self.nodes.len() {
            return Vec::new();
        }
        std::iter::once(index).chain(self.ancestors(index)).collect()
    }

    /// How many splits separate `index` from the root
    pub fn depth_of(&self, index: usize) -> Option<usize> {
        self.node(index).map(|_| self.ancestors(index).count())
    }

    /// Node count of a tree built with `depth`: 1 + 4 + … + 4^depth
    pub fn node_count(depth: usize) -> usize {
        (0..=depth).map(|level| BRANCHING.pow(level as u32)).sum()
    }
}

/// Iterator over a node's ancestors, nearest first
pub struct Ancestors<'a> {
    tree:    &'a TileTree,
    current: Option<usize>,
}

impl Iterator for Ancestors<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let index = self.current?;
        self.current = self.tree.parent(index);
        Some(index)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_count_is_power_of_four() {
        for depth in 1..=4 {
            let tree = TileTree::build(depth);
            assert_eq!(tree.leaves().len(), 4usize.pow(depth as u32));
        }
    }

    #[test]
    fn test_every_leaf_has_depth_ancestors() {
        for depth in 1..=3 {
            let tree = TileTree::build(depth);
            for &leaf in tree.leaves() {
                let chain: Vec<usize> = tree.ancestors(leaf).collect();
                assert_eq!(chain.len(), depth as usize);
                assert_eq!(*chain.last().unwrap(), ROOT_INDEX);
            }
        }
    }

    #[test]
    fn test_depth_two_scenario() {
        let tree = TileTree::build(2);
        assert_eq!(tree.leaves().len(), 16);
        assert_eq!(tree.len(), 21);

        // Arbitrary leaf: walking upward must end at the root
        let leaf = tree.leaves()[11];
        let path = tree.path_to_root(leaf);
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], leaf);
        assert_eq!(path[2], ROOT_INDEX);
        assert_eq!(tree.depth_of(leaf), Some(2));
    }

    #[test]
    fn test_preorder_index_assignment() {
        let tree = TileTree::build(2);
        assert_eq!(tree.children(ROOT_INDEX), &[1, 2, 3, 4]);
        // First quadrant's children come right after the root's children
        assert_eq!(tree.children(1), &[5, 6, 7, 8]);
        assert_eq!(tree.children(2), &[9, 10, 11, 12]);
        assert_eq!(tree.children(4), &[17, 18, 19, 20]);
        assert_eq!(tree.parent(12), Some(2));

        // Arena position matches the node's index
        for i in 0..tree.len() {
            assert_eq!(tree.node(i).unwrap().index, i);
        }
    }

    #[test]
    fn test_depth_three_threads_indices_through_subtrees() {
        let tree = TileTree::build(3);
        // 1 + 4 are allocated, then node 1's children 5..=8,
        // then node 5's leaves 9..=12 before node 6's
        assert_eq!(tree.children(1), &[5, 6, 7, 8]);
        assert_eq!(tree.children(5), &[9, 10, 11, 12]);
        assert_eq!(tree.children(6), &[13, 14, 15, 16]);
        assert_eq!(tree.leaves()[0], 9);
        assert_eq!(tree.len(), TileTree::node_count(3));
    }

    #[test]
    fn test_zero_depth_is_root_only() {
        let tree = TileTree::build(0);
        assert_eq!(tree.len(), 1);
        assert!(tree.leaves().is_empty());
        assert!(tree.children(ROOT_INDEX).is_empty());
        assert_eq!(tree.ancestors(ROOT_INDEX).count(), 0);
    }

    #[test]
    fn test_negative_depth_is_empty() {
        let tree = TileTree::build(-1);
        assert!(tree.is_empty());
        assert!(tree.leaves().is_empty());
        assert!(tree.path_to_root(0).is_empty());
    }
}
