// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use thiserror::Error;
use tracing::{instrument, trace};

use crate::math::{cross_sv, Vec2};
use crate::settings::{AABB_EXTENSION, AABB_MULTIPLIER};
use crate::types::aabb::Aabb;
use crate::types::ray::RayCastInput;

/// Sentinel index meaning "no node".
const NULL_NODE: usize = usize::MAX;

/// Initial traversal stack size for queries and ray casts.
const STACK_CAPACITY: usize = 256;

/// Handle to a leaf in a [`DynamicTree`].
///
/// Ids index the tree's node arena and stay valid until the proxy is
/// destroyed; destroyed ids are recycled by later insertions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProxyId(usize);

impl ProxyId {
    /// Arena index backing this id.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Fattening parameters for tree leaves.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeConfig {
    /// Uniform margin added around every leaf.
    pub aabb_extension: f32,
    /// Scale on the predicted displacement when a moved leaf is re-inserted.
    pub aabb_multiplier: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            aabb_extension: AABB_EXTENSION,
            aabb_multiplier: AABB_MULTIPLIER,
        }
    }
}

/// Structural defects found by [`DynamicTree::validate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The root node has a parent.
    #[error("root node {0} has a parent")]
    RootHasParent(usize),
    /// A child does not point back at its parent.
    #[error("node {child} does not point back at parent {parent}")]
    BadParent {
        /// Parent node.
        parent: usize,
        /// Child node.
        child: usize,
    },
    /// A leaf has exactly one child, or an index is out of range.
    #[error("node {0} has malformed children")]
    BadChildren(usize),
    /// Stored height disagrees with the children.
    #[error("node {node} stores height {stored}, expected {expected}")]
    BadHeight {
        /// Offending node.
        node: usize,
        /// Height in the node.
        stored: i32,
        /// Height recomputed from the children.
        expected: i32,
    },
    /// Stored AABB is not the union of the children's AABBs.
    #[error("node {0} AABB is not the union of its children")]
    BadAabb(usize),
    /// Node accounting does not add up.
    #[error("{live} live + {free} free nodes != arena size {capacity}")]
    FreeListMismatch {
        /// Live nodes.
        live: usize,
        /// Nodes on the free list.
        free: usize,
        /// Arena size.
        capacity: usize,
    },
    /// Reachable leaves disagree with the proxy count.
    #[error("{reachable} leaves reachable from the root, {proxies} proxies recorded")]
    LeafCountMismatch {
        /// Leaves reachable from the root.
        reachable: usize,
        /// Proxies created and not destroyed.
        proxies: usize,
    },
}

#[derive(Debug, Clone)]
struct TreeNode<T> {
    /// Fat AABB for leaves, union of children for internal nodes.
    aabb: Aabb,
    user_data: Option<T>,
    /// Parent while allocated, next free slot while on the free list.
    parent_or_next: usize,
    child1: usize,
    child2: usize,
    /// Leaf = 0, free = -1.
    height: i32,
}

impl<T> TreeNode<T> {
    const fn vacant() -> Self {
        Self {
            aabb: Aabb::ZERO,
            user_data: None,
            parent_or_next: NULL_NODE,
            child1: NULL_NODE,
            child2: NULL_NODE,
            height: -1,
        }
    }

    const fn is_leaf(&self) -> bool {
        self.child1 == NULL_NODE
    }
}

/// Dynamic AABB tree.
///
/// Leaves hold fattened AABBs plus caller data `T`; internal nodes hold the
/// union of their children. Insertion picks the sibling that minimizes the
/// growth in total perimeter and the tree is kept height-balanced with
/// AVL-style rotations, so queries stay `O(log n)` under churn. Nodes live in
/// a `Vec` arena with an intrusive free list; ids are arena indices and never
/// move.
#[derive(Debug, Clone)]
pub struct DynamicTree<T> {
    root: usize,
    nodes: Vec<TreeNode<T>>,
    node_count: usize,
    free_list: usize,
    proxy_count: usize,
    insertion_count: u64,
    config: TreeConfig,
}

impl<T> Default for DynamicTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DynamicTree<T> {
    /// Empty tree with default fattening.
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Empty tree with custom fattening.
    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            root: NULL_NODE,
            nodes: Vec::with_capacity(16),
            node_count: 0,
            free_list: NULL_NODE,
            proxy_count: 0,
            insertion_count: 0,
            config,
        }
    }

    /// Fattening parameters in use.
    pub const fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Number of live proxies (leaves).
    pub const fn proxy_count(&self) -> usize {
        self.proxy_count
    }

    /// Size of the node arena, including free slots.
    pub fn node_capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Total leaf insertions, including re-insertions caused by moves.
    pub const fn insertion_count(&self) -> u64 {
        self.insertion_count
    }

    /// Creates a leaf for `aabb`, fattened by the configured extension.
    pub fn create_proxy(&mut self, aabb: Aabb, user_data: T) -> ProxyId {
        let id = self.allocate_node();
        let node = &mut self.nodes[id];
        node.aabb = aabb.extended(self.config.aabb_extension);
        node.user_data = Some(user_data);
        node.height = 0;
        self.proxy_count += 1;
        self.insert_leaf(id);
        ProxyId(id)
    }

    /// Removes a leaf and returns its data; `None` if `id` is not a live leaf.
    pub fn destroy_proxy(&mut self, id: ProxyId) -> Option<T> {
        debug_assert!(self.is_live_leaf(id.0), "destroy of unknown proxy {id:?}");
        if !self.is_live_leaf(id.0) {
            return None;
        }
        self.remove_leaf(id.0);
        let data = self.nodes[id.0].user_data.take();
        self.free_node(id.0);
        self.proxy_count -= 1;
        data
    }

    /// Updates a leaf after its shape moved.
    ///
    /// Returns `false` and leaves the tree untouched when the stored fat AABB
    /// still contains `aabb`. Otherwise the leaf is re-inserted with `aabb`
    /// fattened by the extension and stretched along `displacement` (scaled by
    /// the multiplier), and `true` is returned so callers can re-buffer it.
    pub fn move_proxy(&mut self, id: ProxyId, aabb: Aabb, displacement: Vec2) -> bool {
        debug_assert!(self.is_live_leaf(id.0), "move of unknown proxy {id:?}");
        if !self.is_live_leaf(id.0) || self.nodes[id.0].aabb.contains(&aabb) {
            return false;
        }

        self.remove_leaf(id.0);
        let fat = aabb
            .extended(self.config.aabb_extension)
            .swept(displacement * self.config.aabb_multiplier);
        self.nodes[id.0].aabb = fat;
        self.insert_leaf(id.0);
        true
    }

    /// Stored fat AABB of a leaf.
    ///
    /// # Panics
    /// Panics if `id` was never issued by this tree.
    #[must_use]
    pub fn fat_aabb(&self, id: ProxyId) -> Aabb {
        debug_assert!(self.is_live_leaf(id.0), "fat_aabb of unknown proxy {id:?}");
        self.nodes[id.0].aabb
    }

    /// Caller data of a live leaf.
    #[must_use]
    pub fn user_data(&self, id: ProxyId) -> Option<&T> {
        self.nodes.get(id.0).and_then(|n| n.user_data.as_ref())
    }

    /// Visits every leaf whose fat AABB overlaps `aabb`. Returning `false`
    /// from `visit` stops the query.
    pub fn query<F>(&self, aabb: &Aabb, mut visit: F)
    where
        F: FnMut(ProxyId) -> bool,
    {
        let mut stack = Vec::with_capacity(STACK_CAPACITY);
        stack.push(self.root);

        while let Some(index) = stack.pop() {
            if index == NULL_NODE {
                continue;
            }
            let node = &self.nodes[index];
            if node.aabb.overlaps(aabb) {
                if node.is_leaf() {
                    if !visit(ProxyId(index)) {
                        return;
                    }
                } else {
                    stack.push(node.child1);
                    stack.push(node.child2);
                }
            }
        }
    }

    /// Casts a ray against the leaves' fat AABBs.
    ///
    /// `visit` receives the current (possibly clipped) input and the leaf,
    /// and returns the new max fraction: `0` stops the cast, a negative value
    /// ignores the leaf, and a positive value clips the ray to that fraction.
    pub fn ray_cast<F>(&self, input: &RayCastInput, mut visit: F)
    where
        F: FnMut(&RayCastInput, ProxyId) -> f32,
    {
        let p1 = input.p1;
        let p2 = input.p2;
        let r = (p2 - p1).normalize();
        debug_assert!(r.length_squared() > 0.0, "degenerate ray");

        // Separating axis for the segment: |dot(v, p1 - c)| > dot(|v|, h).
        let v = cross_sv(1.0, r);
        let abs_v = v.abs();

        let mut max_fraction = input.max_fraction;
        let segment_aabb = |fraction: f32| {
            let t = p1 + (p2 - p1) * fraction;
            Aabb::new(p1.min(t), p1.max(t))
        };
        let mut bounds = segment_aabb(max_fraction);

        let mut stack = Vec::with_capacity(STACK_CAPACITY);
        stack.push(self.root);

        while let Some(index) = stack.pop() {
            if index == NULL_NODE {
                continue;
            }
            let node = &self.nodes[index];
            if !node.aabb.overlaps(&bounds) {
                continue;
            }

            let c = node.aabb.center();
            let h = node.aabb.extents();
            let separation = v.dot(p1 - c).abs() - abs_v.dot(h);
            if separation > 0.0 {
                continue;
            }

            if node.is_leaf() {
                let sub_input = RayCastInput {
                    p1,
                    p2,
                    max_fraction,
                };
                let value = visit(&sub_input, ProxyId(index));
                if value == 0.0 {
                    return;
                }
                if value > 0.0 {
                    max_fraction = value;
                    bounds = segment_aabb(max_fraction);
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }

    /// Height of the root (0 for an empty tree or a single leaf).
    #[must_use]
    pub fn height(&self) -> u32 {
        if self.root == NULL_NODE {
            return 0;
        }
        u32::try_from(self.nodes[self.root].height).unwrap_or(0)
    }

    /// Largest height difference between the two children of any node.
    #[must_use]
    pub fn max_balance(&self) -> u32 {
        self.nodes
            .iter()
            .filter(|n| n.height > 1)
            .map(|n| (self.nodes[n.child2].height - self.nodes[n.child1].height).unsigned_abs())
            .max()
            .unwrap_or(0)
    }

    /// Sum of all node perimeters divided by the root perimeter; lower is
    /// better. Returns 0 for an empty tree.
    #[must_use]
    pub fn area_ratio(&self) -> f32 {
        if self.root == NULL_NODE {
            return 0.0;
        }
        let root_area = self.nodes[self.root].aabb.perimeter();
        let total: f32 = self
            .nodes
            .iter()
            .filter(|n| n.height >= 0)
            .map(|n| n.aabb.perimeter())
            .sum();
        total / root_area
    }

    /// Translates every node by `-new_origin`.
    pub fn shift_origin(&mut self, new_origin: Vec2) {
        for node in &mut self.nodes {
            node.aabb = node.aabb.translated(-new_origin);
        }
    }

    /// Rebuilds the tree bottom-up by greedily pairing the leaves whose union
    /// has the smallest perimeter. `O(n^3)`; meant for offline or
    /// load-time use, not per step.
    #[instrument(level = "trace", skip_all, fields(proxies = self.proxy_count))]
    pub fn rebuild_bottom_up(&mut self) {
        let mut pending: Vec<usize> = Vec::with_capacity(self.proxy_count);

        for index in 0..self.nodes.len() {
            if self.nodes[index].height < 0 {
                continue;
            }
            if self.nodes[index].is_leaf() {
                self.nodes[index].parent_or_next = NULL_NODE;
                pending.push(index);
            } else {
                self.free_node(index);
            }
        }

        while pending.len() > 1 {
            let mut min_cost = f32::MAX;
            let (mut i_min, mut j_min) = (0, 1);
            for i in 0..pending.len() {
                let aabb_i = self.nodes[pending[i]].aabb;
                for j in (i + 1)..pending.len() {
                    let cost = aabb_i.combine(&self.nodes[pending[j]].aabb).perimeter();
                    if cost < min_cost {
                        i_min = i;
                        j_min = j;
                        min_cost = cost;
                    }
                }
            }

            let child1 = pending[i_min];
            let child2 = pending[j_min];
            let parent = self.allocate_node();
            let aabb = self.nodes[child1].aabb.combine(&self.nodes[child2].aabb);
            let height = 1 + self.nodes[child1].height.max(self.nodes[child2].height);
            let node = &mut self.nodes[parent];
            node.child1 = child1;
            node.child2 = child2;
            node.height = height;
            node.aabb = aabb;
            node.parent_or_next = NULL_NODE;
            self.nodes[child1].parent_or_next = parent;
            self.nodes[child2].parent_or_next = parent;

            pending.swap_remove(j_min);
            pending[i_min] = parent;
        }

        self.root = pending.first().copied().unwrap_or(NULL_NODE);
        trace!(height = self.height(), "tree rebuilt bottom-up");
    }

    /// Checks parent links, heights, AABB unions and node accounting.
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.root != NULL_NODE && self.nodes[self.root].parent_or_next != NULL_NODE {
            return Err(TreeError::RootHasParent(self.root));
        }
        let reachable = self.validate_subtree(self.root)?;
        if reachable != self.proxy_count {
            return Err(TreeError::LeafCountMismatch {
                reachable,
                proxies: self.proxy_count,
            });
        }

        let mut free = 0;
        let mut index = self.free_list;
        while index != NULL_NODE && free <= self.nodes.len() {
            index = self.nodes[index].parent_or_next;
            free += 1;
        }
        if self.node_count + free != self.nodes.len() {
            return Err(TreeError::FreeListMismatch {
                live: self.node_count,
                free,
                capacity: self.nodes.len(),
            });
        }
        Ok(())
    }

    // Returns the number of leaves under `index`. Recursion depth is bounded
    // by the tree height.
    fn validate_subtree(&self, index: usize) -> Result<usize, TreeError> {
        if index == NULL_NODE {
            return Ok(0);
        }
        let node = &self.nodes[index];
        if node.is_leaf() {
            if node.child2 != NULL_NODE {
                return Err(TreeError::BadChildren(index));
            }
            if node.height != 0 {
                return Err(TreeError::BadHeight {
                    node: index,
                    stored: node.height,
                    expected: 0,
                });
            }
            return Ok(1);
        }

        let (c1, c2) = (node.child1, node.child2);
        if c1 >= self.nodes.len() || c2 >= self.nodes.len() {
            return Err(TreeError::BadChildren(index));
        }
        for child in [c1, c2] {
            if self.nodes[child].parent_or_next != index {
                return Err(TreeError::BadParent {
                    parent: index,
                    child,
                });
            }
        }

        let expected = 1 + self.nodes[c1].height.max(self.nodes[c2].height);
        if node.height != expected {
            return Err(TreeError::BadHeight {
                node: index,
                stored: node.height,
                expected,
            });
        }
        if node.aabb != self.nodes[c1].aabb.combine(&self.nodes[c2].aabb) {
            return Err(TreeError::BadAabb(index));
        }

        Ok(self.validate_subtree(c1)? + self.validate_subtree(c2)?)
    }

    fn is_live_leaf(&self, index: usize) -> bool {
        self.nodes
            .get(index)
            .is_some_and(|n| n.height == 0 && n.is_leaf())
    }

    fn allocate_node(&mut self) -> usize {
        let index = if self.free_list == NULL_NODE {
            self.nodes.push(TreeNode::vacant());
            self.nodes.len() - 1
        } else {
            let index = self.free_list;
            self.free_list = self.nodes[index].parent_or_next;
            index
        };
        let node = &mut self.nodes[index];
        node.parent_or_next = NULL_NODE;
        node.child1 = NULL_NODE;
        node.child2 = NULL_NODE;
        node.height = 0;
        node.user_data = None;
        self.node_count += 1;
        index
    }

    fn free_node(&mut self, index: usize) {
        debug_assert!(self.node_count > 0);
        let node = &mut self.nodes[index];
        node.parent_or_next = self.free_list;
        node.child1 = NULL_NODE;
        node.child2 = NULL_NODE;
        node.height = -1;
        node.user_data = None;
        self.free_list = index;
        self.node_count -= 1;
    }

    fn insert_leaf(&mut self, leaf: usize) {
        self.insertion_count += 1;

        if self.root == NULL_NODE {
            self.root = leaf;
            self.nodes[leaf].parent_or_next = NULL_NODE;
            return;
        }

        // Find the best sibling for this leaf.
        let leaf_aabb = self.nodes[leaf].aabb;
        let mut index = self.root;
        while !self.nodes[index].is_leaf() {
            let node = &self.nodes[index];
            let area = node.aabb.perimeter();
            let combined_area = node.aabb.combine(&leaf_aabb).perimeter();

            // Cost of creating a new parent for this node and the new leaf.
            let cost = 2.0 * combined_area;
            // Minimum cost of pushing the leaf further down the tree.
            let inheritance_cost = 2.0 * (combined_area - area);

            let cost1 = self.descend_cost(node.child1, &leaf_aabb, inheritance_cost);
            let cost2 = self.descend_cost(node.child2, &leaf_aabb, inheritance_cost);

            if cost < cost1 && cost < cost2 {
                break;
            }
            index = if cost1 < cost2 {
                node.child1
            } else {
                node.child2
            };
        }
        let sibling = index;

        // Create a new parent.
        let old_parent = self.nodes[sibling].parent_or_next;
        let new_parent = self.allocate_node();
        let sibling_aabb = self.nodes[sibling].aabb;
        let sibling_height = self.nodes[sibling].height;
        {
            let node = &mut self.nodes[new_parent];
            node.parent_or_next = old_parent;
            node.aabb = leaf_aabb.combine(&sibling_aabb);
            node.height = sibling_height + 1;
            node.child1 = sibling;
            node.child2 = leaf;
        }
        if old_parent == NULL_NODE {
            self.root = new_parent;
        } else if self.nodes[old_parent].child1 == sibling {
            self.nodes[old_parent].child1 = new_parent;
        } else {
            self.nodes[old_parent].child2 = new_parent;
        }
        self.nodes[sibling].parent_or_next = new_parent;
        self.nodes[leaf].parent_or_next = new_parent;

        let start = self.nodes[leaf].parent_or_next;
        self.refit_ancestors(start);
    }

    fn descend_cost(&self, child: usize, leaf_aabb: &Aabb, inheritance_cost: f32) -> f32 {
        let node = &self.nodes[child];
        let combined = leaf_aabb.combine(&node.aabb);
        if node.is_leaf() {
            combined.perimeter() + inheritance_cost
        } else {
            combined.perimeter() - node.aabb.perimeter() + inheritance_cost
        }
    }

    fn remove_leaf(&mut self, leaf: usize) {
        if leaf == self.root {
            self.root = NULL_NODE;
            return;
        }

        let parent = self.nodes[leaf].parent_or_next;
        let grand_parent = self.nodes[parent].parent_or_next;
        let sibling = if self.nodes[parent].child1 == leaf {
            self.nodes[parent].child2
        } else {
            self.nodes[parent].child1
        };

        if grand_parent == NULL_NODE {
            self.root = sibling;
            self.nodes[sibling].parent_or_next = NULL_NODE;
            self.free_node(parent);
            return;
        }

        // Destroy the parent and connect the sibling to the grand parent.
        if self.nodes[grand_parent].child1 == parent {
            self.nodes[grand_parent].child1 = sibling;
        } else {
            self.nodes[grand_parent].child2 = sibling;
        }
        self.nodes[sibling].parent_or_next = grand_parent;
        self.free_node(parent);

        self.refit_ancestors(grand_parent);
    }

    // Walks from `index` to the root, rebalancing and refreshing heights and
    // AABBs on the way.
    fn refit_ancestors(&mut self, mut index: usize) {
        while index != NULL_NODE {
            index = self.balance(index);

            let c1 = self.nodes[index].child1;
            let c2 = self.nodes[index].child2;
            debug_assert!(c1 != NULL_NODE && c2 != NULL_NODE);

            let height = 1 + self.nodes[c1].height.max(self.nodes[c2].height);
            let aabb = self.nodes[c1].aabb.combine(&self.nodes[c2].aabb);
            let node = &mut self.nodes[index];
            node.height = height;
            node.aabb = aabb;

            index = node.parent_or_next;
        }
    }

    // Performs a left or right rotation if node `a` is imbalanced and returns
    // the new root of the subtree.
    fn balance(&mut self, a: usize) -> usize {
        if self.nodes[a].is_leaf() || self.nodes[a].height < 2 {
            return a;
        }

        let b = self.nodes[a].child1;
        let c = self.nodes[a].child2;
        let balance = self.nodes[c].height - self.nodes[b].height;

        if balance > 1 {
            self.rotate_up(a, c, b, false);
            return c;
        }
        if balance < -1 {
            self.rotate_up(a, b, c, true);
            return b;
        }
        a
    }

    // Promotes `up` (a child of `a`) above `a`. `other` is `a`'s remaining
    // child. `a` takes the place of `up` in `a`'s child slot, and the shorter
    // grandchild of `up` moves under `a`.
    fn rotate_up(&mut self, a: usize, up: usize, other: usize, up_was_child1: bool) {
        let f = self.nodes[up].child1;
        let g = self.nodes[up].child2;

        // Swap `a` and `up`.
        let a_parent = self.nodes[a].parent_or_next;
        self.nodes[up].child1 = a;
        self.nodes[up].parent_or_next = a_parent;
        self.nodes[a].parent_or_next = up;

        if a_parent == NULL_NODE {
            self.root = up;
        } else if self.nodes[a_parent].child1 == a {
            self.nodes[a_parent].child1 = up;
        } else {
            debug_assert_eq!(self.nodes[a_parent].child2, a);
            self.nodes[a_parent].child2 = up;
        }

        // The taller grandchild stays with `up`; the other goes under `a`.
        let (keep, moved) = if self.nodes[f].height > self.nodes[g].height {
            (f, g)
        } else {
            (g, f)
        };
        self.nodes[up].child2 = keep;
        if up_was_child1 {
            self.nodes[a].child1 = moved;
        } else {
            self.nodes[a].child2 = moved;
        }
        self.nodes[moved].parent_or_next = a;

        let a_aabb = self.nodes[other].aabb.combine(&self.nodes[moved].aabb);
        let a_height = 1 + self.nodes[other].height.max(self.nodes[moved].height);
        self.nodes[a].aabb = a_aabb;
        self.nodes[a].height = a_height;

        self.nodes[up].aabb = a_aabb.combine(&self.nodes[keep].aabb);
        self.nodes[up].height = 1 + a_height.max(self.nodes[keep].height);
    }
}
