// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use tracing::{instrument, trace};

use super::dynamic_tree::{DynamicTree, ProxyId, TreeConfig};
use crate::math::Vec2;
use crate::types::aabb::Aabb;
use crate::types::ray::RayCastInput;

/// Candidate pair of proxies whose fat AABBs overlap.
///
/// Always canonical: `proxy_a < proxy_b`. The derived ordering is
/// lexicographic on `(proxy_a, proxy_b)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pair {
    /// Smaller proxy id.
    pub proxy_a: ProxyId,
    /// Larger proxy id.
    pub proxy_b: ProxyId,
}

impl Pair {
    /// Canonical pair from two distinct ids in either order.
    pub fn new(a: ProxyId, b: ProxyId) -> Self {
        debug_assert_ne!(a, b, "a proxy cannot pair with itself");
        Self {
            proxy_a: a.min(b),
            proxy_b: a.max(b),
        }
    }
}

/// Broad phase: a [`DynamicTree`] plus a buffer of proxies that moved since
/// the last [`update_pairs`](Self::update_pairs).
///
/// Moving a proxy only records it; the pair search runs once per update over
/// the recorded proxies, so several moves between updates cost a single
/// sort-and-dedup pass.
#[derive(Debug, Clone)]
pub struct BroadPhase<T> {
    tree: DynamicTree<T>,
    /// `None` marks an entry cancelled by `destroy_proxy`.
    move_buffer: Vec<Option<ProxyId>>,
    pair_buffer: Vec<Pair>,
}

impl<T> Default for BroadPhase<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BroadPhase<T> {
    /// Empty broad phase with default tree fattening.
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Empty broad phase with custom tree fattening.
    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            tree: DynamicTree::with_config(config),
            move_buffer: Vec::with_capacity(16),
            pair_buffer: Vec::with_capacity(16),
        }
    }

    /// Creates a proxy and records it as moved, so its pairs are found on the
    /// next update.
    pub fn create_proxy(&mut self, aabb: Aabb, user_data: T) -> ProxyId {
        let id = self.tree.create_proxy(aabb, user_data);
        self.buffer_move(id);
        id
    }

    /// Destroys a proxy and returns its data. Pending moves for it are
    /// cancelled.
    pub fn destroy_proxy(&mut self, id: ProxyId) -> Option<T> {
        self.unbuffer_move(id);
        self.tree.destroy_proxy(id)
    }

    /// Moves a proxy; it is recorded only if the tree had to re-insert it.
    pub fn move_proxy(&mut self, id: ProxyId, aabb: Aabb, displacement: Vec2) {
        if self.tree.move_proxy(id, aabb, displacement) {
            self.buffer_move(id);
        }
    }

    /// Records a proxy as moved without changing it, forcing its pairs to be
    /// re-reported on the next update.
    pub fn touch_proxy(&mut self, id: ProxyId) {
        self.buffer_move(id);
    }

    /// Reports every new candidate pair once and clears the move buffer.
    ///
    /// For each recorded proxy the tree is queried with its fat AABB. Pairs
    /// are canonicalized, sorted and deduplicated before `callback` sees them,
    /// so a pair found from both sides is reported once, in ascending order.
    #[instrument(level = "trace", skip_all, fields(moved = self.move_buffer.len()))]
    pub fn update_pairs<F>(&mut self, mut callback: F)
    where
        F: FnMut(Pair, &T, &T),
    {
        self.pair_buffer.clear();

        for query_id in self.move_buffer.drain(..).flatten() {
            let fat = self.tree.fat_aabb(query_id);
            let pairs = &mut self.pair_buffer;
            self.tree.query(&fat, |proxy| {
                // A proxy does not pair with itself.
                if proxy != query_id {
                    pairs.push(Pair::new(proxy, query_id));
                }
                true
            });
        }

        self.pair_buffer.sort_unstable();
        self.pair_buffer.dedup();

        for pair in &self.pair_buffer {
            if let (Some(a), Some(b)) = (
                self.tree.user_data(pair.proxy_a),
                self.tree.user_data(pair.proxy_b),
            ) {
                callback(*pair, a, b);
            }
        }
        trace!(pairs = self.pair_buffer.len(), "broad-phase pairs updated");
    }

    /// Visits every proxy whose fat AABB overlaps `aabb`; see
    /// [`DynamicTree::query`].
    pub fn query<F>(&self, aabb: &Aabb, visit: F)
    where
        F: FnMut(ProxyId) -> bool,
    {
        self.tree.query(aabb, visit);
    }

    /// Ray cast against fat AABBs; see [`DynamicTree::ray_cast`].
    pub fn ray_cast<F>(&self, input: &RayCastInput, visit: F)
    where
        F: FnMut(&RayCastInput, ProxyId) -> f32,
    {
        self.tree.ray_cast(input, visit);
    }

    /// `true` if the two proxies' fat AABBs overlap.
    #[must_use]
    pub fn test_overlap(&self, a: ProxyId, b: ProxyId) -> bool {
        self.tree.fat_aabb(a).overlaps(&self.tree.fat_aabb(b))
    }

    /// Fat AABB of a proxy.
    #[must_use]
    pub fn fat_aabb(&self, id: ProxyId) -> Aabb {
        self.tree.fat_aabb(id)
    }

    /// Data attached to a proxy.
    #[must_use]
    pub fn user_data(&self, id: ProxyId) -> Option<&T> {
        self.tree.user_data(id)
    }

    /// Number of live proxies.
    #[must_use]
    pub const fn proxy_count(&self) -> usize {
        self.tree.proxy_count()
    }

    /// Number of entries waiting in the move buffer, cancelled ones included.
    #[must_use]
    pub fn move_count(&self) -> usize {
        self.move_buffer.len()
    }

    /// Height of the underlying tree.
    #[must_use]
    pub fn tree_height(&self) -> u32 {
        self.tree.height()
    }

    /// Largest child-height difference in the underlying tree.
    #[must_use]
    pub fn tree_balance(&self) -> u32 {
        self.tree.max_balance()
    }

    /// Area ratio of the underlying tree; see [`DynamicTree::area_ratio`].
    #[must_use]
    pub fn tree_quality(&self) -> f32 {
        self.tree.area_ratio()
    }

    /// Translates all proxies by `-new_origin`.
    pub fn shift_origin(&mut self, new_origin: Vec2) {
        self.tree.shift_origin(new_origin);
    }

    /// Read access to the underlying tree.
    #[must_use]
    pub const fn tree(&self) -> &DynamicTree<T> {
        &self.tree
    }

    fn buffer_move(&mut self, id: ProxyId) {
        self.move_buffer.push(Some(id));
    }

    fn unbuffer_move(&mut self, id: ProxyId) {
        for entry in &mut self.move_buffer {
            if *entry == Some(id) {
                *entry = None;
            }
        }
    }
}
