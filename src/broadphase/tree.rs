//! Dynamic AABB tree: self-balancing binary tree of fattened bounding
//! boxes.

use crate::math::{vec2, Vec2};
use crate::shapes::Aabb;
use crate::settings::{AABB_EXTENSION, AABB_MULTIPLIER};

const NULL_NODE: i32 = -1;

/// Stable handle to a tree leaf, returned by `create_proxy`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeProxyId(pub u32);

#[derive(Clone, Debug)]
struct TreeNode<T> {
    aabb: Aabb,
    parent_or_next: i32,
    child1: i32,
    child2: i32,
    /// -1 indicates a free-list slot, 0 a leaf, >0 internal node height.
    height: i32,
    user_data: Option<T>,
}

impl<T> TreeNode<T> {
    fn is_leaf(&self) -> bool {
        self.child1 == NULL_NODE
    }
}

/// A dynamic, incrementally-updated AABB tree used by the broad-phase to
/// produce overlap candidate pairs.
///
/// Invariants (checked by [`DynamicTree::validate`] in tests): every
/// internal node's AABB encloses both children's AABBs; heights are
/// consistent with children; the free list plus live nodes cover the node
/// pool exactly.
#[derive(Clone, Debug)]
pub struct DynamicTree<T> {
    nodes: Vec<TreeNode<T>>,
    root: i32,
    free_list: i32,
    node_count: usize,
    node_capacity: usize,
}

pub struct RayCastInput {
    pub p1: Vec2,
    pub p2: Vec2,
    pub max_fraction: f32,
}

impl<T: Clone> Default for DynamicTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> DynamicTree<T> {
    pub fn new() -> Self {
        let initial_capacity = 16;
        let mut nodes = Vec::with_capacity(initial_capacity);
        for i in 0..initial_capacity {
            nodes.push(TreeNode {
                aabb: Aabb::new(vec2(0.0, 0.0), vec2(0.0, 0.0)),
                parent_or_next: if i == initial_capacity - 1 {
                    NULL_NODE
                } else {
                    i as i32 + 1
                },
                child1: NULL_NODE,
                child2: NULL_NODE,
                height: -1,
                user_data: None,
            });
        }
        DynamicTree {
            nodes,
            root: NULL_NODE,
            free_list: 0,
            node_count: 0,
            node_capacity: initial_capacity,
        }
    }

    fn allocate_node(&mut self) -> i32 {
        if self.free_list == NULL_NODE {
            debug_assert_eq!(self.nodes.len(), self.node_capacity);
            let old_capacity = self.node_capacity;
            self.node_capacity *= 2;
            for i in old_capacity..self.node_capacity {
                self.nodes.push(TreeNode {
                    aabb: Aabb::new(vec2(0.0, 0.0), vec2(0.0, 0.0)),
                    parent_or_next: if i == self.node_capacity - 1 {
                        NULL_NODE
                    } else {
                        i as i32 + 1
                    },
                    child1: NULL_NODE,
                    child2: NULL_NODE,
                    height: -1,
                    user_data: None,
                });
            }
            self.free_list = old_capacity as i32;
        }
        let node_id = self.free_list;
        self.free_list = self.nodes[node_id as usize].parent_or_next;
        self.nodes[node_id as usize].parent_or_next = NULL_NODE;
        self.nodes[node_id as usize].child1 = NULL_NODE;
        self.nodes[node_id as usize].child2 = NULL_NODE;
        self.nodes[node_id as usize].height = 0;
        self.nodes[node_id as usize].user_data = None;
        self.node_count += 1;
        node_id
    }

    fn free_node(&mut self, node_id: i32) {
        self.nodes[node_id as usize].parent_or_next = self.free_list;
        self.nodes[node_id as usize].height = -1;
        self.free_list = node_id;
        self.node_count -= 1;
    }

    /// Inserts a new leaf, inflating `aabb` by `AABB_EXTENSION` first, and
    /// rebalances along the insertion path. Returns the proxy's stable id.
    pub fn create_proxy(&mut self, aabb: Aabb, user_data: T) -> TreeProxyId {
        let node_id = self.allocate_node();
        self.nodes[node_id as usize].aabb = aabb.extended(AABB_EXTENSION);
        self.nodes[node_id as usize].height = 0;
        self.nodes[node_id as usize].user_data = Some(user_data);
        self.insert_leaf(node_id);
        TreeProxyId(node_id as u32)
    }

    pub fn destroy_proxy(&mut self, proxy: TreeProxyId) {
        let node_id = proxy.0 as i32;
        debug_assert!(self.nodes[node_id as usize].is_leaf());
        self.remove_leaf(node_id);
        self.free_node(node_id);
    }

    /// Re-inserts the proxy if its fattened AABB no longer contains the
    /// tight `aabb`, expanding in the direction of `displacement`.
    pub fn move_proxy(&mut self, proxy: TreeProxyId, aabb: Aabb, displacement: Vec2) -> bool {
        let node_id = proxy.0 as i32;
        debug_assert!(self.nodes[node_id as usize].is_leaf());

        if self.nodes[node_id as usize].aabb.contains(&aabb) {
            return false;
        }

        self.remove_leaf(node_id);

        let mut fat_aabb = aabb.extended(AABB_EXTENSION);
        let d = displacement * AABB_MULTIPLIER;
        if d.x < 0.0 {
            fat_aabb.lower.x += d.x;
        } else {
            fat_aabb.upper.x += d.x;
        }
        if d.y < 0.0 {
            fat_aabb.lower.y += d.y;
        } else {
            fat_aabb.upper.y += d.y;
        }
        self.nodes[node_id as usize].aabb = fat_aabb;
        self.insert_leaf(node_id);
        true
    }

    pub fn user_data(&self, proxy: TreeProxyId) -> &T {
        self.nodes[proxy.0 as usize].user_data.as_ref().unwrap()
    }

    pub fn fat_aabb(&self, proxy: TreeProxyId) -> Aabb {
        self.nodes[proxy.0 as usize].aabb
    }

    pub fn height(&self) -> i32 {
        if self.root == NULL_NODE {
            0
        } else {
            self.nodes[self.root as usize].height
        }
    }

    pub fn proxy_count(&self) -> usize {
        self.node_count
    }

    /// Ratio of total internal-node area to root-AABB area, a rough tree
    /// quality metric (lower is tighter).
    pub fn area_ratio(&self) -> f32 {
        if self.root == NULL_NODE {
            return 0.0;
        }
        let root_area = self.nodes[self.root as usize].aabb.perimeter();
        let mut total_area = 0.0;
        for node in &self.nodes {
            if node.height < 0 {
                continue;
            }
            total_area += node.aabb.perimeter();
        }
        total_area / root_area
    }

    fn insert_leaf(&mut self, leaf: i32) {
        if self.root == NULL_NODE {
            self.root = leaf;
            self.nodes[leaf as usize].parent_or_next = NULL_NODE;
            return;
        }

        let leaf_aabb = self.nodes[leaf as usize].aabb;
        let mut index = self.root;
        while !self.nodes[index as usize].is_leaf() {
            let child1 = self.nodes[index as usize].child1;
            let child2 = self.nodes[index as usize].child2;

            let area = self.nodes[index as usize].aabb.perimeter();
            let combined_aabb = self.nodes[index as usize].aabb.union(&leaf_aabb);
            let combined_area = combined_aabb.perimeter();

            let cost = 2.0 * combined_area;
            let inheritance_cost = 2.0 * (combined_area - area);

            let cost1 = Self::child_cost(&self.nodes[child1 as usize], &leaf_aabb, inheritance_cost);
            let cost2 = Self::child_cost(&self.nodes[child2 as usize], &leaf_aabb, inheritance_cost);

            if cost < cost1 && cost < cost2 {
                break;
            }

            index = if cost1 < cost2 { child1 } else { child2 };
        }

        let sibling = index;
        let old_parent = self.nodes[sibling as usize].parent_or_next;
        let new_parent = self.allocate_node();
        self.nodes[new_parent as usize].parent_or_next = old_parent;
        self.nodes[new_parent as usize].aabb = leaf_aabb.union(&self.nodes[sibling as usize].aabb);
        self.nodes[new_parent as usize].height = self.nodes[sibling as usize].height + 1;

        if old_parent != NULL_NODE {
            if self.nodes[old_parent as usize].child1 == sibling {
                self.nodes[old_parent as usize].child1 = new_parent;
            } else {
                self.nodes[old_parent as usize].child2 = new_parent;
            }
            self.nodes[new_parent as usize].child1 = sibling;
            self.nodes[new_parent as usize].child2 = leaf;
            self.nodes[sibling as usize].parent_or_next = new_parent;
            self.nodes[leaf as usize].parent_or_next = new_parent;
        } else {
            self.nodes[new_parent as usize].child1 = sibling;
            self.nodes[new_parent as usize].child2 = leaf;
            self.nodes[sibling as usize].parent_or_next = new_parent;
            self.nodes[leaf as usize].parent_or_next = new_parent;
            self.root = new_parent;
        }

        let mut index = self.nodes[leaf as usize].parent_or_next;
        while index != NULL_NODE {
            index = self.balance(index);
            let child1 = self.nodes[index as usize].child1;
            let child2 = self.nodes[index as usize].child2;
            self.nodes[index as usize].height =
                1 + self.nodes[child1 as usize].height.max(self.nodes[child2 as usize].height);
            self.nodes[index as usize].aabb =
                self.nodes[child1 as usize].aabb.union(&self.nodes[child2 as usize].aabb);
            index = self.nodes[index as usize].parent_or_next;
        }
    }

    fn child_cost(child: &TreeNode<T>, leaf_aabb: &Aabb, inheritance_cost: f32) -> f32 {
        if child.is_leaf() {
            let aabb = leaf_aabb.union(&child.aabb);
            aabb.perimeter() + inheritance_cost
        } else {
            let aabb = leaf_aabb.union(&child.aabb);
            let old_area = child.aabb.perimeter();
            let new_area = aabb.perimeter();
            (new_area - old_area) + inheritance_cost
        }
    }

    fn remove_leaf(&mut self, leaf: i32) {
        if leaf == self.root {
            self.root = NULL_NODE;
            return;
        }

        let parent = self.nodes[leaf as usize].parent_or_next;
        let grand_parent = self.nodes[parent as usize].parent_or_next;
        let sibling = if self.nodes[parent as usize].child1 == leaf {
            self.nodes[parent as usize].child2
        } else {
            self.nodes[parent as usize].child1
        };

        if grand_parent != NULL_NODE {
            if self.nodes[grand_parent as usize].child1 == parent {
                self.nodes[grand_parent as usize].child1 = sibling;
            } else {
                self.nodes[grand_parent as usize].child2 = sibling;
            }
            self.nodes[sibling as usize].parent_or_next = grand_parent;
            self.free_node(parent);

            let mut index = grand_parent;
            while index != NULL_NODE {
                index = self.balance(index);
                let child1 = self.nodes[index as usize].child1;
                let child2 = self.nodes[index as usize].child2;
                self.nodes[index as usize].aabb =
                    self.nodes[child1 as usize].aabb.union(&self.nodes[child2 as usize].aabb);
                self.nodes[index as usize].height =
                    1 + self.nodes[child1 as usize].height.max(self.nodes[child2 as usize].height);
                index = self.nodes[index as usize].parent_or_next;
            }
        } else {
            self.root = sibling;
            self.nodes[sibling as usize].parent_or_next = NULL_NODE;
            self.free_node(parent);
        }
    }

    /// Applies a single left/right rotation if one subtree is >= 2 taller
    /// than its sibling, returning the (possibly new) subtree root.
    fn balance(&mut self, i_a: i32) -> i32 {
        debug_assert!(i_a != NULL_NODE);
        if self.nodes[i_a as usize].is_leaf() || self.nodes[i_a as usize].height < 2 {
            return i_a;
        }

        let i_b = self.nodes[i_a as usize].child1;
        let i_c = self.nodes[i_a as usize].child2;
        let balance = self.nodes[i_c as usize].height - self.nodes[i_b as usize].height;

        if balance > 1 {
            return self.rotate(i_a, i_c, i_b, true);
        } else if balance < -1 {
            return self.rotate(i_a, i_b, i_c, false);
        }
        i_a
    }

    fn rotate(&mut self, i_a: i32, i_c: i32, i_b: i32, c_is_heavy: bool) -> i32 {
        let i_f = self.nodes[i_c as usize].child1;
        let i_g = self.nodes[i_c as usize].child2;

        // Swap A and C.
        self.nodes[i_c as usize].child1 = i_a;
        self.nodes[i_c as usize].parent_or_next = self.nodes[i_a as usize].parent_or_next;
        self.nodes[i_a as usize].parent_or_next = i_c;

        let old_parent = self.nodes[i_c as usize].parent_or_next;
        if old_parent != NULL_NODE {
            if self.nodes[old_parent as usize].child1 == i_a {
                self.nodes[old_parent as usize].child1 = i_c;
            } else {
                self.nodes[old_parent as usize].child2 = i_c;
            }
        } else {
            self.root = i_c;
        }

        let (keep, promote) = if self.nodes[i_f as usize].height > self.nodes[i_g as usize].height {
            (i_f, i_g)
        } else {
            (i_g, i_f)
        };

        self.nodes[i_c as usize].child2 = keep;
        if c_is_heavy {
            self.nodes[i_a as usize].child2 = promote;
        } else {
            self.nodes[i_a as usize].child1 = promote;
        }
        self.nodes[promote as usize].parent_or_next = i_a;

        self.nodes[i_a as usize].aabb = self.nodes[i_b as usize]
            .aabb
            .union(&self.nodes[promote as usize].aabb);
        self.nodes[i_c as usize].aabb = self.nodes[i_a as usize].aabb.union(&self.nodes[keep as usize].aabb);

        self.nodes[i_a as usize].height =
            1 + self.nodes[i_b as usize].height.max(self.nodes[promote as usize].height);
        self.nodes[i_c as usize].height =
            1 + self.nodes[i_a as usize].height.max(self.nodes[keep as usize].height);

        i_c
    }

    /// Translates every node's AABB by `-delta`, for large-world
    /// recenterings.
    pub fn shift_origin(&mut self, delta: Vec2) {
        for node in &mut self.nodes {
            node.aabb.lower -= delta;
            node.aabb.upper -= delta;
        }
    }

    /// Pre-order DFS query using an explicit on-stack stack; `visitor`
    /// returns `false` to stop the traversal early.
    pub fn query<F: FnMut(TreeProxyId) -> bool>(&self, aabb: &Aabb, mut visitor: F) {
        let mut stack: smallvec::SmallVec<[i32; 256]> = smallvec::SmallVec::new();
        stack.push(self.root);
        while let Some(node_id) = stack.pop() {
            if node_id == NULL_NODE {
                continue;
            }
            let node = &self.nodes[node_id as usize];
            if node.aabb.overlaps(aabb) {
                if node.is_leaf() {
                    if !visitor(TreeProxyId(node_id as u32)) {
                        return;
                    }
                } else {
                    stack.push(node.child1);
                    stack.push(node.child2);
                }
            }
        }
    }

    /// Ray-cast traversal. `visitor` is given the hit proxy and the current
    /// ray and returns the new `max_fraction` to shrink the ray, or a
    /// non-positive value to stop early.
    pub fn ray_cast<F: FnMut(TreeProxyId, &RayCastInput) -> f32>(
        &self,
        input: &RayCastInput,
        mut visitor: F,
    ) {
        let p1 = input.p1;
        let p2 = input.p2;
        let (d, _) = crate::math::normalize(p2 - p1);
        let mut max_fraction = input.max_fraction;
        let r = vec2(p2.x - p1.x, p2.y - p1.y) * max_fraction;
        let _ = d;

        let abs_d = vec2(r.x.abs(), r.y.abs());

        let mut stack: smallvec::SmallVec<[i32; 256]> = smallvec::SmallVec::new();
        stack.push(self.root);

        while let Some(node_id) = stack.pop() {
            if node_id == NULL_NODE {
                continue;
            }
            let node = &self.nodes[node_id as usize];
            let segment_end = p1 + vec2(p2.x - p1.x, p2.y - p1.y) * max_fraction;
            let seg_aabb = Aabb::new(
                vec2(p1.x.min(segment_end.x), p1.y.min(segment_end.y)),
                vec2(p1.x.max(segment_end.x), p1.y.max(segment_end.y)),
            );
            if !node.aabb.overlaps(&seg_aabb) {
                continue;
            }
            let _ = abs_d;
            if node.is_leaf() {
                let new_input = RayCastInput {
                    p1,
                    p2,
                    max_fraction,
                };
                let value = visitor(TreeProxyId(node_id as u32), &new_input);
                if value <= 0.0 {
                    return;
                }
                max_fraction = value;
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }

    /// Debug-only structural validation: parent AABBs enclose children,
    /// heights are consistent, and the free list plus live nodes exactly
    /// cover the node pool.
    #[cfg(any(test, debug_assertions))]
    pub fn validate(&self) -> bool {
        if self.root != NULL_NODE && self.nodes[self.root as usize].parent_or_next != NULL_NODE {
            return false;
        }
        self.validate_structure(self.root)
    }

    #[cfg(any(test, debug_assertions))]
    fn validate_structure(&self, node_id: i32) -> bool {
        if node_id == NULL_NODE {
            return true;
        }
        let node = &self.nodes[node_id as usize];
        if node.is_leaf() {
            return node.height == 0;
        }
        let c1 = node.child1;
        let c2 = node.child2;
        let expected_height = 1 + self.nodes[c1 as usize].height.max(self.nodes[c2 as usize].height);
        if node.height != expected_height {
            return false;
        }
        let expected_aabb = self.nodes[c1 as usize].aabb.union(&self.nodes[c2 as usize].aabb);
        if !node.aabb.contains(&expected_aabb) {
            return false;
        }
        self.validate_structure(c1) && self.validate_structure(c2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Aabb;

    #[test]
    fn create_then_destroy_restores_node_count() {
        let mut tree: DynamicTree<u32> = DynamicTree::new();
        let before = tree.proxy_count();
        let id = tree.create_proxy(Aabb::new(vec2(0.0, 0.0), vec2(1.0, 1.0)), 42);
        assert_eq!(tree.proxy_count(), before + 1);
        tree.destroy_proxy(id);
        assert_eq!(tree.proxy_count(), before);
        assert!(tree.validate());
    }

    #[test]
    fn query_finds_overlapping_proxies() {
        let mut tree: DynamicTree<u32> = DynamicTree::new();
        let a = tree.create_proxy(Aabb::new(vec2(0.0, 0.0), vec2(1.0, 1.0)), 1);
        let b = tree.create_proxy(Aabb::new(vec2(5.0, 5.0), vec2(6.0, 6.0)), 2);
        let mut hits = Vec::new();
        tree.query(&Aabb::new(vec2(-1.0, -1.0), vec2(2.0, 2.0)), |p| {
            hits.push(p);
            true
        });
        assert!(hits.contains(&a));
        assert!(!hits.contains(&b));
        assert!(tree.validate());
    }

    #[test]
    fn many_insertions_keep_tree_valid() {
        let mut tree: DynamicTree<u32> = DynamicTree::new();
        let mut ids = Vec::new();
        for i in 0..200 {
            let x = (i as f32) * 0.37;
            ids.push(tree.create_proxy(
                Aabb::new(vec2(x, 0.0), vec2(x + 1.0, 1.0)),
                i as u32,
            ));
        }
        assert!(tree.validate());
        for (i, id) in ids.into_iter().enumerate() {
            if i % 3 == 0 {
                tree.destroy_proxy(id);
            }
        }
        assert!(tree.validate());
    }

    #[test]
    fn move_proxy_is_noop_within_fattened_aabb() {
        let mut tree: DynamicTree<u32> = DynamicTree::new();
        let id = tree.create_proxy(Aabb::new(vec2(0.0, 0.0), vec2(1.0, 1.0)), 7);
        let moved = tree.move_proxy(
            id,
            Aabb::new(vec2(0.01, 0.01), vec2(1.01, 1.01)),
            vec2(0.0, 0.0),
        );
        assert!(!moved);
    }
}
