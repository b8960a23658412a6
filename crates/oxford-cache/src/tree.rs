//! Persistent weight-balanced binary search tree keyed by `i64`.
//!
//! Every update returns a new tree that shares all untouched subtrees with
//! the old one; the old tree stays valid and unchanged. Each node records its
//! weight (`1 + weight(left) + weight(right)`), which gives O(log n)
//! positional access in addition to key lookup.
//!
//! ## Balance
//!
//! Balance compares `weight + 1` of sibling subtrees: neither may exceed
//! [`DELTA`] times the other. Updates rebuild the search path bottom-up with
//! `join`, which rotates once or twice depending on the weights of the
//! grandchildren on the heavy side.
//!
//! # Examples
//!
//! ```
//! use oxford_cache::WeightBalancedTree;
//!
//! let empty = WeightBalancedTree::new();
//! let one = empty.insert(7, "seven");
//! assert_eq!(empty.get(7), None);
//! assert_eq!(one.get(7), Some(&"seven"));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Maximum ratio between the `weight + 1` of two sibling subtrees.
pub const DELTA: usize = 4;

type Link<V> = Option<Arc<Node<V>>>;

/// One tree node. Immutable once built.
pub struct Node<V> {
    key: i64,
    value: V,
    weight: usize,
    left: Link<V>,
    right: Link<V>,
}

impl<V> Node<V> {
    pub fn key(&self) -> i64 {
        self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    /// Number of nodes in the subtree rooted here.
    pub fn weight(&self) -> usize {
        self.weight
    }
}

impl<V: fmt::Debug> fmt::Debug for Node<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

/// Ways a tree can fail [`WeightBalancedTree::check_invariants`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("node {key} records weight {recorded} but has {actual} nodes")]
    Weight {
        key: i64,
        recorded: usize,
        actual: usize,
    },

    #[error("node {key} is out of order")]
    Order { key: i64 },

    #[error("node {key} is out of balance: children weigh {left} and {right}")]
    Balance { key: i64, left: usize, right: usize },
}

// ============================================================================
// Node algebra
// ============================================================================

#[inline]
fn weight<V>(link: &Link<V>) -> usize {
    link.as_ref().map_or(0, |n| n.weight)
}

/// The quantity the balance condition compares.
#[inline]
fn heft<V>(link: &Link<V>) -> usize {
    weight(link) + 1
}

#[inline]
fn too_heavy(heavier: usize, lighter: usize) -> bool {
    heavier > DELTA * lighter
}

#[inline]
fn alike(a: usize, b: usize) -> bool {
    !too_heavy(a, b) && !too_heavy(b, a)
}

fn node<V>(left: Link<V>, key: i64, value: V, right: Link<V>) -> Link<V> {
    Some(Arc::new(Node {
        key,
        value,
        weight: 1 + weight(&left) + weight(&right),
        left,
        right,
    }))
}

/// `(a, k, (b, k2, c))` becomes `((a, k, b), k2, c)`.
fn rotate_left<V: Clone>(link: Link<V>) -> Link<V> {
    let Some(n) = &link else { return link };
    let Some(r) = &n.right else { return link };
    let left = node(n.left.clone(), n.key, n.value.clone(), r.left.clone());
    node(left, r.key, r.value.clone(), r.right.clone())
}

/// `((a, k1, b), k, c)` becomes `(a, k1, (b, k, c))`.
fn rotate_right<V: Clone>(link: Link<V>) -> Link<V> {
    let Some(n) = &link else { return link };
    let Some(l) = &n.left else { return link };
    let right = node(l.right.clone(), n.key, n.value.clone(), n.right.clone());
    node(l.left.clone(), l.key, l.value.clone(), right)
}

/// Build a balanced tree from `left`, the entry `(key, value)`, and `right`,
/// where every key in `left` is below `key` and every key in `right` above.
fn join<V: Clone>(left: Link<V>, key: i64, value: V, right: Link<V>) -> Link<V> {
    if too_heavy(heft(&left), heft(&right)) {
        join_right(left, key, value, right)
    } else if too_heavy(heft(&right), heft(&left)) {
        join_left(left, key, value, right)
    } else {
        node(left, key, value, right)
    }
}

/// `left` is the heavier side: descend its right spine.
fn join_right<V: Clone>(left: Link<V>, key: i64, value: V, right: Link<V>) -> Link<V> {
    if alike(heft(&left), heft(&right)) {
        return node(left, key, value, right);
    }
    let Some(l) = left else {
        return node(None, key, value, right);
    };
    let joined = join_right(l.right.clone(), key, value, right);
    if alike(heft(&l.left), heft(&joined)) {
        return node(l.left.clone(), l.key, l.value.clone(), joined);
    }
    let (inner, outer) = match &joined {
        Some(j) => (heft(&j.left), heft(&j.right)),
        None => (1, 1),
    };
    let outer_side = heft(&l.left);
    if alike(outer_side, inner) && alike(outer_side + inner, outer) {
        rotate_left(node(l.left.clone(), l.key, l.value.clone(), joined))
    } else {
        rotate_left(node(l.left.clone(), l.key, l.value.clone(), rotate_right(joined)))
    }
}

/// `right` is the heavier side: descend its left spine.
fn join_left<V: Clone>(left: Link<V>, key: i64, value: V, right: Link<V>) -> Link<V> {
    if alike(heft(&left), heft(&right)) {
        return node(left, key, value, right);
    }
    let Some(r) = right else {
        return node(left, key, value, None);
    };
    let joined = join_left(left, key, value, r.left.clone());
    if alike(heft(&joined), heft(&r.right)) {
        return node(joined, r.key, r.value.clone(), r.right.clone());
    }
    let (outer, inner) = match &joined {
        Some(j) => (heft(&j.left), heft(&j.right)),
        None => (1, 1),
    };
    let outer_side = heft(&r.right);
    if alike(outer_side, inner) && alike(outer_side + inner, outer) {
        rotate_right(node(joined, r.key, r.value.clone(), r.right.clone()))
    } else {
        rotate_right(node(rotate_left(joined), r.key, r.value.clone(), r.right.clone()))
    }
}

/// Remove the largest entry of a non-empty subtree.
fn split_last<V: Clone>(n: &Arc<Node<V>>) -> (Link<V>, i64, V) {
    match &n.right {
        None => (n.left.clone(), n.key, n.value.clone()),
        Some(r) => {
            let (rest, key, value) = split_last(r);
            (join(n.left.clone(), n.key, n.value.clone(), rest), key, value)
        }
    }
}

/// Concatenate two trees whose key ranges do not overlap.
fn join2<V: Clone>(left: Link<V>, right: Link<V>) -> Link<V> {
    match &left {
        None => right,
        Some(l) => {
            let (rest, key, value) = split_last(l);
            join(rest, key, value, right)
        }
    }
}

fn insert_link<V: Clone>(link: &Link<V>, key: i64, value: V) -> Link<V> {
    let Some(n) = link else {
        return node(None, key, value, None);
    };
    match key.cmp(&n.key) {
        Ordering::Equal => node(n.left.clone(), key, value, n.right.clone()),
        Ordering::Less => join(
            insert_link(&n.left, key, value),
            n.key,
            n.value.clone(),
            n.right.clone(),
        ),
        Ordering::Greater => join(
            n.left.clone(),
            n.key,
            n.value.clone(),
            insert_link(&n.right, key, value),
        ),
    }
}

fn remove_link<V: Clone>(link: &Link<V>, key: i64) -> Option<(Link<V>, V)> {
    let n = link.as_ref()?;
    match key.cmp(&n.key) {
        Ordering::Equal => Some((join2(n.left.clone(), n.right.clone()), n.value.clone())),
        Ordering::Less => {
            let (left, removed) = remove_link(&n.left, key)?;
            Some((join(left, n.key, n.value.clone(), n.right.clone()), removed))
        }
        Ordering::Greater => {
            let (right, removed) = remove_link(&n.right, key)?;
            Some((join(n.left.clone(), n.key, n.value.clone(), right), removed))
        }
    }
}

// ============================================================================
// Tree
// ============================================================================

/// An immutable weight-balanced tree. Cloning is O(1).
pub struct WeightBalancedTree<V> {
    root: Link<V>,
}

impl<V> Clone for WeightBalancedTree<V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
        }
    }
}

impl<V> Default for WeightBalancedTree<V> {
    fn default() -> Self {
        Self { root: None }
    }
}

impl<V: fmt::Debug> fmt::Debug for WeightBalancedTree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V> WeightBalancedTree<V> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        weight(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Value stored under `key`.
    pub fn get(&self, key: i64) -> Option<&V> {
        let mut link = &self.root;
        while let Some(n) = link {
            match key.cmp(&n.key) {
                Ordering::Equal => return Some(&n.value),
                Ordering::Less => link = &n.left,
                Ordering::Greater => link = &n.right,
            }
        }
        None
    }

    pub fn contains_key(&self, key: i64) -> bool {
        self.get(key).is_some()
    }

    /// Position of `key` in key order, or `Err` with the position it
    /// would be inserted at.
    pub fn index_of(&self, key: i64) -> Result<usize, usize> {
        let mut link = &self.root;
        let mut base = 0;
        while let Some(n) = link {
            match key.cmp(&n.key) {
                Ordering::Equal => return Ok(base + weight(&n.left)),
                Ordering::Less => link = &n.left,
                Ordering::Greater => {
                    base += weight(&n.left) + 1;
                    link = &n.right;
                }
            }
        }
        Err(base)
    }

    /// Entry at position `index` in key order.
    pub fn get_index(&self, index: usize) -> Option<(i64, &V)> {
        let mut link = &self.root;
        let mut index = index;
        while let Some(n) = link {
            let left = weight(&n.left);
            match index.cmp(&left) {
                Ordering::Less => link = &n.left,
                Ordering::Equal => return Some((n.key, &n.value)),
                Ordering::Greater => {
                    index -= left + 1;
                    link = &n.right;
                }
            }
        }
        None
    }

    /// Entry with the smallest key.
    pub fn min(&self) -> Option<(i64, &V)> {
        let mut n = self.root.as_ref()?;
        while let Some(left) = &n.left {
            n = left;
        }
        Some((n.key, &n.value))
    }

    /// Entry with the largest key.
    pub fn max(&self) -> Option<(i64, &V)> {
        let mut n = self.root.as_ref()?;
        while let Some(right) = &n.right {
            n = right;
        }
        Some((n.key, &n.value))
    }

    /// Height of the tree; 0 when empty.
    pub fn height(&self) -> usize {
        fn height<V>(link: &Link<V>) -> usize {
            link.as_ref().map_or(0, |n| 1 + height(&n.left).max(height(&n.right)))
        }
        height(&self.root)
    }

    /// Entries in key order.
    pub fn iter(&self) -> Iter<'_, V> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left(&self.root);
        iter
    }

    /// Keys in key order.
    pub fn keys(&self) -> impl Iterator<Item = i64> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Verify weights, key order, and balance at every node.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        fn check<V>(link: &Link<V>, low: Option<i64>, high: Option<i64>) -> Result<usize, InvariantViolation> {
            let Some(n) = link else { return Ok(0) };
            if low.is_some_and(|low| n.key <= low) || high.is_some_and(|high| n.key >= high) {
                return Err(InvariantViolation::Order { key: n.key });
            }
            let left = check(&n.left, low, Some(n.key))?;
            let right = check(&n.right, Some(n.key), high)?;
            let actual = 1 + left + right;
            if n.weight != actual {
                return Err(InvariantViolation::Weight {
                    key: n.key,
                    recorded: n.weight,
                    actual,
                });
            }
            if !alike(left + 1, right + 1) {
                return Err(InvariantViolation::Balance { key: n.key, left, right });
            }
            Ok(actual)
        }
        check(&self.root, None, None).map(|_| ())
    }
}

impl<V: Clone> WeightBalancedTree<V> {
    /// A tree with `key` bound to `value`, replacing any previous binding.
    pub fn insert(&self, key: i64, value: V) -> Self {
        Self {
            root: insert_link(&self.root, key, value),
        }
    }

    /// A tree without `key`, and the value it was bound to.
    ///
    /// Returns `None` when `key` is absent.
    pub fn remove(&self, key: i64) -> Option<(Self, V)> {
        remove_link(&self.root, key).map(|(root, value)| (Self { root }, value))
    }
}

impl<V: Clone> FromIterator<(i64, V)> for WeightBalancedTree<V> {
    fn from_iter<I: IntoIterator<Item = (i64, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |tree, (key, value)| tree.insert(key, value))
    }
}

/// In-order iterator over a [`WeightBalancedTree`].
pub struct Iter<'a, V> {
    stack: Vec<&'a Node<V>>,
}

impl<'a, V> Iter<'a, V> {
    fn push_left(&mut self, mut link: &'a Link<V>) {
        while let Some(n) = link {
            self.stack.push(n);
            link = &n.left;
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (i64, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.stack.pop()?;
        self.push_left(&n.right);
        Some((n.key, &n.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_tree() {
        let tree: WeightBalancedTree<u32> = WeightBalancedTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.get(1), None);
        assert_eq!(tree.min(), None);
        assert_eq!(tree.index_of(5), Err(0));
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn ascending_inserts_stay_balanced() {
        let mut tree = WeightBalancedTree::new();
        for key in 1..=1000 {
            tree = tree.insert(key, key * 10);
            tree.check_invariants().unwrap();
        }
        assert_eq!(tree.len(), 1000);
        for key in 1..=1000 {
            assert_eq!(tree.get(key), Some(&(key * 10)));
            assert_eq!(tree.index_of(key), Ok((key - 1) as usize));
        }
        assert!(tree.height() <= 2 * 10 + 2, "height {}", tree.height());
        assert_eq!(tree.min(), Some((1, &10)));
        assert_eq!(tree.max(), Some((1000, &10000)));
    }

    #[test]
    fn old_versions_are_unchanged() {
        let one = WeightBalancedTree::new().insert(1, "a");
        let two = one.insert(2, "b");
        let replaced = two.insert(1, "z");
        assert_eq!(one.len(), 1);
        assert_eq!(one.get(2), None);
        assert_eq!(two.get(1), Some(&"a"));
        assert_eq!(replaced.get(1), Some(&"z"));
        assert_eq!(replaced.len(), 2);
    }

    #[test]
    fn remove_returns_value_and_rebalances() {
        let tree: WeightBalancedTree<i64> = (0..200).map(|k| (k, k)).collect();
        let mut current = tree.clone();
        for key in (0..200).step_by(3) {
            let (next, value) = current.remove(key).unwrap();
            assert_eq!(value, key);
            next.check_invariants().unwrap();
            current = next;
        }
        assert!(current.remove(0).is_none());
        assert_eq!(tree.len(), 200);
        assert_eq!(current.len(), 200 - 67);
    }

    #[test]
    fn positional_access() {
        let tree: WeightBalancedTree<()> = [50, 10, 40, 20, 30].into_iter().map(|k| (k, ())).collect();
        assert_eq!(tree.get_index(0).map(|(k, _)| k), Some(10));
        assert_eq!(tree.get_index(4).map(|(k, _)| k), Some(50));
        assert_eq!(tree.get_index(5), None);
        assert_eq!(tree.index_of(30), Ok(2));
        assert_eq!(tree.index_of(35), Err(3));
        assert_eq!(tree.index_of(5), Err(0));
        assert_eq!(tree.index_of(99), Err(5));
    }

    #[test]
    fn iteration_is_ordered() {
        let tree: WeightBalancedTree<()> = [5, -3, 9, 0].into_iter().map(|k| (k, ())).collect();
        assert_eq!(tree.keys().collect::<Vec<_>>(), vec![-3, 0, 5, 9]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(i64),
        Remove(i64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (-64i64..64).prop_map(Op::Insert),
            (-64i64..64).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_updates_preserve_invariants(ops in prop::collection::vec(op(), 0..300)) {
            let mut tree = WeightBalancedTree::new();
            let mut model = std::collections::BTreeMap::new();
            for op in ops {
                match op {
                    Op::Insert(k) => {
                        tree = tree.insert(k, k);
                        model.insert(k, k);
                    }
                    Op::Remove(k) => {
                        let expected = model.remove(&k);
                        match tree.remove(k) {
                            Some((next, value)) => {
                                prop_assert_eq!(Some(value), expected);
                                tree = next;
                            }
                            None => prop_assert_eq!(expected, None),
                        }
                    }
                }
                prop_assert!(tree.check_invariants().is_ok());
            }
            prop_assert_eq!(tree.len(), model.len());
            let keys: Vec<i64> = tree.keys().collect();
            let expected: Vec<i64> = model.keys().copied().collect();
            prop_assert_eq!(keys, expected);
        }

        #[test]
        fn prop_index_of_agrees_with_get_index(keys in prop::collection::btree_set(any::<i64>(), 0..100)) {
            let tree: WeightBalancedTree<()> = keys.iter().map(|&k| (k, ())).collect();
            for (i, &k) in keys.iter().enumerate() {
                prop_assert_eq!(tree.index_of(k), Ok(i));
                prop_assert_eq!(tree.get_index(i).map(|(key, _)| key), Some(k));
            }
        }
    }
}
