//! Concurrent Hash Set

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

const DISPLAY_LABEL: &str = "HashSet";

/// An unordered, thread-safe set.
///
/// Every operation takes the set's own lock for its duration: writers
/// (`add`, `remove`, `clear`, `from_json`) take it exclusively, readers
/// share it. No operation ever holds the locks of two sets at once.
pub struct ConcurrentSet<T> {
    items: RwLock<HashSet<T>>,
}

impl<T> ConcurrentSet<T>
where
    T: Eq + Hash + Clone,
{
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashSet::new()),
        }
    }

    // Poisoning is ignored: every critical section leaves the HashSet consistent
    fn read(&self) -> RwLockReadGuard<'_, HashSet<T>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashSet<T>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert every item; items already present are left alone
    pub fn add<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.write().extend(items);
    }

    /// Remove every item; absent items are ignored
    pub fn remove<'a, I>(&self, items: I)
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let mut set = self.write();
        for item in items {
            set.remove(item);
        }
    }

    /// True if every item is present. An empty list is always contained.
    pub fn contains<'a, I>(&self, items: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let set = self.read();
        items.into_iter().all(|item| set.contains(item))
    }

    /// True if `item` is present
    pub fn exists(&self, item: &T) -> bool {
        self.read().contains(item)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// Snapshot of the current items, in no particular order
    pub fn values(&self) -> Vec<T> {
        self.read().iter().cloned().collect()
    }

    /// True if `other` holds exactly the same items.
    ///
    /// `None` is never the same as a set. The comparison snapshots this
    /// set first and then queries `other` through its public methods, so
    /// `a.same(Some(&b))` and `b.same(Some(&a))` may run concurrently.
    pub fn same(&self, other: Option<&Self>) -> bool {
        let Some(other) = other else {
            return false;
        };

        let values = self.values();
        if values.len() != other.len() {
            return false;
        }

        other.contains(&values)
    }

    /// Replace all items with `items` under a single exclusive lock
    pub(crate) fn replace(&self, items: Vec<T>) {
        let mut set = self.write();
        set.clear();
        set.extend(items);
    }
}

impl<T> Default for ConcurrentSet<T>
where
    T: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ConcurrentSet<T>
where
    T: Eq + Hash + Clone,
{
    fn clone(&self) -> Self {
        self.values().into_iter().collect()
    }
}

impl<T> FromIterator<T> for ConcurrentSet<T>
where
    T: Eq + Hash + Clone,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: RwLock::new(iter.into_iter().collect()),
        }
    }
}

impl<T> PartialEq for ConcurrentSet<T>
where
    T: Eq + Hash + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        self.same(Some(other))
    }
}

impl<T> Eq for ConcurrentSet<T> where T: Eq + Hash + Clone {}

impl<T> fmt::Debug for ConcurrentSet<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set = self.items.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_set().entries(set.iter()).finish()
    }
}

impl<T> fmt::Display for ConcurrentSet<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set = self.items.read().unwrap_or_else(PoisonError::into_inner);
        let items: Vec<String> = set.iter().map(ToString::to_string).collect();
        write!(f, "{}\n{}", DISPLAY_LABEL, items.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_add() {
        let set: ConcurrentSet<i32> = ConcurrentSet::new();
        set.add([]);
        set.add([1]);
        set.add([2]);
        set.add([2, 3]);
        set.add([]);

        assert!(!set.is_empty());
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_add_is_idempotent() {
        let set = ConcurrentSet::new();
        set.add(["a"]);
        set.add(["a"]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_contains() {
        let set: ConcurrentSet<i32> = ConcurrentSet::new();
        set.add([3, 1, 2]);
        set.add([2, 3]);

        assert!(set.contains(&[]));
        assert!(set.contains(&[1]));
        assert!(set.contains(&[1, 2, 3]));
        assert!(!set.contains(&[1, 2, 3, 4]));
        assert!(set.exists(&2));
        assert!(!set.exists(&9));
    }

    #[test]
    fn test_contains_nothing_on_empty_set() {
        let set: ConcurrentSet<i32> = ConcurrentSet::new();
        assert!(set.contains(&[]));
        assert!(!set.contains(&[7]));
    }

    #[test]
    fn test_remove() {
        let set: ConcurrentSet<i32> = ConcurrentSet::new();
        set.add([1, 2, 2, 3]);
        assert_eq!(set.len(), 3);

        set.remove(&[]);
        assert_eq!(set.len(), 3);

        set.remove(&[1]);
        assert_eq!(set.len(), 2);

        set.remove(&[3]);
        set.remove(&[3]);
        assert_eq!(set.len(), 1);

        set.remove(&[2]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_clear_and_values() {
        let set: ConcurrentSet<i32> = (1..=5).collect();
        let mut values = set.values();
        values.sort();
        assert_eq!(values, vec![1, 2, 3, 4, 5]);

        set.clear();
        assert!(set.is_empty());
        assert!(set.values().is_empty());
    }

    #[test]
    fn test_same() {
        let a: ConcurrentSet<i32> = [1, 2, 3].into_iter().collect();
        let b: ConcurrentSet<i32> = [3, 2, 1].into_iter().collect();
        let c: ConcurrentSet<i32> = [1, 2].into_iter().collect();
        let d: ConcurrentSet<i32> = [1, 2, 4].into_iter().collect();

        assert!(a.same(Some(&a)));
        assert!(a.same(Some(&b)));
        assert!(b.same(Some(&a)));
        assert!(!a.same(Some(&c)));
        assert!(!c.same(Some(&a)));
        assert!(!a.same(Some(&d)));
        assert!(!a.same(None));
        assert_eq!(a, b);
        assert_ne!(a, d);
    }

    #[test]
    fn test_clone_is_independent() {
        let original: ConcurrentSet<i32> = [1, 2].into_iter().collect();
        let copy = original.clone();
        original.add([3]);

        assert_eq!(copy.len(), 2);
        assert!(!copy.exists(&3));
    }

    #[test]
    fn test_display() {
        let set = ConcurrentSet::new();
        set.add(["11".to_string()]);
        assert_eq!(set.to_string(), "HashSet\n11");

        set.add(["1".to_string()]);
        let text = set.to_string();
        assert!(text.starts_with("HashSet\n"));
        assert!(text.contains("11") && text.contains(", "));
    }

    #[test]
    fn test_concurrent_same_does_not_deadlock() {
        let a: Arc<ConcurrentSet<u32>> = Arc::new((0..100).collect());
        let b: Arc<ConcurrentSet<u32>> = Arc::new((0..100).collect());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let a = Arc::clone(&a);
                let b = Arc::clone(&b);
                thread::spawn(move || {
                    for _ in 0..200 {
                        if i % 2 == 0 {
                            a.same(Some(&*b));
                        } else {
                            b.same(Some(&*a));
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert!(a.same(Some(&*b)));
    }

    #[test]
    fn test_concurrent_add_remove() {
        let set: Arc<ConcurrentSet<u32>> = Arc::new(ConcurrentSet::new());

        let handles: Vec<_> = (0..4u32)
            .map(|t| {
                let set = Arc::clone(&set);
                thread::spawn(move || {
                    for n in 0..250 {
                        let item = t * 1000 + n;
                        set.add([item]);
                        assert!(set.contains(&[item]));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(set.len(), 1000);
    }
}
