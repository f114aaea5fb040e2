//! Comparison of two path lists

use std::collections::HashSet;
use std::hash::Hash;

/// Items of `a` missing from `b`, and items of `b` missing from `a`.
///
/// Both outputs keep the order (and duplicates) of their input.
pub fn unique<T>(a: &[T], b: &[T]) -> (Vec<T>, Vec<T>)
where
    T: Eq + Hash + Clone,
{
    let set_a: HashSet<&T> = a.iter().collect();
    let set_b: HashSet<&T> = b.iter().collect();

    let only_a = a.iter().filter(|x| !set_b.contains(x)).cloned().collect();
    let only_b = b.iter().filter(|x| !set_a.contains(x)).cloned().collect();

    (only_a, only_b)
}
