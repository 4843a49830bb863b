//! Drivers that walk a tree applying a single-node rewrite

use crate::cog::Cog;
use crate::handle::CogHandle;
use crate::record::Key;

/// Apply `op` to `handle`, then to every descendant, pre-order
///
/// Children are read from the snapshot *after* `op` ran, so a node that
/// `op` just replaced is walked in its new shape. Left before right.
pub fn recur_top_down<F>(op: &F, handle: &CogHandle)
where
    F: Fn(&CogHandle) + ?Sized,
{
    op(handle);
    let cog = handle.get();
    if let Some((left, right)) = cog.children() {
        recur_top_down(op, left);
        recur_top_down(op, right);
    }
}

/// Descend toward `target` and apply `op` at the node where descent stops
///
/// A BTree sends `target < sep` left and everything else right. Concat
/// gives no hint about where `target` lives, so descent stops there, as it
/// does at leaves. Siblings off the path are never visited.
pub fn recur_to_target<F>(op: &F, target: Key, handle: &CogHandle)
where
    F: Fn(&CogHandle) + ?Sized,
{
    let mut current = handle.clone();
    while let Some(next) = step_toward(target, &current.get()) {
        current = next;
    }
    op(&current);
}

/// Descend toward `target`, applying `op` at every node on the way
///
/// Same descent rule as [`recur_to_target`]; the next step is chosen from
/// each node's snapshot after `op` ran on it.
pub fn recur_to_target_top_down<F>(op: &F, target: Key, handle: &CogHandle)
where
    F: Fn(&CogHandle) + ?Sized,
{
    let mut current = handle.clone();
    loop {
        op(&current);
        match step_toward(target, &current.get()) {
            Some(next) => current = next,
            None => return,
        }
    }
}

fn step_toward(target: Key, cog: &Cog) -> Option<CogHandle> {
    match cog {
        Cog::BTree { left, sep, right } => Some(if target < *sep {
            left.clone()
        } else {
            right.clone()
        }),
        Cog::Array(_) | Cog::SortedArray(_) | Cog::Concat { .. } => None,
    }
}
