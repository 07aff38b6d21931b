//! Syntactic classification of a pointer's root.

use escape_ir::{Module, Value, ValueKind};
use rustc_hash::FxHashSet;

use crate::escape::Escape;

/// Classify the root of `ptr` by walking backwards through
/// address-preserving operators only: casts, projections, and phis.
///
/// A global root is [`Escape::Global`], an argument root [`Escape::Local`],
/// and everything else (allocations, load results, call results, …) is
/// [`Escape::No`] — deeper reachability is the memory walkers' job, not
/// this classifier's. Loads, integer arithmetic, and calls are never
/// chased through.
pub fn classify_origin(module: &Module, ptr: Value) -> Escape {
    let mut visited = FxHashSet::default();
    walk(module, ptr, &mut visited)
}

fn walk(module: &Module, value: Value, visited: &mut FxHashSet<Value>) -> Escape {
    if !visited.insert(value) {
        return Escape::No;
    }
    match module.kind(value) {
        ValueKind::Global => Escape::Global,
        ValueKind::Argument { .. } => Escape::Local,
        ValueKind::Cast { src } => walk(module, *src, visited),
        ValueKind::Projection { base, .. } => walk(module, *base, visited),
        ValueKind::Phi { incomings } => {
            // First escaping incoming wins; sound because Global orders
            // below Local.
            for (_, incoming) in incomings {
                let origin = walk(module, *incoming, visited);
                if origin.is_escape() {
                    return origin;
                }
            }
            Escape::No
        }
        _ => Escape::No,
    }
}
