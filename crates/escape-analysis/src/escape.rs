//! The three-point escape lattice.

use escape_ir::{HasBottom, HasTop, Lattice};

/// How far an object's address travels beyond its allocating activation.
///
/// The declaration order *is* the lattice order: `Global < Local < No`,
/// with `meet = min`. The summariser seeds at bottom (`Global`) and the
/// tracker reports top (`No`) when no contrary evidence is found.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Escape {
    /// Reachable from a global, an unanalysable call, or an unknown
    /// construct; the object must stay on the heap.
    Global,
    /// Flows into the caller (argument, return value, or memory reachable
    /// from an argument) but not into global state.
    Local,
    /// Never leaves the allocating activation record; the object may be
    /// promoted to the stack.
    No,
}

impl Escape {
    /// Whether the address is observable after the allocating activation
    /// returns.
    pub fn is_escape(self) -> bool {
        self != Escape::No
    }

    /// The report phrase for an allocation with this verdict.
    pub(crate) fn phrase(self) -> &'static str {
        match self {
            Escape::Global => "globally escapes.",
            Escape::Local => "locally escapes.",
            Escape::No => "is local.",
        }
    }
}

impl Lattice for Escape {
    fn join(&self, other: &Self) -> Self {
        (*self).max(*other)
    }

    fn meet(&self, other: &Self) -> Self {
        (*self).min(*other)
    }

    fn is_subseteq(&self, other: &Self) -> bool {
        self <= other
    }
}

impl HasBottom for Escape {
    fn bottom() -> Self {
        Escape::Global
    }
}

impl HasTop for Escape {
    fn top() -> Self {
        Escape::No
    }
}

impl std::fmt::Display for Escape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Escape::Global => "GlobalEscape",
            Escape::Local => "LocalEscape",
            Escape::No => "NoEscape",
        };
        write!(f, "{s}")
    }
}
