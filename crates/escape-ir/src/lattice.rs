//! Lattice traits for analysis domains.
//!
//! Implementations must satisfy the usual algebraic laws:
//!
//! - `join`/`meet` are associative, commutative, and idempotent;
//! - absorption: `a.join(&a.meet(&b)) == a` and `a.meet(&a.join(&b)) == a`;
//! - `is_subseteq` agrees with both: `a.is_subseteq(&b)` iff
//!   `a.join(&b) == b` iff `a.meet(&b) == a`.
//!
//! The assertion helpers in `escape-test-utils` verify these properties
//! over a sample of elements.

pub trait Lattice {
    fn join(&self, other: &Self) -> Self;
    fn meet(&self, other: &Self) -> Self;
    fn is_subseteq(&self, other: &Self) -> bool;
}

/// A lattice with a least element.
///
/// `bottom().is_subseteq(&x)`, `bottom().join(&x) == x`, and
/// `bottom().meet(&x) == bottom()` for all `x`.
pub trait HasBottom: Lattice {
    fn bottom() -> Self;
}

/// A lattice with a greatest element.
///
/// `x.is_subseteq(&top())`, `top().join(&x) == top()`, and
/// `top().meet(&x) == x` for all `x`.
pub trait HasTop: Lattice {
    fn top() -> Self;
}
