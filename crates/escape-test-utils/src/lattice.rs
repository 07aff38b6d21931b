//! Assertion helpers for verifying lattice algebraic laws.
//!
//! These check properties over a given set of sample elements and collect
//! all violations into a single report, so every failing law is visible at
//! once.

use std::fmt::{Debug, Write};

use escape_ir::{HasBottom, HasTop, Lattice};

fn report(violations: Vec<String>) {
    if violations.is_empty() {
        return;
    }
    let mut msg = format!("{} lattice law violation(s):\n", violations.len());
    for (i, v) in violations.iter().enumerate() {
        let _ = writeln!(msg, "  {}. {}", i + 1, v);
    }
    panic!("{msg}");
}

/// Check join/meet laws, absorption, and ordering consistency over the
/// given elements. All violations are collected and reported together.
pub fn assert_lattice_laws<L: Lattice + PartialEq + Debug>(elements: &[L]) {
    let mut violations = Vec::new();
    check_operator_laws(elements, &mut violations);
    check_absorption(elements, &mut violations);
    check_ordering_consistent(elements, &mut violations);
    report(violations);
}

/// [`assert_lattice_laws`] plus the bottom and top element laws. Bottom and
/// top are tested in addition to the provided elements.
pub fn assert_finite_lattice_laws<L: HasBottom + HasTop + PartialEq + Debug>(elements: &[L]) {
    let mut violations = Vec::new();
    check_operator_laws(elements, &mut violations);
    check_absorption(elements, &mut violations);
    check_ordering_consistent(elements, &mut violations);
    check_bottom_laws(elements, &mut violations);
    check_top_laws(elements, &mut violations);
    report(violations);
}

fn check_operator_laws<L: Lattice + PartialEq + Debug>(elements: &[L], v: &mut Vec<String>) {
    for a in elements {
        if a.join(a) != *a {
            v.push(format!("join not idempotent at {a:?}"));
        }
        if a.meet(a) != *a {
            v.push(format!("meet not idempotent at {a:?}"));
        }
        for b in elements {
            if a.join(b) != b.join(a) {
                v.push(format!("join not commutative at ({a:?}, {b:?})"));
            }
            if a.meet(b) != b.meet(a) {
                v.push(format!("meet not commutative at ({a:?}, {b:?})"));
            }
            for c in elements {
                if a.join(b).join(c) != a.join(&b.join(c)) {
                    v.push(format!("join not associative at ({a:?}, {b:?}, {c:?})"));
                }
                if a.meet(b).meet(c) != a.meet(&b.meet(c)) {
                    v.push(format!("meet not associative at ({a:?}, {b:?}, {c:?})"));
                }
            }
        }
    }
}

fn check_absorption<L: Lattice + PartialEq + Debug>(elements: &[L], v: &mut Vec<String>) {
    for a in elements {
        for b in elements {
            if a.join(&a.meet(b)) != *a {
                v.push(format!("join/meet absorption violated at ({a:?}, {b:?})"));
            }
            if a.meet(&a.join(b)) != *a {
                v.push(format!("meet/join absorption violated at ({a:?}, {b:?})"));
            }
        }
    }
}

fn check_ordering_consistent<L: Lattice + PartialEq + Debug>(elements: &[L], v: &mut Vec<String>) {
    for a in elements {
        for b in elements {
            let sub = a.is_subseteq(b);
            if sub != (a.join(b) == *b) {
                v.push(format!("is_subseteq disagrees with join at ({a:?}, {b:?})"));
            }
            if sub != (a.meet(b) == *a) {
                v.push(format!("is_subseteq disagrees with meet at ({a:?}, {b:?})"));
            }
        }
    }
}

fn check_bottom_laws<L: HasBottom + PartialEq + Debug>(elements: &[L], v: &mut Vec<String>) {
    let bot = L::bottom();
    for x in elements {
        if !bot.is_subseteq(x) {
            v.push(format!("bottom is not below {x:?}"));
        }
        if bot.join(x) != *x {
            v.push(format!("bottom is not the join identity at {x:?}"));
        }
        if bot.meet(x) != bot {
            v.push(format!("bottom does not absorb meet at {x:?}"));
        }
    }
}

fn check_top_laws<L: HasTop + PartialEq + Debug>(elements: &[L], v: &mut Vec<String>) {
    let top = L::top();
    for x in elements {
        if !x.is_subseteq(&top) {
            v.push(format!("{x:?} is not below top"));
        }
        if top.join(x) != top {
            v.push(format!("top does not absorb join at {x:?}"));
        }
        if top.meet(x) != *x {
            v.push(format!("top is not the meet identity at {x:?}"));
        }
    }
}
