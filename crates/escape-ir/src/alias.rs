//! The alias oracle seam.
//!
//! The analysis treats anything other than [`AliasResult::NoAlias`] as "may
//! observe" when following loads, and only [`AliasResult::MustAlias`] as
//! "definitely overwrites" when meeting stores, so an oracle is free to be
//! imprecise in the `MayAlias` direction without breaking soundness.

use crate::module::Module;
use crate::value::{AllocKind, Value, ValueKind};

/// The four-point answer of an alias query over two (pointer, size) pairs.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AliasResult {
    NoAlias,
    MayAlias,
    PartialAlias,
    MustAlias,
}

/// An alias query oracle over module values.
pub trait AliasOracle {
    fn alias(&self, module: &Module, a: Value, a_size: u64, b: Value, b_size: u64) -> AliasResult;
}

impl<T: AliasOracle + ?Sized> AliasOracle for &T {
    fn alias(&self, module: &Module, a: Value, a_size: u64, b: Value, b_size: u64) -> AliasResult {
        (**self).alias(module, a, a_size, b, b_size)
    }
}

/// A small structural oracle, precise enough for identified objects.
///
/// Casts are address-preserving and stripped before comparison. Two
/// distinct identified objects (allocations or globals) cannot alias;
/// identical addresses must alias; distinct field paths off a common base
/// cannot alias; everything else may.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicAliasOracle;

impl BasicAliasOracle {
    fn strip_casts(module: &Module, mut value: Value) -> Value {
        while let ValueKind::Cast { src } = module.kind(value) {
            value = *src;
        }
        value
    }

    fn is_identified(module: &Module, value: Value) -> bool {
        matches!(
            module.kind(value),
            ValueKind::Alloc(AllocKind::Stack | AllocKind::Heap) | ValueKind::Global
        )
    }
}

impl AliasOracle for BasicAliasOracle {
    fn alias(&self, module: &Module, a: Value, a_size: u64, b: Value, b_size: u64) -> AliasResult {
        let a = Self::strip_casts(module, a);
        let b = Self::strip_casts(module, b);

        if a == b {
            return if a_size == b_size {
                AliasResult::MustAlias
            } else {
                AliasResult::PartialAlias
            };
        }

        if Self::is_identified(module, a) && Self::is_identified(module, b) {
            return AliasResult::NoAlias;
        }

        if let (
            ValueKind::Projection { base: base_a, path: path_a },
            ValueKind::Projection { base: base_b, path: path_b },
        ) = (module.kind(a), module.kind(b))
        {
            let base_a = Self::strip_casts(module, *base_a);
            let base_b = Self::strip_casts(module, *base_b);
            if base_a == base_b {
                return if path_a == path_b {
                    AliasResult::MustAlias
                } else {
                    AliasResult::NoAlias
                };
            }
            if Self::is_identified(module, base_a) && Self::is_identified(module, base_b) {
                return AliasResult::NoAlias;
            }
        }

        // An identified object and a projection off a *different*
        // identified object cannot overlap either.
        if let ValueKind::Projection { base, .. } = module.kind(a) {
            let base = Self::strip_casts(module, *base);
            if base != b && Self::is_identified(module, base) && Self::is_identified(module, b) {
                return AliasResult::NoAlias;
            }
        }
        if let ValueKind::Projection { base, .. } = module.kind(b) {
            let base = Self::strip_casts(module, *base);
            if base != a && Self::is_identified(module, base) && Self::is_identified(module, a) {
                return AliasResult::NoAlias;
            }
        }

        AliasResult::MayAlias
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    #[test]
    fn identified_objects_do_not_alias() {
        let mut module = Module::new();
        let mut b = module
            .define_function("f", &[], Type::Opaque)
            .unwrap();
        let x = b.stack_alloc("x", Type::Int(64));
        let y = b.stack_alloc("y", Type::Int(64));
        b.finish().unwrap();

        let oracle = BasicAliasOracle;
        assert_eq!(oracle.alias(&module, x, 8, y, 8), AliasResult::NoAlias);
        assert_eq!(oracle.alias(&module, x, 8, x, 8), AliasResult::MustAlias);
        assert_eq!(oracle.alias(&module, x, 8, x, 4), AliasResult::PartialAlias);
    }

    #[test]
    fn casts_are_address_preserving() {
        let mut module = Module::new();
        let mut b = module
            .define_function("f", &[], Type::Opaque)
            .unwrap();
        let x = b.stack_alloc("x", Type::Int(64));
        let c = b.cast("c", x, Type::ptr(Type::Int(8)));
        b.finish().unwrap();

        let oracle = BasicAliasOracle;
        assert_eq!(oracle.alias(&module, x, 8, c, 8), AliasResult::MustAlias);
    }

    #[test]
    fn distinct_fields_do_not_alias() {
        let mut module = Module::new();
        let pair = Type::Aggregate(vec![Type::Int(64), Type::Int(64)]);
        let mut b = module
            .define_function("f", &[], Type::Opaque)
            .unwrap();
        let x = b.stack_alloc("x", pair);
        let f0 = b.project("f0", x, &[0]);
        let f1 = b.project("f1", x, &[1]);
        let f0_again = b.project("f0b", x, &[0]);
        b.finish().unwrap();

        let oracle = BasicAliasOracle;
        assert_eq!(oracle.alias(&module, f0, 8, f1, 8), AliasResult::NoAlias);
        assert_eq!(oracle.alias(&module, f0, 8, f0_again, 8), AliasResult::MustAlias);
    }

    #[test]
    fn unknown_pointers_may_alias() {
        let mut module = Module::new();
        let ptr = Type::ptr(Type::Int(64));
        let mut b = module
            .define_function("f", &[ptr.clone(), ptr], Type::Opaque)
            .unwrap();
        let p = b.param(0);
        let q = b.param(1);
        let x = b.stack_alloc("x", Type::Int(64));
        b.finish().unwrap();

        let oracle = BasicAliasOracle;
        assert_eq!(oracle.alias(&module, p, 8, q, 8), AliasResult::MayAlias);
        assert_eq!(oracle.alias(&module, p, 8, x, 8), AliasResult::MayAlias);
    }
}
