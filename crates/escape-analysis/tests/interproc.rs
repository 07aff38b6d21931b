//! Interprocedural summaries, callee policies, and oracle sensitivity.

mod common;

use common::boxed;
use escape_analysis::{Escape, EscapeAnalysis, EscapeConfig};
use escape_ir::{AliasOracle, AliasResult, BasicAliasOracle, Module, Type, Value};

fn first_verdict<A: AliasOracle>(analysis: &mut EscapeAnalysis<'_, A>, name: &str) -> Escape {
    let function = analysis.module().function_by_name(name).unwrap();
    analysis.analyse_function(function).unwrap().allocations[0].verdict
}

/// A callee that only reads its argument contributes `NoEscape` along the
/// call edge.
#[test]
fn read_only_callee_summary() {
    let mut module = Module::new();
    let ptr_box = Type::ptr(boxed());
    let mut b = module
        .define_function("main.use", &[ptr_box], Type::Opaque)
        .unwrap();
    let p = b.param(0);
    let callee = b.function();
    b.load("v", p);
    b.ret(None);
    b.finish().unwrap();

    let mut b = module.define_function("main.call", &[], Type::Opaque).unwrap();
    let x = b.heap_alloc("x", boxed());
    b.call("", callee, &[x]);
    b.ret(None);
    b.finish().unwrap();

    let mut analysis = EscapeAnalysis::new(&module, BasicAliasOracle);
    assert_eq!(first_verdict(&mut analysis, "main.call"), Escape::No);
    assert_eq!(analysis.summary(callee), Some([Escape::No].as_slice()));
}

/// A callee that returns its argument propagates a local escape to the
/// call site.
#[test]
fn returning_callee_summary() {
    let mut module = Module::new();
    let ptr_box = Type::ptr(boxed());
    let mut b = module
        .define_function("main.id", &[ptr_box.clone()], ptr_box)
        .unwrap();
    let p = b.param(0);
    let callee = b.function();
    b.ret(Some(p));
    b.finish().unwrap();

    let mut b = module.define_function("main.call", &[], Type::Opaque).unwrap();
    let x = b.heap_alloc("x", boxed());
    b.call("", callee, &[x]);
    b.ret(None);
    b.finish().unwrap();

    let mut analysis = EscapeAnalysis::new(&module, BasicAliasOracle);
    assert_eq!(first_verdict(&mut analysis, "main.call"), Escape::Local);
}

/// A callee that publishes its argument into a global poisons the call
/// site globally.
#[test]
fn publishing_callee_summary() {
    let mut module = Module::new();
    let sink = module.global("G", Type::ptr(boxed()));
    let ptr_box = Type::ptr(boxed());
    let mut b = module
        .define_function("main.publish", &[ptr_box], Type::Opaque)
        .unwrap();
    let p = b.param(0);
    let callee = b.function();
    b.store(p, sink);
    b.ret(None);
    b.finish().unwrap();

    let mut b = module.define_function("main.call", &[], Type::Opaque).unwrap();
    let x = b.heap_alloc("x", boxed());
    b.call("", callee, &[x]);
    b.ret(None);
    b.finish().unwrap();

    let mut analysis = EscapeAnalysis::new(&module, BasicAliasOracle);
    assert_eq!(first_verdict(&mut analysis, "main.call"), Escape::Global);
    assert_eq!(analysis.summary(callee), Some([Escape::Global].as_slice()));
}

/// The same pointer passed in several positions meets every matching
/// summary slot.
#[test]
fn repeated_argument_meets_all_positions() {
    let mut module = Module::new();
    let ptr_box = Type::ptr(boxed());
    let mut b = module
        .define_function("main.two", &[ptr_box.clone(), ptr_box.clone()], ptr_box)
        .unwrap();
    let q = b.param(1);
    let callee = b.function();
    b.ret(Some(q));
    b.finish().unwrap();

    let mut b = module.define_function("main.call", &[], Type::Opaque).unwrap();
    let x = b.heap_alloc("x", boxed());
    b.call("", callee, &[x, x]);
    b.ret(None);
    b.finish().unwrap();

    let mut analysis = EscapeAnalysis::new(&module, BasicAliasOracle);
    // summary is [No, Local]; the meet over both positions is Local.
    assert_eq!(analysis.summary(callee), None);
    assert_eq!(first_verdict(&mut analysis, "main.call"), Escape::Local);
    assert_eq!(
        analysis.summary(callee),
        Some([Escape::No, Escape::Local].as_slice())
    );
}

/// Passing a pointer beyond the callee's arity has no summary slot and
/// degrades conservatively.
#[test]
fn arity_mismatch_is_global() {
    let mut module = Module::new();
    let ptr_box = Type::ptr(boxed());
    let mut b = module
        .define_function("main.one", &[ptr_box], Type::Opaque)
        .unwrap();
    let callee = b.function();
    b.ret(None);
    b.finish().unwrap();

    let mut b = module.define_function("main.call", &[], Type::Opaque).unwrap();
    let x = b.heap_alloc("x", boxed());
    let pad = b.stack_alloc("pad", boxed());
    b.call("", callee, &[pad, x]);
    b.ret(None);
    b.finish().unwrap();

    let mut analysis = EscapeAnalysis::new(&module, BasicAliasOracle);
    assert_eq!(first_verdict(&mut analysis, "main.call"), Escape::Global);
}

/// Declaration-only callees follow the configured policy on argument
/// paths: trusting by default, conservative on request.
#[test]
fn undefined_callee_policy() {
    let mut module = Module::new();
    let ptr_box = Type::ptr(boxed());
    let external = module.declare_function("ext", &[ptr_box], Type::Opaque);
    let mut b = module.define_function("main.call", &[], Type::Opaque).unwrap();
    let x = b.heap_alloc("x", boxed());
    b.call("", external, &[x]);
    b.ret(None);
    b.finish().unwrap();

    let mut analysis = EscapeAnalysis::new(&module, BasicAliasOracle);
    assert_eq!(first_verdict(&mut analysis, "main.call"), Escape::No);

    let config = EscapeConfig::new().with_undefined_callee_verdict(Escape::Global);
    let mut analysis = EscapeAnalysis::with_config(&module, BasicAliasOracle, config);
    assert_eq!(first_verdict(&mut analysis, "main.call"), Escape::Global);
}

/// Indirect callees are unanalysable and follow the same policy.
#[test]
fn indirect_callee_policy() {
    let mut module = Module::new();
    let ptr_box = Type::ptr(boxed());
    let fn_ty = Type::Func(vec![ptr_box.clone()], Box::new(Type::Opaque));
    let mut b = module
        .define_function("main.call", &[Type::ptr(fn_ty)], Type::Opaque)
        .unwrap();
    let target = b.param(0);
    let x = b.heap_alloc("x", boxed());
    b.call_indirect("", target, &[x]);
    b.ret(None);
    b.finish().unwrap();

    let mut analysis = EscapeAnalysis::new(&module, BasicAliasOracle);
    assert_eq!(first_verdict(&mut analysis, "main.call"), Escape::No);

    let config = EscapeConfig::new().with_undefined_callee_verdict(Escape::Global);
    let mut analysis = EscapeAnalysis::with_config(&module, BasicAliasOracle, config);
    assert_eq!(first_verdict(&mut analysis, "main.call"), Escape::Global);
}

/// On backward paths an unanalysable call has taken over the memory
/// state; the policy does not soften that.
#[test]
fn undefined_callee_in_backward_path_is_global() {
    let mut module = Module::new();
    let external = module.declare_function("ext", &[], Type::Opaque);
    let mut b = module.define_function("main.call", &[], Type::Opaque).unwrap();
    let x = b.heap_alloc("x", boxed());
    let slot = b.stack_alloc("slot", Type::ptr(boxed()));
    b.call("", external, &[]);
    b.store(x, slot);
    b.ret(None);
    b.finish().unwrap();

    let mut analysis = EscapeAnalysis::new(&module, BasicAliasOracle);
    assert_eq!(first_verdict(&mut analysis, "main.call"), Escape::Global);
}

/// A *defined* call before the store is walked through the tracker
/// instead: an unused result leaks nothing.
#[test]
fn defined_callee_in_backward_path_is_tracked() {
    let mut module = Module::new();
    let mut b = module.define_function("main.noop", &[], Type::Opaque).unwrap();
    let noop = b.function();
    b.ret(None);
    b.finish().unwrap();

    let mut b = module.define_function("main.call", &[], Type::Opaque).unwrap();
    let x = b.heap_alloc("x", boxed());
    let slot = b.stack_alloc("slot", Type::ptr(boxed()));
    b.call("", noop, &[]);
    b.store(x, slot);
    b.ret(None);
    b.finish().unwrap();

    let mut analysis = EscapeAnalysis::new(&module, BasicAliasOracle);
    assert_eq!(first_verdict(&mut analysis, "main.call"), Escape::No);
}

/// A call between the store and a load does not hide the load: the
/// forward walk continues through the call's memory definition.
#[test]
fn forward_walk_continues_through_calls() {
    let mut module = Module::new();
    let mut b = module.define_function("main.noop", &[], Type::Opaque).unwrap();
    let noop = b.function();
    b.ret(None);
    b.finish().unwrap();

    let ptr_box = Type::ptr(boxed());
    let mut b = module
        .define_function("main.call", &[], ptr_box.clone())
        .unwrap();
    let x = b.heap_alloc("x", boxed());
    let slot = b.stack_alloc("slot", ptr_box);
    b.store(x, slot);
    b.call("", noop, &[]);
    let v = b.load("v", slot);
    b.ret(Some(v));
    b.finish().unwrap();

    let mut analysis = EscapeAnalysis::new(&module, BasicAliasOracle);
    assert_eq!(first_verdict(&mut analysis, "main.call"), Escape::Local);
}

/// Every function's summary has one slot per argument once analysed, and
/// analysis terminates with nothing left in flight.
#[test]
fn summaries_match_arity() {
    let mut module = Module::new();
    let ptr_box = Type::ptr(boxed());
    let mut b = module
        .define_function("main.three", &[ptr_box.clone(), ptr_box.clone(), ptr_box], Type::Opaque)
        .unwrap();
    let f = b.function();
    b.ret(None);
    b.finish().unwrap();

    let mut analysis = EscapeAnalysis::new(&module, BasicAliasOracle);
    analysis.analyse_function(f).unwrap();
    assert_eq!(analysis.summary(f).map(<[Escape]>::len), Some(3));
}

/// Tightening the alias oracle never drives a verdict down the lattice.
#[test]
fn verdicts_are_monotone_in_oracle_precision() {
    struct AlwaysMay;

    impl AliasOracle for AlwaysMay {
        fn alias(&self, _: &Module, _: Value, _: u64, _: Value, _: u64) -> AliasResult {
            AliasResult::MayAlias
        }
    }

    let mut module = Module::new();
    let ptr_box = Type::ptr(boxed());
    let mut b = module
        .define_function("main.apart", &[], ptr_box.clone())
        .unwrap();
    let x = b.heap_alloc("x", boxed());
    let slot = b.stack_alloc("slot", ptr_box.clone());
    let other = b.stack_alloc("other", ptr_box);
    b.store(x, slot);
    let v = b.load("v", other);
    b.ret(Some(v));
    b.finish().unwrap();

    let mut precise = EscapeAnalysis::new(&module, BasicAliasOracle);
    let mut blurry = EscapeAnalysis::new(&module, AlwaysMay);
    let precise_verdict = first_verdict(&mut precise, "main.apart");
    let blurry_verdict = first_verdict(&mut blurry, "main.apart");

    assert_eq!(precise_verdict, Escape::No);
    assert_eq!(blurry_verdict, Escape::Local);
    // Imprecision may only push verdicts toward bottom, never the precise
    // result below the imprecise one.
    use escape_ir::Lattice;
    assert!(blurry_verdict.is_subseteq(&precise_verdict));
}
