//! Escape analysis over the `escape-ir` data model.
//!
//! For every heap allocation site in a function (and every function
//! argument, interprocedurally) the engine decides whether the object's
//! address stays inside the allocating activation ([`Escape::No`]), reaches
//! the caller ([`Escape::Local`]), or becomes reachable from global state
//! ([`Escape::Global`]). The pass is purely informative: it never rewrites
//! the IR, and it preserves all other analyses.
//!
//! ```
//! use escape_analysis::EscapeAnalysis;
//! use escape_ir::{BasicAliasOracle, Module, Type};
//!
//! let mut module = Module::new();
//! let global = module.global("sink", Type::ptr(Type::Int(64)));
//! let mut b = module
//!     .define_function("main.leak", &[], Type::Opaque)
//!     .unwrap();
//! let x = b.heap_alloc("x", Type::Int(64));
//! let c = b.cast("c", x, Type::ptr(Type::Int(64)));
//! b.store(c, global);
//! b.ret(None);
//! b.finish().unwrap();
//!
//! let mut analysis = EscapeAnalysis::new(&module, BasicAliasOracle);
//! let report = analysis.analyse_module();
//! assert_eq!(report.to_string(), "Escape: main.leak\n%x(c) globally escapes.\n");
//! ```

mod analysis;
mod config;
mod error;
mod escape;
mod origin;
mod report;

pub use analysis::EscapeAnalysis;
pub use config::{EscapeConfig, HEAP_ALLOC_NAME, RUNTIME_PREFIX, USER_PREFIX};
pub use error::EscapeError;
pub use escape::Escape;
pub use origin::classify_origin;
pub use report::{AllocationVerdict, FunctionReport, ModuleReport};
