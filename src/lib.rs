//! Escape analysis for an SSA IR with a memory-SSA view.
//!
//! This crate re-exports the two workspace members:
//!
//! - [`escape_ir`] — the IR data model, memory-SSA view, alias oracle seam,
//!   and the reference construction layer;
//! - [`escape_analysis`] — the analysis engine, its configuration, and the
//!   report types.
//!
//! See `escape_analysis::EscapeAnalysis` for the entry points.

pub use escape_analysis::{
    AllocationVerdict, Escape, EscapeAnalysis, EscapeConfig, EscapeError, FunctionReport,
    HEAP_ALLOC_NAME, ModuleReport, RUNTIME_PREFIX, USER_PREFIX, classify_origin,
};
pub use escape_ir::{
    AliasOracle, AliasResult, AllocKind, BasicAliasOracle, Block, BuilderError, Callee, DataLayout,
    Function, FunctionBuilder, HasBottom, HasTop, Lattice, MemoryAccess, MemoryAccessKind,
    MemorySsa, Module, Symbol, Type, Value, ValueKind,
};
