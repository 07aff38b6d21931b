//! IR data model for escape analysis.
//!
//! This crate is the narrow interface between a host compiler and the
//! analysis engine in `escape-analysis`: typed value handles with a closed
//! kind set, a memory-SSA view, an alias oracle seam, and a data-layout
//! oracle. It also ships reference providers for each of these (an
//! arena-based [`Module`] with a [`FunctionBuilder`], a straightforward
//! memory-SSA construction, and [`BasicAliasOracle`]) so the workspace
//! stands alone; a host adapter can substitute its own.

pub mod arena;
mod alias;
mod block;
mod builder;
mod error;
mod function;
mod intern;
mod lattice;
mod memory;
mod module;
mod types;
mod value;

pub use alias::{AliasOracle, AliasResult, BasicAliasOracle};
pub use block::{Block, BlockInfo};
pub use builder::FunctionBuilder;
pub use error::BuilderError;
pub use function::{Function, FunctionInfo};
pub use intern::{Symbol, SymbolTable};
pub use lattice::{HasBottom, HasTop, Lattice};
pub use memory::{MemoryAccess, MemoryAccessInfo, MemoryAccessKind, MemorySsa};
pub use module::Module;
pub use types::{DataLayout, Type};
pub use value::{AllocKind, Callee, Value, ValueInfo, ValueKind};
