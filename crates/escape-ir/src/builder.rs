//! Fluent construction of function bodies.
//!
//! The builder is the reference construction layer: it wires use lists as
//! instructions are created, keeps block layout and CFG edges, and attaches
//! the memory-SSA view when the function is finished. It also owns the
//! adapter decisions a host frontend would make — notably representing
//! runtime heap-allocation calls as [`ValueKind::Alloc`] with
//! [`AllocKind::Heap`].

use smallvec::SmallVec;

use crate::block::{Block, BlockInfo};
use crate::error::BuilderError;
use crate::function::Function;
use crate::memory::MemorySsa;
use crate::module::Module;
use crate::types::Type;
use crate::value::{AllocKind, Callee, Value, ValueInfo, ValueKind};

impl Module {
    /// Start defining a function. The entry block is created and selected.
    pub fn define_function(
        &mut self,
        name: &str,
        params: &[Type],
        ret: Type,
    ) -> Result<FunctionBuilder<'_>, BuilderError> {
        if self.function_by_name(name).is_some() {
            return Err(BuilderError::DuplicateFunction(name.to_string()));
        }
        let function = self.new_function(name, params, ret, false);
        let entry = self.blocks.alloc(BlockInfo {
            name: Some(self.symbols.intern("entry")),
            ..BlockInfo::default()
        });
        self.functions[function].blocks.push(entry);
        Ok(FunctionBuilder {
            module: self,
            function,
            current: entry,
        })
    }
}

/// Builds one function body, then seals it with [`finish`](Self::finish).
#[derive(Debug)]
pub struct FunctionBuilder<'m> {
    module: &'m mut Module,
    function: Function,
    current: Block,
}

impl<'m> FunctionBuilder<'m> {
    pub fn function(&self) -> Function {
        self.function
    }

    /// The `index`th formal argument value.
    pub fn param(&self, index: usize) -> Value {
        self.module.functions[self.function].params[index]
    }

    pub fn module(&self) -> &Module {
        self.module
    }

    // -- Blocks and edges ---------------------------------------------------

    /// Append a new block and return it (the insertion point is unchanged).
    pub fn block(&mut self, name: &str) -> Block {
        let name = (!name.is_empty()).then(|| self.module.symbols.intern(name));
        let block = self.module.blocks.alloc(BlockInfo {
            name,
            ..BlockInfo::default()
        });
        self.module.functions[self.function].blocks.push(block);
        block
    }

    /// Move the insertion point to `block`.
    pub fn switch_to(&mut self, block: Block) {
        self.current = block;
    }

    /// Record a control-flow edge. Control transfer itself has no value
    /// kind; edges live on the blocks.
    pub fn edge(&mut self, from: Block, to: Block) {
        self.module.blocks[from].succs.push(to);
        self.module.blocks[to].preds.push(from);
    }

    /// Edge from the current block to `to`.
    pub fn jump(&mut self, to: Block) {
        self.edge(self.current, to);
    }

    /// Edges from the current block to both targets.
    pub fn branch(&mut self, then_block: Block, else_block: Block) {
        self.edge(self.current, then_block);
        self.edge(self.current, else_block);
    }

    // -- Instructions -------------------------------------------------------

    fn push(&mut self, name: &str, ty: Type, kind: ValueKind) -> Value {
        let name = (!name.is_empty()).then(|| self.module.symbols.intern(name));
        let (current, function) = (self.current, self.function);
        let value = self.module.values.alloc_with_id(|id| ValueInfo {
            id,
            name,
            ty,
            kind,
            block: Some(current),
            function: Some(function),
            users: Default::default(),
        });
        for operand in self.module.values[value].kind.operands() {
            self.module.add_user(operand, value);
        }
        self.module.blocks[self.current].insts.push(value);
        value
    }

    /// A stack allocation of a `ty` slot; the value is the slot's address.
    pub fn stack_alloc(&mut self, name: &str, ty: Type) -> Value {
        self.push(name, Type::ptr(ty), ValueKind::Alloc(AllocKind::Stack))
    }

    /// A runtime heap allocation of a `ty` object. Pass [`Type::Opaque`]
    /// for allocations whose element type only the later casts know.
    pub fn heap_alloc(&mut self, name: &str, ty: Type) -> Value {
        self.push(name, Type::ptr(ty), ValueKind::Alloc(AllocKind::Heap))
    }

    pub fn cast(&mut self, name: &str, src: Value, ty: Type) -> Value {
        self.push(name, ty, ValueKind::Cast { src })
    }

    /// A field/element address. The result type is derived from `base`'s
    /// pointee where the path can be followed, pointer-to-opaque otherwise.
    pub fn project(&mut self, name: &str, base: Value, path: &[u32]) -> Value {
        let mut ty = self.module.ty(base).pointee();
        for &index in path {
            ty = ty.and_then(|t| t.field(index));
        }
        let ty = Type::ptr(ty.cloned().unwrap_or(Type::Opaque));
        self.push(
            name,
            ty,
            ValueKind::Projection {
                base,
                path: SmallVec::from_slice(path),
            },
        )
    }

    pub fn phi(&mut self, name: &str, ty: Type, incomings: &[(Block, Value)]) -> Value {
        self.push(
            name,
            ty,
            ValueKind::Phi {
                incomings: incomings.to_vec(),
            },
        )
    }

    /// Add an incoming to an existing phi (for backedges whose value is
    /// built after the phi).
    pub fn add_phi_incoming(&mut self, phi: Value, block: Block, value: Value) {
        if let ValueKind::Phi { incomings } = &mut self.module.values[phi].kind {
            incomings.push((block, value));
        }
        self.module.add_user(value, phi);
    }

    pub fn load(&mut self, name: &str, ptr: Value) -> Value {
        let ty = self.module.ty(ptr).pointee().cloned().unwrap_or(Type::Opaque);
        self.push(name, ty, ValueKind::Load { ptr })
    }

    pub fn store(&mut self, value: Value, ptr: Value) -> Value {
        self.push("", Type::Opaque, ValueKind::Store { value, ptr })
    }

    pub fn call(&mut self, name: &str, callee: Function, args: &[Value]) -> Value {
        let ty = self.module.functions[callee].ret.clone();
        self.push(
            name,
            ty,
            ValueKind::Call {
                callee: Callee::Function(callee),
                args: SmallVec::from_slice(args),
            },
        )
    }

    pub fn call_indirect(&mut self, name: &str, target: Value, args: &[Value]) -> Value {
        let ty = match self.module.ty(target) {
            Type::Func(_, ret) => (**ret).clone(),
            Type::Ptr(inner) => match &**inner {
                Type::Func(_, ret) => (**ret).clone(),
                _ => Type::Opaque,
            },
            _ => Type::Opaque,
        };
        self.push(
            name,
            ty,
            ValueKind::Call {
                callee: Callee::Indirect(target),
                args: SmallVec::from_slice(args),
            },
        )
    }

    pub fn insert_value(&mut self, name: &str, agg: Value, field: u32, value: Value) -> Value {
        let ty = self.module.ty(agg).clone();
        self.push(name, ty, ValueKind::InsertAggregate { agg, field, value })
    }

    pub fn extract_value(&mut self, name: &str, agg: Value, field: u32) -> Value {
        let ty = self.module.ty(agg).field(field).cloned().unwrap_or(Type::Opaque);
        self.push(name, ty, ValueKind::ExtractAggregate { agg, field })
    }

    pub fn icmp(&mut self, name: &str, lhs: Value, rhs: Value) -> Value {
        self.push(name, Type::Int(1), ValueKind::IntCompare { lhs, rhs })
    }

    /// An integer constant.
    pub fn int(&mut self, bits: u16) -> Value {
        self.push(
            "",
            Type::Int(bits),
            ValueKind::Other {
                operands: SmallVec::new(),
            },
        )
    }

    /// A return. Modelled as [`ValueKind::Other`]; the analysis treats any
    /// unknown user of a pointer as caller-observable.
    pub fn ret(&mut self, value: Option<Value>) -> Value {
        let operands = value.into_iter().collect();
        self.push("", Type::Opaque, ValueKind::Other { operands })
    }

    /// An op outside the closed kind set.
    pub fn unknown(&mut self, name: &str, operands: &[Value]) -> Value {
        self.push(
            name,
            Type::Opaque,
            ValueKind::Other {
                operands: SmallVec::from_slice(operands),
            },
        )
    }

    // -- Sealing ------------------------------------------------------------

    /// Validate phis, build the memory-SSA view, and attach it.
    pub fn finish(self) -> Result<Function, BuilderError> {
        let blocks = self.module.functions[self.function].blocks.clone();
        for &block in &blocks {
            let insts = self.module.blocks[block].insts.clone();
            for &inst in &insts {
                let ValueKind::Phi { incomings } = self.module.kind(inst) else {
                    continue;
                };
                for (incoming, _) in incomings {
                    if !self.module.blocks[block].preds.contains(incoming) {
                        return Err(BuilderError::PhiIncomingNotPredecessor {
                            phi: inst,
                            block: *incoming,
                        });
                    }
                }
            }
        }
        let memssa = MemorySsa::build(self.module, self.function);
        self.module.functions[self.function].memssa = Some(memssa);
        Ok(self.function)
    }
}
