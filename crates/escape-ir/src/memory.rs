//! The memory-SSA view: memory threaded as a single virtual value through
//! defs (stores, calls), uses (loads), and phis.
//!
//! [`MemorySsa::build`] is the reference construction used by the
//! [`FunctionBuilder`](crate::FunctionBuilder): stores and calls define the
//! memory state, loads use it, and a block reached by more than one
//! predecessor (or only by a later block, i.e. a backedge) merges through an
//! unpruned [`MemoryAccessKind::Phi`]. A host adapter may attach its own
//! view instead; the analysis only consumes the accessors.

use indexmap::IndexSet;
use rustc_hash::FxHashMap;

use crate::arena::Arena;
use crate::block::Block;
use crate::function::Function;
use crate::identifier;
use crate::module::Module;
use crate::value::{Value, ValueKind};

identifier! {
    /// A node of the memory-SSA graph.
    struct MemoryAccess
}

/// The kind of a memory-SSA node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemoryAccessKind {
    /// A definition of the memory state. `inst` is absent for definitions
    /// synthesised by the construction rather than taken from the IR.
    Def {
        inst: Option<Value>,
        defining: MemoryAccess,
    },
    /// A read of the memory state.
    Use {
        inst: Option<Value>,
        defining: MemoryAccess,
    },
    /// A merge of one incoming state per predecessor block.
    Phi { incomings: Vec<(Block, MemoryAccess)> },
    /// The memory state on function entry.
    LiveOnEntry,
}

/// One memory-SSA node with its users.
#[derive(Clone, Debug)]
pub struct MemoryAccessInfo {
    pub(crate) id: MemoryAccess,
    pub(crate) kind: MemoryAccessKind,
    pub(crate) users: IndexSet<MemoryAccess>,
}

impl MemoryAccessInfo {
    pub fn id(&self) -> MemoryAccess {
        self.id
    }

    pub fn kind(&self) -> &MemoryAccessKind {
        &self.kind
    }

    pub fn users(&self) -> impl Iterator<Item = MemoryAccess> + '_ {
        self.users.iter().copied()
    }
}

/// The memory-SSA graph of one function.
#[derive(Clone, Debug)]
pub struct MemorySsa {
    accesses: Arena<MemoryAccess, MemoryAccessInfo>,
    by_inst: FxHashMap<Value, MemoryAccess>,
    live_on_entry: MemoryAccess,
}

impl MemorySsa {
    fn empty() -> Self {
        let mut accesses: Arena<MemoryAccess, MemoryAccessInfo> = Arena::default();
        let live_on_entry = accesses.alloc_with_id(|id| MemoryAccessInfo {
            id,
            kind: MemoryAccessKind::LiveOnEntry,
            users: IndexSet::new(),
        });
        Self {
            accesses,
            by_inst: FxHashMap::default(),
            live_on_entry,
        }
    }

    /// The entry-state node.
    pub fn live_on_entry(&self) -> MemoryAccess {
        self.live_on_entry
    }

    /// The node attached to a memory-touching instruction, if any.
    pub fn access_of(&self, inst: Value) -> Option<MemoryAccess> {
        self.by_inst.get(&inst).copied()
    }

    pub fn kind(&self, access: MemoryAccess) -> &MemoryAccessKind {
        &self.accesses[access].kind
    }

    /// The instruction a def or use is attached to.
    pub fn inst_of(&self, access: MemoryAccess) -> Option<Value> {
        match self.kind(access) {
            MemoryAccessKind::Def { inst, .. } | MemoryAccessKind::Use { inst, .. } => *inst,
            _ => None,
        }
    }

    /// The defining access of a def or use.
    pub fn defining_access(&self, access: MemoryAccess) -> Option<MemoryAccess> {
        match self.kind(access) {
            MemoryAccessKind::Def { defining, .. } | MemoryAccessKind::Use { defining, .. } => {
                Some(*defining)
            }
            _ => None,
        }
    }

    /// The incoming states of a phi.
    pub fn incomings(&self, access: MemoryAccess) -> Option<&[(Block, MemoryAccess)]> {
        match self.kind(access) {
            MemoryAccessKind::Phi { incomings } => Some(incomings),
            _ => None,
        }
    }

    pub fn users(&self, access: MemoryAccess) -> impl Iterator<Item = MemoryAccess> + '_ {
        self.accesses[access].users()
    }

    fn alloc(&mut self, kind: MemoryAccessKind) -> MemoryAccess {
        self.accesses.alloc_with_id(|id| MemoryAccessInfo {
            id,
            kind,
            users: IndexSet::new(),
        })
    }

    /// Build the view over `function`'s current body.
    pub fn build(module: &Module, function: Function) -> Self {
        let mut ssa = Self::empty();
        let blocks = module.function(function).blocks().to_vec();

        let layout_pos: FxHashMap<Block, usize> =
            blocks.iter().enumerate().map(|(i, b)| (*b, i)).collect();

        // Blocks merging several predecessors, or fed only by a backedge,
        // get a phi up front so every entry state exists before the walk.
        let mut block_phi: FxHashMap<Block, MemoryAccess> = FxHashMap::default();
        for (pos, &block) in blocks.iter().enumerate() {
            let preds = module.block(block).preds();
            let needs_phi = preds.len() > 1
                || (preds.len() == 1 && layout_pos.get(&preds[0]).is_none_or(|p| *p >= pos));
            if needs_phi {
                let phi = ssa.alloc(MemoryAccessKind::Phi {
                    incomings: Vec::new(),
                });
                block_phi.insert(block, phi);
            }
        }

        let mut out_state: FxHashMap<Block, MemoryAccess> = FxHashMap::default();
        for &block in &blocks {
            let mut current = match block_phi.get(&block) {
                Some(phi) => *phi,
                None => match module.block(block).preds().first() {
                    Some(pred) => out_state[pred],
                    None => ssa.live_on_entry,
                },
            };
            for &inst in module.block(block).insts() {
                match module.kind(inst) {
                    ValueKind::Store { .. } | ValueKind::Call { .. } => {
                        let def = ssa.alloc(MemoryAccessKind::Def {
                            inst: Some(inst),
                            defining: current,
                        });
                        ssa.accesses[current].users.insert(def);
                        ssa.by_inst.insert(inst, def);
                        current = def;
                    }
                    ValueKind::Load { .. } => {
                        let access = ssa.alloc(MemoryAccessKind::Use {
                            inst: Some(inst),
                            defining: current,
                        });
                        ssa.accesses[current].users.insert(access);
                        ssa.by_inst.insert(inst, access);
                    }
                    _ => {}
                }
            }
            out_state.insert(block, current);
        }

        // Resolve phi incomings now that every predecessor out-state exists.
        for &block in &blocks {
            let Some(&phi) = block_phi.get(&block) else {
                continue;
            };
            let incomings: Vec<(Block, MemoryAccess)> = module
                .block(block)
                .preds()
                .iter()
                .map(|&pred| (pred, out_state[&pred]))
                .collect();
            for &(_, incoming) in &incomings {
                ssa.accesses[incoming].users.insert(phi);
            }
            ssa.accesses[phi].kind = MemoryAccessKind::Phi { incomings };
        }

        ssa
    }
}
