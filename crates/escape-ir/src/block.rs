//! Basic blocks: instruction layout plus explicit CFG edges.

use crate::identifier;
use crate::intern::Symbol;
use crate::value::Value;

identifier! {
    /// A basic block of a function.
    struct Block
}

impl std::fmt::Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "^{}", crate::arena::Id::from(*self).raw())
    }
}

/// Instruction order and control-flow edges of one block.
#[derive(Clone, Debug, Default)]
pub struct BlockInfo {
    pub(crate) name: Option<Symbol>,
    pub(crate) insts: Vec<Value>,
    pub(crate) preds: Vec<Block>,
    pub(crate) succs: Vec<Block>,
}

impl BlockInfo {
    pub fn name(&self) -> Option<Symbol> {
        self.name
    }

    /// Instructions in layout order.
    pub fn insts(&self) -> &[Value] {
        &self.insts
    }

    pub fn preds(&self) -> &[Block] {
        &self.preds
    }

    pub fn succs(&self) -> &[Block] {
        &self.succs
    }
}
