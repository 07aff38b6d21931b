//! SSA values and the closed kind set the analysis dispatches over.

use indexmap::IndexSet;
use smallvec::SmallVec;

use crate::block::Block;
use crate::function::Function;
use crate::identifier;
use crate::intern::Symbol;
use crate::types::Type;

identifier! {
    /// An SSA value: an instruction result, a function argument, or a
    /// module global.
    struct Value
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", crate::arena::Id::from(*self).raw())
    }
}

/// Where an allocation's storage lives.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AllocKind {
    Stack,
    Heap,
}

/// The target of a call.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Callee {
    /// A direct call to a module function.
    Function(Function),
    /// An indirect call through an SSA value.
    Indirect(Value),
}

/// The closed set of value kinds the analysis understands.
///
/// The construction layer is responsible for mapping host IR onto this set;
/// in particular, calls to the runtime heap allocator become
/// `Alloc(AllocKind::Heap)`, and any construct without a counterpart here
/// becomes [`Other`](ValueKind::Other) carrying its operands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Alloc(AllocKind),
    /// An address-preserving conversion of `src`.
    Cast { src: Value },
    /// A field/element address derived from `base` by `path`.
    Projection { base: Value, path: SmallVec<[u32; 4]> },
    /// A merge of one incoming value per predecessor block.
    Phi { incomings: Vec<(Block, Value)> },
    Load { ptr: Value },
    Store { value: Value, ptr: Value },
    Call { callee: Callee, args: SmallVec<[Value; 4]> },
    /// An aggregate equal to `agg` with `field` replaced by `value`.
    InsertAggregate { agg: Value, field: u32, value: Value },
    /// The `field` component of aggregate `agg`.
    ExtractAggregate { agg: Value, field: u32 },
    IntCompare { lhs: Value, rhs: Value },
    /// The `index`th formal argument of the owning function.
    Argument { index: usize },
    Global,
    /// Anything else. Operands are recorded so use-wiring stays uniform.
    Other { operands: SmallVec<[Value; 2]> },
}

impl ValueKind {
    /// The operand values, in operand order.
    pub fn operands(&self) -> SmallVec<[Value; 4]> {
        match self {
            ValueKind::Alloc(_) | ValueKind::Argument { .. } | ValueKind::Global => SmallVec::new(),
            ValueKind::Cast { src } => SmallVec::from_slice(&[*src]),
            ValueKind::Projection { base, .. } => SmallVec::from_slice(&[*base]),
            ValueKind::Phi { incomings } => incomings.iter().map(|(_, v)| *v).collect(),
            ValueKind::Load { ptr } => SmallVec::from_slice(&[*ptr]),
            ValueKind::Store { value, ptr } => SmallVec::from_slice(&[*value, *ptr]),
            ValueKind::Call { callee, args } => {
                let mut operands = SmallVec::new();
                if let Callee::Indirect(target) = callee {
                    operands.push(*target);
                }
                operands.extend(args.iter().copied());
                operands
            }
            ValueKind::InsertAggregate { agg, value, .. } => SmallVec::from_slice(&[*agg, *value]),
            ValueKind::ExtractAggregate { agg, .. } => SmallVec::from_slice(&[*agg]),
            ValueKind::IntCompare { lhs, rhs } => SmallVec::from_slice(&[*lhs, *rhs]),
            ValueKind::Other { operands } => operands.iter().copied().collect(),
        }
    }
}

/// Everything the module knows about one value.
#[derive(Clone, Debug)]
pub struct ValueInfo {
    pub(crate) id: Value,
    pub(crate) name: Option<Symbol>,
    pub(crate) ty: Type,
    pub(crate) kind: ValueKind,
    pub(crate) block: Option<Block>,
    pub(crate) function: Option<Function>,
    /// Direct users in insertion order. Iteration order is part of the
    /// determinism contract of the analysis.
    pub(crate) users: IndexSet<Value>,
}

impl ValueInfo {
    pub fn id(&self) -> Value {
        self.id
    }

    pub fn name(&self) -> Option<Symbol> {
        self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn block(&self) -> Option<Block> {
        self.block
    }

    pub fn function(&self) -> Option<Function> {
        self.function
    }

    pub fn users(&self) -> impl Iterator<Item = Value> + '_ {
        self.users.iter().copied()
    }
}
