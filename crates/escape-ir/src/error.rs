//! Construction-time errors.

use crate::block::Block;
use crate::value::Value;

/// Errors raised while building a function.
///
/// Analysis itself never errors (malformed inputs degrade to conservative
/// verdicts); only construction is fallible.
#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    /// A function with this name already exists in the module.
    #[error("function `{0}` is already defined")]
    DuplicateFunction(String),
    /// A phi lists an incoming block that is not a predecessor of its
    /// own block.
    #[error("phi {phi} has an incoming from {block}, which is not a predecessor")]
    PhiIncomingNotPredecessor { phi: Value, block: Block },
}
