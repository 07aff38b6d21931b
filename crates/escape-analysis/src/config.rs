//! Analysis configuration and runtime naming conventions.

use crate::escape::Escape;

/// Callee name of the runtime heap allocator.
pub const HEAP_ALLOC_NAME: &str = "__go_new";

/// Name prefix of runtime support functions, skipped by the driver.
pub const RUNTIME_PREFIX: &str = "__go_";

/// Name prefix of user functions, the only ones analysed in module mode.
pub const USER_PREFIX: &str = "main.";

/// Tunable policies of the analysis.
///
/// The defaults reproduce the runtime conventions and the historic
/// treatment of unanalysable callees; see the `with_*` methods for the
/// knobs.
#[derive(Clone, Debug)]
pub struct EscapeConfig {
    /// Calls to a function with this literal name are heap allocation
    /// sites, in addition to values the construction layer already marked
    /// as heap allocations.
    pub heap_alloc_name: String,
    /// Functions whose name starts with this prefix are runtime support
    /// and never analysed.
    pub runtime_prefix: String,
    /// When set, module analysis is restricted to functions whose name
    /// starts with this prefix. Function analysis ignores it.
    pub user_prefix: Option<String>,
    /// Verdict for a pointer handed to a declaration-only or indirect
    /// callee. The historic behaviour is [`Escape::No`]; the safe reading
    /// is [`Escape::Global`].
    pub undefined_callee_verdict: Escape,
    /// Bound on tracker recursion depth. Exceeding it yields
    /// [`Escape::Global`].
    pub max_depth: Option<usize>,
}

impl Default for EscapeConfig {
    fn default() -> Self {
        Self {
            heap_alloc_name: HEAP_ALLOC_NAME.to_string(),
            runtime_prefix: RUNTIME_PREFIX.to_string(),
            user_prefix: Some(USER_PREFIX.to_string()),
            undefined_callee_verdict: Escape::No,
            max_depth: None,
        }
    }
}

impl EscapeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_undefined_callee_verdict(mut self, verdict: Escape) -> Self {
        self.undefined_callee_verdict = verdict;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_user_prefix(mut self, prefix: Option<String>) -> Self {
        self.user_prefix = prefix;
        self
    }

    pub fn with_runtime_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.runtime_prefix = prefix.into();
        self
    }

    pub fn with_heap_alloc_name(mut self, name: impl Into<String>) -> Self {
        self.heap_alloc_name = name.into();
        self
    }
}
