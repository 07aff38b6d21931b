//! Rendered analysis results.
//!
//! The line formats are part of the observable surface and must not change:
//! one `Escape: <function-name>` line per analysed function, then one
//! `%<inst-name>(<first-user-name>) <phrase>` line per heap allocation.

use escape_ir::{Function, Module, Value};

use crate::escape::Escape;

/// Verdict for one heap allocation site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocationVerdict {
    pub value: Value,
    pub verdict: Escape,
    line: String,
}

impl AllocationVerdict {
    pub(crate) fn new(module: &Module, inst: Value, verdict: Escape) -> Self {
        // Unnamed users print as empty, the way anonymous host-IR values do.
        let user_name = module
            .users(inst)
            .next()
            .and_then(|user| module.value_name(user))
            .unwrap_or_default();
        let line = format!(
            "{}({user_name}) {}",
            module.display_value(inst),
            verdict.phrase()
        );
        Self {
            value: inst,
            verdict,
            line,
        }
    }

    /// The rendered report line.
    pub fn line(&self) -> &str {
        &self.line
    }
}

impl std::fmt::Display for AllocationVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.line)
    }
}

/// All allocation verdicts of one function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionReport {
    pub function: Function,
    pub(crate) name: String,
    pub allocations: Vec<AllocationVerdict>,
}

impl FunctionReport {
    pub fn function_name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for FunctionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Escape: {}", self.name)?;
        for allocation in &self.allocations {
            writeln!(f, "{}", allocation.line)?;
        }
        Ok(())
    }
}

/// Reports for every function the module driver analysed, in module order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleReport {
    pub functions: Vec<FunctionReport>,
}

impl std::fmt::Display for ModuleReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for function in &self.functions {
            write!(f, "{function}")?;
        }
        Ok(())
    }
}
