//! The escape analysis engine.
//!
//! [`EscapeAnalysis`] drives a joint traversal of the SSA use-def graph and
//! the memory-SSA graph. The value tracker follows a candidate pointer
//! through casts, projections, aggregates, and phis; every store of the
//! pointer dispatches a backward walk (has this memory already been
//! leaked?) and a forward walk (who can observe the slot from here?); calls
//! are resolved through a per-argument summary cache with a re-entrancy set
//! cutting recursion.
//!
//! Verdicts are lattice values, never errors: anything the engine cannot
//! understand degrades to [`Escape::Global`] for memory operations and
//! [`Escape::Local`] for value users.

use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};

use escape_ir::{
    AliasOracle, AliasResult, AllocKind, Callee, Function, Lattice, MemoryAccess,
    MemoryAccessKind, MemorySsa, Module, Type, Value, ValueKind,
};

use crate::config::EscapeConfig;
use crate::error::EscapeError;
use crate::escape::Escape;
use crate::origin::classify_origin;
use crate::report::{AllocationVerdict, FunctionReport, ModuleReport};

/// The analysis engine for one module.
///
/// Owns all mutable analysis state: the summary cache, the re-entrancy
/// set, the per-traversal track set, and the rendered report cache.
/// Concurrent analyses must each own their own engine.
pub struct EscapeAnalysis<'m, A: AliasOracle> {
    module: &'m Module,
    alias: A,
    config: EscapeConfig,
    /// Immutable per-argument summaries, present once a function's
    /// analysis has completed.
    summaries: FxHashMap<Function, Vec<Escape>>,
    /// Functions currently being analysed; calls into these resolve to
    /// the conservative fixpoint seed.
    in_progress: FxHashSet<Function>,
    /// Rendered reports; re-analysis returns the cached rendering.
    reports: FxHashMap<Function, FunctionReport>,
    /// Value identities on the tracker stack of the current traversal.
    tracked: FxHashSet<String>,
    depth: usize,
}

impl<'m, A: AliasOracle> EscapeAnalysis<'m, A> {
    pub fn new(module: &'m Module, alias: A) -> Self {
        Self::with_config(module, alias, EscapeConfig::default())
    }

    pub fn with_config(module: &'m Module, alias: A, config: EscapeConfig) -> Self {
        Self {
            module,
            alias,
            config,
            summaries: FxHashMap::default(),
            in_progress: FxHashSet::default(),
            reports: FxHashMap::default(),
            tracked: FxHashSet::default(),
            depth: 0,
        }
    }

    pub fn config(&self) -> &EscapeConfig {
        &self.config
    }

    pub fn module(&self) -> &'m Module {
        self.module
    }

    /// The cached per-argument summary of `function`, if analysed.
    pub fn summary(&self, function: Function) -> Option<&[Escape]> {
        self.summaries.get(&function).map(Vec::as_slice)
    }

    // -- Entry points -------------------------------------------------------

    /// Analyse a single defined function (the intraprocedural pass).
    ///
    /// Idempotent: a second call returns the identical cached report.
    pub fn analyse_function(&mut self, function: Function) -> Result<&FunctionReport, EscapeError> {
        if self.module.function(function).is_declaration() {
            return Err(EscapeError::Declaration(
                self.module.function_name(function).to_string(),
            ));
        }
        if !self.reports.contains_key(&function) {
            self.run_function(function);
        }
        Ok(&self.reports[&function])
    }

    /// Analyse every eligible function in the module (the whole-module
    /// pass): declarations and runtime-support functions are skipped, and
    /// when a user prefix is configured only matching functions are
    /// reported.
    pub fn analyse_module(&mut self) -> ModuleReport {
        let module = self.module;
        let mut report = ModuleReport::default();
        for function in module.functions().collect::<Vec<_>>() {
            let name = module.function_name(function);
            if module.function(function).is_declaration() {
                trace!("skipping declaration `{name}`");
                continue;
            }
            if name.starts_with(&self.config.runtime_prefix) {
                trace!("skipping runtime function `{name}`");
                continue;
            }
            if let Some(prefix) = &self.config.user_prefix {
                if !name.starts_with(prefix.as_str()) {
                    trace!("skipping non-user function `{name}`");
                    continue;
                }
            }
            if !self.reports.contains_key(&function) {
                self.run_function(function);
            }
            report.functions.push(self.reports[&function].clone());
        }
        report
    }

    /// Track a single value from scratch and return its verdict.
    pub fn classify_value(&mut self, value: Value) -> Escape {
        self.tracked.clear();
        self.track(value, true)
    }

    // -- Summarisation ------------------------------------------------------

    /// Analyse `function`: per-argument summary plus the heap allocation
    /// report. The summary is inserted only after the function has left
    /// the re-entrancy set, and is immutable from then on.
    fn run_function(&mut self, function: Function) {
        let module = self.module;
        debug!("analysing `{}`", module.function_name(function));
        self.in_progress.insert(function);
        let saved = std::mem::take(&mut self.tracked);

        let params = module.function(function).params().to_vec();
        let mut summary = vec![Escape::Global; params.len()];
        for (index, &param) in params.iter().enumerate() {
            self.tracked.clear();
            summary[index] = self.track(param, true);
            trace!("  arg {index}: {}", summary[index]);
        }

        let mut allocations = Vec::new();
        for &block in module.function(function).blocks() {
            for &inst in module.block(block).insts() {
                if !self.is_heap_allocation(inst) {
                    continue;
                }
                self.tracked.clear();
                let verdict = self.track(inst, true);
                trace!("  alloc {}: {verdict}", module.display_value(inst));
                allocations.push(AllocationVerdict::new(module, inst, verdict));
            }
        }

        self.tracked = saved;
        self.in_progress.remove(&function);
        self.summaries.insert(function, summary);
        self.reports.insert(
            function,
            FunctionReport {
                function,
                name: module.function_name(function).to_string(),
                allocations,
            },
        );
    }

    fn is_heap_allocation(&self, inst: Value) -> bool {
        match self.module.kind(inst) {
            ValueKind::Alloc(AllocKind::Heap) => true,
            ValueKind::Call {
                callee: Callee::Function(callee),
                ..
            } => self.module.function_name(*callee) == self.config.heap_alloc_name,
            _ => false,
        }
    }

    // -- Value tracker ------------------------------------------------------

    /// Follow every use of `value`, meeting the verdicts. Root invocations
    /// acquire a track-set entry so cyclic phi chains bottom out; the
    /// outermost frame owns the verdict for a revisited value.
    fn track(&mut self, value: Value, root: bool) -> Escape {
        if !root {
            return self.track_users(value);
        }
        let key = self.module.value_identity(value);
        if self.tracked.contains(&key) {
            return Escape::No;
        }
        self.tracked.insert(key.clone());
        let verdict = self.track_users(value);
        self.tracked.remove(&key);
        verdict
    }

    fn track_users(&mut self, value: Value) -> Escape {
        if self.config.max_depth.is_some_and(|max| self.depth >= max) {
            return Escape::Global;
        }
        self.depth += 1;
        let users: Vec<Value> = self.module.users(value).collect();
        let mut verdict = Escape::No;
        for user in users {
            let observed = self.track_user(value, user);
            trace!(
                "    {} via {}: {observed}",
                self.module.display_value(value),
                self.module.display_value(user)
            );
            verdict = verdict.meet(&observed);
            if verdict == Escape::Global {
                break;
            }
        }
        self.depth -= 1;
        verdict
    }

    fn track_user(&mut self, value: Value, user: Value) -> Escape {
        match self.module.kind(user) {
            ValueKind::Cast { .. }
            | ValueKind::Projection { .. }
            | ValueKind::InsertAggregate { .. }
            | ValueKind::ExtractAggregate { .. } => self.track(user, false),
            ValueKind::Phi { .. } => self.track(user, true),
            ValueKind::Store { value: stored, ptr } => {
                if *stored == value {
                    self.track_store(user, *ptr)
                } else {
                    // The tracked pointer is the destination: the object is
                    // written into, its address does not move.
                    Escape::No
                }
            }
            ValueKind::Load { .. } => Escape::No,
            ValueKind::IntCompare { .. } => Escape::No,
            ValueKind::Call { args, .. } if args.contains(&value) => {
                self.argument_verdict(user, value)
            }
            _ => Escape::Local,
        }
    }

    /// The tracked pointer is written to memory: ask the backward walk
    /// whether the memory state is already leaked, then follow the slot
    /// forward.
    fn track_store(&mut self, store: Value, ptr: Value) -> Escape {
        let module = self.module;
        let Some(function) = module.value(store).function() else {
            return Escape::Global;
        };
        let Some(memssa) = module.function(function).memory_ssa() else {
            return Escape::Global;
        };
        let Some(access) = memssa.access_of(store) else {
            return Escape::Global;
        };
        let prior = self.backward(memssa, access);
        if prior.is_escape() {
            return prior;
        }
        self.forward(memssa, access, ptr)
    }

    // -- Backward memory walk -----------------------------------------------

    /// Walk the defining-access chain of a store: a prior store into a
    /// globally-rooted location, or a prior unanalysable call, has already
    /// leaked the memory the tracked pointer is now part of.
    fn backward(&mut self, memssa: &'m MemorySsa, access: MemoryAccess) -> Escape {
        let mut visited = FxHashSet::default();
        self.backward_walk(memssa, access, &mut visited)
    }

    fn backward_walk(
        &mut self,
        memssa: &'m MemorySsa,
        access: MemoryAccess,
        visited: &mut FxHashSet<MemoryAccess>,
    ) -> Escape {
        if !visited.insert(access) {
            return Escape::No;
        }
        match memssa.kind(access) {
            MemoryAccessKind::Def { inst, defining } | MemoryAccessKind::Use { inst, defining } => {
                let Some(inst) = *inst else {
                    return Escape::No;
                };
                match self.module.kind(inst) {
                    ValueKind::Store { ptr, .. } => {
                        let origin = classify_origin(self.module, *ptr);
                        if origin.is_escape() {
                            return origin;
                        }
                        self.backward_walk(memssa, *defining, visited)
                    }
                    ValueKind::Call {
                        callee: Callee::Function(callee),
                        ..
                    } if !self.module.function(*callee).is_declaration() => {
                        // The call may route the memory state anywhere its
                        // result flows.
                        self.track(inst, true)
                    }
                    ValueKind::Call { .. } => Escape::Global,
                    _ => Escape::Global,
                }
            }
            MemoryAccessKind::Phi { incomings } => {
                for (_, incoming) in incomings {
                    let leaked = self.backward_walk(memssa, *incoming, visited);
                    if leaked.is_escape() {
                        return leaked;
                    }
                }
                Escape::No
            }
            // The entry state carries no prior store.
            MemoryAccessKind::LiveOnEntry => Escape::No,
        }
    }

    // -- Forward memory walk ------------------------------------------------

    /// Follow every memory operation that may coincide with `loc` after
    /// the store, deciding for each observer whether the pointer escapes
    /// further. Short-circuits on the first escaping observer.
    fn forward(&mut self, memssa: &'m MemorySsa, access: MemoryAccess, loc: Value) -> Escape {
        let mut visited = FxHashSet::default();
        visited.insert(access);
        self.forward_walk(memssa, access, loc, &mut visited)
    }

    fn forward_walk(
        &mut self,
        memssa: &'m MemorySsa,
        access: MemoryAccess,
        loc: Value,
        visited: &mut FxHashSet<MemoryAccess>,
    ) -> Escape {
        let users: Vec<MemoryAccess> = memssa.users(access).collect();
        for user in users {
            if !visited.insert(user) {
                continue;
            }
            let observed = self.forward_user(memssa, user, loc, visited);
            if observed.is_escape() {
                return observed;
            }
        }
        Escape::No
    }

    fn forward_user(
        &mut self,
        memssa: &'m MemorySsa,
        user: MemoryAccess,
        loc: Value,
        visited: &mut FxHashSet<MemoryAccess>,
    ) -> Escape {
        match memssa.kind(user) {
            MemoryAccessKind::Use { inst: Some(inst), .. } => match self.module.kind(*inst) {
                ValueKind::Load { ptr } => {
                    if self.may_observe(*ptr, loc) {
                        // The load can see the stored pointer; whatever it
                        // propagates, the pointer propagates.
                        self.track(*inst, true)
                    } else {
                        Escape::No
                    }
                }
                _ => Escape::Global,
            },
            MemoryAccessKind::Phi { .. } => self.forward_walk(memssa, user, loc, visited),
            MemoryAccessKind::Def { inst: Some(inst), .. } => match self.module.kind(*inst) {
                ValueKind::Store { ptr, .. } => {
                    if self.must_overwrite(*ptr, loc) {
                        // The slot is definitely overwritten; tracking may
                        // stop along this path.
                        Escape::No
                    } else {
                        self.forward_walk(memssa, user, loc, visited)
                    }
                }
                ValueKind::Call { callee, args } => {
                    let handed = self.call_observers(callee, args, loc);
                    if handed.is_escape() {
                        return handed;
                    }
                    // The call did not must-overwrite the slot, so later
                    // memory operations can still observe the pointer.
                    self.forward_walk(memssa, user, loc, visited)
                }
                _ => Escape::Global,
            },
            _ => Escape::Global,
        }
    }

    /// Verdict for a call that may read the slot: every pointer argument
    /// that may alias `loc` hands the stored pointer to the callee.
    fn call_observers(&mut self, callee: &Callee, args: &[Value], loc: Value) -> Escape {
        let module = self.module;
        let callee = *callee;
        let mut verdict = Escape::No;
        for (index, &arg) in args.iter().enumerate() {
            if !module.ty(arg).is_ptr() {
                continue;
            }
            if !self.may_observe(arg, loc) {
                continue;
            }
            verdict = verdict.meet(&self.summary_verdict(callee, index));
            if verdict == Escape::Global {
                break;
            }
        }
        verdict
    }

    // -- Interprocedural summaries ------------------------------------------

    /// Verdict for passing the tracked `value` directly as a call
    /// argument, meeting every position that passes it.
    fn argument_verdict(&mut self, call: Value, value: Value) -> Escape {
        let ValueKind::Call { callee, args } = self.module.kind(call) else {
            return Escape::Local;
        };
        let callee = *callee;
        let positions: Vec<usize> = args
            .iter()
            .enumerate()
            .filter_map(|(index, &arg)| (arg == value).then_some(index))
            .collect();
        let mut verdict = Escape::No;
        for index in positions {
            verdict = verdict.meet(&self.summary_verdict(callee, index));
            if verdict == Escape::Global {
                break;
            }
        }
        verdict
    }

    /// The callee's verdict for its `index`th argument, analysing the
    /// callee on demand. Re-entrant callees resolve to the conservative
    /// seed; unanalysable callees to the configured policy.
    fn summary_verdict(&mut self, callee: Callee, index: usize) -> Escape {
        let function = match callee {
            Callee::Indirect(_) => return self.config.undefined_callee_verdict,
            Callee::Function(function) => function,
        };
        if self.module.function(function).is_declaration() {
            return self.config.undefined_callee_verdict;
        }
        if self.in_progress.contains(&function) {
            return Escape::Global;
        }
        if !self.summaries.contains_key(&function) {
            self.run_function(function);
        }
        self.summaries[&function]
            .get(index)
            .copied()
            .unwrap_or(Escape::Global)
    }

    // -- Oracle queries -----------------------------------------------------

    fn may_observe(&self, ptr: Value, loc: Value) -> bool {
        self.alias_query(ptr, loc) != AliasResult::NoAlias
    }

    fn must_overwrite(&self, ptr: Value, loc: Value) -> bool {
        self.alias_query(ptr, loc) == AliasResult::MustAlias
    }

    fn alias_query(&self, ptr: Value, loc: Value) -> AliasResult {
        let module = self.module;
        let layout = module.data_layout();
        self.alias.alias(
            module,
            ptr,
            layout.size_of(&self.pointee_type(ptr)),
            loc,
            layout.size_of(&self.pointee_type(loc)),
        )
    }

    /// The element type behind `ptr`, recovering opaque pointees from the
    /// value's cast users. Cast users that agree type the allocation; a
    /// disagreement falls back to the declared type.
    fn pointee_type(&self, ptr: Value) -> Type {
        let module = self.module;
        match module.ty(ptr).pointee() {
            Some(Type::Opaque) | None => {}
            Some(ty) => return ty.clone(),
        }
        let mut recovered: Option<Type> = None;
        for user in module.users(ptr) {
            let ValueKind::Cast { .. } = module.kind(user) else {
                continue;
            };
            let Some(elem) = module.ty(user).pointee() else {
                continue;
            };
            match &recovered {
                None => recovered = Some(elem.clone()),
                Some(previous) if previous == elem => {}
                Some(_) => return Type::Opaque,
            }
        }
        recovered.unwrap_or(Type::Opaque)
    }
}
