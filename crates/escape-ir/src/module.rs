//! The module: owner of every arena plus the symbol table.

use crate::arena::{Arena, Id};
use crate::block::{Block, BlockInfo};
use crate::function::{Function, FunctionInfo};
use crate::intern::SymbolTable;
use crate::types::{DataLayout, Type};
use crate::value::{Value, ValueInfo, ValueKind};

/// A translation unit: functions, globals, and the values they contain.
///
/// All handles (`Value`, `Block`, `Function`) index arenas owned here, so a
/// `Module` plus a handle is always enough context to answer a query.
#[derive(Debug, Default)]
pub struct Module {
    pub(crate) values: Arena<Value, ValueInfo>,
    pub(crate) blocks: Arena<Block, BlockInfo>,
    pub(crate) functions: Arena<Function, FunctionInfo>,
    pub(crate) globals: Vec<Value>,
    pub(crate) symbols: SymbolTable,
    pub(crate) layout: DataLayout,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(layout: DataLayout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    pub fn data_layout(&self) -> &DataLayout {
        &self.layout
    }

    // -- Globals and functions ----------------------------------------------

    /// Add a module global holding a `ty`. The global's value is the
    /// address, so its type is a pointer to `ty`.
    pub fn global(&mut self, name: &str, ty: Type) -> Value {
        let name = self.symbols.intern(name);
        let global = self.values.alloc_with_id(|id| ValueInfo {
            id,
            name: Some(name),
            ty: Type::ptr(ty),
            kind: ValueKind::Global,
            block: None,
            function: None,
            users: Default::default(),
        });
        self.globals.push(global);
        global
    }

    pub fn globals(&self) -> &[Value] {
        &self.globals
    }

    /// Add a declaration-only function.
    pub fn declare_function(&mut self, name: &str, params: &[Type], ret: Type) -> Function {
        self.new_function(name, params, ret, true)
    }

    pub(crate) fn new_function(
        &mut self,
        name: &str,
        params: &[Type],
        ret: Type,
        declaration: bool,
    ) -> Function {
        let name = self.symbols.intern(name);
        let function = self.functions.alloc_with_id(|id| FunctionInfo {
            id,
            name,
            params: Vec::new(),
            ret,
            blocks: Vec::new(),
            declaration,
            memssa: None,
        });
        let args: Vec<Value> = params
            .iter()
            .enumerate()
            .map(|(index, ty)| {
                self.values.alloc_with_id(|id| ValueInfo {
                    id,
                    name: None,
                    ty: ty.clone(),
                    kind: ValueKind::Argument { index },
                    block: None,
                    function: Some(function),
                    users: Default::default(),
                })
            })
            .collect();
        self.functions[function].params = args;
        function
    }

    /// Functions in definition order.
    pub fn functions(&self) -> impl Iterator<Item = Function> + '_ {
        self.functions.iter().map(|(id, _)| id)
    }

    pub fn function(&self, function: Function) -> &FunctionInfo {
        &self.functions[function]
    }

    pub fn function_by_name(&self, name: &str) -> Option<Function> {
        self.functions
            .iter()
            .find(|(_, info)| self.symbols.resolve(info.name) == name)
            .map(|(id, _)| id)
    }

    pub fn function_name(&self, function: Function) -> &str {
        self.symbols.resolve(self.functions[function].name)
    }

    // -- Value queries ------------------------------------------------------

    pub fn value(&self, value: Value) -> &ValueInfo {
        &self.values[value]
    }

    pub fn kind(&self, value: Value) -> &ValueKind {
        &self.values[value].kind
    }

    pub fn ty(&self, value: Value) -> &Type {
        &self.values[value].ty
    }

    /// Direct users of `value` in insertion order.
    pub fn users(&self, value: Value) -> impl Iterator<Item = Value> + '_ {
        self.values[value].users()
    }

    pub fn value_name(&self, value: Value) -> Option<&str> {
        self.values[value]
            .name
            .map(|symbol| self.symbols.resolve(symbol))
    }

    /// Stable textual identity for `value`: `<name>_<hex arena index>`.
    ///
    /// Deterministic within one run and distinct per value; carries no
    /// semantic meaning beyond hash-key use.
    pub fn value_identity(&self, value: Value) -> String {
        let raw = Id::from(value).raw();
        match self.value_name(value) {
            Some(name) => format!("{name}_{raw:x}"),
            None => format!("_{raw:x}"),
        }
    }

    /// Render `value` for reports: `%name`, or `%<index>` if unnamed.
    pub fn display_value(&self, value: Value) -> String {
        match self.value_name(value) {
            Some(name) => format!("%{name}"),
            None => value.to_string(),
        }
    }

    pub fn block(&self, block: Block) -> &BlockInfo {
        &self.blocks[block]
    }

    pub(crate) fn add_user(&mut self, of: Value, user: Value) {
        self.values[of].users.insert(user);
    }
}
