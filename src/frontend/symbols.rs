//! Symbol table and scope management for Vesna
//!
//! Scopes form an arena: a `Vec<Scope>` addressed by index, each scope
//! holding a non-owning handle to its parent. Symbols live in a parallel
//! arena and are referenced by id from the scopes and from analysis
//! annotations. The whole table is owned by one compilation and dropped
//! with it.

use std::collections::HashMap;

use crate::frontend::ast::Span;

pub type SymbolId = usize;
pub type ScopeId = usize;

/// The closed set of static types.
///
/// Class types are nominal: two class types are equal iff their names
/// match. There is no subtyping and no coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Integer64,
    String,
    Boolean,
    Null,
    Module,
    Class(std::string::String),
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Integer64 => write!(f, "Integer64"),
            Type::String => write!(f, "String"),
            Type::Boolean => write!(f, "Boolean"),
            Type::Null => write!(f, "Null"),
            Type::Module => write!(f, "Module"),
            Type::Class(name) => write!(f, "{}", name),
        }
    }
}

impl Type {
    /// Primitive type spelled by `name`, if any.
    pub fn primitive(name: &str) -> Option<Type> {
        match name {
            "Integer64" => Some(Type::Integer64),
            "String" => Some(Type::String),
            "Boolean" => Some(Type::Boolean),
            "Null" => Some(Type::Null),
            _ => None,
        }
    }
}

/// Symbol table managing all named entities of one compilation.
#[derive(Debug)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    scopes: Vec<Scope>,
    current_scope: ScopeId,
}

pub const ROOT_SCOPE: ScopeId = 0;

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = Self {
            symbols: Vec::new(),
            scopes: vec![Scope::new(None, ScopeKind::Module)],
            current_scope: ROOT_SCOPE,
        };
        table.add_builtins();
        table
    }

    /// Pre-bind the immutable builtin names in the root scope.
    fn add_builtins(&mut self) {
        for builtin in [
            Builtin::And,
            Builtin::Or,
            Builtin::Not,
            Builtin::True,
            Builtin::False,
        ] {
            let declared = self.declare(Symbol {
                name: builtin.name().to_string(),
                kind: SymbolKind::Builtin(builtin),
                span: Span::default(),
            });
            debug_assert!(declared.is_some());
        }
    }

    // ========================================================================
    // Scope navigation
    // ========================================================================

    /// Create a child of the current scope and make it current.
    pub fn enter_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let scope = Scope::new(Some(self.current_scope), kind);
        self.scopes.push(scope);
        self.current_scope = self.scopes.len() - 1;
        self.current_scope
    }

    /// Make a previously created scope current (used when the resolution
    /// pass re-enters a function scope built by the declaration pass).
    pub fn enter_scope_at(&mut self, scope: ScopeId) {
        self.current_scope = scope;
    }

    /// Move back to the parent of the current scope.
    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current_scope].parent {
            self.current_scope = parent;
        }
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current_scope
    }

    pub fn scope_kind(&self, scope: ScopeId) -> ScopeKind {
        self.scopes[scope].kind
    }

    pub fn current_scope_kind(&self) -> ScopeKind {
        self.scopes[self.current_scope].kind
    }

    /// A member scope with no symbols at all selects the "has no
    /// subsymbol" diagnostic shape.
    pub fn scope_is_empty(&self, scope: ScopeId) -> bool {
        self.scopes[scope].symbols.is_empty()
    }

    /// Record the declared return type on a function scope.
    pub fn set_return_type(&mut self, scope: ScopeId, ty: Type) {
        self.scopes[scope].return_type = Some(ty);
    }

    /// Record the owning class name on a class scope, for `this`.
    pub fn set_class_name(&mut self, scope: ScopeId, name: &str) {
        self.scopes[scope].class_name = Some(name.to_string());
    }

    /// Whether the current scope chain passes through a function body.
    pub fn in_function(&self) -> bool {
        let mut scope = self.current_scope;
        loop {
            if self.scopes[scope].kind == ScopeKind::Function {
                return true;
            }
            match self.scopes[scope].parent {
                Some(parent) => scope = parent,
                None => return false,
            }
        }
    }

    /// Declared return type of the innermost enclosing function.
    pub fn current_return_type(&self) -> Option<&Type> {
        let mut scope = self.current_scope;
        loop {
            if self.scopes[scope].kind == ScopeKind::Function {
                return self.scopes[scope].return_type.as_ref();
            }
            scope = self.scopes[scope].parent?;
        }
    }

    /// Name of the innermost enclosing class, if the current scope chain
    /// passes through one.
    pub fn enclosing_class(&self) -> Option<&str> {
        let mut scope = self.current_scope;
        loop {
            if let Some(name) = self.scopes[scope].class_name.as_deref() {
                return Some(name);
            }
            scope = self.scopes[scope].parent?;
        }
    }

    // ========================================================================
    // Declaration and lookup
    // ========================================================================

    /// Declare a symbol in the current scope.
    ///
    /// Returns `None` when the name is already bound in that scope
    /// (builtins count as already present); the caller reports the
    /// redefinition. Names in enclosing scopes never conflict.
    pub fn declare(&mut self, symbol: Symbol) -> Option<SymbolId> {
        self.declare_in(self.current_scope, symbol)
    }

    /// Declare a symbol in an explicit scope (class member scopes during
    /// the declaration pass).
    pub fn declare_in(&mut self, scope: ScopeId, symbol: Symbol) -> Option<SymbolId> {
        if self.scopes[scope].symbols.contains_key(&symbol.name) {
            return None;
        }
        let id = self.symbols.len();
        self.scopes[scope].symbols.insert(symbol.name.clone(), id);
        self.symbols.push(symbol);
        Some(id)
    }

    /// Look up a name through the current scope chain, innermost first.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        let mut scope = self.current_scope;
        loop {
            if let Some(&id) = self.scopes[scope].symbols.get(name) {
                return Some(id);
            }
            scope = self.scopes[scope].parent?;
        }
    }

    /// Look up a name strictly within one scope, without walking the
    /// parent chain. Used for `a.b` member resolution.
    pub fn lookup_member(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scopes[scope].symbols.get(name).copied()
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id]
    }

    // ========================================================================
    // Imported modules
    // ========================================================================

    /// Bind an importable module in the current scope. Only `io` exists;
    /// its member scope holds the overloaded `print`.
    ///
    /// Returns `Ok(None)` for an unknown module name and `Err(())` when
    /// the module name is already bound.
    pub fn import_module(&mut self, name: &str, span: Span) -> Result<Option<SymbolId>, ()> {
        if name != "io" {
            return Ok(None);
        }
        let module_scope = self.enter_scope(ScopeKind::Module);
        self.declare(Symbol {
            name: "print".to_string(),
            kind: SymbolKind::Overloaded(OverloadSet {
                signatures: vec![
                    Signature::new(vec![Type::Integer64], Type::Null),
                    Signature::new(vec![Type::String], Type::Null),
                    Signature::new(vec![Type::Boolean], Type::Null),
                ],
            }),
            span: Span::default(),
        });
        self.exit_scope();
        let id = self
            .declare(Symbol {
                name: name.to_string(),
                kind: SymbolKind::Module(ModuleInfo { scope: module_scope }),
                span,
            })
            .ok_or(())?;
        Ok(Some(id))
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// A scope containing symbol bindings.
#[derive(Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    pub symbols: HashMap<String, SymbolId>,
    /// Declared return type, set on function scopes.
    pub return_type: Option<Type>,
    /// Owning class name, set on class scopes.
    pub class_name: Option<String>,
}

impl Scope {
    pub fn new(parent: Option<ScopeId>, kind: ScopeKind) -> Self {
        Self {
            parent,
            kind,
            symbols: HashMap::new(),
            return_type: None,
            class_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Class,
    Function,
    Block,
}

/// A symbol in the symbol table.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum SymbolKind {
    Variable(VariableInfo),
    Function(FunctionInfo),
    Class(ClassInfo),
    Module(ModuleInfo),
    Builtin(Builtin),
    /// Overloaded module function (e.g. `io.print`): a closed dispatch
    /// table keyed by argument types.
    Overloaded(OverloadSet),
}

#[derive(Debug, Clone)]
pub struct VariableInfo {
    /// `None` while a hoisted declaration's type is still pending (its
    /// initializer has not been reached by the resolution pass yet).
    pub ty: Option<Type>,
}

#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub params: Vec<(String, Type)>,
    pub return_type: Type,
    /// Parameter + local scope, created by the declaration pass.
    pub scope: ScopeId,
}

#[derive(Debug, Clone)]
pub struct ClassInfo {
    /// Member scope holding fields and methods.
    pub scope: ScopeId,
}

#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub scope: ScopeId,
}

/// Pre-bound, non-overridable root-scope names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    And,
    Or,
    Not,
    True,
    False,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::And => "and",
            Builtin::Or => "or",
            Builtin::Not => "not",
            Builtin::True => "true",
            Builtin::False => "false",
        }
    }

    /// Call signature for the pseudo-function builtins; `true`/`false`
    /// are values, not callables.
    pub fn signature(self) -> Option<Signature> {
        match self {
            Builtin::And | Builtin::Or => Some(Signature::new(
                vec![Type::Boolean, Type::Boolean],
                Type::Boolean,
            )),
            Builtin::Not => Some(Signature::new(vec![Type::Boolean], Type::Boolean)),
            Builtin::True | Builtin::False => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<Type>,
    pub ret: Type,
}

impl Signature {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Self { params, ret }
    }
}

#[derive(Debug, Clone)]
pub struct OverloadSet {
    pub signatures: Vec<Signature>,
}

impl OverloadSet {
    /// Dispatch on exact argument types; `None` when no signature matches.
    pub fn resolve(&self, args: &[Type]) -> Option<&Signature> {
        self.signatures.iter().find(|sig| sig.params == args)
    }

    /// Whether any signature accepts this many arguments.
    pub fn accepts_arity(&self, arity: usize) -> bool {
        self.signatures.iter().any(|sig| sig.params.len() == arity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable(name: &str, ty: Type) -> Symbol {
        Symbol {
            name: name.to_string(),
            kind: SymbolKind::Variable(VariableInfo { ty: Some(ty) }),
            span: Span::default(),
        }
    }

    #[test]
    fn lookup_walks_the_parent_chain() {
        let mut table = SymbolTable::new();
        table.declare(variable("x", Type::Integer64)).unwrap();

        table.enter_scope(ScopeKind::Function);
        assert!(table.lookup("x").is_some());

        table.declare(variable("y", Type::String)).unwrap();
        assert!(table.lookup("y").is_some());

        table.exit_scope();
        assert!(table.lookup("x").is_some());
        assert!(table.lookup("y").is_none());
    }

    #[test]
    fn redeclaration_fails_in_same_scope_only() {
        let mut table = SymbolTable::new();
        assert!(table.declare(variable("a", Type::Integer64)).is_some());
        assert!(table.declare(variable("a", Type::Integer64)).is_none());

        // The same name in a child scope is a fresh binding.
        table.enter_scope(ScopeKind::Block);
        assert!(table.declare(variable("a", Type::Integer64)).is_some());
    }

    #[test]
    fn builtins_count_as_already_present() {
        let mut table = SymbolTable::new();
        assert!(table.declare(variable("and", Type::Integer64)).is_none());
        assert!(table.declare(variable("true", Type::Boolean)).is_none());
    }

    #[test]
    fn member_lookup_does_not_walk_parents() {
        let mut table = SymbolTable::new();
        table.declare(variable("outer", Type::Integer64)).unwrap();
        let scope = table.enter_scope(ScopeKind::Class);
        table.exit_scope();
        assert!(table.lookup_member(scope, "outer").is_none());
        assert!(table.scope_is_empty(scope));
    }

    #[test]
    fn io_module_provides_print_overloads() {
        let mut table = SymbolTable::new();
        let id = table
            .import_module("io", Span::default())
            .unwrap()
            .expect("io should be importable");
        let SymbolKind::Module(info) = &table.get(id).kind else {
            panic!("io should be a module symbol");
        };
        let print = table.lookup_member(info.scope, "print").unwrap();
        let SymbolKind::Overloaded(set) = &table.get(print).kind else {
            panic!("print should be overloaded");
        };
        assert!(set.resolve(&[Type::Integer64]).is_some());
        assert!(set.resolve(&[Type::Boolean]).is_some());
        assert!(set.resolve(&[Type::Class("C".to_string())]).is_none());
        assert!(!set.accepts_arity(0));
    }

    #[test]
    fn unknown_module_is_not_importable() {
        let mut table = SymbolTable::new();
        assert_eq!(table.import_module("net", Span::default()), Ok(None));
    }

    #[test]
    fn class_types_are_nominal() {
        assert_eq!(Type::Class("A".to_string()), Type::Class("A".to_string()));
        assert_ne!(Type::Class("A".to_string()), Type::Class("B".to_string()));
    }
}
