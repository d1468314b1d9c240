//! Definite-assignment tracker (C2): the static approximation of "a variable
//! must be written before it is read on every path".

use std::collections::HashSet;

use boa_interner::Sym;

/// Why a scope was pushed, which determines how it is merged back into its
/// parent on exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// A function or the top-level program body. Discarded on exit: none of
    /// its assignments are visible to the caller.
    Function,
    /// A bare `{ ... }` block. Unions its sets into the parent on exit.
    Block,
    /// `while`/`for` bodies: possibly zero iterations, so assignments never
    /// promote into the parent.
    Loop,
    /// `do-while` bodies run at least once, so they merge like a block.
    DoWhileLoop,
    /// One arm of an `if`/`else if`/`else` chain, or one non-empty `case`.
    /// Always merged explicitly via `merge_if`/`merge_switch`, never unioned
    /// directly into the parent.
    Branch,
}

/// Whether a name in scope has been assigned yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Initialized,
    Uninitialized,
}

/// One lexical scope's view of which declared names are assigned.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    kind: Option<ScopeKind>,
    initialized: HashSet<Sym>,
    uninitialized: HashSet<Sym>,
}

impl Scope {
    fn with_kind(kind: ScopeKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn add_initialized(&mut self, name: Sym) {
        self.uninitialized.remove(&name);
        self.initialized.insert(name);
    }

    pub fn add_uninitialized(&mut self, name: Sym) {
        if !self.initialized.contains(&name) {
            self.uninitialized.insert(name);
        }
    }

    /// Moves `name` from `uninitialized` to `initialized`. Returns whether it
    /// was actually found uninitialized in *this* scope (callers walk up the
    /// stack themselves; see [`EnvStack::initialize`]).
    fn initialize_here(&mut self, name: Sym) -> bool {
        if self.uninitialized.remove(&name) {
            self.initialized.insert(name);
            true
        } else {
            false
        }
    }

    fn lookup_here(&self, name: Sym) -> Option<BindingState> {
        if self.initialized.contains(&name) {
            Some(BindingState::Initialized)
        } else if self.uninitialized.contains(&name) {
            Some(BindingState::Uninitialized)
        } else {
            None
        }
    }
}

/// A stack of scopes, plus the auxiliary baselines `if`/`switch` handling
/// needs so sibling branches are compared against the same starting point.
#[derive(Debug, Default)]
pub struct EnvStack {
    scopes: Vec<Scope>,
}

impl EnvStack {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::with_kind(ScopeKind::Function)],
        }
    }

    /// Pushes a scope that inherits copies of the parent's sets, per the
    /// "child inherits copies" invariant in §3.
    pub fn push_scope(&mut self, kind: ScopeKind) {
        let parent = self.scopes.last().cloned().unwrap_or_default();
        let mut child = parent;
        child.kind = Some(kind);
        self.scopes.push(child);
    }

    /// Pops the current scope and, per `kind`, merges it into the parent.
    pub fn pop_scope(&mut self) -> Scope {
        let scope = self.scopes.pop().expect("scope stack must not underflow");
        match scope.kind {
            Some(ScopeKind::Function) | Some(ScopeKind::Loop) | Some(ScopeKind::Branch) => {}
            Some(ScopeKind::Block) | Some(ScopeKind::DoWhileLoop) => {
                if let Some(parent) = self.scopes.last_mut() {
                    for name in &scope.initialized {
                        parent.add_initialized(*name);
                    }
                    for name in &scope.uninitialized {
                        if !parent.initialized.contains(name) {
                            parent.uninitialized.insert(*name);
                        }
                    }
                }
            }
            None => {}
        }
        scope
    }

    pub fn add_initialized(&mut self, name: Sym) {
        self.current_mut().add_initialized(name);
    }

    pub fn add_uninitialized(&mut self, name: Sym) {
        self.current_mut().add_uninitialized(name);
    }

    /// Moves `name` from `U` to `I`, searching outward from the current
    /// scope (a write to a name declared in an enclosing block still counts).
    pub fn initialize(&mut self, name: Sym) -> bool {
        for scope in self.scopes.iter_mut().rev() {
            if scope.initialize_here(name) {
                return true;
            }
            if scope.initialized.contains(&name) {
                return true;
            }
        }
        false
    }

    pub fn lookup(&self, name: Sym) -> Option<BindingState> {
        for scope in self.scopes.iter().rev() {
            if let Some(state) = scope.lookup_here(name) {
                return Some(state);
            }
        }
        None
    }

    fn current_mut(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("non-empty scope stack")
    }

    pub fn snapshot(&self) -> Scope {
        self.scopes.last().cloned().unwrap_or_default()
    }

    /// An `if` with a given arm snapshot promotes `name` in the parent only
    /// if every arm initialized it; `has_else` false means the chain is
    /// non-exhaustive and nothing is ever promoted.
    pub fn merge_if(&mut self, baseline: &Scope, arms: &[Scope], has_else: bool) {
        if !has_else || arms.is_empty() {
            return;
        }
        let candidates: Vec<Sym> = baseline.uninitialized.iter().copied().collect();
        for name in candidates {
            if arms.iter().all(|arm| arm.initialized.contains(&name)) {
                self.initialize(name);
            }
        }
    }

    /// A `switch` promotes `name` only if it has a `default` and every case
    /// (fall-through groups counted once) initializes it.
    pub fn merge_switch(&mut self, baseline: &Scope, cases: &[Scope], has_default: bool) {
        if !has_default || cases.is_empty() {
            return;
        }
        let candidates: Vec<Sym> = baseline.uninitialized.iter().copied().collect();
        for name in candidates {
            if cases.iter().all(|case| case.initialized.contains(&name)) {
                self.initialize(name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boa_interner::Interner;

    fn sym(interner: &mut Interner, name: &str) -> Sym {
        interner.get_or_intern(name)
    }

    #[test]
    fn plain_block_promotes_to_parent() {
        let mut interner = Interner::default();
        let x = sym(&mut interner, "x");
        let mut env = EnvStack::new();
        env.add_uninitialized(x);

        env.push_scope(ScopeKind::Block);
        env.initialize(x);
        env.pop_scope();

        assert_eq!(env.lookup(x), Some(BindingState::Initialized));
    }

    #[test]
    fn loop_body_never_promotes() {
        let mut interner = Interner::default();
        let x = sym(&mut interner, "x");
        let mut env = EnvStack::new();
        env.add_uninitialized(x);

        env.push_scope(ScopeKind::Loop);
        env.initialize(x);
        env.pop_scope();

        assert_eq!(env.lookup(x), Some(BindingState::Uninitialized));
    }

    #[test]
    fn do_while_body_promotes_like_a_block() {
        let mut interner = Interner::default();
        let x = sym(&mut interner, "x");
        let mut env = EnvStack::new();
        env.add_uninitialized(x);

        env.push_scope(ScopeKind::DoWhileLoop);
        env.initialize(x);
        env.pop_scope();

        assert_eq!(env.lookup(x), Some(BindingState::Initialized));
    }

    #[test]
    fn if_without_else_does_not_promote() {
        let mut interner = Interner::default();
        let x = sym(&mut interner, "x");
        let mut env = EnvStack::new();
        env.add_uninitialized(x);
        let baseline = env.snapshot();

        env.push_scope(ScopeKind::Branch);
        env.initialize(x);
        let arm = env.pop_scope();

        env.merge_if(&baseline, &[arm], false);
        assert_eq!(env.lookup(x), Some(BindingState::Uninitialized));
    }

    #[test]
    fn if_else_promotes_only_when_every_arm_does() {
        let mut interner = Interner::default();
        let x = sym(&mut interner, "x");

        // Both arms initialize: promotes.
        let mut env = EnvStack::new();
        env.add_uninitialized(x);
        let baseline = env.snapshot();
        env.push_scope(ScopeKind::Branch);
        env.initialize(x);
        let then_arm = env.pop_scope();
        env.push_scope(ScopeKind::Branch);
        env.initialize(x);
        let else_arm = env.pop_scope();
        env.merge_if(&baseline, &[then_arm, else_arm], true);
        assert_eq!(env.lookup(x), Some(BindingState::Initialized));

        // Only one arm initializes: does not promote.
        let mut env = EnvStack::new();
        env.add_uninitialized(x);
        let baseline = env.snapshot();
        env.push_scope(ScopeKind::Branch);
        env.initialize(x);
        let then_arm = env.pop_scope();
        let else_arm = env.snapshot();
        env.merge_if(&baseline, &[then_arm, else_arm], true);
        assert_eq!(env.lookup(x), Some(BindingState::Uninitialized));
    }

    #[test]
    fn switch_without_default_never_promotes() {
        let mut interner = Interner::default();
        let x = sym(&mut interner, "x");
        let mut env = EnvStack::new();
        env.add_uninitialized(x);
        let baseline = env.snapshot();

        env.push_scope(ScopeKind::Branch);
        env.initialize(x);
        let case_a = env.pop_scope();

        env.merge_switch(&baseline, &[case_a], false);
        assert_eq!(env.lookup(x), Some(BindingState::Uninitialized));
    }

    #[test]
    fn function_scope_discards_on_exit() {
        let mut interner = Interner::default();
        let x = sym(&mut interner, "x");
        let mut env = EnvStack::new();
        env.add_uninitialized(x);

        env.push_scope(ScopeKind::Function);
        env.initialize(x);
        env.pop_scope();

        assert_eq!(env.lookup(x), Some(BindingState::Uninitialized));
    }
}
