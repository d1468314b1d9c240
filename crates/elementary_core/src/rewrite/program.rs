//! Program-level rewrite rule (§4.3 "Program"): push the global scope, walk
//! every top-level statement, then prepend the `rts` alias declaration.

use boa_ast::declaration::{Binding, LexicalDeclaration, LexicalDeclarationKind, Variable};
use boa_ast::statement::Statement;
use boa_ast::{Declaration, StatementList, StatementListItem};

use super::synth::{self, RTS_GLOBAL_NAME, RTS_LOCAL_NAME};
use super::Rewriter;
use crate::analysis::ScopeKind;

pub(crate) fn rewrite_program(rewriter: &mut Rewriter<'_>, statements: StatementList) -> StatementList {
    rewriter.push_function_frame(false);

    let mut items: Vec<StatementListItem> = Vec::with_capacity(statements.statements().len() + 1);
    for item in statements.statements() {
        if let Some(rewritten) = super::stmt::rewrite_top_level_item(rewriter, item.clone()) {
            items.push(rewritten);
        }
    }

    let (_scope, temps) = rewriter.pop_function_frame();
    let mut prelude = Vec::with_capacity(temps.len() + 1);
    prelude.push(rts_alias_declaration(rewriter));
    prelude.extend(temps.into_iter().map(|name| hoisted_var_declaration(name)));

    prelude.extend(items);
    StatementList::from(prelude)
}

/// `let rts = __elementary_rts__;`
fn rts_alias_declaration(rewriter: &mut Rewriter<'_>) -> StatementListItem {
    let local = rewriter.interner.get_or_intern(RTS_LOCAL_NAME);
    let init = synth::ident_expr(rewriter.interner, RTS_GLOBAL_NAME);
    let variable = Variable::from_identifier(local.into(), Some(init));
    let decl = LexicalDeclaration::new(LexicalDeclarationKind::Let, vec![variable].into());
    StatementListItem::Declaration(Declaration::Lexical(decl))
}

/// `var __ejs_tmp_N;` hoisted by a compound-assignment desugaring.
pub(crate) fn hoisted_var_declaration(name: boa_interner::Sym) -> StatementListItem {
    let variable = Variable::from_identifier(Binding::Identifier(name.into()), None);
    StatementListItem::Statement(Statement::Var(boa_ast::declaration::VarDeclaration(
        vec![variable].into(),
    )))
}

pub(crate) fn enter_block_scope(rewriter: &mut Rewriter<'_>) {
    rewriter.push_lexical_scope(ScopeKind::Block);
}

pub(crate) fn exit_block_scope(rewriter: &mut Rewriter<'_>) {
    rewriter.pop_lexical_scope();
}
