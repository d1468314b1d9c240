//! Statement rules from §4.3: `if`, loops, `switch`, forbidden statements,
//! and the top-level dispatch used by both the program body and every
//! function body.

use boa_ast::function::{
    ArrowFunction, FunctionBody, FunctionDeclaration, FunctionExpression,
};
use boa_ast::statement::iteration::{DoWhileLoop, ForLoop, WhileLoop};
use boa_ast::statement::{Block, If, Statement, Switch};
use boa_ast::{Declaration, Spanned, StatementList, StatementListItem};

use super::expr::{is_assignment, reject_assignment_operand, rewrite_expression};
use super::synth::rts_call;
use super::Rewriter;
use crate::analysis::ScopeKind;

/// The 1-based source line a diagnostic or spliced check attributes itself
/// to (§3's `{line, message}` data model): the line the item's span starts
/// on. Sub-expressions within one statement all share that statement's
/// line rather than resolving their own, innermost span — the same
/// statement-granularity attribution a diagnostic would get from any
/// caller walking this tree node by node.
fn line_of(item: &StatementListItem) -> u32 {
    item.span().start().line_number()
}

pub(crate) fn rewrite_top_level_item(
    rewriter: &mut Rewriter<'_>,
    item: StatementListItem,
) -> Option<StatementListItem> {
    let line = line_of(&item);
    match item {
        StatementListItem::Statement(stmt) => {
            rewrite_statement(rewriter, stmt, line).map(StatementListItem::Statement)
        }
        StatementListItem::Declaration(decl) => Some(StatementListItem::Declaration(
            rewrite_declaration(rewriter, decl, line),
        )),
    }
}

fn rewrite_declaration(rewriter: &mut Rewriter<'_>, decl: Declaration, line: u32) -> Declaration {
    match decl {
        Declaration::Lexical(lexical) => super::decl::rewrite_lexical_declaration(rewriter, lexical, line),
        Declaration::FunctionDeclaration(func) => {
            Declaration::FunctionDeclaration(rewrite_function_declaration(rewriter, func, line))
        }
        other => other,
    }
}

fn rewrite_function_declaration(
    rewriter: &mut Rewriter<'_>,
    func: FunctionDeclaration,
    line: u32,
) -> FunctionDeclaration {
    let name = rewriter.interner.resolve_expect(func.name().sym()).to_string();
    let declared = super::function::check_parameters(rewriter, func.parameters(), line);
    let body = super::function::rewrite_function_body(rewriter, &name, declared, func.body().clone(), false, line);
    FunctionDeclaration::new(func.name(), func.parameters().clone(), body)
}

fn rewrite_statement(
    rewriter: &mut Rewriter<'_>,
    stmt: Statement,
    line: u32,
) -> Option<Statement> {
    match stmt {
        Statement::Var(_) => {
            super::decl::reject_var_declaration(rewriter, line);
            None
        }
        // A bare `x = y;` statement is fine; only assignment used as an
        // operand of something else is the forbidden case (checked at each
        // of those call sites via `reject_assignment_operand`).
        Statement::Expression(expr) => {
            Some(Statement::Expression(rewrite_expression(rewriter, expr, line)))
        }
        Statement::If(if_stmt) => Some(Statement::If(rewrite_if(rewriter, if_stmt, line))),
        Statement::While(while_loop) => Some(Statement::While(rewrite_while(rewriter, while_loop, line))),
        Statement::DoWhileLoop(do_while) => {
            Some(Statement::DoWhileLoop(rewrite_do_while(rewriter, do_while, line)))
        }
        Statement::ForLoop(for_loop) => Some(Statement::ForLoop(rewrite_for(rewriter, for_loop, line))),
        Statement::Switch(switch) => Some(Statement::Switch(rewrite_switch(rewriter, switch, line))),
        Statement::Block(block) => Some(Statement::Block(rewrite_block(rewriter, block, line))),
        Statement::Throw(_) => {
            rewriter.diagnostics.error(line, "'throw' is not supported.");
            None
        }
        Statement::With(_) => {
            rewriter.diagnostics.error(line, "'with' is not supported.");
            None
        }
        Statement::Try(_) => {
            rewriter.diagnostics.error(line, "'try'/'catch' is not supported.");
            None
        }
        Statement::Return(ret) => Some(Statement::Return(rewrite_return(rewriter, ret, line))),
        other => Some(other),
    }
}

fn rewrite_return(
    rewriter: &mut Rewriter<'_>,
    ret: boa_ast::statement::Return,
    line: u32,
) -> boa_ast::statement::Return {
    let target = ret
        .target()
        .cloned()
        .map(|expr| rewrite_expression(rewriter, expr, line));
    boa_ast::statement::Return::new(target)
}

fn rewrite_block(rewriter: &mut Rewriter<'_>, block: Block, line: u32) -> Block {
    super::program::enter_block_scope(rewriter);
    let items = rewrite_block_items(rewriter, block.statement_list().statements(), line);
    super::program::exit_block_scope(rewriter);
    Block::from(StatementList::from(items))
}

fn rewrite_block_items(
    rewriter: &mut Rewriter<'_>,
    items: &[StatementListItem],
    _line: u32,
) -> Vec<StatementListItem> {
    items
        .iter()
        .cloned()
        .filter_map(|item| rewrite_top_level_item(rewriter, item))
        .collect()
}

/// §4.3 "If-statement": body must be a braced block; test wrapped in
/// `checkIfBoolean`. §4.2's `merge_if` runs across all arms once every arm
/// has been walked.
fn rewrite_if(rewriter: &mut Rewriter<'_>, if_stmt: If, line: u32) -> If {
    if is_assignment(if_stmt.cond()) {
        reject_assignment_operand(rewriter, line);
    }
    require_braced(rewriter, if_stmt.body(), line);

    let baseline = rewriter.env.snapshot();
    let condition = checked_condition(rewriter, if_stmt.cond().clone(), None, line);

    rewriter.push_lexical_scope(ScopeKind::Branch);
    let then_body = rewrite_statement(rewriter, if_stmt.body().clone(), line)
        .unwrap_or_else(|| empty_block_statement());
    let then_scope = rewriter.pop_lexical_scope();

    let mut arm_scopes = vec![then_scope];
    let has_else = if_stmt.else_node().is_some();

    let else_body = if_stmt.else_node().cloned().map(|else_stmt| {
        rewriter.push_lexical_scope(ScopeKind::Branch);
        let rewritten = rewrite_statement(rewriter, else_stmt, line).unwrap_or_else(empty_block_statement);
        arm_scopes.push(rewriter.pop_lexical_scope());
        rewritten
    });

    rewriter.env.merge_if(&baseline, &arm_scopes, has_else);

    If::new(condition, then_body, else_body)
}

fn empty_block_statement() -> Statement {
    Statement::Block(Block::from(StatementList::from(Vec::new())))
}

/// Wraps `test` in `checkIfBoolean(test, op, line)`. `op` is `None` for a
/// statement-position test (if/while/do-while/for), `Some(symbol)` for a
/// logical-expression operand (handled separately in `expr.rs`).
fn checked_condition(
    rewriter: &mut Rewriter<'_>,
    cond: boa_ast::expression::Expression,
    op: Option<&str>,
    line: u32,
) -> boa_ast::expression::Expression {
    let cond = rewrite_expression(rewriter, cond, line);
    let op_arg = match op {
        Some(symbol) => super::synth::string_lit(rewriter.interner, symbol),
        None => boa_ast::expression::Expression::Literal(boa_ast::expression::literal::Literal::Null),
    };
    rts_call(rewriter.interner, "checkIfBoolean", vec![cond, op_arg, super::synth::line_lit(line)])
}

fn require_braced(rewriter: &mut Rewriter<'_>, body: &Statement, line: u32) {
    if !matches!(body, Statement::Block(_) | Statement::If(_)) {
        rewriter
            .diagnostics
            .error(line, "Expected a braced block for this statement's body.");
    }
}

fn rewrite_while(rewriter: &mut Rewriter<'_>, while_loop: WhileLoop, line: u32) -> WhileLoop {
    require_braced(rewriter, while_loop.body(), line);
    let condition = checked_condition(rewriter, while_loop.condition().clone(), None, line);

    rewriter.push_lexical_scope(ScopeKind::Loop);
    let body = rewrite_statement(rewriter, while_loop.body().clone(), line).unwrap_or_else(empty_block_statement);
    rewriter.pop_lexical_scope();

    WhileLoop::new(condition, body)
}

fn rewrite_do_while(rewriter: &mut Rewriter<'_>, do_while: DoWhileLoop, line: u32) -> DoWhileLoop {
    require_braced(rewriter, do_while.body(), line);

    rewriter.push_lexical_scope(ScopeKind::DoWhileLoop);
    let body = rewrite_statement(rewriter, do_while.body().clone(), line).unwrap_or_else(empty_block_statement);
    rewriter.pop_lexical_scope();

    let condition = checked_condition(rewriter, do_while.cond().clone(), None, line);
    DoWhileLoop::new(body, condition)
}

/// §4.3 "Loop statements": `for` must have all three header parts present;
/// init must be a declaration or assignment; test must not itself be an
/// assignment.
fn rewrite_for(rewriter: &mut Rewriter<'_>, for_loop: ForLoop, line: u32) -> ForLoop {
    require_braced(rewriter, for_loop.body(), line);

    if for_loop.init().is_none() || for_loop.condition().is_none() || for_loop.final_expr().is_none() {
        rewriter
            .diagnostics
            .error(line, "A 'for' loop must have an initializer, a test, and an update.");
    }
    if let Some(cond) = for_loop.condition() {
        if is_assignment(cond) {
            reject_assignment_operand(rewriter, line);
        }
    }

    rewriter.push_lexical_scope(ScopeKind::Loop);

    let init = for_loop.init().cloned().map(|init| match init {
        boa_ast::statement::iteration::ForLoopInitializer::Expression(expr) => {
            boa_ast::statement::iteration::ForLoopInitializer::Expression(rewrite_expression(
                rewriter, expr, line,
            ))
        }
        boa_ast::statement::iteration::ForLoopInitializer::Lexical(lexical) => {
            let Declaration::Lexical(rewritten) =
                super::decl::rewrite_lexical_declaration(rewriter, lexical, line)
            else {
                unreachable!("rewrite_lexical_declaration always returns Lexical")
            };
            boa_ast::statement::iteration::ForLoopInitializer::Lexical(rewritten)
        }
        boa_ast::statement::iteration::ForLoopInitializer::Var(var) => {
            super::decl::reject_var_declaration(rewriter, line);
            boa_ast::statement::iteration::ForLoopInitializer::Var(var)
        }
    });

    let condition = for_loop
        .condition()
        .cloned()
        .map(|cond| checked_condition(rewriter, cond, None, line));
    let step = for_loop
        .final_expr()
        .cloned()
        .map(|expr| rewrite_expression(rewriter, expr, line));
    let body = rewrite_statement(rewriter, for_loop.body().clone(), line).unwrap_or_else(empty_block_statement);

    rewriter.pop_lexical_scope();

    ForLoop::new(init, condition, step, body)
}

/// §4.3 "Switch statement": each non-empty case body must be braced;
/// interacts with C2's `merge_switch`.
fn rewrite_switch(rewriter: &mut Rewriter<'_>, switch: Switch, line: u32) -> Switch {
    let discriminant = rewrite_expression(rewriter, switch.val().clone(), line);
    let baseline = rewriter.env.snapshot();
    let has_default = switch.cases().iter().any(|case| case.condition().is_none());

    let mut case_scopes = Vec::new();
    let mut rewritten_cases = Vec::with_capacity(switch.cases().len());

    for case in switch.cases() {
        if case.body().statements().is_empty() {
            rewritten_cases.push(case.clone());
            continue;
        }
        let condition = case
            .condition()
            .cloned()
            .map(|cond| rewrite_expression(rewriter, cond, line));

        rewriter.push_lexical_scope(ScopeKind::Branch);
        let body = rewrite_block_items(rewriter, case.body().statements(), line);
        case_scopes.push(rewriter.pop_lexical_scope());

        rewritten_cases.push(boa_ast::statement::Case::new(condition, StatementList::from(body)));
    }

    rewriter.env.merge_switch(&baseline, &case_scopes, has_default);

    Switch::new(discriminant, rewritten_cases.into())
}

pub(crate) fn rewrite_function_expression(
    rewriter: &mut Rewriter<'_>,
    func: FunctionExpression,
    line: u32,
) -> FunctionExpression {
    let name = func
        .name()
        .map(|n| rewriter.interner.resolve_expect(n.sym()).to_string())
        .unwrap_or_else(|| "<anonymous>".to_string());
    let declared = super::function::check_parameters(rewriter, func.parameters(), line);
    let body: FunctionBody =
        super::function::rewrite_function_body(rewriter, &name, declared, func.body().clone(), false, line);
    FunctionExpression::new(func.name(), func.parameters().clone(), body, func.strict())
}

/// Arrow functions inherit the enclosing `this` (and so the enclosing
/// "in constructor" flag, per §9) rather than resetting it; only a plain
/// block body can contain statements that need the full rewrite, a bare
/// expression body is rewritten as an expression directly.
pub(crate) fn rewrite_arrow_function(
    rewriter: &mut Rewriter<'_>,
    arrow: ArrowFunction,
    line: u32,
) -> ArrowFunction {
    let declared = super::function::check_parameters(rewriter, arrow.parameters(), line);
    let inherited_in_constructor = rewriter.current_in_constructor_public();

    rewriter.push_function_frame(inherited_in_constructor);
    let mut items = Vec::with_capacity(arrow.body().statements().len() + 1);
    items.push(super::function::arity_check_statement(rewriter, "<arrow>", declared, line));
    for item in arrow.body().statements() {
        if let Some(rewritten) = rewrite_top_level_item(rewriter, item.clone()) {
            items.push(rewritten);
        }
    }
    let (_scope, temps) = rewriter.pop_function_frame();
    let mut prelude: Vec<StatementListItem> =
        temps.into_iter().map(super::program::hoisted_var_declaration).collect();
    prelude.extend(items);

    ArrowFunction::new(
        arrow.name(),
        arrow.parameters().clone(),
        FunctionBody::new(StatementList::from(prelude)),
    )
}

/// Class expression/declaration: walks the constructor (flagging it so
/// `this.m = v` bypasses the member-existence check per §9) and every
/// method body; field initializers are rewritten as ordinary expressions.
pub(crate) fn rewrite_class(
    rewriter: &mut Rewriter<'_>,
    class: boa_ast::function::Class,
    line: u32,
) -> boa_ast::function::Class {
    use boa_ast::function::ClassElement;

    let constructor = class.constructor().cloned().map(|ctor| {
        let declared = super::function::check_parameters(rewriter, ctor.parameters(), line);
        let body = super::function::rewrite_function_body(
            rewriter,
            "constructor",
            declared,
            ctor.body().clone(),
            true,
            line,
        );
        FunctionExpression::new(ctor.name(), ctor.parameters().clone(), body, ctor.strict())
    });

    let elements = class
        .elements()
        .iter()
        .cloned()
        .map(|element| match element {
            ClassElement::MethodDefinition(method) => {
                let name = method
                    .name()
                    .as_literal()
                    .map(|sym| rewriter.interner.resolve_expect(sym).to_string())
                    .unwrap_or_else(|| "<method>".to_string());
                let declared = super::function::check_parameters(rewriter, method.parameters(), line);
                let body = super::function::rewrite_function_body(
                    rewriter,
                    &name,
                    declared,
                    method.body().clone(),
                    false,
                    line,
                );
                ClassElement::MethodDefinition(method.with_body(body))
            }
            other => other,
        })
        .collect::<Vec<_>>();

    boa_ast::function::Class::new(
        class.name(),
        class.super_ref().cloned(),
        constructor,
        elements.into(),
    )
}
