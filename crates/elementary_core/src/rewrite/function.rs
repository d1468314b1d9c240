//! Function rule (§4.3 "Function (any kind)"): reject rest parameters,
//! splice an `arityCheck` call at the top of the body, and manage the
//! constructor-local relaxation flag (§9 "Constructor-local relaxation").

use boa_ast::function::{FormalParameterList, FunctionBody};
use boa_ast::{StatementList, StatementListItem};

use super::stmt::rewrite_top_level_item;
use super::synth::{self, line_lit, string_lit};
use super::Rewriter;

/// Validates the parameter list (no rest parameter, no destructuring
/// patterns beyond a bare identifier) and returns its declared length.
pub(crate) fn check_parameters(
    rewriter: &mut Rewriter<'_>,
    params: &FormalParameterList,
    line: u32,
) -> usize {
    if params.has_rest_parameter() {
        rewriter
            .diagnostics
            .error(line, "Rest parameters are not supported.");
    }
    for param in params.as_ref() {
        match param.variable().binding() {
            boa_ast::declaration::Binding::Identifier(ident) => {
                // Parameters start out initialized (§4.2 "Function
                // parameters shadow").
                rewriter.env.add_initialized(ident.sym());
            }
            boa_ast::declaration::Binding::Pattern(_) => {
                rewriter
                    .diagnostics
                    .error(line, "Destructuring patterns are not supported in parameters.");
            }
        }
    }
    params.as_ref().len()
}

/// Rewrites a function body: pushes a function-scoped frame (so the body
/// can't observe the caller's `U`/`I` sets), walks every statement, splices
/// the arity check, and prepends any temporaries hoisted by compound
/// assignments inside this body.
pub(crate) fn rewrite_function_body(
    rewriter: &mut Rewriter<'_>,
    name: &str,
    declared_params: usize,
    body: FunctionBody,
    in_constructor: bool,
    line: u32,
) -> FunctionBody {
    rewriter.push_function_frame(in_constructor);

    let mut items = Vec::with_capacity(body.statements().len() + 1);
    items.push(arity_check_statement(rewriter, name, declared_params, line));
    for item in body.statements() {
        if let Some(rewritten) = rewrite_top_level_item(rewriter, item.clone()) {
            items.push(rewritten);
        }
    }

    let (_scope, temps) = rewriter.pop_function_frame();
    let mut prelude: Vec<StatementListItem> = temps
        .into_iter()
        .map(super::program::hoisted_var_declaration)
        .collect();
    prelude.extend(items);

    FunctionBody::new(StatementList::from(prelude))
}

pub(crate) fn arity_check_statement(
    rewriter: &mut Rewriter<'_>,
    name: &str,
    declared_params: usize,
    line: u32,
) -> StatementListItem {
    let call = synth::rts_call(
        rewriter.interner,
        "arityCheck",
        vec![
            string_lit(rewriter.interner, name),
            synth::number_lit(declared_params as f64),
            arguments_length_expr(rewriter.interner),
            line_lit(line),
        ],
    );
    StatementListItem::Statement(boa_ast::statement::Statement::Expression(call))
}

/// `arguments.length`, read via the legacy `arguments` object every
/// non-arrow function body has access to.
fn arguments_length_expr(interner: &mut boa_interner::Interner) -> boa_ast::expression::Expression {
    use boa_ast::expression::access::{PropertyAccess, PropertyAccessField, SimplePropertyAccess};
    let arguments = synth::ident_expr(interner, "arguments");
    let field = PropertyAccessField::Const(interner.get_or_intern("length"));
    boa_ast::expression::Expression::PropertyAccess(PropertyAccess::Simple(
        SimplePropertyAccess::new(arguments, field),
    ))
}
