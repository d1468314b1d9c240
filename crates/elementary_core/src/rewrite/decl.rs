//! Variable-declaration rule (§4.3 "Variable declaration"): `let`/`const`
//! only, no destructuring, definite-assignment bookkeeping, and `const`
//! reassignment rejection.

use boa_ast::declaration::{Binding, LexicalDeclaration, LexicalDeclarationKind, Variable};
use boa_ast::Declaration;

use super::expr::rewrite_expression;
use super::Rewriter;

pub(crate) fn rewrite_lexical_declaration(
    rewriter: &mut Rewriter<'_>,
    decl: LexicalDeclaration,
    line: u32,
) -> Declaration {
    let is_const = matches!(decl.kind(), LexicalDeclarationKind::Const);
    let mut rewritten_vars = Vec::with_capacity(decl.variable_list().as_ref().len());

    for variable in decl.variable_list().as_ref() {
        let Binding::Identifier(ident) = variable.binding() else {
            rewriter.diagnostics.error(
                line,
                "Destructuring patterns are not supported in variable declarations.",
            );
            rewritten_vars.push(variable.clone());
            continue;
        };

        let name = ident.sym();
        let init = variable
            .init()
            .cloned()
            .map(|expr| rewrite_expression(rewriter, expr, line));

        if init.is_some() {
            rewriter.env.add_initialized(name);
        } else {
            rewriter.env.add_uninitialized(name);
        }
        if is_const {
            rewriter.declare_const(name);
        }

        rewritten_vars.push(Variable::from_identifier(
            Binding::Identifier(ident.clone()),
            init,
        ));
    }

    Declaration::Lexical(LexicalDeclaration::new(decl.kind(), rewritten_vars.into()))
}

/// `var` declarations are rejected outright: §4.3 requires `let`/`const`.
pub(crate) fn reject_var_declaration(rewriter: &mut Rewriter<'_>, line: u32) {
    rewriter
        .diagnostics
        .error(line, "Use 'let' or 'const' to declare a variable.");
}
