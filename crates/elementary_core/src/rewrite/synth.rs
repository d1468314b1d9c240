//! Helpers for synthesizing the `boa_ast` nodes the rewriter splices in:
//! calls into the `rts` object, identifier references, and literals. Kept in
//! one place so the rest of the rewriter reads as "what gets spliced where"
//! rather than "how do I build an AST node".

use boa_ast::expression::access::{PropertyAccess, PropertyAccessField, SimplePropertyAccess};
use boa_ast::expression::literal::Literal;
use boa_ast::expression::{Call, Expression, Identifier};
use boa_interner::{Interner, Sym};
use boa_engine::JsString;

/// The name bound at the top of every rewritten program, per §4.3: "prepend
/// a declaration that binds a local name (conventionally `rts`)".
pub const RTS_LOCAL_NAME: &str = "rts";
/// The frozen global the sandbox binder (C7) installs the check library
/// under; `rts` is just a program-local alias for it.
pub const RTS_GLOBAL_NAME: &str = "__elementary_rts__";

pub fn ident_expr(interner: &mut Interner, name: &str) -> Expression {
    Expression::Identifier(Identifier::new(interner.get_or_intern(name)))
}

pub fn ident_expr_sym(name: Sym) -> Expression {
    Expression::Identifier(Identifier::new(name))
}

pub fn string_lit(interner: &mut Interner, value: &str) -> Expression {
    Expression::Literal(Literal::String(interner.get_or_intern(value)))
}

pub fn number_lit(value: f64) -> Expression {
    Expression::Literal(Literal::Num(value))
}

pub fn line_lit(line: u32) -> Expression {
    number_lit(line as f64)
}

pub fn bool_lit(value: bool) -> Expression {
    Expression::Literal(Literal::Bool(value))
}

/// `rts.<method>(args...)`.
pub fn rts_call(interner: &mut Interner, method: &str, args: Vec<Expression>) -> Expression {
    let rts = ident_expr(interner, RTS_LOCAL_NAME);
    let field = PropertyAccessField::Const(interner.get_or_intern(method));
    let access = PropertyAccess::Simple(SimplePropertyAccess::new(rts, field));
    Expression::Call(Call::new(Expression::PropertyAccess(access), args.into()))
}

/// A plain, unqualified call `name(args...)`, used for the desugared
/// assignment/update temporaries which are locals, not `rts` members.
pub fn plain_call(callee: Expression, args: Vec<Expression>) -> Expression {
    Expression::Call(Call::new(callee, args.into()))
}

pub fn js_string(s: &str) -> JsString {
    JsString::from(s)
}
