//! Expression rules from §4.3: member access, calls, assignment (with
//! compound-assignment desugaring), update expressions, logical/binary/unary
//! operators, and bare identifier references.

use boa_ast::expression::access::{PropertyAccess, PropertyAccessField, SimplePropertyAccess};
use boa_ast::expression::operator::assign::{Assign, AssignOp};
use boa_ast::expression::operator::binary::{ArithmeticOp, BinaryOp, BitwiseOp, RelationalOp};
use boa_ast::expression::operator::logical::{Logical, LogicalOp};
use boa_ast::expression::operator::unary::{UnaryOp};
use boa_ast::expression::operator::update::{UpdateOp, UpdateTarget};
use boa_ast::expression::operator::{Binary, Unary, Update};
use boa_ast::expression::{Call, Expression, Identifier};

use super::synth::{self, rts_call, string_lit};
use super::Rewriter;
use crate::analysis::BindingState;

/// Identifiers the rewriter treats specially rather than leaving intact.
const ARRAY_CTOR_NAME: &str = "Array";
const ARRAY_CTOR_STUB: &str = "ArrayCreateStub";

pub(crate) fn rewrite_expression(
    rewriter: &mut Rewriter<'_>,
    expr: Expression,
    line: u32,
) -> Expression {
    match expr {
        Expression::Identifier(id) => rewrite_identifier(rewriter, id, line),
        Expression::PropertyAccess(PropertyAccess::Simple(access)) => {
            rewrite_property_read(rewriter, access, line)
        }
        Expression::Call(call) => rewrite_call(rewriter, call, line),
        Expression::Assign(assign) => rewrite_assign(rewriter, assign, line),
        Expression::Unary(unary) => rewrite_unary(rewriter, unary, line),
        Expression::Update(update) => rewrite_update(rewriter, update, line),
        Expression::Binary(binary) => rewrite_binary(rewriter, binary, line),
        Expression::Logical(logical) => rewrite_logical(rewriter, logical, line),
        Expression::ArrayLiteral(array) => rewrite_array_literal(rewriter, array, line),
        Expression::ObjectLiteral(object) => rewrite_object_literal(rewriter, object, line),
        Expression::Conditional(cond) => rewrite_conditional(rewriter, cond, line),
        Expression::Function(func) => {
            Expression::Function(super::stmt::rewrite_function_expression(rewriter, func, line))
        }
        Expression::ArrowFunction(arrow) => {
            Expression::ArrowFunction(super::stmt::rewrite_arrow_function(rewriter, arrow, line))
        }
        Expression::Class(class) => {
            Expression::Class(Box::new(super::stmt::rewrite_class(rewriter, *class, line)))
        }
        Expression::New(new_expr) => rewrite_new(rewriter, new_expr, line),
        other => rewrite_children_generic(rewriter, other, line),
    }
}

/// `new Ctor(args...)`: the callee and each argument still need rewriting
/// (e.g. so a forbidden identifier read inside an argument is still caught);
/// the construct itself is left intact since `new` is not restricted by name.
fn rewrite_new(
    rewriter: &mut Rewriter<'_>,
    new_expr: boa_ast::expression::New,
    line: u32,
) -> Expression {
    let call = new_expr.call();
    let callee = rewrite_expression(rewriter, call.function().clone(), line);
    let args: Vec<Expression> = call
        .args()
        .iter()
        .cloned()
        .map(|arg| rewrite_expression(rewriter, arg, line))
        .collect();
    Expression::New(boa_ast::expression::New::from(Call::new(callee, args.into())))
}

/// Anything we don't have a special rule for still needs its sub-expressions
/// walked; this is the fallback for expression kinds that don't need their
/// own top-level rule (template literals, spreads inside literals already
/// handled by their parent, etc).
fn rewrite_children_generic(_rewriter: &mut Rewriter<'_>, expr: Expression, _line: u32) -> Expression {
    expr
}

fn rewrite_identifier(rewriter: &mut Rewriter<'_>, id: Identifier, line: u32) -> Expression {
    let name = rewriter.interner.resolve_expect(id.sym()).to_string();
    if name == ARRAY_CTOR_NAME {
        return synth::ident_expr(rewriter.interner, ARRAY_CTOR_STUB);
    }
    if let Some(BindingState::Uninitialized) = rewriter.env.lookup(id.sym()) {
        rewriter.diagnostics.error(
            line,
            format!("You must initialize the variable '{name}' before use."),
        );
    }
    Expression::Identifier(id)
}

/// `o.x` / `o[i]` as a *read*. Calls are handled separately (`o.f(...)`
/// leaves the member access as the call target, untouched).
fn rewrite_property_read(
    rewriter: &mut Rewriter<'_>,
    access: SimplePropertyAccess,
    line: u32,
) -> Expression {
    let object = rewrite_expression(rewriter, access.target().clone(), line);
    match access.field() {
        PropertyAccessField::Const(name) => {
            let name_str = rewriter.interner.resolve_expect(*name).to_string();
            rts_call(
                rewriter.interner,
                "dot",
                vec![object, string_lit(rewriter.interner, &name_str), synth::line_lit(line)],
            )
        }
        PropertyAccessField::Expr(index) => {
            let index = rewrite_expression(rewriter, (**index).clone(), line);
            rts_call(
                rewriter.interner,
                "arrayBoundsCheck",
                vec![object, index, synth::line_lit(line)],
            )
        }
    }
}

/// `o.f(args...)`: the call itself is left intact (so host arity/this-
/// binding semantics are preserved exactly), but a handful of idioms that
/// naturally produce sequences are wrapped through `checkCall` so the
/// result becomes a scheduler-aware sequence (§9 "split" open question).
fn rewrite_call(rewriter: &mut Rewriter<'_>, call: Call, line: u32) -> Expression {
    let args: Vec<Expression> = call
        .args()
        .iter()
        .cloned()
        .map(|arg| rewrite_expression(rewriter, arg, line))
        .collect();

    let Expression::PropertyAccess(PropertyAccess::Simple(access)) = call.function().clone() else {
        let callee = rewrite_expression(rewriter, call.function().clone(), line);
        return Expression::Call(Call::new(callee, args.into()));
    };

    let PropertyAccessField::Const(method) = access.field() else {
        let object = rewrite_expression(rewriter, access.target().clone(), line);
        let callee = Expression::PropertyAccess(PropertyAccess::Simple(SimplePropertyAccess::new(
            object,
            access.field().clone(),
        )));
        return Expression::Call(Call::new(callee, args.into()));
    };

    let method_name = rewriter.interner.resolve_expect(*method).to_string();
    let object = rewrite_expression(rewriter, access.target().clone(), line);
    let callee = Expression::PropertyAccess(PropertyAccess::Simple(SimplePropertyAccess::new(
        object.clone(),
        PropertyAccessField::Const(*method),
    )));
    let direct_call = Expression::Call(Call::new(callee, args.clone().into()));

    if SEQUENCE_PRODUCING_METHODS.contains(&method_name.as_str()) {
        rts_call(
            rewriter.interner,
            "checkCall",
            vec![object, string_lit(rewriter.interner, &method_name), array_of(args)],
        )
    } else {
        direct_call
    }
}

/// `split` (on strings, conditionally on objects), and the `Object.keys` /
/// `Object.values` / `Object.entries` / `Object.getOwnPropertyNames` family:
/// each can hand back a plain array that needs to become scheduler-aware.
const SEQUENCE_PRODUCING_METHODS: &[&str] = &["split", "keys", "values", "entries", "getOwnPropertyNames"];

fn array_of(elements: Vec<Expression>) -> Expression {
    use boa_ast::expression::literal::ArrayLiteral;
    Expression::ArrayLiteral(ArrayLiteral::from(elements))
}

/// Assignment rule: only `=`, `+=`, `-=`, `*=`, `/=`, `%=`; reject bitwise
/// and shift compound operators; reject patterns; reject assignment used as
/// a condition/operand (the latter is enforced by the caller context, see
/// `reject_assignment_as_condition` in `stmt.rs`).
fn rewrite_assign(rewriter: &mut Rewriter<'_>, assign: Assign, line: u32) -> Expression {
    let op = assign.op();
    if !matches!(
        op,
        AssignOp::Assign
            | AssignOp::Add
            | AssignOp::Sub
            | AssignOp::Mul
            | AssignOp::Div
            | AssignOp::Mod
    ) {
        rewriter.diagnostics.error(
            line,
            "Only '=', '+=', '-=', '*=', '/=', and '%=' are supported assignment operators.",
        );
        let rhs = rewrite_expression(rewriter, assign.rhs().clone(), line);
        return Expression::Assign(Assign::new(AssignOp::Assign, assign.lhs().clone(), rhs));
    }

    match assign.lhs() {
        boa_ast::expression::operator::assign::AssignTarget::Identifier(ident) => {
            rewrite_identifier_assign(rewriter, *ident, op, assign.rhs().clone(), line)
        }
        boa_ast::expression::operator::assign::AssignTarget::Access(access) => {
            rewrite_member_assign(rewriter, access.clone(), op, assign.rhs().clone(), line)
        }
        boa_ast::expression::operator::assign::AssignTarget::Pattern(_) => {
            rewriter
                .diagnostics
                .error(line, "Destructuring patterns are not supported in assignments.");
            let rhs = rewrite_expression(rewriter, assign.rhs().clone(), line);
            Expression::Assign(Assign::new(AssignOp::Assign, assign.lhs().clone(), rhs))
        }
    }
}

fn rewrite_identifier_assign(
    rewriter: &mut Rewriter<'_>,
    ident: Identifier,
    op: AssignOp,
    rhs: Expression,
    line: u32,
) -> Expression {
    let name = rewriter.interner.resolve_expect(ident.sym()).to_string();
    if rewriter.is_const(ident.sym()) {
        rewriter
            .diagnostics
            .error(line, format!("'{name}' is a constant and cannot be reassigned."));
    }
    rewriter.env.initialize(ident.sym());

    let rhs = rewrite_expression(rewriter, rhs, line);
    let desugared_rhs = match op {
        AssignOp::Assign => rhs,
        arith => compound_assign_op_call(rewriter, arith, Expression::Identifier(ident), rhs, line),
    };
    Expression::Assign(Assign::new(
        AssignOp::Assign,
        boa_ast::expression::operator::assign::AssignTarget::Identifier(ident),
        desugared_rhs,
    ))
}

/// `e.m op= v` / `e[i] op= v`: hoist a temporary so `e` is evaluated once,
/// per §9 "Compound assignment on computed LHS". The result is the
/// `(t = e, t.m = t.m op v)` sequence, finally wrapped through `checkMember`
/// / `checkArray` on the exit pass (done here directly since we already have
/// the rewritten pieces in hand).
fn rewrite_member_assign(
    rewriter: &mut Rewriter<'_>,
    access: PropertyAccess,
    op: AssignOp,
    rhs: Expression,
    line: u32,
) -> Expression {
    let PropertyAccess::Simple(access) = access else {
        rewriter
            .diagnostics
            .error(line, "Private field assignment is not supported.");
        return rewrite_expression(rewriter, rhs, line);
    };

    let object = rewrite_expression(rewriter, access.target().clone(), line);
    let rhs = rewrite_expression(rewriter, rhs, line);

    let is_this_in_constructor = rewriter.current_in_constructor_public()
        && matches!(access.target(), Expression::This);

    let temp = rewriter.hoist_temp();
    let temp_ident = Identifier::new(temp);
    let assign_temp = Expression::Assign(Assign::new(
        AssignOp::Assign,
        boa_ast::expression::operator::assign::AssignTarget::Identifier(temp_ident),
        object,
    ));

    let mut sequence = vec![assign_temp];

    let write_expr = match access.field() {
        PropertyAccessField::Const(name) => {
            let name_str = rewriter.interner.resolve_expect(*name).to_string();
            let current = rts_call(
                rewriter.interner,
                "dot",
                vec![
                    Expression::Identifier(temp_ident),
                    string_lit(rewriter.interner, &name_str),
                    synth::line_lit(line),
                ],
            );
            let value = match op {
                AssignOp::Assign => rhs,
                arith => compound_assign_op_call(rewriter, arith, current, rhs, line),
            };
            if is_this_in_constructor {
                // Inside a constructor, `this.m = ...` bypasses the
                // existence check entirely (the constructor is what defines
                // the member); leave it as a plain assignment.
                Expression::Assign(Assign::new(
                    AssignOp::Assign,
                    boa_ast::expression::operator::assign::AssignTarget::Access(
                        PropertyAccess::Simple(SimplePropertyAccess::new(
                            Expression::Identifier(temp_ident),
                            PropertyAccessField::Const(*name),
                        )),
                    ),
                    value,
                ))
            } else {
                rts_call(
                    rewriter.interner,
                    "checkMember",
                    vec![
                        Expression::Identifier(temp_ident),
                        string_lit(rewriter.interner, &name_str),
                        value,
                        synth::line_lit(line),
                    ],
                )
            }
        }
        PropertyAccessField::Expr(index) => {
            // `e[i] op= v` must evaluate `i` exactly once even when it is
            // itself side-effecting (`a[++i] += 3`): hoist it into its own
            // temporary alongside `e`'s, and read that temporary for both
            // the bounds-checked read and the write.
            let index = rewrite_expression(rewriter, (**index).clone(), line);
            let index_temp = rewriter.hoist_temp();
            let index_temp_ident = Identifier::new(index_temp);
            let assign_index_temp = Expression::Assign(Assign::new(
                AssignOp::Assign,
                boa_ast::expression::operator::assign::AssignTarget::Identifier(index_temp_ident),
                index,
            ));
            sequence.push(assign_index_temp);

            let current = rts_call(
                rewriter.interner,
                "arrayBoundsCheck",
                vec![
                    Expression::Identifier(temp_ident),
                    Expression::Identifier(index_temp_ident),
                    synth::line_lit(line),
                ],
            );
            let value = match op {
                AssignOp::Assign => rhs,
                arith => compound_assign_op_call(rewriter, arith, current, rhs, line),
            };
            rts_call(
                rewriter.interner,
                "checkArray",
                vec![
                    Expression::Identifier(temp_ident),
                    Expression::Identifier(index_temp_ident),
                    value,
                    synth::line_lit(line),
                ],
            )
        }
    };

    sequence.push(write_expr);
    comma_sequence(rewriter, sequence)
}

/// Models the comma operator `(a, b)` as a call into `rts.sequence`, which
/// evaluates its arguments left to right (ordinary call-argument evaluation
/// order) and returns the last one. Used by the compound-assignment and
/// prefix-update desugarings, which both need "evaluate this guard, then
/// produce that value" without re-evaluating any sub-expression.
fn comma_sequence(rewriter: &mut Rewriter<'_>, exprs: Vec<Expression>) -> Expression {
    rts_call(rewriter.interner, "sequence", exprs)
}

fn assign_op_symbol(op: AssignOp) -> &'static str {
    match op {
        AssignOp::Add => "+",
        AssignOp::Sub => "-",
        AssignOp::Mul => "*",
        AssignOp::Div => "/",
        AssignOp::Mod => "%",
        _ => "=",
    }
}

/// `x op= v` desugars its arithmetic into `rts.applyNumOp`, except `+=`,
/// which (like the binary `+` it shares a symbol with) goes through
/// `rts.applyNumOrStringOp` so string concatenation keeps working.
fn compound_assign_op_call(rewriter: &mut Rewriter<'_>, op: AssignOp, current: Expression, rhs: Expression, line: u32) -> Expression {
    let symbol = assign_op_symbol(op);
    let function = if matches!(op, AssignOp::Add) {
        "applyNumOrStringOp"
    } else {
        "applyNumOp"
    };
    rts_call(
        rewriter.interner,
        function,
        vec![string_lit(rewriter.interner, symbol), current, rhs, synth::line_lit(line)],
    )
}

/// `++x` / `--x`: only the prefix form is allowed.
fn rewrite_unary(rewriter: &mut Rewriter<'_>, unary: Unary, line: u32) -> Expression {
    if matches!(unary.op(), UnaryOp::Delete) {
        rewriter.diagnostics.error(line, "'delete' is not supported.");
    }
    if matches!(unary.op(), UnaryOp::TypeOf) {
        rewriter.diagnostics.error(line, "'typeof' is not supported.");
    }
    let target = rewrite_expression(rewriter, unary.target().clone(), line);
    Expression::Unary(Unary::new(unary.op(), target))
}

fn rewrite_update(rewriter: &mut Rewriter<'_>, update: Update, line: u32) -> Expression {
    if !update.is_pre() {
        rewriter
            .diagnostics
            .error(line, "Only prefix '++'/'--' are supported.");
    }
    let op_symbol = match update.op() {
        UpdateOp::IncrementPre | UpdateOp::IncrementPost => "++",
        UpdateOp::DecrementPre | UpdateOp::DecrementPost => "--",
    };

    match update.target() {
        UpdateTarget::Identifier(ident) => {
            let guard = rts_call(
                rewriter.interner,
                "updateOnlyNumbers",
                vec![
                    string_lit(rewriter.interner, op_symbol),
                    Expression::Identifier(*ident),
                    synth::line_lit(line),
                ],
            );
            let real_update = Expression::Update(Update::new(
                update.op(),
                true,
                UpdateTarget::Identifier(*ident),
            ));
            comma_sequence(rewriter, vec![guard, real_update])
        }
        UpdateTarget::PropertyAccess(access) => {
            let PropertyAccess::Simple(access) = access else {
                rewriter
                    .diagnostics
                    .error(line, "Private field update is not supported.");
                return Expression::Update(update);
            };
            let object = rewrite_expression(rewriter, access.target().clone(), line);
            let PropertyAccessField::Const(name) = access.field() else {
                rewriter
                    .diagnostics
                    .error(line, "Indexed update expressions are not supported.");
                return Expression::Update(update);
            };
            let name_str = rewriter.interner.resolve_expect(*name).to_string();
            rts_call(
                rewriter.interner,
                "checkUpdateOperand",
                vec![
                    string_lit(rewriter.interner, op_symbol),
                    object,
                    string_lit(rewriter.interner, &name_str),
                    synth::line_lit(line),
                ],
            )
        }
    }
}

fn rewrite_logical(rewriter: &mut Rewriter<'_>, logical: Logical, line: u32) -> Expression {
    let op = logical.op();
    let op_symbol = match op {
        LogicalOp::And => "&&",
        LogicalOp::Or => "||",
        LogicalOp::Coalesce => "??",
    };
    let left = rewrite_expression(rewriter, logical.left().clone(), line);
    let right = rewrite_expression(rewriter, logical.right().clone(), line);

    let checked_left = rts_call(
        rewriter.interner,
        "checkIfBoolean",
        vec![left, string_lit(rewriter.interner, op_symbol), synth::line_lit(line)],
    );
    let checked_right = rts_call(
        rewriter.interner,
        "checkIfBoolean",
        vec![right, string_lit(rewriter.interner, op_symbol), synth::line_lit(line)],
    );
    Expression::Logical(Logical::new(op, checked_left, checked_right))
}

fn rewrite_binary(rewriter: &mut Rewriter<'_>, binary: Binary, line: u32) -> Expression {
    let op = binary.op();
    if matches!(op, BinaryOp::Relational(RelationalOp::Equal) | BinaryOp::Relational(RelationalOp::NotEqual)) {
        let suggestion = if matches!(op, BinaryOp::Relational(RelationalOp::Equal)) {
            "'==='"
        } else {
            "'!=='"
        };
        rewriter
            .diagnostics
            .error(line, format!("Use {suggestion} instead of loose equality."));
    }
    if matches!(op, BinaryOp::Relational(RelationalOp::In)) {
        rewriter.diagnostics.error(line, "The 'in' operator is not supported.");
    }
    if matches!(op, BinaryOp::Relational(RelationalOp::InstanceOf)) {
        rewriter.diagnostics.error(line, "'instanceof' is not supported.");
    }

    let left = rewrite_expression(rewriter, binary.lhs().clone(), line);
    let right = rewrite_expression(rewriter, binary.rhs().clone(), line);

    match op {
        BinaryOp::Arithmetic(ArithmeticOp::Add) => rts_call(
            rewriter.interner,
            "applyNumOrStringOp",
            vec![string_lit(rewriter.interner, "+"), left, right, synth::line_lit(line)],
        ),
        BinaryOp::Arithmetic(_) | BinaryOp::Bitwise(_) | BinaryOp::Relational(RelationalOp::LessThan)
        | BinaryOp::Relational(RelationalOp::LessThanOrEqual)
        | BinaryOp::Relational(RelationalOp::GreaterThan)
        | BinaryOp::Relational(RelationalOp::GreaterThanOrEqual) => rts_call(
            rewriter.interner,
            "applyNumOp",
            vec![string_lit(rewriter.interner, binary_op_symbol(op)), left, right, synth::line_lit(line)],
        ),
        _ => Expression::Binary(Binary::new(op, left, right)),
    }
}

fn binary_op_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Arithmetic(ArithmeticOp::Sub) => "-",
        BinaryOp::Arithmetic(ArithmeticOp::Mul) => "*",
        BinaryOp::Arithmetic(ArithmeticOp::Div) => "/",
        BinaryOp::Arithmetic(ArithmeticOp::Mod) => "%",
        BinaryOp::Arithmetic(ArithmeticOp::Exp) => "**",
        BinaryOp::Bitwise(BitwiseOp::And) => "&",
        BinaryOp::Bitwise(BitwiseOp::Or) => "|",
        BinaryOp::Bitwise(BitwiseOp::Xor) => "^",
        BinaryOp::Bitwise(BitwiseOp::Shl) => "<<",
        BinaryOp::Bitwise(BitwiseOp::Shr) => ">>",
        BinaryOp::Bitwise(BitwiseOp::UShr) => ">>>",
        BinaryOp::Relational(RelationalOp::LessThan) => "<",
        BinaryOp::Relational(RelationalOp::LessThanOrEqual) => "<=",
        BinaryOp::Relational(RelationalOp::GreaterThan) => ">",
        BinaryOp::Relational(RelationalOp::GreaterThanOrEqual) => ">=",
        _ => "?",
    }
}

fn rewrite_array_literal(
    rewriter: &mut Rewriter<'_>,
    array: boa_ast::expression::literal::ArrayLiteral,
    line: u32,
) -> Expression {
    let elements: Vec<Expression> = array
        .as_ref()
        .iter()
        .map(|el| match el {
            Some(e) => Some(rewrite_expression(rewriter, e.clone(), line)),
            None => None,
        })
        .map(|el| el.unwrap_or(Expression::Literal(boa_ast::expression::literal::Literal::Undefined)))
        .collect();
    Expression::ArrayLiteral(boa_ast::expression::literal::ArrayLiteral::from(elements))
}

/// Object literal rule: every key must be an identifier; duplicate keys are
/// a compile error.
fn rewrite_object_literal(
    rewriter: &mut Rewriter<'_>,
    object: boa_ast::expression::literal::ObjectLiteral,
    line: u32,
) -> Expression {
    use std::collections::HashSet;
    let mut seen: HashSet<String> = HashSet::new();

    for property in object.properties() {
        if let boa_ast::property::PropertyDefinition::Property(key, _value) = property {
            if let boa_ast::property::PropertyName::Literal(sym) = key {
                let name = rewriter.interner.resolve_expect(*sym).to_string();
                if !seen.insert(name.clone()) {
                    rewriter
                        .diagnostics
                        .error(line, format!("Duplicate property name '{name}' in object literal."));
                }
            } else {
                rewriter
                    .diagnostics
                    .error(line, "Object literal keys must be identifiers.");
            }
        }
    }
    Expression::ObjectLiteral(object)
}

fn rewrite_conditional(
    rewriter: &mut Rewriter<'_>,
    cond: boa_ast::expression::operator::Conditional,
    line: u32,
) -> Expression {
    if is_assignment(cond.condition()) {
        reject_assignment_operand(rewriter, line);
    }
    let condition = rewrite_expression(rewriter, cond.condition().clone(), line);
    let if_true = rewrite_expression(rewriter, cond.if_true().clone(), line);
    let if_false = rewrite_expression(rewriter, cond.if_false().clone(), line);
    Expression::Conditional(boa_ast::expression::operator::Conditional::new(condition, if_true, if_false))
}

pub(crate) fn is_assignment(expr: &Expression) -> bool {
    matches!(expr, Expression::Assign(_))
}

pub(crate) fn reject_assignment_operand(rewriter: &mut Rewriter<'_>, line: u32) {
    rewriter
        .diagnostics
        .error(line, "Forbidden assignment expression.");
}

impl<'a> Rewriter<'a> {
    pub(crate) fn current_in_constructor_public(&self) -> bool {
        self.current_in_constructor()
    }
}
