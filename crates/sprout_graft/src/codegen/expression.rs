//! Expression printing.
//!
//! State reads become `$name.value`, loop item fields read `_item`, and
//! writes below a state root go through `update` so the cell notifies its
//! subscribers.

use sprout_seed::expr::{BinaryOp, Expr, PathSegment, UnaryOp};

use super::context::{CodegenContext, RuntimeHelper};
use super::helpers::{is_js_identifier, js_key, js_number, js_string};

/// Loop item parameter in list templates
pub const ITEM_PARAM: &str = "_item";

/// Array methods that mutate their receiver in place.
const MUTATING_METHODS: &[&str] = &["push", "pop", "shift", "unshift", "splice", "sort", "reverse"];

const SEQUENCE: u8 = 0;
const ASSIGN: u8 = 1;
const TERNARY: u8 = 2;
const UNARY: u8 = 14;
const POSTFIX: u8 = 15;
const CALL: u8 = 17;
const PRIMARY: u8 = 18;

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Sequence(_) => SEQUENCE,
        Expr::Assign { .. } => ASSIGN,
        Expr::Conditional { .. } => TERNARY,
        Expr::Binary { op, .. } => 3 + op.precedence(),
        Expr::Unary { .. } => UNARY,
        Expr::Update { prefix: true, .. } => UNARY,
        Expr::Update { .. } => POSTFIX,
        Expr::Member { .. } | Expr::Index { .. } | Expr::Call { .. } => CALL,
        _ => PRIMARY,
    }
}

/// `??` cannot be mixed with `&&` or `||` without parentheses.
fn mixes_coalesce(parent: BinaryOp, child: &Expr) -> bool {
    let Expr::Binary { op, .. } = child else {
        return false;
    };
    let logical = |op: BinaryOp| matches!(op, BinaryOp::And | BinaryOp::Or);
    (parent == BinaryOp::Coalesce && logical(*op)) || (logical(parent) && *op == BinaryOp::Coalesce)
}

pub fn write_expr(ctx: &mut CodegenContext, expr: &Expr) {
    write_prec(ctx, expr, SEQUENCE);
}

/// Expression usable as a single call argument or arrow body.
pub fn write_operand(ctx: &mut CodegenContext, expr: &Expr) {
    if matches!(expr, Expr::Object(_)) {
        ctx.push("(");
        write_expr(ctx, expr);
        ctx.push(")");
    } else {
        write_prec(ctx, expr, ASSIGN);
    }
}

/// Print as statements, one per sequence item.
pub fn write_statements(ctx: &mut CodegenContext, expr: &Expr) {
    let items = match expr {
        Expr::Sequence(items) => items.as_slice(),
        single => std::slice::from_ref(single),
    };
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            ctx.newline();
        }
        write_operand(ctx, item);
        ctx.push(";");
    }
}

/// Guards joined with `&&`.
pub fn write_conjunction(ctx: &mut CodegenContext, guards: &[Expr]) {
    let min = 3 + BinaryOp::And.precedence() + 1;
    for (i, guard) in guards.iter().enumerate() {
        if i > 0 {
            ctx.push(" && ");
        }
        if mixes_coalesce(BinaryOp::And, guard) {
            ctx.push("(");
            write_expr(ctx, guard);
            ctx.push(")");
        } else {
            write_prec(ctx, guard, min);
        }
    }
}

fn write_prec(ctx: &mut CodegenContext, expr: &Expr, min: u8) {
    let wrap = precedence(expr) < min;
    if wrap {
        ctx.push("(");
    }
    write_inner(ctx, expr);
    if wrap {
        ctx.push(")");
    }
}

fn write_list(ctx: &mut CodegenContext, items: &[Expr]) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            ctx.push(", ");
        }
        write_prec(ctx, item, ASSIGN);
    }
}

fn write_inner(ctx: &mut CodegenContext, expr: &Expr) {
    match expr {
        Expr::Number(n) => ctx.push(&js_number(*n)),
        Expr::String(s) => ctx.push(&js_string(s)),
        Expr::Bool(b) => ctx.push(if *b { "true" } else { "false" }),
        Expr::Null => ctx.push("null"),
        Expr::Array(items) => {
            ctx.push("[");
            write_list(ctx, items);
            ctx.push("]");
        }
        Expr::Object(entries) => {
            if entries.is_empty() {
                ctx.push("{}");
                return;
            }
            ctx.push("{ ");
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    ctx.push(", ");
                }
                ctx.push(&js_key(key));
                ctx.push(": ");
                write_prec(ctx, value, ASSIGN);
            }
            ctx.push(" }");
        }
        Expr::State(name) => {
            ctx.push("$");
            ctx.push(name);
            ctx.push(".value");
        }
        Expr::Item(name) => {
            ctx.push(ITEM_PARAM);
            write_field(ctx, name);
        }
        Expr::Ident(name) => match name.as_str() {
            "log" => ctx.push("console.log"),
            "navigate" => ctx.push_helper(RuntimeHelper::Navigate),
            other => ctx.push(other),
        },
        Expr::Member { object, property } => {
            write_prec(ctx, object, CALL);
            write_field(ctx, property);
        }
        Expr::Index { object, index } => {
            write_prec(ctx, object, CALL);
            ctx.push("[");
            write_expr(ctx, index);
            ctx.push("]");
        }
        Expr::Call { callee, args } => {
            if let Expr::Member { object, property } = callee.as_ref() {
                if MUTATING_METHODS.contains(&property.as_str()) && object.is_assignable() {
                    write_mutation(ctx, object, |ctx, receiver| {
                        ctx.push(receiver);
                        write_field(ctx, property);
                        ctx.push("(");
                        write_list(ctx, args);
                        ctx.push(")");
                    });
                    return;
                }
            }
            write_prec(ctx, callee, CALL);
            ctx.push("(");
            write_list(ctx, args);
            ctx.push(")");
        }
        Expr::Unary { op, operand } => {
            ctx.push(op.as_str());
            // `- -x` must not print as a decrement
            let nested = matches!(
                operand.as_ref(),
                Expr::Unary { .. } | Expr::Update { prefix: true, .. }
            ) || (*op == UnaryOp::Neg && matches!(operand.as_ref(), Expr::Number(n) if *n < 0.0));
            if nested {
                ctx.push("(");
                write_expr(ctx, operand);
                ctx.push(")");
            } else {
                write_prec(ctx, operand, UNARY);
            }
        }
        Expr::Binary { op, left, right } => {
            let p = 3 + op.precedence();
            write_binary_side(ctx, *op, left, p);
            ctx.push(" ");
            ctx.push(op.as_str());
            ctx.push(" ");
            write_binary_side(ctx, *op, right, p + 1);
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            write_prec(ctx, test, TERNARY + 1);
            ctx.push(" ? ");
            write_prec(ctx, consequent, ASSIGN);
            ctx.push(" : ");
            write_prec(ctx, alternate, ASSIGN);
        }
        Expr::Assign { op, target, value } => {
            write_mutation(ctx, target, |ctx, lhs| {
                ctx.push(lhs);
                ctx.push(" ");
                ctx.push(op.as_str());
                ctx.push(" ");
                write_prec(ctx, value, ASSIGN);
            });
        }
        Expr::Update { op, prefix, target } => {
            write_mutation(ctx, target, |ctx, lhs| {
                if *prefix {
                    ctx.push(op.as_str());
                    ctx.push(lhs);
                } else {
                    ctx.push(lhs);
                    ctx.push(op.as_str());
                }
            });
        }
        Expr::Sequence(items) => write_list(ctx, items),
    }
}

fn write_binary_side(ctx: &mut CodegenContext, parent: BinaryOp, side: &Expr, min: u8) {
    if mixes_coalesce(parent, side) {
        ctx.push("(");
        write_expr(ctx, side);
        ctx.push(")");
    } else {
        write_prec(ctx, side, min);
    }
}

fn write_field(ctx: &mut CodegenContext, name: &str) {
    if is_js_identifier(name) {
        ctx.push(".");
        ctx.push(name);
    } else {
        ctx.push("[");
        ctx.push(&js_string(name));
        ctx.push("]");
    }
}

/// Print a write to `target`. A bare state writes through `.value`; a path
/// below a state mutates the value in place inside `update`.
fn write_mutation(
    ctx: &mut CodegenContext,
    target: &Expr,
    body: impl FnOnce(&mut CodegenContext, &str),
) {
    match target.state_path() {
        Some((root, path)) if path.is_empty() => {
            let lhs = format!("${root}.value");
            body(ctx, &lhs);
        }
        Some((root, path)) => {
            let lhs = ctx.capture(|ctx| {
                ctx.push("_v");
                for segment in &path {
                    match segment {
                        PathSegment::Field(field) => write_field(ctx, field),
                        PathSegment::Index(index) => {
                            ctx.push("[");
                            write_expr(ctx, index);
                            ctx.push("]");
                        }
                    }
                }
            });
            ctx.push("$");
            ctx.push(root);
            ctx.push(".update((_v) => { ");
            body(ctx, &lhs);
            ctx.push("; })");
        }
        None => {
            let lhs = ctx.capture(|ctx| write_prec(ctx, target, CALL));
            body(ctx, &lhs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CodegenOptions;
    use sprout_seed::expr::parse_expression;

    fn print(source: &str) -> String {
        let expr = parse_expression(source).unwrap();
        let mut ctx = CodegenContext::new(CodegenOptions::default());
        write_expr(&mut ctx, &expr);
        ctx.into_code()
    }

    #[test]
    fn test_state_reads() {
        assert_eq!(print("$count * 2"), "$count.value * 2");
        assert_eq!(print("$user.name"), "$user.value.name");
        assert_eq!(print(":title"), "_item.title");
    }

    #[test]
    fn test_precedence() {
        assert_eq!(print("($a + $b) * 2"), "($a.value + $b.value) * 2");
        assert_eq!(print("$a - ($b - 1)"), "$a.value - ($b.value - 1)");
        assert_eq!(print("$a - $b - 1"), "$a.value - $b.value - 1");
        assert_eq!(print("!($a && $b)"), "!($a.value && $b.value)");
        assert_eq!(print("($a ? 1 : 2).toString()"), "($a.value ? 1 : 2).toString()");
    }

    #[test]
    fn test_coalesce_mixing() {
        assert_eq!(print("$a ?? ($b || $c)"), "$a.value ?? ($b.value || $c.value)");
    }

    #[test]
    fn test_writes() {
        assert_eq!(print("$count++"), "$count.value++");
        assert_eq!(print("$count += 2"), "$count.value += 2");
        assert_eq!(
            print("$user.name = 'Ada'"),
            r#"$user.update((_v) => { _v.name = "Ada"; })"#
        );
        assert_eq!(
            print("$items.push(:title)"),
            "$items.update((_v) => { _v.push(_item.title); })"
        );
    }

    #[test]
    fn test_builtins_and_literals() {
        assert_eq!(print("log('hi', 1.5)"), r#"console.log("hi", 1.5)"#);
        assert_eq!(print("[1, {a: true, 'b-c': null}]"), r#"[1, { a: true, "b-c": null }]"#);
    }
}
