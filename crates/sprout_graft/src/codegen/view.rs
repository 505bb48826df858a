//! View node emission.

use rustc_hash::FxHashMap;

use crate::program::{ElementPlan, HandlerAction, PropValue, ViewNode};

use super::context::{CodegenContext, RuntimeHelper};
use super::expression::{write_operand, write_statements, ITEM_PARAM};
use super::helpers::{capitalize, js_key, js_string};

/// Generate a node list as an array literal
pub fn generate_nodes(ctx: &mut CodegenContext, nodes: &[ViewNode]) {
    if nodes.is_empty() {
        ctx.push("[]");
        return;
    }
    ctx.push("[");
    ctx.indent();
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            ctx.push(",");
        }
        ctx.newline();
        generate_node(ctx, node);
    }
    ctx.deindent();
    ctx.newline();
    ctx.push("]");
}

pub fn generate_node(ctx: &mut CodegenContext, node: &ViewNode) {
    match node {
        ViewNode::Element(element) => generate_element(ctx, element),
        ViewNode::Text(text) => ctx.push(&js_string(text)),
        ViewNode::Live(expr) => {
            ctx.push_helper(RuntimeHelper::Text);
            ctx.push("(() => ");
            write_operand(ctx, expr);
            ctx.push(")");
        }
        ViewNode::Once(expr) => {
            ctx.push("String(");
            write_operand(ctx, expr);
            ctx.push(")");
        }
        ViewNode::When {
            condition,
            then,
            otherwise,
        } => {
            ctx.push_helper(RuntimeHelper::When);
            ctx.push("(() => ");
            write_operand(ctx, condition);
            ctx.push(", () => ");
            generate_nodes(ctx, then);
            if !otherwise.is_empty() {
                ctx.push(", () => ");
                generate_nodes(ctx, otherwise);
            }
            ctx.push(")");
        }
        ViewNode::List { source, template } => {
            ctx.push_helper(RuntimeHelper::List);
            ctx.push("(");
            // A bare state hands over the cell itself so the helper subscribes
            match source.as_state() {
                Some(name) => {
                    ctx.push("$");
                    ctx.push(name);
                }
                None => {
                    ctx.push("() => ");
                    write_operand(ctx, source);
                }
            }
            ctx.push(", (");
            ctx.push(ITEM_PARAM);
            ctx.push(") => ");
            generate_nodes(ctx, template);
            ctx.push(")");
        }
        ViewNode::Component(name) => {
            ctx.push_helper(RuntimeHelper::H);
            ctx.push("(");
            ctx.push(name);
            ctx.push(", null, [])");
        }
    }
}

fn generate_element(ctx: &mut CodegenContext, element: &ElementPlan) {
    ctx.push_helper(RuntimeHelper::H);
    ctx.push("(");
    ctx.push(&js_string(&element.tag));
    ctx.push(", ");
    generate_props(ctx, element);
    ctx.push(", ");
    generate_nodes(ctx, &element.children);
    ctx.push(")");
}

fn generate_props(ctx: &mut CodegenContext, element: &ElementPlan) {
    let has_props = element.class.is_some()
        || element.id.is_some()
        || !element.attributes.is_empty()
        || element.binding.is_some()
        || !element.handlers.is_empty();
    if !has_props {
        ctx.push("null");
        return;
    }

    let mut first = true;
    let mut key = |ctx: &mut CodegenContext, name: &str| {
        ctx.push(if first { "{ " } else { ", " });
        first = false;
        ctx.push(&js_key(name));
        ctx.push(": ");
    };

    if let Some(class) = &element.class {
        key(ctx, "class");
        ctx.push(&js_string(class));
    }
    if let Some(id) = &element.id {
        key(ctx, "id");
        ctx.push(&js_string(id));
    }
    for (name, value) in &element.attributes {
        key(ctx, name);
        match value {
            PropValue::Static(text) => ctx.push(&js_string(text)),
            PropValue::Dynamic(expr) => {
                ctx.push("() => ");
                write_operand(ctx, expr);
            }
        }
    }

    // Handlers grouped per event, in order of first appearance
    let mut events: Vec<&str> = Vec::new();
    let mut bodies: FxHashMap<&str, Vec<&HandlerAction>> = FxHashMap::default();
    for handler in &element.handlers {
        let event = handler.event.as_str();
        if !bodies.contains_key(event) {
            events.push(event);
        }
        bodies.entry(event).or_default().push(&handler.action);
    }

    if let Some(binding) = &element.binding {
        key(ctx, binding.property);
        ctx.push("() => $");
        ctx.push(&binding.state);
        ctx.push(".value");
        if !bodies.contains_key(binding.event) {
            events.push(binding.event);
        }
    }

    for event in events {
        key(ctx, &format!("on{}", capitalize(event)));
        ctx.push("(e) => {");
        ctx.indent();
        if let Some(binding) = element.binding.as_ref().filter(|b| b.event == event) {
            ctx.newline();
            ctx.push("$");
            ctx.push(&binding.state);
            ctx.push(".value = e.target.");
            ctx.push(binding.property);
            ctx.push(";");
        }
        for action in bodies.get(event).into_iter().flatten() {
            ctx.newline();
            match action {
                HandlerAction::Run(expr) => write_statements(ctx, expr),
                HandlerAction::Navigate(path) => {
                    ctx.push("e.preventDefault();");
                    ctx.newline();
                    ctx.push_helper(RuntimeHelper::Navigate);
                    ctx.push("(");
                    ctx.push(&js_string(path));
                    ctx.push(");");
                }
            }
        }
        ctx.deindent();
        ctx.newline();
        ctx.push("}");
    }
    ctx.push(" }");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CodegenOptions;
    use crate::program::Binding;
    use sprout_seed::expr::{parse_expression, Expr};

    fn emit(node: &ViewNode) -> String {
        let mut ctx = CodegenContext::new(CodegenOptions::default());
        generate_node(&mut ctx, node);
        ctx.into_code()
    }

    #[test]
    fn test_live_and_once() {
        assert_eq!(
            emit(&ViewNode::Live(Expr::State("count".into()))),
            "_text(() => $count.value)"
        );
        assert_eq!(
            emit(&ViewNode::Once(Expr::Item("_index".into()))),
            "String(_item._index)"
        );
    }

    #[test]
    fn test_bare_element() {
        let element = ElementPlan::new("hr");
        assert_eq!(emit(&ViewNode::Element(element)), r#"_h("hr", null, [])"#);
    }

    #[test]
    fn test_bound_input() {
        let mut element = ElementPlan::new("input");
        element.binding = Some(Binding {
            state: "name".into(),
            property: "value",
            event: "input",
        });
        insta::assert_snapshot!(emit(&ViewNode::Element(element)), @r#"
        _h("input", { value: () => $name.value, onInput: (e) => {
          $name.value = e.target.value;
        } }, [])
        "#);
    }

    #[test]
    fn test_list_source() {
        let list = ViewNode::List {
            source: parse_expression("$items.slice(1)").unwrap(),
            template: vec![ViewNode::Once(Expr::Item("name".into()))],
        };
        insta::assert_snapshot!(emit(&list), @r"
        _list(() => $items.value.slice(1), (_item) => [
          String(_item.name)
        ])
        ");
    }
}
