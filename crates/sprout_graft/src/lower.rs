//! Lowering from the component AST to a [`RenderProgram`].
//!
//! The match over [`Node`] is exhaustive: an AST that passed parsing always
//! lowers. Class names are scoped here and recorded in the style sheet as
//! they are encountered.

use compact_str::CompactString;
use sprout_seed::expr::Expr;
use sprout_seed::hash::scope_tag;
use sprout_seed::{AttributeValue, Component, EffectAction, Element, Node};

use crate::classes::scope_class;
use crate::css::StyleSheet;
use crate::program::{
    Binding, EffectPlan, ElementPlan, FetchPlan, Handler, HandlerAction, PropValue,
    RenderProgram, StateInit, StatePlan, ViewNode, NAVIGATION_EVENT,
};

/// Lower a parsed component. Returns the program and the style sheet
/// collected from its classes.
pub fn lower(component: &Component<'_>, name: &str) -> (RenderProgram, StyleSheet) {
    let tag = scope_tag(name);
    let mut lowering = Lowering {
        sheet: StyleSheet::new(tag.clone()),
        scope_tag: tag,
    };

    let states = component
        .states
        .iter()
        .map(|state| StatePlan {
            name: state.name.clone(),
            init: if state.computed {
                StateInit::Derived(state.initializer.expr.clone())
            } else {
                StateInit::Value(state.initializer.expr.clone())
            },
        })
        .collect();

    let effects = component
        .effects
        .iter()
        .map(|effect| match &effect.action {
            EffectAction::Fetch(fetch) => EffectPlan::Fetch(FetchPlan {
                url: fetch.url.expr.clone(),
                stages: fetch.stages.clone(),
                target: fetch.target.clone(),
            }),
            EffectAction::Expr(action) => EffectPlan::Standing {
                guards: effect.dependencies.iter().map(|d| d.expr.clone()).collect(),
                action: action.expr.clone(),
            },
        })
        .collect();

    let view = lowering.nodes(&component.nodes);
    let program = RenderProgram {
        name: name.to_string(),
        scope_tag: lowering.scope_tag,
        states,
        effects,
        view,
        imports: component.imports.iter().cloned().collect(),
    };
    (program, lowering.sheet)
}

struct Lowering {
    scope_tag: String,
    sheet: StyleSheet,
}

impl Lowering {
    fn nodes(&mut self, nodes: &[Node<'_>]) -> Vec<ViewNode> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            if let Some(view) = self.node(node) {
                out.push(view);
            }
        }
        out
    }

    fn node(&mut self, node: &Node<'_>) -> Option<ViewNode> {
        Some(match node {
            Node::Element(element) => ViewNode::Element(self.element(element)),
            Node::Text(text) => ViewNode::Text(text.clone()),
            Node::CodeLine(line) => {
                let mut paragraph = ElementPlan::new("p");
                paragraph.children.push(ViewNode::Text(line.clone()));
                ViewNode::Element(paragraph)
            }
            Node::Variable(name) => ViewNode::Live(Expr::State(name.clone())),
            Node::ReactiveInterpolation(expression) => ViewNode::Live(expression.expr.clone()),
            Node::StaticInterpolation(expression) => ViewNode::Once(expression.expr.clone()),
            // Loop templates are rebuilt per item, so a single read suffices
            Node::PropertyAccess(property) => ViewNode::Once(Expr::Item(property.clone())),
            Node::Conditional(conditional) => ViewNode::When {
                condition: conditional.condition.expr.clone(),
                then: self.nodes(&conditional.true_branch),
                otherwise: self.nodes(&conditional.false_branch),
            },
            Node::Loop(lp) => ViewNode::List {
                source: lp.array.expr.clone(),
                template: self.nodes(&lp.template),
            },
            Node::Component(name) => ViewNode::Component(name.clone()),
            Node::Attribute(_) | Node::Event(_) | Node::Nav(_) => {
                tracing::debug!(kind = node.kind(), "binding outside an element ignored");
                return None;
            }
        })
    }

    fn element(&mut self, element: &Element<'_>) -> ElementPlan {
        let mut plan = ElementPlan::new(element.tag.clone());

        if !element.classes.is_empty() {
            let mut class = String::new();
            for (i, name) in element.classes.iter().enumerate() {
                self.sheet.add_class(name);
                if i > 0 {
                    class.push(' ');
                }
                class.push_str(&scope_class(name, &self.scope_tag));
            }
            plan.class = Some(class);
        }
        plan.id = element.id.clone();

        for attribute in element.attributes.iter() {
            plan.attributes
                .push((attribute.name.clone(), prop_value(&attribute.value)));
        }

        for child in element.children.iter() {
            match child {
                Node::Attribute(attribute) => plan
                    .attributes
                    .push((attribute.name.clone(), prop_value(&attribute.value))),
                Node::Event(event) => plan.handlers.push(Handler {
                    event: event.name.clone(),
                    action: HandlerAction::Run(event.action.expr.clone()),
                }),
                Node::Nav(path) => {
                    plan.attributes
                        .push((CompactString::const_new("href"), PropValue::Static(path.clone())));
                    plan.handlers.push(Handler {
                        event: CompactString::const_new(NAVIGATION_EVENT),
                        action: HandlerAction::Navigate(path.clone()),
                    });
                }
                Node::Variable(name) if element.is_input_like() && plan.binding.is_none() => {
                    plan.binding = Some(binding_for(&plan, name.clone()));
                }
                other => {
                    if let Some(view) = self.node(other) {
                        plan.children.push(view);
                    }
                }
            }
        }

        plan
    }
}

fn prop_value(value: &AttributeValue) -> PropValue {
    match value {
        AttributeValue::Static(text) => PropValue::Static(text.clone()),
        AttributeValue::Dynamic(expression) => PropValue::Dynamic(expression.expr.clone()),
    }
}

/// Checkboxes and radios bind `checked`; selects report on `change`.
fn binding_for(plan: &ElementPlan, state: CompactString) -> Binding {
    let toggles = matches!(
        plan.attribute("type"),
        Some(PropValue::Static(kind)) if kind.as_str() == "checkbox" || kind.as_str() == "radio"
    );
    let (property, event) = match plan.tag.as_str() {
        "input" if toggles => ("checked", "change"),
        "select" => ("value", "change"),
        _ => ("value", "input"),
    };
    Binding {
        state,
        property,
        event,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprout_seed::Bump;

    fn lower_source(source: &str) -> (RenderProgram, StyleSheet) {
        let allocator = Bump::new();
        let component = sprout_trellis::parse(&allocator, source).unwrap();
        lower(&component, "Test")
    }

    #[test]
    fn test_states_and_effects() {
        let (program, _) = lower_source(
            "$count:0\n$double := $count * 2\n~ $count > 1 |> log($count)\n---\np[$count]",
        );
        assert!(matches!(program.states[0].init, StateInit::Value(Expr::Number(_))));
        assert!(matches!(program.states[1].init, StateInit::Derived(_)));
        let EffectPlan::Standing { guards, .. } = &program.effects[0] else {
            panic!("Expected standing effect");
        };
        assert_eq!(guards.len(), 1);
    }

    #[test]
    fn test_element_plan() {
        let (program, sheet) = lower_source(
            "$name:\"\"\n---\ninput.field.p-2[$name placeholder{\"Name\"}]\na[!nav(/about) \"About\"]",
        );
        let ViewNode::Element(input) = &program.view[0] else {
            panic!("Expected element");
        };
        let tag = &program.scope_tag;
        assert_eq!(input.class.as_deref(), Some(format!("field-{tag} p-2").as_str()));
        assert_eq!(
            input.binding,
            Some(Binding {
                state: "name".into(),
                property: "value",
                event: "input",
            })
        );
        assert!(input.children.is_empty());
        assert_eq!(input.attribute("placeholder"), Some(&PropValue::Static("Name".into())));

        let ViewNode::Element(link) = &program.view[1] else {
            panic!("Expected element");
        };
        assert_eq!(link.attribute("href"), Some(&PropValue::Static("/about".into())));
        assert_eq!(
            link.handlers[0].action,
            HandlerAction::Navigate("/about".into())
        );
        assert_eq!(link.children, vec![ViewNode::Text("About".into())]);
        assert!(!sheet.is_empty());
    }

    #[test]
    fn test_checkbox_binding() {
        let (program, _) = lower_source("$done:false\n---\ninput[type{\"checkbox\"} $done]");
        let ViewNode::Element(input) = &program.view[0] else {
            panic!("Expected element");
        };
        let binding = input.binding.as_ref().unwrap();
        assert_eq!((binding.property, binding.event), ("checked", "change"));
    }

    #[test]
    fn test_interpolations_and_code_lines() {
        let (program, _) = lower_source("$who:\"Ada\"\n---\nh1[\"Hi @{$who} #{1 + 1}\"]\npre[```\nraw\n```]");
        let ViewNode::Element(h1) = &program.view[0] else {
            panic!("Expected element");
        };
        assert!(matches!(h1.children[1], ViewNode::Live(Expr::State(_))));
        assert_eq!(h1.children[2], ViewNode::Text(" ".into()));
        assert!(matches!(h1.children[3], ViewNode::Once(Expr::Binary { .. })));

        let ViewNode::Element(pre) = &program.view[1] else {
            panic!("Expected element");
        };
        let ViewNode::Element(p) = &pre.children[0] else {
            panic!("Expected paragraph");
        };
        assert_eq!(p.tag, "p");
        assert_eq!(p.children, vec![ViewNode::Text("raw".into())]);
    }

    #[test]
    fn test_loop_and_conditional() {
        let (program, _) = lower_source(
            "$items:[]\n---\nul\n  $items\n    li[:name]\n? $items.length > 0\n  p[\"some\"]\n? else\n  p[\"none\"]",
        );
        let ViewNode::Element(ul) = &program.view[0] else {
            panic!("Expected element");
        };
        let ViewNode::List { source, template } = &ul.children[0] else {
            panic!("Expected list");
        };
        assert_eq!(source, &Expr::State("items".into()));
        assert_eq!(template.len(), 1);

        let ViewNode::When { then, otherwise, .. } = &program.view[1] else {
            panic!("Expected conditional");
        };
        assert_eq!((then.len(), otherwise.len()), (1, 1));
    }
}
