//! JavaScript module generation.
//!
//! Prints a [`RenderProgram`] as an ES module whose default export is the
//! component function. The function creates the component's cells, registers
//! its effects and returns its root nodes built with the rendering primitive
//! library's `h`/`text`/`when`/`list`.

mod context;
mod expression;
mod helpers;
mod view;

use sprout_seed::FetchStage;

use crate::options::CodegenOptions;
use crate::program::{EffectPlan, FetchPlan, RenderProgram, StateInit};

pub use context::{CodegenContext, RuntimeHelper};
pub use helpers::{js_string, to_pascal_case};
use expression::{write_conjunction, write_operand, write_statements};
use view::generate_nodes;

/// Generate the module text for a program
pub fn generate_module(program: &RenderProgram, options: &CodegenOptions) -> String {
    let mut ctx = CodegenContext::new(options.clone());

    ctx.push("export default function ");
    ctx.push(&to_pascal_case(&program.name));
    ctx.push("() {");
    ctx.indent();

    for state in &program.states {
        ctx.newline();
        ctx.push("const $");
        ctx.push(&state.name);
        ctx.push(" = ");
        match &state.init {
            StateInit::Value(init) => {
                ctx.push_helper(RuntimeHelper::Signal);
                ctx.push("(");
                write_operand(&mut ctx, init);
            }
            StateInit::Derived(init) => {
                ctx.push_helper(RuntimeHelper::Computed);
                ctx.push("(() => ");
                write_operand(&mut ctx, init);
            }
        }
        ctx.push(");");
    }

    for effect in &program.effects {
        ctx.newline();
        match effect {
            EffectPlan::Standing { guards, action } => {
                generate_standing_effect(&mut ctx, guards, action)
            }
            EffectPlan::Fetch(fetch) => generate_fetch(&mut ctx, fetch),
        }
    }

    ctx.newline();
    ctx.push("return ");
    generate_nodes(&mut ctx, &program.view);
    ctx.push(";");
    ctx.deindent();
    ctx.newline();
    ctx.push_line("}");

    let preamble = generate_preamble(&ctx, program);
    let mut code = preamble;
    code.push_str(&ctx.into_code());
    code
}

fn generate_preamble(ctx: &CodegenContext, program: &RenderProgram) -> String {
    let mut preamble = String::with_capacity(128);
    let helpers = ctx.used_helpers();
    if !helpers.is_empty() {
        preamble.push_str("import { ");
        for (i, helper) in helpers.iter().enumerate() {
            if i > 0 {
                preamble.push_str(", ");
            }
            preamble.push_str(helper.name());
            preamble.push_str(" as ");
            preamble.push_str(helper.alias());
        }
        preamble.push_str(" } from ");
        preamble.push_str(&js_string(&ctx.options.runtime_module));
        preamble.push_str(";\n");
    }
    for import in &program.imports {
        preamble.push_str("import ");
        preamble.push_str(import);
        preamble.push_str(" from ");
        preamble.push_str(&js_string(&format!(
            "./{import}{}",
            ctx.options.component_extension
        )));
        preamble.push_str(";\n");
    }
    if !preamble.is_empty() {
        preamble.push('\n');
    }
    preamble
}

fn generate_standing_effect(
    ctx: &mut CodegenContext,
    guards: &[sprout_seed::expr::Expr],
    action: &sprout_seed::expr::Expr,
) {
    ctx.push_helper(RuntimeHelper::Effect);
    ctx.push("(() => {");
    ctx.indent();
    ctx.newline();
    if guards.is_empty() {
        write_statements(ctx, action);
    } else {
        ctx.push("if (");
        write_conjunction(ctx, guards);
        ctx.push(") {");
        ctx.indent();
        ctx.newline();
        write_statements(ctx, action);
        ctx.deindent();
        ctx.newline();
        ctx.push("}");
    }
    ctx.deindent();
    ctx.newline();
    ctx.push("});");
}

/// Fetch pipelines run once at mount, each stage a continuation.
fn generate_fetch(ctx: &mut CodegenContext, fetch: &FetchPlan) {
    ctx.push_helper(RuntimeHelper::OnMount);
    ctx.push("(() => {");
    ctx.indent();
    ctx.newline();
    ctx.push("fetch(");
    write_operand(ctx, &fetch.url);
    ctx.push(")");
    ctx.indent();
    for stage in &fetch.stages {
        ctx.newline();
        match stage {
            FetchStage::Json => ctx.push(".then((_r) => _r.json())"),
            FetchStage::Text => ctx.push(".then((_r) => _r.text())"),
            FetchStage::Field(path) => {
                ctx.push(".then((_v) => _v");
                for field in path {
                    ctx.push("?.");
                    ctx.push(field);
                }
                ctx.push(")");
            }
        }
    }
    ctx.newline();
    ctx.push(".then((_v) => {");
    ctx.indent();
    ctx.newline();
    ctx.push("$");
    ctx.push(&fetch.target);
    ctx.push(".value = _v;");
    ctx.deindent();
    ctx.newline();
    ctx.push("})");
    ctx.newline();
    ctx.push(".catch(");
    ctx.push_helper(RuntimeHelper::ReportError);
    ctx.push(");");
    ctx.deindent();
    ctx.deindent();
    ctx.newline();
    ctx.push("});");
}
