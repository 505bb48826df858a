//! Preamble lines: state, effect and alias declarations.

use compact_str::CompactString;
use sprout_seed::expr::parse_expression;
use sprout_seed::{
    CompileError, EffectAction, EffectDecl, ErrorCode, Expression, FetchPipeline, FetchStage,
    StateDecl,
};

use crate::header::{find_content_open, parse_header};
use crate::lines::Line;
use crate::text::{find_closing, find_top_level, ident_len, is_ident, split_top_level, trim_part};

/// Marker separating dependency guards (or fetch stages) from the action.
pub const PIPE: &str = "|>";

pub(crate) enum PreambleItem {
    State(StateDecl),
    Effect(EffectDecl),
    Alias {
        name: CompactString,
        definition: CompactString,
    },
}

/// Whether a line has the shape of a declaration. Used to find where the
/// preamble ends when the source has no `---` separator.
pub(crate) fn is_declaration(text: &str) -> bool {
    if text.starts_with('~') {
        return true;
    }
    if let Some(rest) = text.strip_prefix('$') {
        let len = ident_len(rest);
        return len > 0 && rest[len..].trim_start().starts_with(':');
    }
    if let Some(rest) = text.strip_prefix('%') {
        let len = ident_len(rest);
        return len > 0 && rest[len..].trim_start().starts_with('=');
    }
    false
}

pub(crate) fn parse_preamble_line(line: &Line<'_>) -> Result<PreambleItem, CompileError> {
    match line.text.as_bytes().first() {
        Some(b'$') => parse_state(line).map(PreambleItem::State),
        Some(b'~') => parse_effect(line).map(PreambleItem::Effect),
        Some(b'%') => parse_alias(line),
        _ => Err(CompileError::new(
            ErrorCode::UnrecognizedPreambleLine,
            line.number,
            line.column(0),
        )
        .with_detail(format!("unrecognized declaration `{}`", line.text))),
    }
}

fn error(line: &Line<'_>, offset: usize, code: ErrorCode) -> CompileError {
    CompileError::new(code, line.number, line.column(offset))
}

/// Parse `source` found at `offset` on `line`.
fn expression(line: &Line<'_>, source: &str, offset: usize) -> Result<Expression, CompileError> {
    parse_expression(source)
        .map(|expr| Expression::new(source, expr))
        .map_err(|err| {
            error(line, offset + err.offset, ErrorCode::InvalidExpression)
                .with_detail(format!("`{source}`: {err}"))
        })
}

/// `$name:initializer` or `$name := expression`
fn parse_state(line: &Line<'_>) -> Result<StateDecl, CompileError> {
    let text = line.text;
    let name_len = ident_len(&text[1..]);
    let name_end = 1 + name_len;
    let after = &text[name_end..];

    if name_len == 0 || !(after.is_empty() || after.starts_with(':') || after.starts_with(' ')) {
        return Err(error(line, 1, ErrorCode::InvalidStateName));
    }

    let rest = after.trim_start();
    let rest_offset = text.len() - rest.len();
    let (computed, init_offset) = if rest.starts_with(":=") {
        (true, rest_offset + 2)
    } else if rest.starts_with(':') {
        (false, rest_offset + 1)
    } else {
        return Err(error(line, rest_offset, ErrorCode::MissingInitializer)
            .with_detail(format!("expected `:` or `:=` after `${}`", &text[1..name_end])));
    };

    let (init_offset, initializer) = trim_part((init_offset, &text[init_offset..]));
    if initializer.is_empty() {
        return Err(error(line, init_offset, ErrorCode::MissingInitializer));
    }

    Ok(StateDecl {
        name: CompactString::from(&text[1..name_end]),
        initializer: expression(line, initializer, init_offset)?,
        computed,
        line: line.number,
    })
}

/// `~ action`, `~ guard, guard |> action` or a fetch pipeline
fn parse_effect(line: &Line<'_>) -> Result<EffectDecl, CompileError> {
    let (offset, body) = trim_part((1, &line.text[1..]));
    if body.is_empty() {
        return Err(error(line, 0, ErrorCode::InvalidEffect).with_detail("empty effect"));
    }

    if body.starts_with("fetch(") {
        let pipeline = parse_fetch(line, body, offset)?;
        return Ok(EffectDecl {
            action: EffectAction::Fetch(pipeline),
            dependencies: Vec::new(),
            line: line.number,
        });
    }

    let Some(pipe) = find_top_level(body, PIPE) else {
        return Ok(EffectDecl {
            action: EffectAction::Expr(expression(line, body, offset)?),
            dependencies: Vec::new(),
            line: line.number,
        });
    };

    let mut dependencies = Vec::new();
    for part in split_top_level(&body[..pipe], ",") {
        let (at, source) = trim_part(part);
        if source.is_empty() {
            return Err(error(line, offset + at, ErrorCode::InvalidEffect)
                .with_detail("empty dependency before `|>`"));
        }
        dependencies.push(expression(line, source, offset + at)?);
    }

    let (at, action) = trim_part((pipe + PIPE.len(), &body[pipe + PIPE.len()..]));
    if action.is_empty() {
        return Err(error(line, offset + at, ErrorCode::InvalidEffect)
            .with_detail("missing action after `|>`"));
    }
    if let Some(extra) = find_top_level(action, PIPE) {
        return Err(error(line, offset + at + extra, ErrorCode::InvalidEffect)
            .with_detail("only fetch effects may chain `|>` stages"));
    }

    Ok(EffectDecl {
        action: EffectAction::Expr(expression(line, action, offset + at)?),
        dependencies,
        line: line.number,
    })
}

/// `fetch(url) |> json |> .data |> $target`
fn parse_fetch(line: &Line<'_>, body: &str, offset: usize) -> Result<FetchPipeline, CompileError> {
    let invalid = |at: usize, detail: &str| {
        error(line, offset + at, ErrorCode::InvalidFetchPipeline).with_detail(detail.to_string())
    };

    let parts: Vec<(usize, &str)> = split_top_level(body, PIPE).into_iter().map(trim_part).collect();
    let (_, call) = parts[0];
    let open = "fetch".len();
    if find_closing(call, open) != Some(call.len() - 1) {
        return Err(invalid(0, "expected `fetch(url)` at the start of the pipeline"));
    }
    let (url_at, url) = trim_part((open + 1, &call[open + 1..call.len() - 1]));
    if url.is_empty() {
        return Err(invalid(open, "fetch needs a url"));
    }
    let url = expression(line, url, offset + url_at)?;

    if parts.len() < 2 {
        return Err(invalid(body.len(), "a fetch pipeline must end in `|> $state`"));
    }

    let (target_at, target) = parts[parts.len() - 1];
    let target = match target.strip_prefix('$') {
        Some(name) if is_ident(name) => CompactString::from(name),
        _ => return Err(invalid(target_at, "a fetch pipeline must end in `|> $state`")),
    };

    let mut stages = Vec::new();
    for &(at, stage) in &parts[1..parts.len() - 1] {
        let stage = match stage {
            "json" => FetchStage::Json,
            "text" => FetchStage::Text,
            field if field.starts_with('.') => {
                let path: Vec<CompactString> =
                    field[1..].split('.').map(CompactString::from).collect();
                if !path.iter().all(|segment| is_ident(segment)) {
                    return Err(invalid(at, "invalid field projection"));
                }
                FetchStage::Field(path)
            }
            other => {
                return Err(invalid(
                    at,
                    &format!("unknown stage `{other}`, expected `json`, `text` or `.field`"),
                ))
            }
        };
        stages.push(stage);
    }

    Ok(FetchPipeline {
        source: CompactString::from(body),
        url,
        stages,
        target,
    })
}

/// `%name = definition`
fn parse_alias(line: &Line<'_>) -> Result<PreambleItem, CompileError> {
    let text = line.text;
    let name_len = ident_len(&text[1..]);
    if name_len == 0 {
        return Err(error(line, 1, ErrorCode::InvalidAlias).with_detail("expected an alias name"));
    }
    let name = &text[1..1 + name_len];
    let rest = text[1 + name_len..].trim_start();
    let Some(definition) = rest.strip_prefix('=') else {
        return Err(error(line, 1 + name_len, ErrorCode::InvalidAlias)
            .with_detail(format!("expected `=` after `%{name}`")));
    };
    let (def_at, definition) = trim_part((text.len() - definition.len(), definition));

    if definition.is_empty() {
        return Err(error(line, def_at, ErrorCode::InvalidAlias)
            .with_detail(format!("alias `%{name}` has an empty definition")));
    }
    if let Some(open) = find_content_open(definition) {
        return Err(error(line, def_at + open, ErrorCode::InvalidAlias)
            .with_detail("an alias can only stand for an element header"));
    }
    if let Err(err) = parse_header(definition) {
        return Err(error(line, def_at + err.offset, ErrorCode::InvalidAlias).with_detail(err.message));
    }

    Ok(PreambleItem::Alias {
        name: CompactString::from(name),
        definition: CompactString::from(definition),
    })
}
