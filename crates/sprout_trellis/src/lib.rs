//! Trellis - The indentation-sensitive component parser for Sprout.
//!
//! A component source has two phases: a preamble of state (`$name:value`,
//! `$name := expr`), effect (`~ action`) and alias (`%name = header`)
//! declarations, then a `---` separator followed by indentation-nested
//! markup. Parsing is all or nothing: the first unrecognized construct fails
//! the unit with a positional [`CompileError`].
//!
//! # Example
//!
//! ```
//! use sprout_trellis::{parse, Bump, Node};
//!
//! let allocator = Bump::new();
//! let source = "$count:0\n---\nh1[\"Count: @{$count}\"]";
//! let component = parse(&allocator, source).unwrap();
//! assert_eq!(component.states.len(), 1);
//! assert!(matches!(component.nodes[0], Node::Element(_)));
//! ```

mod bindings;
mod header;
mod inline;
mod lines;
mod parser;
mod preamble;
mod text;

pub use header::{find_content_open, DEFAULT_TAG};
pub use inline::{DEFAULT_EVENT, NAV_EVENT};
pub use parser::{Parser, ParserOptions, SEPARATOR};
pub use preamble::PIPE;

pub use sprout_seed::{Bump, CompileError, Component, ErrorCode, Node};

/// Parse a component source
pub fn parse<'a>(allocator: &'a Bump, source: &str) -> Result<Component<'a>, CompileError> {
    parse_with_options(allocator, source, ParserOptions::default())
}

/// Parse a component source with options
pub fn parse_with_options<'a>(
    allocator: &'a Bump,
    source: &str,
    options: ParserOptions,
) -> Result<Component<'a>, CompileError> {
    let result = Parser::with_options(allocator, source, options).parse();
    match &result {
        Ok(component) => tracing::debug!(
            states = component.states.len(),
            effects = component.effects.len(),
            nodes = component.nodes.len(),
            imports = component.imports.len(),
            "parsed component"
        ),
        Err(err) => tracing::debug!(line = err.line, column = err.column, "parse failed: {}", err.detail),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprout_seed::AttributeValue;

    #[test]
    fn test_parse_simple_element() {
        let allocator = Bump::new();
        let component = parse(&allocator, "---\nh1.title#main[\"Hello\"]").unwrap();

        assert_eq!(component.nodes.len(), 1);
        if let Node::Element(el) = &component.nodes[0] {
            assert_eq!(el.tag, "h1");
            assert_eq!(el.classes.as_slice(), ["title"]);
            assert_eq!(el.id.as_deref(), Some("main"));
            assert_eq!(el.children[0], Node::Text("Hello".into()));
            assert_eq!(el.line, 2);
        } else {
            panic!("Expected element node");
        }
    }

    #[test]
    fn test_attributes_are_lifted() {
        let allocator = Bump::new();
        let source = "a[href{\"/docs\"} !click(log(1)) \"Docs\"]\n  title{String(1)}";
        let component = parse(&allocator, source).unwrap();

        let Node::Element(el) = &component.nodes[0] else {
            panic!("Expected element node");
        };
        assert_eq!(el.attributes.len(), 2);
        assert_eq!(el.attributes[0].value, AttributeValue::Static("/docs".into()));
        assert!(el.attributes[1].is_dynamic());
        assert_eq!(el.children.len(), 2);
        assert!(matches!(el.children[0], Node::Event(_)));
        assert!(matches!(el.children[1], Node::Text(_)));
    }

    #[test]
    fn test_source_without_separator_is_markup() {
        let allocator = Bump::new();
        let component = parse(&allocator, "div\n  p[\"x\"]").unwrap();
        assert!(component.states.is_empty());
        assert_eq!(component.nodes.len(), 1);

        let err = parse(&allocator, "$count:0\nh1[$count]").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnexpectedContent);
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_legacy_layout() {
        let allocator = Bump::new();
        let options = ParserOptions {
            legacy_layout: true,
        };
        let source = "$count:0\n~ log($count)\n\nh1[$count]";
        let component = parse_with_options(&allocator, source, options).unwrap();
        assert_eq!(component.states.len(), 1);
        assert_eq!(component.effects.len(), 1);
        assert_eq!(component.nodes.len(), 1);
    }

    #[test]
    fn test_error_display() {
        let allocator = Bump::new();
        let err = parse(&allocator, "---\ndiv\n  p[\"open").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnterminatedString);
        insta::assert_snapshot!(err.to_string(), @"line 3, column 5: Unterminated text literal.");
    }
}
