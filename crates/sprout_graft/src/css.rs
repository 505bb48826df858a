//! Style sheet emission.
//!
//! Every distinct local class gets one scoped rule, empty of declarations.
//! Every distinct arbitrary-value class gets a synthesized rule mapping its
//! bracketed value onto the properties its prefix stands for. Variant
//! prefixes become pseudo-classes or media queries.
//!
//! Minification goes through LightningCSS when the `native` feature is
//! enabled and is a passthrough otherwise.

#[cfg(feature = "native")]
use lightningcss::printer::PrinterOptions;
#[cfg(feature = "native")]
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, StyleSheet as CssStyleSheet};
use phf::phf_map;
use rustc_hash::FxHashSet;

use crate::classes::{classify, is_arbitrary_value, split_variants, ClassKind};

/// Prefixes whose value maps onto fixed properties, space separated.
static ARBITRARY_PROPERTIES: phf::Map<&'static str, &'static str> = phf_map! {
    "w" => "width",
    "h" => "height",
    "size" => "width height",
    "min-w" => "min-width",
    "min-h" => "min-height",
    "max-w" => "max-width",
    "max-h" => "max-height",
    "p" => "padding",
    "px" => "padding-left padding-right",
    "py" => "padding-top padding-bottom",
    "pt" => "padding-top",
    "pr" => "padding-right",
    "pb" => "padding-bottom",
    "pl" => "padding-left",
    "m" => "margin",
    "mx" => "margin-left margin-right",
    "my" => "margin-top margin-bottom",
    "mt" => "margin-top",
    "mr" => "margin-right",
    "mb" => "margin-bottom",
    "ml" => "margin-left",
    "gap" => "gap",
    "gap-x" => "column-gap",
    "gap-y" => "row-gap",
    "top" => "top",
    "right" => "right",
    "bottom" => "bottom",
    "left" => "left",
    "inset" => "inset",
    "z" => "z-index",
    "bg" => "background-color",
    "rounded" => "border-radius",
    "leading" => "line-height",
    "tracking" => "letter-spacing",
    "opacity" => "opacity",
    "shadow" => "box-shadow",
    "basis" => "flex-basis",
    "grid-cols" => "grid-template-columns",
    "grid-rows" => "grid-template-rows",
    "aspect" => "aspect-ratio",
    "duration" => "transition-duration",
    "fill" => "fill",
    "stroke" => "stroke",
    "content" => "content",
};

/// Variants that become pseudo-classes or pseudo-elements.
static PSEUDO_VARIANTS: phf::Map<&'static str, &'static str> = phf_map! {
    "hover" => ":hover",
    "focus" => ":focus",
    "focus-within" => ":focus-within",
    "focus-visible" => ":focus-visible",
    "active" => ":active",
    "visited" => ":visited",
    "disabled" => ":disabled",
    "checked" => ":checked",
    "first" => ":first-child",
    "last" => ":last-child",
    "odd" => ":nth-child(odd)",
    "even" => ":nth-child(even)",
    "placeholder" => "::placeholder",
    "before" => "::before",
    "after" => "::after",
};

/// Variants that become media query conditions.
static MEDIA_VARIANTS: phf::Map<&'static str, &'static str> = phf_map! {
    "sm" => "(min-width: 640px)",
    "md" => "(min-width: 768px)",
    "lg" => "(min-width: 1024px)",
    "xl" => "(min-width: 1280px)",
    "2xl" => "(min-width: 1536px)",
    "dark" => "(prefers-color-scheme: dark)",
    "print" => "print",
};

const COLOR_FUNCTIONS: &[&str] = &[
    "rgb(", "rgba(", "hsl(", "hsla(", "hwb(", "lab(", "lch(", "oklab(", "oklch(", "color(",
];

/// Whether an arbitrary value is shaped like a color literal.
pub fn looks_like_color(value: &str) -> bool {
    value.starts_with('#') || COLOR_FUNCTIONS.iter().any(|f| value.starts_with(f))
}

/// Properties and value for an arbitrary-value class without variants, or
/// `None` when its prefix is unknown.
pub fn arbitrary_declarations(class: &str) -> Option<(Vec<&'static str>, String)> {
    if !is_arbitrary_value(class) {
        return None;
    }
    let (negative, class) = match class.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, class),
    };
    let open = class.find("-[")?;
    let prefix = &class[..open];
    // Underscores stand in for spaces
    let raw = class[open + 2..class.len() - 1].replace('_', " ");
    let value = if negative { format!("-{raw}") } else { raw };

    let properties: &'static str = match prefix {
        "text" if looks_like_color(&value) => "color",
        "text" => "font-size",
        "border" if looks_like_color(&value) => "border-color",
        "border" => "border-width",
        "bg" if value.starts_with("url(") => "background-image",
        _ => ARBITRARY_PROPERTIES.get(prefix).copied()?,
    };
    Some((properties.split(' ').collect(), value))
}

/// Escape a class name for use in a selector.
pub fn escape_class(class: &str) -> String {
    let mut out = String::with_capacity(class.len() + 8);
    for (i, c) in class.chars().enumerate() {
        if i == 0 && c.is_ascii_digit() {
            out.push_str(&format!("\\{:x} ", c as u32));
        } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

#[derive(Debug)]
struct Rule {
    media: Option<String>,
    selector: String,
    declarations: Vec<(&'static str, String)>,
}

/// Collects the rules of one component's style sheet in order of first use.
#[derive(Debug)]
pub struct StyleSheet {
    scope_tag: String,
    seen: FxHashSet<String>,
    rules: Vec<Rule>,
}

impl StyleSheet {
    pub fn new(scope_tag: impl Into<String>) -> Self {
        Self {
            scope_tag: scope_tag.into(),
            seen: FxHashSet::default(),
            rules: Vec::new(),
        }
    }

    /// Record a declared class. Utility classes emit nothing.
    pub fn add_class(&mut self, class: &str) {
        if self.seen.contains(class) {
            return;
        }
        match classify(class) {
            ClassKind::Utility => return,
            ClassKind::Local => self.rules.push(Rule {
                media: None,
                selector: format!(".{}", escape_class(&format!("{class}-{}", self.scope_tag))),
                declarations: Vec::new(),
            }),
            ClassKind::Arbitrary => match arbitrary_rule(class) {
                Some(rule) => self.rules.push(rule),
                None => tracing::debug!(class, "no rule for arbitrary-value class"),
            },
        }
        self.seen.insert(class.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn to_css(&self) -> String {
        let mut out = String::new();
        for rule in &self.rules {
            let indent = if rule.media.is_some() { "  " } else { "" };
            if let Some(media) = &rule.media {
                out.push_str("@media ");
                out.push_str(media);
                out.push_str(" {\n");
            }
            out.push_str(indent);
            out.push_str(&rule.selector);
            if rule.declarations.is_empty() {
                out.push_str(" {}\n");
            } else {
                out.push_str(" {\n");
                for (property, value) in &rule.declarations {
                    out.push_str(indent);
                    out.push_str("  ");
                    out.push_str(property);
                    out.push_str(": ");
                    out.push_str(value);
                    out.push_str(";\n");
                }
                out.push_str(indent);
                out.push_str("}\n");
            }
            if rule.media.is_some() {
                out.push_str("}\n");
            }
        }
        out
    }
}

fn arbitrary_rule(class: &str) -> Option<Rule> {
    let (variants, base) = split_variants(class);
    let (properties, value) = arbitrary_declarations(base)?;

    let mut selector = format!(".{}", escape_class(class));
    let mut media = Vec::new();
    for variant in variants {
        if let Some(pseudo) = PSEUDO_VARIANTS.get(variant) {
            selector.push_str(pseudo);
        } else if let Some(query) = MEDIA_VARIANTS.get(variant) {
            media.push(*query);
        } else {
            tracing::debug!(class, variant, "unknown variant");
            return None;
        }
    }

    Some(Rule {
        media: (!media.is_empty()).then(|| media.join(" and ")),
        selector,
        declarations: properties.iter().map(|p| (*p, value.clone())).collect(),
    })
}

/// Style sheet processing failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CssError {
    #[error("CSS parse error: {0}")]
    Parse(String),
    #[error("CSS minify error: {0}")]
    Minify(String),
    #[error("CSS print error: {0}")]
    Print(String),
}

/// Minify a style sheet with LightningCSS.
#[cfg(feature = "native")]
pub fn minify_css(css: &str) -> Result<String, CssError> {
    let mut stylesheet = CssStyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| CssError::Parse(e.to_string()))?;
    stylesheet
        .minify(MinifyOptions::default())
        .map_err(|e| CssError::Minify(format!("{e:?}")))?;
    let printed = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .map_err(|e| CssError::Print(format!("{e:?}")))?;
    Ok(printed.code)
}

/// Minification passthrough (no LightningCSS)
#[cfg(not(feature = "native"))]
pub fn minify_css(css: &str) -> Result<String, CssError> {
    Ok(css.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_heuristic() {
        let (properties, value) = arbitrary_declarations("text-[#ff0000]").unwrap();
        assert_eq!(properties, ["color"]);
        assert_eq!(value, "#ff0000");

        let (properties, _) = arbitrary_declarations("text-[rgb(0,0,0)]").unwrap();
        assert_eq!(properties, ["color"]);

        let (properties, value) = arbitrary_declarations("text-[22px]").unwrap();
        assert_eq!(properties, ["font-size"]);
        assert_eq!(value, "22px");
    }

    #[test]
    fn test_border_heuristic() {
        let (properties, _) = arbitrary_declarations("border-[#ccc]").unwrap();
        assert_eq!(properties, ["border-color"]);
        let (properties, _) = arbitrary_declarations("border-[3px]").unwrap();
        assert_eq!(properties, ["border-width"]);
    }

    #[test]
    fn test_value_shapes() {
        let (properties, value) = arbitrary_declarations("grid-cols-[1fr_2fr]").unwrap();
        assert_eq!(properties, ["grid-template-columns"]);
        assert_eq!(value, "1fr 2fr");

        let (_, value) = arbitrary_declarations("-mt-[4px]").unwrap();
        assert_eq!(value, "-4px");

        assert!(arbitrary_declarations("wobble-[3px]").is_none());
        assert!(arbitrary_declarations("w-4").is_none());
    }

    #[test]
    fn test_escape_class() {
        assert_eq!(escape_class("w-[32px]"), r"w-\[32px\]");
        assert_eq!(escape_class("hover:bg-[#fff]"), r"hover\:bg-\[\#fff\]");
        assert_eq!(escape_class("2xl:p-4"), r"\32 xl\:p-4");
    }

    #[test]
    fn test_stylesheet() {
        let mut sheet = StyleSheet::new("k3j9x0");
        sheet.add_class("card");
        sheet.add_class("p-4");
        sheet.add_class("w-[32px]");
        sheet.add_class("card");
        sheet.add_class("hover:text-[#333]");
        sheet.add_class("md:px-[10px]");
        insta::assert_snapshot!(sheet.to_css(), @r"
        .card-k3j9x0 {}
        .w-\[32px\] {
          width: 32px;
        }
        .hover\:text-\[\#333\]:hover {
          color: #333;
        }
        @media (min-width: 768px) {
          .md\:px-\[10px\] {
            padding-left: 10px;
            padding-right: 10px;
          }
        }
        ");
    }

    #[test]
    fn test_unknown_variant_skipped() {
        let mut sheet = StyleSheet::new("k3j9x0");
        sheet.add_class("wiggle:w-[2px]");
        assert!(sheet.is_empty());
    }

    #[test]
    #[cfg(feature = "native")]
    fn test_minify() {
        let css = ".a {\n  width: 32px;\n}\n";
        let minified = minify_css(css).unwrap();
        assert_eq!(minified, ".a{width:32px}");
    }
}
