//! Class name classification and scoping.
//!
//! Classes are partitioned into utility classes, which pass through
//! untouched so a shared utility library applies uniformly, and local
//! classes, which receive the component's scope tag so two components may
//! both declare e.g. `container` without colliding.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use phf::phf_set;
use regex::Regex;

/// `prefix-[value]`, optionally negated
static ARBITRARY_VALUE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^-?[a-z][a-z0-9]*(?:-[a-z0-9]+)*-\[[^\[\]\s]+\]$").ok());

/// Complete utility class names.
static UTILITY_NAMES: phf::Set<&'static str> = phf_set! {
    "flex", "grid", "block", "inline", "inline-block", "inline-flex", "inline-grid",
    "hidden", "contents", "table", "static", "fixed", "absolute", "relative", "sticky",
    "visible", "invisible", "italic", "not-italic", "underline", "line-through",
    "no-underline", "uppercase", "lowercase", "capitalize", "truncate", "antialiased",
    "sr-only", "grow", "shrink", "border", "rounded", "shadow", "transition", "resize",
};

/// Utility prefixes, matched against the text before any `-`.
static UTILITY_PREFIXES: phf::Set<&'static str> = phf_set! {
    "p", "px", "py", "pt", "pr", "pb", "pl",
    "m", "mx", "my", "mt", "mr", "mb", "ml",
    "w", "h", "min-w", "min-h", "max-w", "max-h", "size",
    "gap", "space", "divide",
    "text", "font", "leading", "tracking", "whitespace", "break", "decoration",
    "bg", "from", "via", "to",
    "border", "rounded", "ring", "outline", "shadow", "opacity",
    "flex", "grid", "col", "row", "basis", "grow", "shrink", "order",
    "items", "justify", "content", "self", "place",
    "top", "right", "bottom", "left", "inset", "z",
    "overflow", "cursor", "select", "pointer-events",
    "transition", "duration", "ease", "delay", "animate",
    "scale", "rotate", "translate", "skew", "origin",
    "list", "fill", "stroke", "object", "aspect",
};

/// Whether `class` (variants stripped) names an arbitrary-value utility.
pub fn is_arbitrary_value(class: &str) -> bool {
    ARBITRARY_VALUE
        .as_ref()
        .is_some_and(|re| re.is_match(class))
}

/// Whether `class` (variants stripped) is a recognized utility class.
pub fn is_utility(class: &str) -> bool {
    let class = class.strip_prefix('-').unwrap_or(class);
    if UTILITY_NAMES.contains(class) {
        return true;
    }
    class
        .match_indices('-')
        .any(|(pos, _)| UTILITY_PREFIXES.contains(&class[..pos]))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Utility,
    Arbitrary,
    Local,
}

/// Split `md:hover:bg-[#fff]` into its variants and the base class. Colons
/// inside brackets belong to the value.
pub fn split_variants(class: &str) -> (Vec<&str>, &str) {
    let mut variants = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, b) in class.bytes().enumerate() {
        match b {
            b'[' => depth += 1,
            b']' => depth = depth.saturating_sub(1),
            b':' if depth == 0 => {
                variants.push(&class[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    (variants, &class[start..])
}

pub fn classify(class: &str) -> ClassKind {
    let (_, base) = split_variants(class);
    if is_arbitrary_value(base) {
        ClassKind::Arbitrary
    } else if is_utility(base) {
        ClassKind::Utility
    } else {
        ClassKind::Local
    }
}

/// The class as it appears in the rendered output.
pub fn scope_class<'c>(class: &'c str, scope_tag: &str) -> Cow<'c, str> {
    match classify(class) {
        ClassKind::Local => Cow::Owned(format!("{class}-{scope_tag}")),
        ClassKind::Utility | ClassKind::Arbitrary => Cow::Borrowed(class),
    }
}
