//! Code generation context.

use rustc_hash::FxHashSet;

use crate::options::CodegenOptions;

/// Primitives the emitted module imports from the runtime library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuntimeHelper {
    Signal,
    Computed,
    Effect,
    OnMount,
    ReportError,
    H,
    Text,
    When,
    List,
    Navigate,
}

impl RuntimeHelper {
    /// Exported name in the runtime library
    pub fn name(&self) -> &'static str {
        match self {
            Self::Signal => "signal",
            Self::Computed => "computed",
            Self::Effect => "effect",
            Self::OnMount => "onMount",
            Self::ReportError => "reportError",
            Self::H => "h",
            Self::Text => "text",
            Self::When => "when",
            Self::List => "list",
            Self::Navigate => "navigate",
        }
    }

    /// Local alias, kept out of the way of user identifiers
    pub fn alias(&self) -> &'static str {
        match self {
            Self::Signal => "_signal",
            Self::Computed => "_computed",
            Self::Effect => "_effect",
            Self::OnMount => "_onMount",
            Self::ReportError => "_reportError",
            Self::H => "_h",
            Self::Text => "_text",
            Self::When => "_when",
            Self::List => "_list",
            Self::Navigate => "_navigate",
        }
    }
}

/// Code generation context using byte buffer for performance
pub struct CodegenContext {
    /// Generated code buffer (bytes)
    code: Vec<u8>,
    /// Current indentation level
    indent_level: u32,
    pub(crate) options: CodegenOptions,
    /// Helpers used during codegen
    used_helpers: FxHashSet<RuntimeHelper>,
}

impl CodegenContext {
    pub fn new(options: CodegenOptions) -> Self {
        Self {
            code: Vec::with_capacity(4096),
            indent_level: 0,
            options,
            used_helpers: FxHashSet::default(),
        }
    }

    #[inline]
    pub fn push(&mut self, code: &str) {
        self.code.extend_from_slice(code.as_bytes());
    }

    #[inline]
    pub fn push_line(&mut self, code: &str) {
        self.push(code);
        self.newline();
    }

    /// Add newline with proper indentation
    #[inline]
    pub fn newline(&mut self) {
        self.code.push(b'\n');
        for _ in 0..self.indent_level {
            self.code.extend_from_slice(b"  ");
        }
    }

    #[inline]
    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    #[inline]
    pub fn deindent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    /// Record the helper and return its local alias.
    #[inline]
    pub fn helper(&mut self, helper: RuntimeHelper) -> &'static str {
        self.used_helpers.insert(helper);
        helper.alias()
    }

    /// Push a helper's alias, recording its use.
    #[inline]
    pub fn push_helper(&mut self, helper: RuntimeHelper) {
        let alias = self.helper(helper);
        self.push(alias);
    }

    /// Run `f` and take back the code it pushed.
    pub fn capture(&mut self, f: impl FnOnce(&mut Self)) -> String {
        let start = self.code.len();
        f(self);
        let tail = self.code.split_off(start);
        String::from_utf8(tail).unwrap_or_default()
    }

    /// Used helpers in a stable order
    pub fn used_helpers(&self) -> Vec<RuntimeHelper> {
        let mut helpers: Vec<_> = self.used_helpers.iter().copied().collect();
        helpers.sort();
        helpers
    }

    pub fn into_code(self) -> String {
        // SAFETY: only valid UTF-8 strings are pushed
        unsafe { String::from_utf8_unchecked(self.code) }
    }
}
