//! `ParseOptions` and the JSX sub-config: the external surface callers
//! configure a parse with.

use bitflags::bitflags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Loader {
    Js,
    Jsx,
    Ts,
    Tsx,
}

impl Loader {
    pub fn enables_jsx(self) -> bool {
        matches!(self, Self::Jsx | Self::Tsx)
    }

    pub fn enables_typescript(self) -> bool {
        matches!(self, Self::Ts | Self::Tsx)
    }
}

bitflags! {
    /// Which ECMAScript features are *unavailable* in the compilation
    /// target; the lowerer rewrites anything flagged here.
    /// `FeatureSet::empty()` targets the newest supported grammar (nothing
    /// is rewritten); individual bits are set as the target gets older.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FeatureSet: u32 {
        const OPTIONAL_CHAIN       = 1 << 0;
        const NULLISH_COALESCING   = 1 << 1;
        const LOGICAL_ASSIGNMENT   = 1 << 2;
        const TEMPLATE_LITERAL     = 1 << 3;
        const CLASS_PRIVATE_FIELD  = 1 << 4;
        const CLASS_PUBLIC_FIELD   = 1 << 5;
        const CLASS_STATIC_BLOCK   = 1 << 6;
        const DESTRUCTURING        = 1 << 7;
        const REST_SPREAD          = 1 << 8;
        const FOR_OF               = 1 << 9;
        const EXPONENT_OPERATOR    = 1 << 10;
        const ASYNC_AWAIT          = 1 << 11;
        const GENERATOR            = 1 << 12;
        const ARROW_FUNCTION       = 1 << 13;
        const ANNEX_B_FUNCTION_IN_BLOCK = 1 << 14;
    }
}

impl FeatureSet {
    /// True when every feature is available in the target, i.e. there is
    /// nothing for the lowerer to rewrite.
    pub fn nothing_unsupported(self) -> bool {
        self.is_empty()
    }

    pub fn lacks(self, feature: FeatureSet) -> bool {
        self.contains(feature)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum JsxRuntime {
    Classic,
    Automatic,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct JsxOptions {
    pub factory: String,
    pub fragment: String,
    pub runtime: JsxRuntime,
    pub dev: bool,
    pub import_source: Option<String>,
    pub side_effects: bool,
}

impl Default for JsxOptions {
    fn default() -> Self {
        Self {
            factory: "React.createElement".to_string(),
            fragment: "React.Fragment".to_string(),
            runtime: JsxRuntime::Classic,
            dev: false,
            import_source: None,
            side_effects: false,
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParseOptions {
    pub loader: Loader,
    pub target_features: FeatureSet,
    pub mangle_syntax: bool,
    pub ascii_only: bool,
    pub jsx: JsxOptions,
    pub omit_runtime_for_tests: bool,
    /// Forces module mode (implicit `module` parsing goal).
    pub is_strict: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            loader: Loader::Js,
            target_features: FeatureSet::empty(),
            mangle_syntax: false,
            ascii_only: false,
            jsx: JsxOptions::default(),
            omit_runtime_for_tests: false,
            is_strict: false,
        }
    }
}

impl Default for Loader {
    fn default() -> Self {
        Loader::Js
    }
}

/// A `// @jsx h` / `// @jsxFrag f` / `// @jsxRuntime automatic` /
/// `// @jsxImportSource src` pragma comment, overriding `JsxOptions` for one
/// file. Found by [`scan_jsx_pragmas`] scanning the raw source text (a
/// file-level concern independent of the token stream), applied by
/// [`JsxOptions::apply_pragmas`] from `Parser::apply_jsx_pragmas` before any
/// JSX production is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsxPragma {
    Factory(String),
    Fragment(String),
    Runtime(JsxRuntimeChoice),
    ImportSource(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsxRuntimeChoice {
    Classic,
    Automatic,
}

/// Scans `source` line by line for JSX pragma comments, returning each
/// along with the source range of its argument (for diagnostic ranges).
/// Matched directly against the raw text rather than through the lexer:
/// pragmas are conventionally single-line `//` comments and a file-level
/// override, not syntax the grammar itself needs to recognize.
pub fn scan_jsx_pragmas(source: &str) -> Vec<(JsxPragma, jsc_rowan::TextRange)> {
    let base = source.as_ptr() as usize;
    let mut pragmas = Vec::new();
    for line in source.lines() {
        let comment = match line.trim_start().strip_prefix("//") {
            Some(rest) => rest,
            None => continue,
        };

        let (arg, build): (&str, fn(&str) -> Option<JsxPragma>) =
            if let Some(arg) = comment.strip_prefix("@jsxFrag ") {
                (arg, |s| Some(JsxPragma::Fragment(s.to_string())))
            } else if let Some(arg) = comment.strip_prefix("@jsxRuntime ") {
                (arg, |s| match s {
                    "classic" => Some(JsxPragma::Runtime(JsxRuntimeChoice::Classic)),
                    "automatic" => Some(JsxPragma::Runtime(JsxRuntimeChoice::Automatic)),
                    _ => None,
                })
            } else if let Some(arg) = comment.strip_prefix("@jsxImportSource ") {
                (arg, |s| Some(JsxPragma::ImportSource(s.to_string())))
            } else if let Some(arg) = comment.strip_prefix("@jsx ") {
                (arg, |s| Some(JsxPragma::Factory(s.to_string())))
            } else {
                continue;
            };

        let trimmed = arg.trim_end();
        let leading_ws = trimmed.len() - trimmed.trim_start().len();
        let value = &trimmed[leading_ws..];
        if value.is_empty() {
            continue;
        }
        if let Some(pragma) = build(value) {
            let start = (value.as_ptr() as usize - base) as u32;
            let end = start + value.len() as u32;
            pragmas.push((
                pragma,
                jsc_rowan::TextRange::new(start.into(), end.into()),
            ));
        }
    }
    pragmas
}

impl JsxOptions {
    /// Applies every pragma found by [`scan_jsx_pragmas`] in file order (a
    /// later pragma of the same kind wins), then checks the *final*
    /// resulting configuration for invalid combinations. Returns one
    /// warning message + range per invalid combination, for the caller to
    /// push into its diagnostic sink.
    pub fn apply_pragmas(
        &mut self,
        pragmas: &[(JsxPragma, jsc_rowan::TextRange)],
    ) -> Vec<(String, jsc_rowan::TextRange)> {
        let mut import_source_range = None;
        for (pragma, range) in pragmas {
            match pragma {
                JsxPragma::Factory(name) => self.factory = name.clone(),
                JsxPragma::Fragment(name) => self.fragment = name.clone(),
                JsxPragma::Runtime(JsxRuntimeChoice::Classic) => {
                    self.runtime = JsxRuntime::Classic;
                }
                JsxPragma::Runtime(JsxRuntimeChoice::Automatic) => {
                    self.runtime = JsxRuntime::Automatic;
                }
                JsxPragma::ImportSource(src) => {
                    self.import_source = Some(src.clone());
                    import_source_range = Some(*range);
                }
            }
        }

        let mut warnings = Vec::new();
        if self.runtime == JsxRuntime::Classic {
            if let Some(range) = import_source_range {
                warnings.push((
                    "@jsxImportSource has no effect combined with the classic JSX runtime"
                        .to_string(),
                    range,
                ));
            }
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_feature_set_targets_the_newest_grammar() {
        assert!(FeatureSet::empty().nothing_unsupported());
    }

    #[test]
    fn a_single_unsupported_feature_is_not_nothing_unsupported() {
        let features = FeatureSet::OPTIONAL_CHAIN;
        assert!(!features.nothing_unsupported());
        assert!(features.lacks(FeatureSet::OPTIONAL_CHAIN));
        assert!(!features.lacks(FeatureSet::NULLISH_COALESCING));
    }

    #[test]
    fn feature_flags_combine_independently() {
        let features = FeatureSet::OPTIONAL_CHAIN | FeatureSet::TEMPLATE_LITERAL;
        assert!(features.lacks(FeatureSet::OPTIONAL_CHAIN));
        assert!(features.lacks(FeatureSet::TEMPLATE_LITERAL));
        assert!(!features.lacks(FeatureSet::CLASS_PRIVATE_FIELD));
    }

    #[test]
    fn default_options_target_the_newest_grammar_with_mangling_off() {
        let options = ParseOptions::default();
        assert!(options.target_features.nothing_unsupported());
        assert!(!options.mangle_syntax);
        assert!(!options.is_strict);
        assert_eq!(options.loader, Loader::Js);
    }

    #[test]
    fn loader_enables_jsx_and_typescript_independently() {
        assert!(!Loader::Js.enables_jsx());
        assert!(Loader::Jsx.enables_jsx());
        assert!(!Loader::Jsx.enables_typescript());
        assert!(Loader::Tsx.enables_jsx());
        assert!(Loader::Tsx.enables_typescript());
        assert!(Loader::Ts.enables_typescript());
        assert!(!Loader::Ts.enables_jsx());
    }

    #[test]
    fn default_jsx_options_are_classic_react() {
        let jsx = JsxOptions::default();
        assert_eq!(jsx.runtime, JsxRuntime::Classic);
        assert_eq!(jsx.factory, "React.createElement");
        assert_eq!(jsx.fragment, "React.Fragment");
        assert!(!jsx.dev);
    }

    #[test]
    fn scans_all_four_pragma_forms() {
        let source = "// @jsx h\n// @jsxFrag Fragment\n// @jsxRuntime automatic\n// @jsxImportSource preact\nconst x = 1;\n";
        let pragmas = scan_jsx_pragmas(source);
        assert_eq!(pragmas.len(), 4);
        assert_eq!(pragmas[0].0, JsxPragma::Factory("h".to_string()));
        assert_eq!(pragmas[1].0, JsxPragma::Fragment("Fragment".to_string()));
        assert_eq!(
            pragmas[2].0,
            JsxPragma::Runtime(JsxRuntimeChoice::Automatic)
        );
        assert_eq!(
            pragmas[3].0,
            JsxPragma::ImportSource("preact".to_string())
        );
    }

    #[test]
    fn pragma_argument_range_points_at_the_argument_not_the_whole_line() {
        let source = "// @jsx h\n";
        let pragmas = scan_jsx_pragmas(source);
        let (_, range) = &pragmas[0];
        assert_eq!(&source[*range], "h");
    }

    #[test]
    fn unrecognized_jsx_runtime_value_is_ignored() {
        let pragmas = scan_jsx_pragmas("// @jsxRuntime weird\n");
        assert!(pragmas.is_empty());
    }

    #[test]
    fn non_pragma_comments_are_ignored() {
        let pragmas = scan_jsx_pragmas("// just a regular comment\nconst x = 1;\n");
        assert!(pragmas.is_empty());
    }

    #[test]
    fn applying_pragmas_overrides_defaults() {
        let mut jsx = JsxOptions::default();
        let pragmas = scan_jsx_pragmas("// @jsx h\n// @jsxFrag Frag\n// @jsxRuntime automatic\n");
        let warnings = jsx.apply_pragmas(&pragmas);
        assert!(warnings.is_empty());
        assert_eq!(jsx.factory, "h");
        assert_eq!(jsx.fragment, "Frag");
        assert_eq!(jsx.runtime, JsxRuntime::Automatic);
    }

    #[test]
    fn import_source_with_classic_runtime_warns() {
        let mut jsx = JsxOptions::default();
        let pragmas = scan_jsx_pragmas("// @jsxImportSource preact\n");
        let warnings = jsx.apply_pragmas(&pragmas);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].0.contains("classic"));
    }

    #[test]
    fn import_source_with_automatic_runtime_does_not_warn() {
        let mut jsx = JsxOptions::default();
        let pragmas = scan_jsx_pragmas(
            "// @jsxRuntime automatic\n// @jsxImportSource preact\n",
        );
        let warnings = jsx.apply_pragmas(&pragmas);
        assert!(warnings.is_empty());
    }

    #[test]
    fn later_runtime_pragma_clears_earlier_import_source_warning() {
        // The runtime pragma appearing *after* the import-source pragma in
        // the file still suppresses the warning: combinations are checked
        // against the final configuration, not pragma-by-pragma as they're
        // applied.
        let mut jsx = JsxOptions::default();
        let pragmas = scan_jsx_pragmas(
            "// @jsxImportSource preact\n// @jsxRuntime automatic\n",
        );
        let warnings = jsx.apply_pragmas(&pragmas);
        assert!(warnings.is_empty());
    }
}
