//! JSX/TSX to JavaScript compilation with oxc.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use oxc::allocator::Allocator;
use oxc::codegen::Codegen;
use oxc::diagnostics::OxcDiagnostic;
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::transformer::{JsxRuntime, TransformOptions, Transformer};

use crate::config::TransformConfig;

/// A source-to-source compiler usable from the worker thread.
pub trait Compile: Send {
    /// Compile one snippet. Errors carry the compiler's own message.
    fn compile(&self, source: &str) -> Result<String, String>;
}

/// Builds the worker's compiler on first use.
pub type CompilerLoader =
    Box<dyn FnOnce(&TransformConfig) -> Result<Box<dyn Compile>, String> + Send>;

/// Loader for the oxc compiler.
pub fn oxc_loader() -> CompilerLoader {
    Box::new(|config| OxcCompiler::load(config).map(|c| Box::new(c) as Box<dyn Compile>))
}

/// oxc pipeline: parser, semantic analysis, transformer (classic JSX
/// runtime, TypeScript stripping) and codegen.
pub struct OxcCompiler {
    options: TransformOptions,
    source_type: SourceType,
    source_path: &'static Path,
}

impl OxcCompiler {
    pub fn load(config: &TransformConfig) -> Result<Self, String> {
        for pragma in [&config.pragma, &config.pragma_frag] {
            if !is_member_expression(pragma) {
                return Err(format!("invalid JSX pragma `{pragma}`"));
            }
        }

        let mut options = TransformOptions::default();
        options.jsx.runtime = JsxRuntime::Classic;
        options.jsx.pragma = Some(config.pragma.clone());
        options.jsx.pragma_frag = Some(config.pragma_frag.clone());

        let (source_type, source_path) = if config.typescript {
            (SourceType::tsx(), Path::new("component.tsx"))
        } else {
            (SourceType::jsx(), Path::new("component.jsx"))
        };

        Ok(Self {
            options,
            source_type,
            source_path,
        })
    }
}

impl Compile for OxcCompiler {
    fn compile(&self, source: &str) -> Result<String, String> {
        let allocator = Allocator::default();

        let parsed = Parser::new(&allocator, source, self.source_type).parse();
        if !parsed.errors.is_empty() {
            return Err(join_diagnostics(&parsed.errors));
        }
        let mut program = parsed.program;

        let semantic = SemanticBuilder::new()
            .with_check_syntax_error(true)
            .build(&program);
        if !semantic.errors.is_empty() {
            return Err(join_diagnostics(&semantic.errors));
        }
        let scoping = semantic.semantic.into_scoping();

        let transformed = Transformer::new(&allocator, self.source_path, &self.options)
            .build_with_scoping(scoping, &mut program);
        if !transformed.errors.is_empty() {
            return Err(join_diagnostics(&transformed.errors));
        }

        Ok(Codegen::new().build(&program).code)
    }
}

/// Run `compile`, turning a compiler panic into an ordinary error.
pub fn compile_guarded(compiler: &dyn Compile, source: &str) -> Result<String, String> {
    catch_unwind(AssertUnwindSafe(|| compiler.compile(source))).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_owned());
        Err(format!("compiler panicked: {reason}"))
    })
}

fn join_diagnostics(errors: &[OxcDiagnostic]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// `React.createElement`, `h`, `Preact.h` ...
fn is_member_expression(pragma: &str) -> bool {
    !pragma.is_empty()
        && pragma.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiler() -> OxcCompiler {
        OxcCompiler::load(&TransformConfig::default()).unwrap()
    }

    #[test]
    fn test_compiles_jsx_to_create_element() {
        let out = compiler()
            .compile("export default function App() { return <div className=\"x\">hi</div>; }")
            .unwrap();
        assert!(out.contains("React.createElement(\"div\""));
        assert!(out.contains("export default function App"));
        assert!(!out.contains("<div"));
    }

    #[test]
    fn test_fragments_use_pragma_frag() {
        let out = compiler().compile("export default () => <><b /></>;").unwrap();
        assert!(out.contains("React.Fragment"));
    }

    #[test]
    fn test_strips_typescript() {
        let out = compiler()
            .compile("type P = { n: number };\nexport default (p: P): JSX.Element => <i>{p.n}</i>;")
            .unwrap();
        assert!(!out.contains("type P"));
        assert!(!out.contains(": P"));
    }

    #[test]
    fn test_syntax_error_message() {
        let err = compiler().compile("export default function( {").unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn test_invalid_pragma_fails_to_load() {
        let config = TransformConfig {
            pragma: "h(".into(),
            ..TransformConfig::default()
        };
        let err = OxcCompiler::load(&config).err().unwrap();
        assert_eq!(err, "invalid JSX pragma `h(`");
    }

    struct Panicking;

    impl Compile for Panicking {
        fn compile(&self, _: &str) -> Result<String, String> {
            panic!("internal compiler error")
        }
    }

    #[test]
    fn test_panic_is_caught() {
        let err = compile_guarded(&Panicking, "x").unwrap_err();
        assert_eq!(err, "compiler panicked: internal compiler error");
    }
}
