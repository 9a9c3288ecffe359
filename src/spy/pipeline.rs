//! Compile and inspect entry points
//!
//! ```rust,ignore
//! use fiber_spy::spy::pipeline::{compile, inspect_source};
//!
//! let compiled = compile(source, "/src/app.jsx", &InstrumentOptions::default())?;
//! println!("{}", compiled.code);
//!
//! let inspection = inspect_source(source, "/src/app.jsx", "App", props, &options)?;
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::spy::bridge::{DevtoolsHook, FiberSpy};
use crate::spy::formats::{print_module, FormatError};
use crate::spy::host::{Document, RenderError, Renderer};
use crate::spy::instrument::{instrument, GeneratedNames, InstrumentOptions, InstrumentReport, OptionsError};
use crate::spy::runtime::{Element, ElementType, EvalError, Interpreter, ModuleInstance, Value};
use crate::spy::syntax::{parse_module, Module, ParseError};
use crate::spy::walker::DomFrameworkStructure;

#[derive(Error, Debug)]
pub enum SpyError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid instrumentation options: {0}")]
    Options(#[from] OptionsError),

    #[error("evaluation failed: {0}")]
    Eval(#[from] EvalError),

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("module has no export named '{0}'")]
    MissingExport(String),
}

/// An instrumented module and its printed source
#[derive(Debug, Clone)]
pub struct Compiled {
    pub module: Module,
    pub code: String,
    pub names: GeneratedNames,
    pub report: InstrumentReport,
}

/// Parse and instrument `source`
pub fn compile(source: &str, file_name: &str, options: &InstrumentOptions) -> Result<Compiled, SpyError> {
    options.validate()?;
    let module = parse_module(source)?;
    let instrumented = instrument(module, source, file_name, options);
    let code = print_module(&instrumented.module);
    info!(
        file = %file_name,
        elements = instrumented.report.elements_annotated,
        children = instrumented.report.children_wrapped(),
        "compiled"
    );
    Ok(Compiled {
        module: instrumented.module,
        code,
        names: instrumented.names,
        report: instrumented.report,
    })
}

pub fn read_source(path: &Path) -> Result<String, SpyError> {
    fs::read_to_string(path).map_err(|source| SpyError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Compile a file; its path is used as the recorded file name
pub fn compile_file(path: &Path, options: &InstrumentOptions) -> Result<Compiled, SpyError> {
    let source = read_source(path)?;
    compile(&source, &path.to_string_lossy(), options)
}

/// What to render for an export: elements as is, components with `props`
pub fn element_for_export(export: &Value, props: Value) -> Value {
    match export {
        Value::Function(function) => {
            let props = match props {
                Value::Object(fields) => (*fields).clone(),
                _ => Default::default(),
            };
            Value::element(Element::new(ElementType::Component(function.clone()), props))
        }
        other => other.clone(),
    }
}

/// Result of rendering one export into a fresh document
pub struct Inspection {
    pub structures: Vec<DomFrameworkStructure>,
    pub document: Document,
    pub html: String,
}

/// Compile, evaluate and render `export`, then rebuild its structure
pub fn inspect_source(
    source: &str,
    file_name: &str,
    export: &str,
    props: Value,
    options: &InstrumentOptions,
) -> Result<Inspection, SpyError> {
    let compiled = compile(source, file_name, options)?;
    let instance: ModuleInstance = Interpreter::new().load(&compiled.module)?;
    let value = instance
        .export(export)
        .ok_or_else(|| SpyError::MissingExport(export.to_string()))?;

    let hook = DevtoolsHook::new();
    let (spy, _driver) = FiberSpy::attach(&hook);
    let renderer = Renderer::new(&hook);
    let root = renderer.create_container();
    renderer.render(&element_for_export(value, props), &root)?;

    let structures = spy.get_current_structure(None).unwrap_or_default();
    let document = renderer.document().replace(Document::new());
    let html = document.to_html(root.container());
    Ok(Inspection {
        structures,
        document,
        html,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_compile_prints_instrumented_code() {
        let compiled = compile("const a = <b>x</b>", "/a.jsx", &InstrumentOptions::default())
            .expect("compiles");
        assert!(compiled.code.starts_with("const __jsxFileName = \"/a.jsx\";\n"));
        assert!(compiled.code.contains("wcs_wrap_expression({ fileName: __jsxFileName"));
        assert_eq!(compiled.report.texts_wrapped, 1);
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        let options = InstrumentOptions {
            stack_binding: "not an identifier".to_string(),
            ..InstrumentOptions::default()
        };
        assert!(matches!(
            compile("const a = 1", "/a.jsx", &options),
            Err(SpyError::Options(_))
        ));
    }

    #[test]
    fn test_parse_errors_surface() {
        let err = compile("const = 1", "/a.jsx", &InstrumentOptions::default()).unwrap_err();
        assert!(matches!(err, SpyError::Parse(_)));
    }

    #[test]
    fn test_inspect_component_export() {
        let mut props = BTreeMap::new();
        props.insert("t".to_string(), Value::from("hey"));
        let inspection = inspect_source(
            "export const App = (props) => <p>{props.t}</p>",
            "/app.jsx",
            "App",
            Value::object(props),
            &InstrumentOptions::default(),
        )
        .expect("inspects");
        assert_eq!(inspection.html, "<p>hey</p>");
        assert_eq!(inspection.structures.len(), 1);

        let missing = inspect_source(
            "export const App = () => null",
            "/app.jsx",
            "Other",
            Value::Null,
            &InstrumentOptions::default(),
        );
        assert!(matches!(missing, Err(SpyError::MissingExport(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = compile_file(Path::new("/definitely/not/here.jsx"), &InstrumentOptions::default())
            .unwrap_err();
        assert!(err.to_string().starts_with("failed to read /definitely/not/here.jsx"));
    }
}
