//! Testing utilities
//!
//! - [`location_of`] computes the location the instrumentation pass records
//!   for a piece of source text, so tests never hard-code offsets.
//! - [`Harness`] compiles, evaluates and renders a module against a live
//!   bridge.
//! - [`assert_structures`] is a fluent assertion API over reconstructed
//!   structures:
//!
//! ```rust,ignore
//! assert_structures(&structures)
//!     .count(1)
//!     .entry(0, |entry| {
//!         entry
//!             .component(0, |c| {
//!                 c.named("div").at(&location_of(SOURCE, "<div>...</div>"));
//!             })
//!             .child(1, |child| {
//!                 child.component_names(&[None, Some("text-node")]);
//!             });
//!     });
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::spy::bridge::{BridgeDriver, DevtoolsHook, FiberSpy};
use crate::spy::host::{Document, FiberRoot, NodeId, Renderer};
use crate::spy::instrument::InstrumentOptions;
use crate::spy::pipeline::{compile, element_for_export, SpyError};
use crate::spy::runtime::{Interpreter, ModuleInstance, SourceLocation, StackHandle, Value};
use crate::spy::syntax::position::LineIndex;
use crate::spy::walker::{ComponentInfo, DomFrameworkStructure};

pub const TEST_FILE: &str = "/src/test-file.jsx";

/// Location of the first occurrence of `needle` in `source`
///
/// Panics when `needle` does not occur; meant for tests only.
pub fn location_of(source: &str, needle: &str) -> SourceLocation {
    location_in(source, needle, TEST_FILE)
}

pub fn location_in(source: &str, needle: &str, file_name: &str) -> SourceLocation {
    let start = source
        .find(needle)
        .unwrap_or_else(|| panic!("{:?} not found in source", needle));
    let end = start + needle.len();
    let index = LineIndex::new(source);
    SourceLocation::new(
        file_name,
        index.line_number(start),
        index.normalized(start) as i64,
        index.normalized(end) as i64,
    )
}

/// Compile with default options and evaluate
pub fn compile_and_load(source: &str, file_name: &str) -> Result<ModuleInstance, SpyError> {
    let compiled = compile(source, file_name, &InstrumentOptions::default())?;
    Ok(Interpreter::new().load(&compiled.module)?)
}

/// A hook, one renderer with one container, and a bridge attached to them
pub struct Harness {
    pub hook: DevtoolsHook,
    pub renderer: Renderer,
    pub root: FiberRoot,
    pub spy: FiberSpy,
    pub driver: BridgeDriver,
    stack: StackHandle,
}

impl Harness {
    pub fn new() -> Self {
        let hook = DevtoolsHook::new();
        let (spy, driver) = FiberSpy::attach(&hook);
        let renderer = Renderer::new(&hook);
        let root = renderer.create_container();
        Self {
            hook,
            renderer,
            root,
            spy,
            driver,
            stack: StackHandle::new(),
        }
    }

    /// Evaluate `source`; every module loaded by one harness shares a stack
    pub fn load(&self, source: &str, file_name: &str) -> Result<ModuleInstance, SpyError> {
        let compiled = compile(source, file_name, &InstrumentOptions::default())?;
        Ok(Interpreter::with_shared_stack(self.stack.clone()).load(&compiled.module)?)
    }

    /// Render export `name` of `source` (in [`TEST_FILE`]) with `props`
    pub fn render_export(&self, source: &str, name: &str, props: Value) -> Result<(), SpyError> {
        let instance = self.load(source, TEST_FILE)?;
        let export = instance
            .export(name)
            .ok_or_else(|| SpyError::MissingExport(name.to_string()))?;
        self.render(&element_for_export(export, props))
    }

    pub fn render(&self, element: &Value) -> Result<(), SpyError> {
        self.renderer.render(element, &self.root)?;
        Ok(())
    }

    pub fn structure(&self) -> Option<Vec<DomFrameworkStructure>> {
        self.spy.get_current_structure(None)
    }

    pub fn document(&self) -> Rc<RefCell<Document>> {
        self.renderer.document()
    }

    pub fn html(&self) -> String {
        self.document().borrow().to_html(self.root.container())
    }

    pub fn stack(&self) -> &StackHandle {
        &self.stack
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn assert_structures(structures: &[DomFrameworkStructure]) -> StructuresAssertion<'_> {
    StructuresAssertion { structures }
}

pub struct StructuresAssertion<'a> {
    structures: &'a [DomFrameworkStructure],
}

impl<'a> StructuresAssertion<'a> {
    pub fn count(self, expected: usize) -> Self {
        assert_eq!(
            self.structures.len(),
            expected,
            "expected {} structures, found {}",
            expected,
            self.structures.len()
        );
        self
    }

    pub fn entry(self, index: usize, check: impl FnOnce(StructureAssertion<'a>)) -> Self {
        let structure = self
            .structures
            .get(index)
            .unwrap_or_else(|| panic!("no structure at index {}", index));
        check(StructureAssertion { structure });
        self
    }
}

pub struct StructureAssertion<'a> {
    structure: &'a DomFrameworkStructure,
}

impl<'a> StructureAssertion<'a> {
    pub fn node(self, expected: NodeId) -> Self {
        assert_eq!(self.structure.node, Some(expected), "unexpected node");
        self
    }

    pub fn child_count(self, expected: usize) -> Self {
        assert_eq!(
            self.structure.children.len(),
            expected,
            "expected {} children, found {}",
            expected,
            self.structure.children.len()
        );
        self
    }

    pub fn child(self, index: usize, check: impl FnOnce(StructureAssertion<'a>)) -> Self {
        let structure = self
            .structure
            .children
            .get(index)
            .unwrap_or_else(|| panic!("no child at index {}", index));
        check(StructureAssertion { structure });
        self
    }

    /// Component names in order; `None` for anonymous fibers
    pub fn component_names(self, expected: &[Option<&str>]) -> Self {
        let names: Vec<Option<&str>> = self
            .structure
            .components
            .iter()
            .map(|info| info.component.name())
            .collect();
        assert_eq!(names, expected, "unexpected components");
        self
    }

    pub fn component(self, index: usize, check: impl FnOnce(ComponentAssertion<'a>)) -> Self {
        let info = self
            .structure
            .components
            .get(index)
            .unwrap_or_else(|| panic!("no component at index {}", index));
        check(ComponentAssertion { info });
        self
    }
}

pub struct ComponentAssertion<'a> {
    info: &'a ComponentInfo,
}

impl ComponentAssertion<'_> {
    pub fn named(self, expected: &str) -> Self {
        assert_eq!(self.info.component.name(), Some(expected));
        self
    }

    pub fn at(self, expected: &SourceLocation) -> Self {
        assert_eq!(&self.info.location, expected, "unexpected location for {}", self.info.component);
        self
    }

    pub fn unknown_location(self) -> Self {
        assert!(self.info.location.is_unknown(), "expected unknown location, found {}", self.info.location);
        self
    }

    pub fn value(self, expected: &Value) -> Self {
        let value = self.info.props.get("value").unwrap_or(Value::Undefined);
        assert_eq!(&value, expected);
        self
    }
}
