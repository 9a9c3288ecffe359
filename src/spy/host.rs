//! In-memory host: a document, the fiber graph and the renderer building both.

pub mod document;
pub mod fiber;
pub mod renderer;

pub use document::{Document, DomNode, NodeId, NodeKind};
pub use fiber::{FiberId, FiberKind, FiberNode, FiberTree, StateNode};
pub use renderer::{FiberRoot, RenderError, RenderResult, Renderer, RendererHandle};
