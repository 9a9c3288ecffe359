//! Devtools hook and the live bridge on top of it.

pub mod hook;
pub mod spy;

pub use hook::{DevtoolsHook, RendererId, RendererRegistered};
pub use spy::{BridgeDriver, FiberSpy, Listener};
