//! Component execution contexts.
//!
//! Component-specific cleanup code runs under its own component's execution
//! context, whatever context the calling thread had installed. The context
//! is swapped in for the duration of the cleanup and restored afterwards on
//! every exit path, including panics.

mod resolver;
mod switcher;

pub use resolver::{ComponentContextResolver, ComponentRegistry, EntityCleanup};
pub use switcher::{ContextGuard, ExecutionContext, ExecutionContextSwitcher};
