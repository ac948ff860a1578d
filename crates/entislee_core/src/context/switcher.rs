//! Per-thread execution context and scoped switching.

use crate::context::resolver::EntityCleanup;
use crate::types::ComponentId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

thread_local! {
    static CURRENT: RefCell<Option<ExecutionContext>> = const { RefCell::new(None) };
}

#[derive(Clone)]
struct ContextInner {
    component_id: ComponentId,
    resources: HashMap<String, String>,
    cleanup: Option<Arc<dyn EntityCleanup>>,
}

/// The resolution context of one component.
///
/// Cloning is cheap; clones compare equal under [`ExecutionContext::same_as`].
#[derive(Clone)]
pub struct ExecutionContext {
    inner: Arc<ContextInner>,
}

impl ExecutionContext {
    /// Creates an empty context for `component_id`.
    #[must_use]
    pub fn new(component_id: ComponentId) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                component_id,
                resources: HashMap::new(),
                cleanup: None,
            }),
        }
    }

    /// Adds a component-local resource binding.
    #[must_use]
    pub fn with_resource(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.inner)
            .resources
            .insert(name.into(), value.into());
        self
    }

    /// Sets the cleanup hook run when an entity of this component is removed.
    #[must_use]
    pub fn with_cleanup(mut self, cleanup: impl EntityCleanup + 'static) -> Self {
        Arc::make_mut(&mut self.inner).cleanup = Some(Arc::new(cleanup));
        self
    }

    /// Returns the owning component.
    #[must_use]
    pub fn component_id(&self) -> &ComponentId {
        &self.inner.component_id
    }

    /// Resolves a component-local resource.
    #[must_use]
    pub fn resource(&self, name: &str) -> Option<&str> {
        self.inner.resources.get(name).map(String::as_str)
    }

    /// Returns the cleanup hook, if one is registered.
    #[must_use]
    pub fn cleanup(&self) -> Option<&Arc<dyn EntityCleanup>> {
        self.inner.cleanup.as_ref()
    }

    /// Returns true if both handles refer to the same context.
    #[must_use]
    pub fn same_as(&self, other: &ExecutionContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns the context installed on the calling thread.
    #[must_use]
    pub fn current() -> Option<ExecutionContext> {
        CURRENT.with(|current| current.borrow().clone())
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("component_id", &self.inner.component_id)
            .field("resources", &self.inner.resources.len())
            .field("cleanup", &self.inner.cleanup.is_some())
            .finish()
    }
}

/// Installs execution contexts on the calling thread.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContextSwitcher;

impl ExecutionContextSwitcher {
    /// Installs `context` until the returned guard is dropped.
    ///
    /// Guards restore the context that was current when they were created,
    /// so nested guards must be dropped in reverse order.
    #[must_use = "the previous context is restored as soon as the guard is dropped"]
    pub fn enter(context: ExecutionContext) -> ContextGuard {
        let previous = CURRENT.with(|current| current.replace(Some(context)));
        ContextGuard {
            previous,
            _not_send: PhantomData,
        }
    }

    /// Runs `f` with `context` installed, restoring the previous one afterwards.
    pub fn run<T>(context: ExecutionContext, f: impl FnOnce() -> T) -> T {
        let _guard = Self::enter(context);
        f()
    }
}

/// Restores the previously installed context when dropped.
#[derive(Debug)]
pub struct ContextGuard {
    previous: Option<ExecutionContext>,
    // Tied to the thread whose slot it restores.
    _not_send: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        // The slot is gone during thread teardown; nothing left to restore.
        let _ = CURRENT.try_with(|current| *current.borrow_mut() = previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn ctx(name: &str) -> ExecutionContext {
        ExecutionContext::new(ComponentId::new(name))
    }

    #[test]
    fn no_context_by_default() {
        std::thread::spawn(|| assert!(ExecutionContext::current().is_none()))
            .join()
            .unwrap();
    }

    #[test]
    fn run_installs_and_restores() {
        let outer = ctx("Host");
        let inner = ctx("SbbA");
        let _host = ExecutionContextSwitcher::enter(outer.clone());

        let seen = ExecutionContextSwitcher::run(inner.clone(), || {
            ExecutionContext::current().unwrap()
        });

        assert!(seen.same_as(&inner));
        assert!(ExecutionContext::current().unwrap().same_as(&outer));
    }

    #[test]
    fn nested_guards_unwind_in_order() {
        let a = ctx("A");
        let b = ctx("B");
        {
            let _ga = ExecutionContextSwitcher::enter(a.clone());
            {
                let _gb = ExecutionContextSwitcher::enter(b.clone());
                assert!(ExecutionContext::current().unwrap().same_as(&b));
            }
            assert!(ExecutionContext::current().unwrap().same_as(&a));
        }
        assert!(ExecutionContext::current().is_none());
    }

    #[test]
    fn restores_after_panic() {
        let outer = ctx("Host");
        let _host = ExecutionContextSwitcher::enter(outer.clone());

        let result = catch_unwind(AssertUnwindSafe(|| {
            ExecutionContextSwitcher::run(ctx("SbbA"), || panic!("cleanup blew up"))
        }));

        assert!(result.is_err());
        assert!(ExecutionContext::current().unwrap().same_as(&outer));
    }

    #[test]
    fn resources_are_component_local() {
        let context = ctx("SbbA").with_resource("env/timeout", "30");
        assert_eq!(context.resource("env/timeout"), Some("30"));
        assert_eq!(context.resource("missing"), None);
        assert!(context.cleanup().is_none());
    }

    #[test]
    fn contexts_are_per_thread() {
        let _guard = ExecutionContextSwitcher::enter(ctx("Main"));
        std::thread::spawn(|| assert!(ExecutionContext::current().is_none()))
            .join()
            .unwrap();
        assert!(ExecutionContext::current().is_some());
    }
}
