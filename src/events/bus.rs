use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use derivative::Derivative;

use super::Payload;

pub type ListenerFn = Rc<RefCell<dyn FnMut(&Payload) -> anyhow::Result<()>>>;

/// Target a listener is registered against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope(Cow<'static, str>);

impl Scope
{
        pub const GLOBAL: Scope = Scope(Cow::Borrowed("global"));

        pub fn new(name: impl Into<String>) -> Self
        {
                Self(Cow::Owned(name.into()))
        }

        pub fn name(&self) -> &str
        {
                &self.0
        }

        pub fn is_global(&self) -> bool
        {
                *self == Self::GLOBAL
        }
}

impl Default for Scope
{
        fn default() -> Self
        {
                Self::GLOBAL
        }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions
{
        /// Drop the registration right before its first invocation.
        pub once: bool,
        /// The listener promises not to block the source event.
        pub passive: bool,
}

impl ListenerOptions
{
        pub fn once() -> Self
        {
                Self {
                        once: true,
                        ..Self::default()
                }
        }

        pub fn passive() -> Self
        {
                Self {
                        passive: true,
                        ..Self::default()
                }
        }
}

#[derive(Derivative)]
#[derivative(Debug)]
struct Listener
{
        id: u64,
        name: String,
        scope: Scope,
        options: ListenerOptions,

        #[derivative(Debug = "ignore")]
        callback: ListenerFn,
}

#[derive(Default)]
struct Registry
{
        next_id: Cell<u64>,
        listeners: RefCell<Vec<Listener>>,
}

impl Registry
{
        fn contains(
                &self,
                id: u64,
        ) -> bool
        {
                self.listeners.borrow().iter().any(|listener| listener.id == id)
        }

        fn remove(
                &self,
                ids: &[u64],
        )
        {
                self.listeners.borrow_mut().retain(|listener| !ids.contains(&listener.id));
        }
}

/// Synchronous, single-threaded event dispatcher.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct EventBus
{
        registry: Rc<Registry>,
}

impl fmt::Debug for EventBus
{
        fn fmt(
                &self,
                f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result
        {
                f.debug_struct("EventBus")
                        .field("listeners", &self.registry.listeners.borrow().len())
                        .finish()
        }
}

impl EventBus
{
        pub fn new() -> Self
        {
                Self::default()
        }

        /// Registers `callback` on the global scope for every
        /// whitespace-separated name in `names`.
        pub fn on<F>(
                &self,
                names: &str,
                callback: F,
        ) -> Subscription
        where
                F: FnMut(&Payload) -> anyhow::Result<()> + 'static,
        {
                self.on_scoped(names, Scope::GLOBAL, callback, ListenerOptions::default())
        }

        pub fn on_scoped<F>(
                &self,
                names: &str,
                scope: Scope,
                callback: F,
                options: ListenerOptions,
        ) -> Subscription
        where
                F: FnMut(&Payload) -> anyhow::Result<()> + 'static,
        {
                let callback: ListenerFn = Rc::new(RefCell::new(callback));
                let mut listeners = self.registry.listeners.borrow_mut();

                let ids = names
                        .split_whitespace()
                        .map(|name| {
                                let id = self.registry.next_id.get();
                                self.registry.next_id.set(id + 1);

                                listeners.push(Listener {
                                        id,
                                        name: name.to_string(),
                                        scope: scope.clone(),
                                        options,
                                        callback: callback.clone(),
                                });

                                id
                        })
                        .collect();

                Subscription {
                        registry: Rc::downgrade(&self.registry),
                        ids,
                }
        }

        /// An emitter bound to `scope`.
        pub fn scoped(
                &self,
                scope: Scope,
        ) -> ScopedEmitter
        {
                ScopedEmitter {
                        bus: self.clone(),
                        scope,
                }
        }

        pub fn emit(
                &self,
                name: &str,
                payload: &Payload,
        ) -> anyhow::Result<()>
        {
                self.emit_to(&Scope::GLOBAL, name, payload)
        }

        /// Calls every listener registered for `name` on `scope`, in
        /// registration order.
        ///
        /// The first listener error stops the dispatch and is returned.
        /// Listeners removed by an earlier listener of the same dispatch are
        /// skipped, listeners added during it wait for the next emit.
        pub fn emit_to(
                &self,
                scope: &Scope,
                name: &str,
                payload: &Payload,
        ) -> anyhow::Result<()>
        {
                let matching: Vec<(u64, bool, ListenerFn)> = self
                        .registry
                        .listeners
                        .borrow()
                        .iter()
                        .filter(|listener| listener.name == name && listener.scope == *scope)
                        .map(|listener| (listener.id, listener.options.once, listener.callback.clone()))
                        .collect();

                for (id, once, callback) in matching
                {
                        if !self.registry.contains(id)
                        {
                                continue;
                        }

                        if once
                        {
                                self.registry.remove(&[id]);
                        }

                        let mut callback = callback.try_borrow_mut().map_err(|_| {
                                anyhow::anyhow!("listener for `{name}` re-entered its own dispatch")
                        })?;

                        (&mut *callback)(payload)?;
                }

                Ok(())
        }

        pub fn off(
                &self,
                subscription: &Subscription,
        )
        {
                self.registry.remove(&subscription.ids);
        }

        pub fn listener_count(
                &self,
                scope: &Scope,
                name: &str,
        ) -> usize
        {
                self.registry
                        .listeners
                        .borrow()
                        .iter()
                        .filter(|listener| listener.name == name && listener.scope == *scope)
                        .count()
        }
}

/// Handle to a registration made through [`EventBus::on`].
///
/// Dropping it removes the listener; [`Subscription::forget`] keeps it for
/// the lifetime of the bus.
#[must_use = "dropping a subscription unregisters its listener"]
#[derive(Debug)]
pub struct Subscription
{
        registry: Weak<Registry>,
        ids: Vec<u64>,
}

impl Subscription
{
        pub fn cancel(mut self)
        {
                self.release();
        }

        pub fn forget(mut self)
        {
                self.ids.clear();
        }

        pub fn is_active(&self) -> bool
        {
                match self.registry.upgrade()
                {
                        Some(registry) => self.ids.iter().any(|id| registry.contains(*id)),
                        None => false,
                }
        }

        fn release(&mut self)
        {
                if let Some(registry) = self.registry.upgrade()
                {
                        registry.remove(&self.ids);
                }

                self.ids.clear();
        }
}

impl Drop for Subscription
{
        fn drop(&mut self)
        {
                self.release();
        }
}

/// [`EventBus`] handle that emits to and registers on a fixed scope.
#[derive(Debug, Clone)]
pub struct ScopedEmitter
{
        bus: EventBus,
        scope: Scope,
}

impl ScopedEmitter
{
        pub fn scope(&self) -> &Scope
        {
                &self.scope
        }

        pub fn on<F>(
                &self,
                names: &str,
                callback: F,
        ) -> Subscription
        where
                F: FnMut(&Payload) -> anyhow::Result<()> + 'static,
        {
                self.bus.on_scoped(names, self.scope.clone(), callback, ListenerOptions::default())
        }

        pub fn emit(
                &self,
                name: &str,
                payload: &Payload,
        ) -> anyhow::Result<()>
        {
                self.bus.emit_to(&self.scope, name, payload)
        }
}
