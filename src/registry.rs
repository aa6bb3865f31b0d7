//! Name to factory map for declaratively mounted components.
//!
//! Whoever mounts components owns a [`ComponentRegistry`]: factories are registered at startup
//! and looked up by module name when an element asks for one.

use std::collections::BTreeMap;
use std::fmt;

use crate::{ElementId, Error, EventTarget, Host, OptionValue, Result};

/// Page-level events routed to mounted components.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageEvent {
    /// A scroll event from the given source.
    Scroll(EventTarget),
    WindowResize,
}

/// A mounted component driven by the host.
pub trait LiveComponent {
    fn name(&self) -> &str;

    fn element(&self) -> ElementId;

    fn attached(&mut self, host: &dyn Host, now_ms: u64);

    fn detached(&mut self, host: &dyn Host);

    fn set_option(
        &mut self,
        host: &dyn Host,
        name: &str,
        value: OptionValue,
        now_ms: u64,
    ) -> Result<()>;

    /// Components ignore events from sources they did not subscribe to.
    fn handle_event(&mut self, host: &dyn Host, event: &PageEvent, now_ms: u64) -> Result<()>;

    fn tick(&mut self, host: &dyn Host, now_ms: u64) -> Result<()>;

    fn run_frame(&mut self, host: &dyn Host, now_ms: u64) -> Result<()>;

    fn destroy(&mut self, host: &dyn Host);

    fn is_destroyed(&self) -> bool;
}

/// Builds a component for `element` from declarative `(name, value)` options.
pub type ComponentFactory = Box<
    dyn Fn(&dyn Host, ElementId, &[(String, OptionValue)], u64) -> Result<Box<dyn LiveComponent>>,
>;

#[derive(Default)]
pub struct ComponentRegistry {
    factories: BTreeMap<String, ComponentFactory>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `name`, replacing any previous registration.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&dyn Host, ElementId, &[(String, OptionValue)], u64) -> Result<Box<dyn LiveComponent>>
            + 'static,
    {
        let name = name.into();
        fxtrace!(name = %name, "ComponentRegistry: register");
        self.factories.insert(name, Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn create(
        &self,
        name: &str,
        host: &dyn Host,
        element: ElementId,
        options: &[(String, OptionValue)],
        now_ms: u64,
    ) -> Result<Box<dyn LiveComponent>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::UnknownComponent(name.into()))?;
        factory(host, element, options, now_ms)
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("names", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
