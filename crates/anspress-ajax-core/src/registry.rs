//! Routing wire action names to handlers.

use crate::pipeline::handle_action;
use crate::{ActionName, AjaxAction, AjaxRequest, Envelope, Services};
use std::collections::BTreeMap;

/// Every action the server answers, keyed by wire name.
#[derive(Default)]
pub struct ActionRegistry {
    actions: BTreeMap<ActionName, Box<dyn AjaxAction>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action under its derived wire name.
    pub fn register(&mut self, action: impl AjaxAction + 'static) -> Result<ActionName, RegistryError> {
        let name = ActionName::for_handler(action.name());
        if self.actions.contains_key(&name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        tracing::debug!(action = %name, "registered ajax action");
        self.actions.insert(name.clone(), Box::new(action));
        Ok(name)
    }

    pub fn get(&self, name: &str) -> Option<&dyn AjaxAction> {
        self.actions.get(name).map(|action| &**action)
    }

    /// Registered wire names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(ActionName::as_str)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run the action registered as `name`.
    pub fn dispatch(
        &self,
        name: &str,
        request: AjaxRequest,
        services: &Services,
    ) -> Result<Envelope, RegistryError> {
        let action = self
            .get(name)
            .ok_or_else(|| RegistryError::UnknownAction(name.to_string()))?;
        Ok(handle_action(action, request, services))
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.actions.keys()).finish()
    }
}

/// Error registering or looking up an action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("action already registered: {0}")]
    Duplicate(String),
    #[error("unknown action: {0}")]
    UnknownAction(String),
}
