//! Command registration for the worker host.

use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::Value;

use crate::worker::responder::Responder;

/// One command the worker can execute.
///
/// Handlers get the request's params verbatim and a [`Responder`] they
/// drive to a terminal response; progress notifications in between are
/// optional. Returning without touching the responder is safe, the dropped
/// responder answers with an error on the handler's behalf.
#[async_trait(?Send)]
pub trait CommandHandler {
    /// Executes the command for one request.
    async fn execute(&self, params: Option<Value>, reply: Responder);
}

/// Name → handler table for a worker host.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, Rc<dyn CommandHandler>>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`, replacing any previous handler for
    /// that name.
    pub fn register(&mut self, name: impl Into<String>, handler: impl CommandHandler + 'static) {
        self.handlers.insert(name.into(), Rc::new(handler));
    }

    /// Whether a handler is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the registry holds no commands.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub(crate) fn get(&self, name: &str) -> Option<Rc<dyn CommandHandler>> {
        self.handlers.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait(?Send)]
    impl CommandHandler for Noop {
        async fn execute(&self, _params: Option<Value>, reply: Responder) {
            reply.send(Value::Null);
        }
    }

    #[test]
    fn registration_replaces_by_name() {
        let mut registry = CommandRegistry::new();
        assert!(registry.is_empty());

        registry.register("list", Noop);
        registry.register("list", Noop);
        registry.register("install", Noop);

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("list"));
        assert!(!registry.contains("update"));
    }
}
