//! Text-keyed packet handlers.
//!
//! Plugins exchange `(key, contents)` string pairs over the generic custom
//! packet procedures instead of registering new procedure names. Every
//! handler registered for a key receives the contents, in registration order.

use std::collections::HashMap;

type TextHandler = Box<dyn FnMut(&str) + Send>;

/// Fan-out registry of custom packet handlers.
#[derive(Default)]
pub struct CustomPacketRegistry {
    handlers: HashMap<String, Vec<TextHandler>>,
}

impl CustomPacketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler(&mut self, key: impl Into<String>, handler: impl FnMut(&str) + Send + 'static) {
        self.handlers.entry(key.into()).or_default().push(Box::new(handler));
    }

    pub fn handler_count(&self, key: &str) -> usize {
        self.handlers.get(key).map_or(0, Vec::len)
    }

    /// Run every handler for `key`. Returns how many ran.
    pub fn dispatch(&mut self, key: &str, contents: &str) -> usize {
        let Some(handlers) = self.handlers.get_mut(key) else {
            return 0;
        };
        for handler in handlers.iter_mut() {
            handler(contents);
        }
        handlers.len()
    }
}

impl std::fmt::Debug for CustomPacketRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomPacketRegistry")
            .field("keys", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
