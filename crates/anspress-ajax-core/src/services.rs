//! The collaborators the pipeline calls out to.

use crate::ActionContext;
use crate::hooks::SendHooks;
use crate::i18n::{Passthrough, Translator};
use crate::nonce::NonceVerifier;
use std::fmt;
use std::sync::Arc;

/// Nonce verification, translation and send hooks, shared by every request.
pub struct Services {
    nonces: Arc<dyn NonceVerifier>,
    translator: Arc<dyn Translator>,
    hooks: SendHooks,
}

impl Services {
    /// Services with the given verifier, no translations and no hooks.
    pub fn new(nonces: Arc<dyn NonceVerifier>) -> Self {
        Self {
            nonces,
            translator: Arc::new(Passthrough),
            hooks: SendHooks::new(),
        }
    }

    pub fn with_translator(mut self, translator: impl Translator + 'static) -> Self {
        self.translator = Arc::new(translator);
        self
    }

    pub fn with_hook(mut self, hook: impl Fn(&mut ActionContext) + Send + Sync + 'static) -> Self {
        self.hooks.add(hook);
        self
    }

    pub fn hooks_mut(&mut self) -> &mut SendHooks {
        &mut self.hooks
    }

    pub fn nonces(&self) -> &dyn NonceVerifier {
        self.nonces.as_ref()
    }

    pub fn hooks(&self) -> &SendHooks {
        &self.hooks
    }

    pub fn translate(&self, message: &str) -> String {
        self.translator.translate(message)
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}
