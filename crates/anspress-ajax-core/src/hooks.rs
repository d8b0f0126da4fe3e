//! Callbacks fired just before a response leaves the pipeline.

use crate::ActionContext;
use std::fmt;

/// Name under which send hooks are exposed to integrators.
pub const SEND_HOOK: &str = "ap_ajax_class_send";

type SendHook = Box<dyn Fn(&mut ActionContext) + Send + Sync>;

/// Ordered list of send hooks. Each hook gets exclusive access to the
/// finished context and may change anything in it.
#[derive(Default)]
pub struct SendHooks {
    hooks: Vec<SendHook>,
}

impl SendHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook. Hooks run in registration order.
    pub fn add(&mut self, hook: impl Fn(&mut ActionContext) + Send + Sync + 'static) {
        self.hooks.push(Box::new(hook));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub(crate) fn fire(&self, ctx: &mut ActionContext) {
        for hook in &self.hooks {
            hook(ctx);
        }
    }
}

impl fmt::Debug for SendHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendHooks")
            .field("hook", &SEND_HOOK)
            .field("count", &self.hooks.len())
            .finish()
    }
}
