//! AJAX action pipeline for AnsPress.
//!
//! An action is a type implementing [`AjaxAction`]. For every request the
//! pipeline verifies the `__nonce`, asks the action to authorize the caller,
//! dispatches to the logged-in or anonymous handler, and returns an
//! [`Envelope`] carrying `form_errors`, `success`, `action` and an optional
//! `snackbar` notice. Transport is left to the caller.

mod action;
mod context;
mod envelope;
mod hooks;
mod i18n;
mod identity;
mod nonce;
mod pipeline;
mod registry;
mod request;
pub mod sanitize;
mod services;

pub use action::{ActionName, AjaxAction, Permission};
pub use context::ActionContext;
pub use envelope::Envelope;
pub use hooks::{SEND_HOOK, SendHooks};
pub use i18n::{Catalog, Passthrough, Translator};
pub use identity::{Caller, CallerParseError, UserId};
pub use nonce::{DEFAULT_NONCE_KEY, HmacNonces, NonceAge, NonceError, NonceVerifier};
pub use pipeline::{
    MSG_CHEATING, MSG_NO_PERMISSION, MSG_SOMETHING_WRONG, NONCE_FIELD, Stage, handle_action,
    transmit,
};
pub use registry::{ActionRegistry, RegistryError};
pub use request::{ACTION_PARAM, AjaxRequest};
pub use services::Services;
