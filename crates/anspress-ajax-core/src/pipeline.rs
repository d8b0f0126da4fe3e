//! Running one action from request to envelope.
//!
//! Stages: `Created -> TokenChecked -> PermissionChecked -> Dispatched -> Sent`.
//! A failed nonce or permission check jumps straight to `Sent`. Every path
//! ends in [`transmit`], which consumes the context, so a request is
//! answered exactly once.

use crate::{ActionContext, ActionName, AjaxAction, AjaxRequest, Envelope, Permission, Services};

/// Request field carrying the nonce.
pub const NONCE_FIELD: &str = "__nonce";

pub const MSG_CHEATING: &str = "Trying to cheat?!";
pub const MSG_NO_PERMISSION: &str = "You don't have enough permissions to do this action.";
pub const MSG_SOMETHING_WRONG: &str = "Something went wrong.";

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Created,
    TokenChecked,
    PermissionChecked,
    Dispatched,
    Sent,
}

/// Early exit: the check that failed.
#[derive(Debug)]
struct Halt(Stage);

/// Run `action` against `request` and return the response envelope.
pub fn handle_action(action: &dyn AjaxAction, request: AjaxRequest, services: &Services) -> Envelope {
    let mut ctx = ActionContext::new(ActionName::for_handler(action.name()), request);
    let span = tracing::debug_span!("ajax", action = %ctx.action(), caller = %ctx.caller());
    let _guard = span.enter();
    tracing::trace!(stage = ?Stage::Created, "request received");

    match run(action, &mut ctx, services) {
        Ok(stage) => tracing::debug!(?stage, success = ctx.is_success(), "handler finished"),
        Err(Halt(stage)) => tracing::info!(?stage, "request rejected"),
    }

    transmit(ctx, services)
}

fn run(action: &dyn AjaxAction, ctx: &mut ActionContext, services: &Services) -> Result<Stage, Halt> {
    verify_nonce(action, ctx, services)?;
    verify_permission(action, ctx, services)?;

    if ctx.caller().is_authenticated() {
        action.logged_in(ctx);
    } else {
        action.nopriv(ctx);
    }
    Ok(Stage::Dispatched)
}

fn verify_nonce(
    action: &dyn AjaxAction,
    ctx: &mut ActionContext,
    services: &Services,
) -> Result<(), Halt> {
    let Some(key) = action.nonce_key().filter(|k| !k.is_empty()) else {
        return Ok(());
    };

    let nonce = ctx.sanitized_req(NONCE_FIELD);
    match services.nonces().verify(&nonce, key, ctx.caller()) {
        Some(age) => {
            tracing::trace!(?age, key, "nonce accepted");
            Ok(())
        }
        None => {
            ctx.snackbar(services.translate(MSG_CHEATING));
            Err(Halt(Stage::TokenChecked))
        }
    }
}

fn verify_permission(
    action: &dyn AjaxAction,
    ctx: &mut ActionContext,
    services: &Services,
) -> Result<(), Halt> {
    let message = match action.authorize(ctx) {
        Permission::Granted => return Ok(()),
        Permission::Denied => MSG_NO_PERMISSION.to_string(),
        Permission::DeniedWith(message) => message,
    };
    ctx.set_fail();
    ctx.snackbar(services.translate(&message));
    Err(Halt(Stage::PermissionChecked))
}

/// Finish a request: write the status fields, add the fallback notice to a
/// failure without one, run the send hooks, and hand back the envelope.
pub fn transmit(mut ctx: ActionContext, services: &Services) -> Envelope {
    ctx.write_status_fields();

    if !ctx.is_success() && !ctx.has_snackbar() {
        ctx.snackbar(services.translate(MSG_SOMETHING_WRONG));
    }

    services.hooks().fire(&mut ctx);

    tracing::debug!(stage = ?Stage::Sent, action = %ctx.action(), "response sent");
    ctx.into_envelope()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nonce::{DEFAULT_NONCE_KEY, NonceAge, NonceVerifier};
    use crate::{Caller, Catalog};
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const GOOD: &str = "goodnonce1";

    /// Accepts exactly one nonce value for any key and counts lookups.
    #[derive(Default)]
    struct FixedNonce {
        checks: AtomicUsize,
    }

    impl NonceVerifier for FixedNonce {
        fn verify(&self, nonce: &str, key: &str, _caller: &Caller) -> Option<NonceAge> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            (nonce == GOOD && !key.is_empty()).then_some(NonceAge::Fresh)
        }
    }

    fn services() -> (Services, Arc<FixedNonce>) {
        let nonces = Arc::new(FixedNonce::default());
        (Services::new(nonces.clone()), nonces)
    }

    /// Grants everyone; logged-in callers get `id: 42`.
    struct Answer {
        nonce_key: Option<&'static str>,
    }

    impl AjaxAction for Answer {
        fn name(&self) -> &'static str {
            "Answer"
        }

        fn nonce_key(&self) -> Option<&str> {
            self.nonce_key
        }

        fn authorize(&self, _ctx: &ActionContext) -> Permission {
            Permission::Granted
        }

        fn logged_in(&self, ctx: &mut ActionContext) {
            ctx.set_success();
            ctx.add_res("id", 42);
        }
    }

    fn answer() -> Answer {
        Answer {
            nonce_key: Some(DEFAULT_NONCE_KEY),
        }
    }

    /// Keeps the fail-closed behaviour and records whether it was dispatched.
    #[derive(Default)]
    struct Locked {
        dispatched: AtomicUsize,
    }

    impl AjaxAction for Locked {
        fn name(&self) -> &'static str {
            "locked"
        }

        fn authorize(&self, _ctx: &ActionContext) -> Permission {
            Permission::Denied
        }

        fn logged_in(&self, _ctx: &mut ActionContext) {
            self.dispatched.fetch_add(1, Ordering::SeqCst);
        }

        fn nopriv(&self, _ctx: &mut ActionContext) {
            self.dispatched.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn request(caller: Caller, nonce: &str) -> AjaxRequest {
        AjaxRequest::new(caller).with_param(NONCE_FIELD, nonce)
    }

    #[test]
    fn logged_in_success() {
        let (services, _) = services();
        let envelope = handle_action(&answer(), request(Caller::user(5), GOOD), &services);
        assert_eq!(
            envelope.into_value(),
            json!({
                "form_errors": {},
                "success": true,
                "action": "ap_answer",
                "id": 42
            })
        );
    }

    #[test]
    fn anonymous_gets_default_notice() {
        let (services, _) = services();
        let envelope = handle_action(&answer(), request(Caller::Anonymous, GOOD), &services);
        assert!(!envelope.success());
        assert_eq!(envelope.snackbar_message(), Some(MSG_SOMETHING_WRONG));
        assert!(envelope.get("id").is_none());
    }

    #[test]
    fn bad_nonce_stops_before_dispatch() {
        let (services, _) = services();
        let locked = Locked::default();
        let envelope = handle_action(&locked, request(Caller::user(1), "forged"), &services);
        assert_eq!(envelope.snackbar_message(), Some(MSG_CHEATING));
        assert!(!envelope.success());
        assert_eq!(envelope.action(), Some("ap_locked"));
        assert_eq!(locked.dispatched.load(Ordering::SeqCst), 0);

        let envelope = handle_action(&answer(), AjaxRequest::new(Caller::user(1)), &services);
        assert_eq!(envelope.snackbar_message(), Some(MSG_CHEATING));
        assert!(envelope.get("id").is_none());
    }

    #[test]
    fn empty_nonce_key_skips_verification() {
        for key in [None, Some("")] {
            let (services, nonces) = services();
            let action = Answer { nonce_key: key };
            let envelope =
                handle_action(&action, AjaxRequest::new(Caller::user(1)), &services);
            assert!(envelope.success());
            assert_eq!(nonces.checks.load(Ordering::SeqCst), 0);
        }
    }

    #[test]
    fn denied_permission_is_terminal() {
        let (services, _) = services();
        let locked = Locked::default();
        for caller in [Caller::user(1), Caller::Anonymous] {
            let envelope = handle_action(&locked, request(caller, GOOD), &services);
            assert!(!envelope.success());
            assert_eq!(envelope.snackbar_message(), Some(MSG_NO_PERMISSION));
        }
        assert_eq!(locked.dispatched.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn custom_denial_message() {
        struct OwnPost;
        impl AjaxAction for OwnPost {
            fn name(&self) -> &'static str {
                "OwnPost"
            }
            fn nonce_key(&self) -> Option<&str> {
                None
            }
            fn authorize(&self, _ctx: &ActionContext) -> Permission {
                Permission::DeniedWith("You cannot vote on your own post".into())
            }
        }

        let (services, _) = services();
        let envelope = handle_action(&OwnPost, AjaxRequest::default(), &services);
        assert_eq!(
            envelope.snackbar_message(),
            Some("You cannot vote on your own post")
        );
    }

    #[test]
    fn field_errors_reach_the_envelope() {
        struct Validate;
        impl AjaxAction for Validate {
            fn name(&self) -> &'static str {
                "validate"
            }
            fn nonce_key(&self) -> Option<&str> {
                None
            }
            fn authorize(&self, _ctx: &ActionContext) -> Permission {
                Permission::Granted
            }
            fn nopriv(&self, ctx: &mut ActionContext) {
                ctx.set_field_error("title", "Title is required");
                if ctx.has_form_errors() {
                    ctx.snackbar("Fix the errors");
                }
            }
        }

        let (services, _) = services();
        let envelope = handle_action(&Validate, AjaxRequest::default(), &services);
        assert_eq!(
            envelope.form_errors().cloned().map(serde_json::Value::Object),
            Some(json!({ "title": "Title is required" }))
        );
        assert_eq!(envelope.snackbar_message(), Some("Fix the errors"));
    }

    #[test]
    fn messages_are_translated() {
        let (services, _) = services();
        let catalog: Catalog = [(MSG_CHEATING.to_string(), "Tricher ?!".to_string())]
            .into_iter()
            .collect();
        let services = services.with_translator(catalog);
        let envelope = handle_action(&answer(), request(Caller::user(1), "bad"), &services);
        assert_eq!(envelope.snackbar_message(), Some("Tricher ?!"));
    }

    #[test]
    fn send_hooks_see_and_change_the_response() {
        let (services, _) = services();
        let services = services
            .with_hook(|ctx| {
                let seen = ctx.response_field("success").cloned();
                ctx.add_res("seen_success", seen);
            })
            .with_hook(|ctx| ctx.add_res("id", 7));

        let envelope = handle_action(&answer(), request(Caller::user(1), GOOD), &services);
        assert_eq!(envelope.get("seen_success"), Some(&json!(true)));
        assert_eq!(envelope.get("id"), Some(&json!(7)));
    }

    #[test]
    fn blank_notice_gets_the_default_message() {
        let (services, _) = services();
        for blank in [json!(""), json!({}), json!([]), json!(false), json!(0), json!(null)] {
            let mut ctx =
                ActionContext::new(ActionName::for_handler("x"), AjaxRequest::default());
            ctx.add_res("snackbar", blank.clone());
            let envelope = transmit(ctx, &services);
            assert_eq!(
                envelope.snackbar_message(),
                Some(MSG_SOMETHING_WRONG),
                "blank notice {blank}"
            );
        }
    }

    #[test]
    fn transmit_keeps_existing_notice_on_failure() {
        let (services, _) = services();
        let mut ctx = ActionContext::new(ActionName::for_handler("x"), AjaxRequest::default());
        ctx.snackbar("Already voted");
        let envelope = transmit(ctx, &services);
        assert_eq!(envelope.snackbar_message(), Some("Already voted"));
        for key in ["success", "action", "form_errors"] {
            assert!(envelope.contains(key), "missing {key}");
        }
    }
}
