//! The Q&A actions this server answers.

use crate::board::{SharedBoard, VoteType};
use anspress_ajax_core::{ActionContext, ActionRegistry, AjaxAction, Permission, RegistryError};

/// Minimum comment length, in characters.
const MIN_COMMENT_LEN: usize = 5;

/// Register every action against `board`.
pub fn registry(board: &SharedBoard) -> Result<ActionRegistry, RegistryError> {
    let mut registry = ActionRegistry::new();
    registry.register(Ping)?;
    registry.register(PostComment { board: board.clone() })?;
    registry.register(LoadComments { board: board.clone() })?;
    registry.register(Vote { board: board.clone() })?;
    Ok(registry)
}

/// Liveness check. Open to everyone, no nonce.
pub struct Ping;

impl Ping {
    fn pong(ctx: &mut ActionContext) {
        ctx.set_success();
        ctx.add_res("pong", true);
    }
}

impl AjaxAction for Ping {
    fn name(&self) -> &'static str {
        "Ping"
    }

    fn nonce_key(&self) -> Option<&str> {
        None
    }

    fn authorize(&self, _ctx: &ActionContext) -> Permission {
        Permission::Granted
    }

    fn logged_in(&self, ctx: &mut ActionContext) {
        Self::pong(ctx);
    }

    fn nopriv(&self, ctx: &mut ActionContext) {
        Self::pong(ctx);
    }
}

/// Reads `post_id` and records a field error when it is missing or unknown.
fn existing_post(ctx: &mut ActionContext, board: &SharedBoard) -> Option<u64> {
    let post_id = ctx
        .req_u64("post_id")
        .filter(|id| board.read().post(*id).is_some());
    if post_id.is_none() {
        ctx.set_field_error("post_id", "Question or answer does not exist.");
    }
    post_id
}

/// Add a comment to a question or answer.
pub struct PostComment {
    board: SharedBoard,
}

impl AjaxAction for PostComment {
    fn name(&self) -> &'static str {
        "PostComment"
    }

    fn authorize(&self, ctx: &ActionContext) -> Permission {
        Permission::logged_in(ctx)
    }

    fn logged_in(&self, ctx: &mut ActionContext) {
        let post_id = existing_post(ctx, &self.board);

        let body = ctx.sanitized_req("comment");
        if body.chars().count() < MIN_COMMENT_LEN {
            ctx.set_field_error(
                "comment",
                format!("Comment is too short, minimum {MIN_COMMENT_LEN} characters."),
            );
        }

        let (Some(post_id), Some(author)) = (post_id, ctx.caller().user_id()) else {
            ctx.snackbar("Unable to post comment.");
            return;
        };
        if ctx.has_form_errors() {
            ctx.snackbar("Unable to post comment.");
            return;
        }

        let comment = self.board.write().add_comment(post_id, author, body);
        tracing::info!(post_id, comment_id = comment.id, author, "comment posted");

        ctx.set_success();
        ctx.add_res("comment", &comment);
        ctx.snackbar("Comment successfully posted.");
    }
}

/// List the comments of a post. Open to anonymous callers.
pub struct LoadComments {
    board: SharedBoard,
}

impl LoadComments {
    fn load(&self, ctx: &mut ActionContext) {
        let Some(post_id) = existing_post(ctx, &self.board) else {
            return;
        };
        let comments = self.board.read().comments(post_id);
        ctx.set_success();
        ctx.add_res("comments", comments);
    }
}

impl AjaxAction for LoadComments {
    fn name(&self) -> &'static str {
        "LoadComments"
    }

    fn authorize(&self, _ctx: &ActionContext) -> Permission {
        Permission::Granted
    }

    fn logged_in(&self, ctx: &mut ActionContext) {
        self.load(ctx);
    }

    fn nopriv(&self, ctx: &mut ActionContext) {
        self.load(ctx);
    }
}

/// Up or down vote a post. Voting the same way twice retracts the vote.
pub struct Vote {
    board: SharedBoard,
}

impl AjaxAction for Vote {
    fn name(&self) -> &'static str {
        "Vote"
    }

    fn nonce_key(&self) -> Option<&str> {
        Some("ap_vote")
    }

    fn authorize(&self, ctx: &ActionContext) -> Permission {
        let Some(voter) = ctx.caller().user_id() else {
            return Permission::DeniedWith("You must be logged in to vote.".into());
        };
        let own_post = ctx
            .req_u64("post_id")
            .and_then(|id| self.board.read().post(id).map(|p| p.author == voter))
            .unwrap_or(false);
        if own_post {
            return Permission::DeniedWith("You cannot vote on your own question or answer.".into());
        }
        Permission::Granted
    }

    fn logged_in(&self, ctx: &mut ActionContext) {
        let post_id = existing_post(ctx, &self.board);
        let vote = ctx.req_str("type").and_then(VoteType::parse);
        if vote.is_none() {
            ctx.set_field_error("type", "Vote type must be up or down.");
        }

        let (Some(post_id), Some(vote), Some(voter)) = (post_id, vote, ctx.caller().user_id())
        else {
            return;
        };

        let data = self.board.write().vote(post_id, voter, vote);
        tracing::info!(post_id, voter, ?vote, net = data.net, "vote recorded");

        ctx.set_success();
        ctx.add_res("voteData", data);
        ctx.snackbar(if data.active.is_some() {
            "Thank you for voting."
        } else {
            "Your vote has been removed."
        });
    }
}
