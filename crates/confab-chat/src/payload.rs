//! Payload assembly — turning stored context into a provider message list.
//!
//! Providers reject message lists that don't strictly alternate, so the
//! builder enforces the shape rather than trusting the store: system first,
//! then user/assistant alternating, ending with the new user prompt.

use confab_core::types::{ChatMessage, ConversationTurn, Role};

/// Stand-in assistant turn injected when the context window ends on a user
/// turn (e.g. a reply that was never persisted). Keeps alternation intact
/// without inventing content.
pub const PLACEHOLDER_ASSISTANT_REPLY: &str = "[no response]";

/// Build the full message list for one chat request.
///
/// Shape guarantees, regardless of what the stored window looks like:
/// - the system prompt is first and is the only system message;
/// - the first non-system message is a user message;
/// - no two consecutive messages share a role (violating turns are
///   dropped, keeping the earlier one);
/// - the final message is `user_message`.
pub fn build_messages(
    system_prompt: &str,
    context: &[ConversationTurn],
    user_message: &str,
) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(system_prompt)];
    let mut last_role: Option<Role> = None;

    for turn in context {
        // A window can't open on an assistant turn
        if last_role.is_none() && turn.role != Role::User {
            continue;
        }
        if last_role == Some(turn.role) {
            continue;
        }
        messages.push(match turn.role {
            Role::User => ChatMessage::user(&turn.message),
            Role::Assistant => ChatMessage::assistant(&turn.message),
        });
        last_role = Some(turn.role);
    }

    // Close a dangling user turn so the new prompt doesn't double up
    if last_role == Some(Role::User) {
        messages.push(ChatMessage::assistant(PLACEHOLDER_ASSISTANT_REPLY));
    }

    messages.push(ChatMessage::user(user_message));
    messages
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
