/**
 * Chat Route Handlers
 *
 * - `conversations` - list/create/rename/soft-delete conversations
 * - `messages`      - paginated message listing
 * - `send`          - the send-message orchestrator (credits, persistence,
 *                     response generation)
 */

pub mod conversations;
pub mod messages;
pub mod send;
pub mod types;

pub use conversations::{
    create_conversation, delete_conversation, list_conversations, update_conversation,
};
pub use messages::list_messages;
pub use send::send_message;
