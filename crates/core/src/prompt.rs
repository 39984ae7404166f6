// crates/core/src/prompt.rs
//! Prompt assembly: resolved pages become system context, the request
//! becomes the final user turn.

use crate::content::PageContent;
use crate::llm::ChatMessage;

const UNTITLED: &str = "(untitled)";

/// Build the chat transcript for one job.
///
/// One system message per page, in the order given, followed by the user's
/// request.
pub fn build_messages(user_message: &str, pages: &[PageContent]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(pages.len() + 1);
    for page in pages {
        let title = page
            .title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(UNTITLED);
        messages.push(ChatMessage::system(format!("{title}:\n{}", page.text_content)));
    }
    messages.push(ChatMessage::user(user_message));
    messages
}
