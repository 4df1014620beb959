//! Answer composition over retrieved context.

mod composer;
mod model;

pub use composer::{build_prompt, join_contexts, simple_answer, truncate_chars, AnswerComposer, NO_CONTEXT_ANSWER, SIMPLE_LEAD_IN};
pub use model::{parse_chat_response, select_model, ChatModel, NoopModel, OpenAiCompatibleModel, DEFAULT_BASE_URL, DEFAULT_MODEL};
