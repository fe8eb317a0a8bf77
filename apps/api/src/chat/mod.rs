// Chat: bounded conversations with the generative model and reply interpretation.
// Model calls go through llm_client::ChatModel only.

pub mod handlers;
pub mod interpreter;
pub mod kind;
pub mod session;
