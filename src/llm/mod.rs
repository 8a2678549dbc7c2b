//! LLM 层：后端身份、客户端抽象与实现（OpenAI 兼容 / Mock）、统一调用的 Gateway

pub mod backend;
pub mod gateway;
pub mod mock;
pub mod openai;
pub mod providers;
pub mod traits;

pub use backend::Backend;
pub use gateway::BackendGateway;
pub use mock::{MockLlmClient, ScriptedLlmClient};
pub use openai::{OpenAiClient, TokenUsage};
pub use providers::create_client;
pub use traits::{LlmClient, Message, Role};
