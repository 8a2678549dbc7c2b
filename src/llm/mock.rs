//! Mock LLM 客户端（用于测试与离线运行，无需 API）
//!
//! - `MockLlmClient`：决策模式下把用户输入包装成 respond_to_user 决策，专家模式下回显提示词
//! - `ScriptedLlmClient`：按顺序返回预置回复并记录收到的提示词，供测试断言

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{Backend, LlmClient, Message, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockMode {
    Decider,
    Echo,
}

/// Mock 客户端：取最后一条 User 消息生成回复
#[derive(Debug)]
pub struct MockLlmClient {
    backend: Backend,
    mode: MockMode,
}

impl MockLlmClient {
    pub fn decider(backend: Backend) -> Self {
        Self {
            backend,
            mode: MockMode::Decider,
        }
    }

    pub fn echo(backend: Backend) -> Self {
        Self {
            backend,
            mode: MockMode::Echo,
        }
    }
}

fn last_user(messages: &[Message]) -> &str {
    messages
        .iter()
        .rev()
        .find(|m| matches!(m.role, Role::User))
        .map(|m| m.content.as_str())
        .unwrap_or("(no input)")
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        let prompt = last_user(messages);
        match self.mode {
            MockMode::Decider => {
                let decision = serde_json::json!({
                    "action": "respond_to_user",
                    "prompt": format!(
                        "Mock {} is answering: no API key configured for this backend.",
                        self.backend.display_name()
                    ),
                });
                Ok(decision.to_string())
            }
            MockMode::Echo => {
                let excerpt: String = prompt.trim().chars().take(200).collect();
                Ok(format!(
                    "Echo from Mock {}: {}",
                    self.backend.display_name(),
                    excerpt
                ))
            }
        }
    }
}

/// 脚本化客户端：依次弹出预置回复，耗尽后返回 fallback；记录每次调用的提示词
#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    replies: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
    fallback: String,
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Ok(reply.into()));
        }
        self
    }

    pub fn with_failure(self, error: impl Into<String>) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Err(error.into()));
        }
        self
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// 至今收到的所有提示词（最后一条 User 消息）
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(last_user(messages).to_string());
        }
        let next = self.replies.lock().ok().and_then(|mut r| r.pop_front());
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}
