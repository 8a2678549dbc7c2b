//! Backend Gateway：对所有后端的统一调用入口
//!
//! `call` 永不失败：后端报错、未配置或超时都转为 `"<Backend> Error: <message>"` 文本返回，
//! 上层可把每次调用都当作全函数处理。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::OrchestratorError;
use crate::llm::{Backend, LlmClient, Message};

pub struct BackendGateway {
    clients: HashMap<Backend, Arc<dyn LlmClient>>,
    /// None 表示不限时（默认）
    request_timeout: Option<Duration>,
}

impl BackendGateway {
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
            request_timeout: None,
        }
    }

    pub fn with_client(mut self, backend: Backend, client: Arc<dyn LlmClient>) -> Self {
        self.clients.insert(backend, client);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// 向指定后端发送单条 User 提示词并返回文本
    pub async fn call(&self, backend: Backend, prompt: &str) -> String {
        let Some(client) = self.clients.get(&backend) else {
            return error_text(backend, "backend not configured");
        };

        let start = Instant::now();
        tracing::info!(backend = %backend, prompt_chars = prompt.chars().count(), "calling backend");
        let messages = [Message::user(prompt)];

        let result = match self.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, client.complete(&messages)).await {
                Ok(r) => r,
                Err(_) => Err(format!("request timed out after {}s", limit.as_secs())),
            },
            None => client.complete(&messages).await,
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(text) => {
                tracing::info!(backend = %backend, duration_ms, "backend replied");
                text
            }
            Err(e) => {
                tracing::warn!(backend = %backend, duration_ms, error = %e, "backend call failed");
                error_text(backend, &e)
            }
        }
    }

    /// 各后端累计 token 使用：(prompt, completion, total)
    pub fn token_usage(&self, backend: Backend) -> (u64, u64, u64) {
        self.clients
            .get(&backend)
            .map(|c| c.token_usage())
            .unwrap_or((0, 0, 0))
    }
}

impl Default for BackendGateway {
    fn default() -> Self {
        Self::new()
    }
}

fn error_text(backend: Backend, message: &str) -> String {
    OrchestratorError::Provider {
        backend,
        message: message.to_string(),
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlmClient;

    #[tokio::test]
    async fn test_call_returns_reply() {
        let gateway = BackendGateway::new()
            .with_client(Backend::Gpt, Arc::new(ScriptedLlmClient::new().with_reply("hi")));
        assert_eq!(gateway.call(Backend::Gpt, "ping").await, "hi");
    }

    #[tokio::test]
    async fn test_provider_failure_becomes_text() {
        let gateway = BackendGateway::new().with_client(
            Backend::Claude,
            Arc::new(ScriptedLlmClient::new().with_failure("rate limited")),
        );
        assert_eq!(
            gateway.call(Backend::Claude, "ping").await,
            "Claude Error: rate limited"
        );
    }

    #[tokio::test]
    async fn test_unconfigured_backend_becomes_text() {
        let gateway = BackendGateway::new();
        let out = gateway.call(Backend::Gemini, "ping").await;
        assert!(out.starts_with("Gemini Error:"));
    }
}
