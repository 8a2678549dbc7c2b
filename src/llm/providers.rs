//! 各后端的 OpenAI 兼容端点与默认模型
//!
//! - Gemini: https://generativelanguage.googleapis.com/v1beta/openai/，`GOOGLE_API_KEY`
//! - GPT: OpenAI 默认端点，`OPENAI_API_KEY`
//! - Claude: https://api.anthropic.com/v1/，`ANTHROPIC_API_KEY`
//!
//! 未设置 API Key 的后端回退到 Mock，便于离线跑通整个流程。

use std::sync::Arc;

use crate::config::LlmSection;
use crate::llm::{Backend, LlmClient, MockLlmClient, OpenAiClient};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1/";

pub const GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const GPT_MODEL: &str = "gpt-4o";
pub const CLAUDE_MODEL: &str = "claude-3-5-sonnet-20241022";

const CLAUDE_MAX_TOKENS: u32 = 2048;

fn default_model(backend: Backend) -> &'static str {
    match backend {
        Backend::Gemini => GEMINI_MODEL,
        Backend::Gpt => GPT_MODEL,
        Backend::Claude => CLAUDE_MODEL,
    }
}

fn default_base_url(backend: Backend) -> Option<&'static str> {
    match backend {
        Backend::Gemini => Some(GEMINI_BASE_URL),
        Backend::Gpt => None,
        Backend::Claude => Some(ANTHROPIC_BASE_URL),
    }
}

fn default_key_env(backend: Backend) -> &'static str {
    match backend {
        Backend::Gemini => "GOOGLE_API_KEY",
        Backend::Gpt => "OPENAI_API_KEY",
        Backend::Claude => "ANTHROPIC_API_KEY",
    }
}

/// 根据配置与环境变量创建某个后端的客户端；缺少 Key 时回退到 Mock
///
/// 决策后端的 Mock 返回合法的决策 JSON，专家后端的 Mock 回显提示词。
pub fn create_client(cfg: &LlmSection, backend: Backend) -> Arc<dyn LlmClient> {
    let section = cfg.backend(backend);
    let key_env = section
        .api_key_env
        .clone()
        .unwrap_or_else(|| default_key_env(backend).to_string());

    let api_key = match std::env::var(&key_env) {
        Ok(key) if !key.trim().is_empty() => key,
        _ => {
            tracing::warn!(backend = %backend, env = %key_env, "No API key set, using Mock LLM");
            let mock = if cfg.decider == backend {
                MockLlmClient::decider(backend)
            } else {
                MockLlmClient::echo(backend)
            };
            return Arc::new(mock);
        }
    };

    let model = section
        .model
        .clone()
        .unwrap_or_else(|| default_model(backend).to_string());
    let base_url = section
        .base_url
        .as_deref()
        .or_else(|| default_base_url(backend));

    tracing::info!(backend = %backend, model = %model, "Using OpenAI-compatible LLM");
    let client = OpenAiClient::new(base_url, &model, &api_key);
    match backend {
        Backend::Claude => Arc::new(client.with_max_tokens(CLAUDE_MAX_TOKENS)),
        _ => Arc::new(client),
    }
}
