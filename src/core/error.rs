//! 编排错误类型
//!
//! 每个操作的失败最终都变成对话记录中的一行；这里的类型用于日志与单元测试断言。
//! 自修改解析失败不属于错误（见 `SelfModParse::Malformed`）。

use thiserror::Error;

use crate::artifact::ArtifactKind;
use crate::llm::Backend;
use crate::memory::PersistenceError;
use crate::sandbox::ExecutionOutcome;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// 后端调用失败；Display 即 Gateway 返回给上层的错误文本
    #[error("{} Error: {message}", .backend.error_label())]
    Provider { backend: Backend, message: String },

    #[error("Error parsing decision: {reason}\nRaw output: {raw}")]
    DecisionParse { reason: String, raw: String },

    #[error("{kind} execution failed: {message}")]
    Execution { kind: ArtifactKind, message: String },

    #[error("{kind} execution timed out ({secs}s limit)")]
    ExecutionTimeout { kind: ArtifactKind, secs: u64 },

    #[error("Could not save AI memory: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl OrchestratorError {
    /// 非成功的执行结果转为错误；成功时返回 None
    pub fn from_outcome(kind: ArtifactKind, outcome: &ExecutionOutcome) -> Option<Self> {
        if outcome.is_success() {
            return None;
        }
        match outcome {
            ExecutionOutcome::Success { .. } => None,
            ExecutionOutcome::Failure { code, stderr } => Some(Self::Execution {
                kind,
                message: match code {
                    Some(code) => format!("exit code {}: {}", code, stderr.trim()),
                    None => format!("terminated by signal: {}", stderr.trim()),
                },
            }),
            ExecutionOutcome::TimedOut { after } => Some(Self::ExecutionTimeout {
                kind,
                secs: after.as_secs(),
            }),
            ExecutionOutcome::LaunchError(e) => Some(Self::Execution {
                kind,
                message: e.clone(),
            }),
        }
    }
}
