//! 执行沙箱：以子进程运行暂存的 Python / Bash 脚本
//!
//! 契约：捕获 stdout / stderr / 退出码，带硬性墙钟超时；超时时终止整个进程树。
//! 这里不提供任何隔离，只是把风险收敛在 `Sandbox` trait 之后，便于替换为容器或受限用户实现。

pub mod process;

pub use process::ProcessSandbox;

use std::time::Duration;

use async_trait::async_trait;

use crate::artifact::ArtifactKind;

/// 一次执行的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// 退出码 0
    Success { stdout: String },
    /// 非零退出（被信号终止时 code 为 None）
    Failure { code: Option<i32>, stderr: String },
    /// 超过墙钟时限，进程组已被终止
    TimedOut { after: Duration },
    /// 无法启动（解释器不存在、临时文件写入失败等）
    LaunchError(String),
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success { .. })
    }

    /// 渲染为对话记录中的一段文本
    pub fn describe(&self, kind: ArtifactKind) -> String {
        match self {
            ExecutionOutcome::Success { stdout } => {
                format!("{} execution successful:\n{}", kind, stdout)
            }
            ExecutionOutcome::Failure { stderr, .. } => {
                format!("{} execution failed:\n{}", kind, stderr)
            }
            ExecutionOutcome::TimedOut { after } => {
                format!("{} execution timed out ({}s limit)", kind, after.as_secs())
            }
            ExecutionOutcome::LaunchError(e) => format!("{} execution error: {}", kind, e),
        }
    }
}

/// 沙箱能力：运行一段 Python 或 Bash 脚本
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// `kind` 只接受 Python / Bash；SelfMod 返回 LaunchError
    async fn run(&self, kind: ArtifactKind, body: &str) -> ExecutionOutcome;
}
