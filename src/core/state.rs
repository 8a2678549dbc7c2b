//! UI 看到的投影状态
//!
//! Engine 持有完整状态；每处理完一条命令投影出一份轻量的 UiState 供渲染。

use serde::Serialize;

/// 编排阶段（UI 投影用）
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    /// 正在处理命令（等待后端、执行脚本或应用自修改）
    Working(String),
}

/// 暂存槽位的占用情况
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PendingFlags {
    pub python: bool,
    pub bash: bool,
    pub self_mod: bool,
    pub source: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct UiState {
    pub phase: Phase,
    pub transcript: Vec<String>,
    pub autonomous: bool,
    pub queued_tasks: usize,
    pub pending: PendingFlags,
    pub input_locked: bool,
    pub error_message: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            transcript: Vec::new(),
            autonomous: false,
            queued_tasks: 0,
            pending: PendingFlags::default(),
            input_locked: false,
            error_message: None,
        }
    }
}

impl UiState {
    /// 命令开始执行时的状态：沿用上一帧内容并锁定输入
    pub fn working(&self, label: impl Into<String>) -> Self {
        Self {
            phase: Phase::Working(label.into()),
            input_locked: true,
            ..self.clone()
        }
    }
}
