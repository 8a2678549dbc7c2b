//! 编排器：主控循环
//!
//! 负责：加载配置、构建 Engine、建立 cmd/state 两个通道，
//! 并在后台任务中逐条消费 UI 命令，每条命令执行完毕后发布一份 UiState 快照。

use std::path::PathBuf;

use tokio::sync::{mpsc, watch};

use crate::artifact::ArtifactKind;
use crate::config::{load_config, AppConfig};
use crate::core::{Engine, EngineBuilder, OrchestratorError, SubmitAction, UiState};

/// 从 UI 发往编排器的命令
#[derive(Debug, Clone)]
pub enum Command {
    /// 带输入的提交（智能路由 / 强制 / 全上下文 / 脚本请求）
    Submit(SubmitAction, String),
    ToggleAutonomous,
    /// 执行暂存的 Python / Bash 脚本
    RunPending(ArtifactKind),
    ApplySelfMod,
    ClearPending,
    ShowDiagnostics,
    ClearScreen,
    Quit,
}

impl Command {
    /// 执行期间显示在标题栏的描述
    fn label(&self) -> String {
        match self {
            Command::Submit(action, _) => action.label(),
            Command::ToggleAutonomous => "autonomous".to_string(),
            Command::RunPending(kind) => format!("run {}", kind),
            Command::ApplySelfMod => "self-modification".to_string(),
            Command::ClearPending => "clear".to_string(),
            Command::ShowDiagnostics => "diagnostics".to_string(),
            Command::ClearScreen => "clear screen".to_string(),
            Command::Quit => "quit".to_string(),
        }
    }
}

/// 在当前 Engine 上执行一条命令；Quit 返回 false
pub async fn dispatch(engine: &mut Engine, cmd: Command) -> bool {
    tracing::debug!(command = %cmd.label(), "dispatch");
    match cmd {
        Command::Submit(action, input) => engine.submit(action, &input).await,
        Command::ToggleAutonomous => engine.toggle_autonomous().await,
        Command::RunPending(kind) => {
            engine.run_pending(kind).await;
        }
        Command::ApplySelfMod => {
            engine.apply_self_mod().await;
        }
        Command::ClearPending => engine.clear_pending(),
        Command::ShowDiagnostics => engine.show_diagnostics(),
        Command::ClearScreen => engine.clear_screen(),
        Command::Quit => return false,
    }
    true
}

/// 把 Engine 交给后台 owner 任务：返回命令发送端与状态接收端
pub fn spawn_engine(mut engine: Engine) -> (mpsc::UnboundedSender<Command>, watch::Receiver<UiState>) {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<Command>();
    let (state_tx, state_rx) = watch::channel(engine.snapshot());

    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            // 先锁定输入并显示阶段，再执行
            let working = state_tx.borrow().working(cmd.label());
            let _ = state_tx.send(working);

            if !dispatch(&mut engine, cmd).await {
                break;
            }
            let _ = state_tx.send(engine.snapshot());
        }
        tracing::info!("orchestrator loop stopped");
    });

    (cmd_tx, state_rx)
}

/// 从配置创建编排器；配置加载失败时使用默认配置
pub fn create_orchestrator(
    config_path: Option<PathBuf>,
) -> anyhow::Result<(mpsc::UnboundedSender<Command>, watch::Receiver<UiState>)> {
    let cfg = load_config(config_path).unwrap_or_else(|e| {
        let e = OrchestratorError::from(e);
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });
    tracing::info!(
        decider = %cfg.llm.decider,
        specialist = %cfg.autonomy.specialist,
        memory = %cfg.memory.path.display(),
        "starting orchestrator"
    );

    let engine = EngineBuilder::new(cfg).build();
    Ok(spawn_engine(engine))
}
