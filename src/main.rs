//! Maestro - 终端多模型编排器
//!
//! 入口：初始化日志、创建编排器与 TUI，并运行主循环。

use anyhow::Context;
use maestro::{core::create_orchestrator, observability, ui::run_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init(observability::DEFAULT_LOG_FILE).context("Failed to init logging")?;

    // 命令发送端 + 状态接收端
    let (cmd_tx, state_rx) = create_orchestrator(None).context("Failed to create orchestrator")?;

    run_app(state_rx, cmd_tx).await.context("App run failed")?;

    tracing::info!("exit");
    Ok(())
}
