//! 事件处理
//!
//! 轮询 crossterm 键盘事件并映射为应用事件：
//! 功能键与 Enter 提交输入；Alt+字母执行暂存操作（保持输入行可正常打字）；Ctrl+C / Ctrl+Q / F4 退出。

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

use crate::artifact::ArtifactKind;
use crate::core::{Command, SubmitAction};
use crate::llm::Backend;

/// 应用事件
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// 以当前输入行提交
    Submit(SubmitAction),
    /// 不需要输入的命令
    Command(Command),
    Quit,
    /// 交给输入框 / 滚动处理的原始按键
    Key(KeyEvent),
}

/// 按键到应用事件的映射
pub fn map_key(key: KeyEvent) -> AppEvent {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        KeyCode::F(1) | KeyCode::Enter => AppEvent::Submit(SubmitAction::Orchestrate),
        KeyCode::F(2) => AppEvent::Submit(SubmitAction::Force(Backend::Gpt)),
        KeyCode::F(3) => AppEvent::Submit(SubmitAction::Force(Backend::Claude)),
        KeyCode::F(4) => AppEvent::Quit,
        KeyCode::Char(c) if ctrl => match c.to_ascii_lowercase() {
            'c' | 'q' => AppEvent::Quit,
            'l' => AppEvent::Command(Command::ClearScreen),
            _ => AppEvent::Key(key),
        },
        KeyCode::Char(c) if alt => match c.to_ascii_lowercase() {
            '1' => AppEvent::Submit(SubmitAction::Context(Backend::Gemini)),
            '2' => AppEvent::Submit(SubmitAction::Context(Backend::Gpt)),
            '3' => AppEvent::Submit(SubmitAction::Context(Backend::Claude)),
            'q' => AppEvent::Submit(SubmitAction::RequestPython),
            'w' => AppEvent::Submit(SubmitAction::RequestBash),
            'e' => AppEvent::Command(Command::ToggleAutonomous),
            'p' => AppEvent::Command(Command::RunPending(ArtifactKind::Python)),
            'b' => AppEvent::Command(Command::RunPending(ArtifactKind::Bash)),
            's' => AppEvent::Command(Command::ApplySelfMod),
            'd' => AppEvent::Command(Command::ClearPending),
            'm' => AppEvent::Command(Command::ShowDiagnostics),
            _ => AppEvent::Key(key),
        },
        _ => AppEvent::Key(key),
    }
}

/// 事件处理器：持有 cmd_tx，poll 时读键盘并返回 AppEvent
pub struct EventHandler {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl EventHandler {
    pub fn new(cmd_tx: mpsc::UnboundedSender<Command>) -> Self {
        Self { cmd_tx }
    }

    pub fn poll(&self) -> anyhow::Result<Option<AppEvent>> {
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(Some(map_key(key)));
                }
            }
        }
        Ok(None)
    }

    pub fn send(&self, cmd: Command) {
        if self.cmd_tx.send(cmd).is_err() {
            tracing::warn!("orchestrator channel closed");
        }
    }

    pub fn send_submit(&self, action: SubmitAction, input: String) {
        self.send(Command::Submit(action, input));
    }
}
