//! TUI 应用主循环
//!
//! 进入全屏/原始模式，轮询 state_rx 与键盘事件，将输入行与快捷键转为 Command 发送给编排器，
//! 每帧用 draw 渲染 UiState 与输入缓冲。

use std::io::{self, Stdout};

use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{mpsc, watch};

use crate::core::{Command, UiState};
use crate::ui::event::{AppEvent, EventHandler};
use crate::ui::render::draw;

/// 运行 TUI：启用原始模式与全屏，循环 poll 事件 + 渲染，退出时恢复终端
pub async fn run_app(
    state_rx: watch::Receiver<UiState>,
    cmd_tx: mpsc::UnboundedSender<Command>,
) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, state_rx, EventHandler::new(cmd_tx)).await;

    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    state_rx: watch::Receiver<UiState>,
    events: EventHandler,
) -> anyhow::Result<()> {
    let mut input_buffer = String::new();
    let mut scroll = usize::MAX;
    let mut last_len = 0usize;

    loop {
        let state = state_rx.borrow().clone();

        // 有新内容时跟随到底部
        if state.transcript.len() != last_len {
            last_len = state.transcript.len();
            scroll = usize::MAX;
        }

        if let Some(ev) = events.poll()? {
            match ev {
                AppEvent::Quit => {
                    events.send(Command::Quit);
                    break;
                }
                AppEvent::Submit(action) if !state.input_locked => {
                    let input = input_buffer.trim().to_string();
                    input_buffer.clear();
                    if matches!(input.to_lowercase().as_str(), "/exit" | "exit" | "/quit" | "quit") {
                        events.send(Command::Quit);
                        break;
                    }
                    if !input.is_empty() {
                        events.send_submit(action, input);
                    }
                }
                AppEvent::Command(cmd) if !state.input_locked => events.send(cmd),
                AppEvent::Key(key) if !state.input_locked => match key.code {
                    KeyCode::Backspace => {
                        input_buffer.pop();
                    }
                    KeyCode::Char(c)
                        if !key
                            .modifiers
                            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
                    {
                        input_buffer.push(c);
                    }
                    KeyCode::Up => scroll = scroll.saturating_sub(1),
                    KeyCode::Down => scroll = scroll.saturating_add(1),
                    KeyCode::PageUp => scroll = scroll.saturating_sub(10),
                    KeyCode::PageDown => scroll = scroll.saturating_add(10),
                    KeyCode::Home => scroll = 0,
                    KeyCode::End => scroll = usize::MAX,
                    _ => {}
                },
                _ => {}
            }
        }

        let mut scroll_info = (0usize, 0usize);
        terminal.draw(|f| draw(f, &state, &input_buffer, scroll, &mut scroll_info))?;
        let (total_lines, viewport_height) = scroll_info;
        scroll = scroll.min(total_lines.saturating_sub(viewport_height));

        tokio::task::yield_now().await;
    }
    Ok(())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
