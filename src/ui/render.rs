//! 界面渲染
//!
//! 标题栏显示阶段与自主模式；主体为对话记录（按行前缀着色、按宽度换行）；
//! 状态栏显示暂存槽位；底部为输入框与快捷键提示。

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};

use crate::core::{PendingFlags, Phase, UiState};

/// 将内容按宽度换行（按字符数，避免在 UTF-8 中间截断）；续行缩进两格
pub(crate) fn wrap_line(s: &str, width: usize) -> Vec<String> {
    if width <= 2 || s.chars().count() <= width {
        return vec![s.to_string()];
    }
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut count = 0usize;
    for ch in s.chars() {
        if count >= width {
            lines.push(std::mem::take(&mut line));
            line.push_str("  ");
            count = 2;
        }
        line.push(ch);
        count += 1;
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Paragraph 的滚动偏移是 u16，超出部分停在最后可表示的行
fn scroll_row(offset: usize) -> u16 {
    offset.min(u16::MAX as usize) as u16
}

/// 按行首前缀着色
fn line_style(line: &str) -> Style {
    if line.starts_with("--- You:") || line.starts_with("--- Sending") {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else if line.contains("READY from") || line.starts_with("WARNING") {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else if line.starts_with("Press ") {
        Style::default().fg(Color::DarkGray)
    } else if line.contains("Error")
        || line.contains("failed")
        || line.contains("timed out")
        || line.starts_with("No ")
    {
        Style::default().fg(Color::Red)
    } else if line.contains("successful") || line.starts_with("Memory updated") || line.starts_with("New ") {
        Style::default().fg(Color::Green)
    } else if line.starts_with("Autonomous Agent") || line.starts_with("AUTONOMOUS") {
        Style::default().fg(Color::Magenta)
    } else {
        Style::default()
    }
}

fn pending_summary(pending: &PendingFlags) -> String {
    let mut staged = Vec::new();
    if pending.python {
        staged.push("Python [Alt+P]");
    }
    if pending.bash {
        staged.push("Bash [Alt+B]");
    }
    if pending.self_mod {
        staged.push("SelfMod [Alt+S]");
    }
    if staged.is_empty() {
        return " Pending: none ".to_string();
    }
    match &pending.source {
        Some(source) => format!(" Pending from {}: {} │ Alt+D deny ", source, staged.join(", ")),
        None => format!(" Pending: {} │ Alt+D deny ", staged.join(", ")),
    }
}

/// 绘制一帧；将 (总行数, 可视高度) 写入 out 供外部 clamp 滚动
pub fn draw(
    f: &mut Frame,
    state: &UiState,
    input_buffer: &str,
    scroll: usize,
    out: &mut (usize, usize),
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(f.area());

    let conv_area = chunks[0];
    let content_width = conv_area.width.saturating_sub(3) as usize; // 边框 + 滚动条

    let phase = match &state.phase {
        Phase::Idle => "Idle".to_string(),
        Phase::Working(label) => format!("Working: {}…", label),
    };
    let autonomy = if state.autonomous {
        format!("Autonomous: ON ({} queued)", state.queued_tasks)
    } else {
        "Autonomous: OFF".to_string()
    };
    let block = Block::default()
        .title(format!(" Maestro │ {} │ {} ", phase, autonomy))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if state.autonomous {
            Color::Magenta
        } else {
            Color::Yellow
        }));

    let mut text_lines: Vec<Line> = Vec::new();
    for raw in &state.transcript {
        let style = line_style(raw);
        for piece in wrap_line(raw, content_width.max(20)) {
            text_lines.push(Line::from(Span::styled(piece, style)));
        }
    }

    let content_height = conv_area.height.saturating_sub(2) as usize;
    let total_lines = text_lines.len();
    let scroll_offset = scroll.min(total_lines.saturating_sub(content_height));

    let inner = block.inner(conv_area);
    f.render_widget(block, conv_area);
    let paragraph = Paragraph::new(Text::from(text_lines)).scroll((scroll_row(scroll_offset), 0));
    f.render_widget(paragraph, inner);

    if total_lines > content_height {
        let mut scrollbar_state = ScrollbarState::new(total_lines)
            .position(scroll_offset)
            .viewport_content_length(content_height);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .thumb_symbol("█")
            .track_symbol(Some("░"));
        f.render_stateful_widget(scrollbar, inner, &mut scrollbar_state);
    }

    let status_style = if state.pending.python || state.pending.bash || state.pending.self_mod {
        Style::default().fg(Color::Black).bg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    f.render_widget(
        Paragraph::new(pending_summary(&state.pending)).style(status_style),
        chunks[1],
    );

    let (title, border_color) = if let Some(err) = &state.error_message {
        (
            format!(" Error: {} ", err.chars().take(48).collect::<String>()),
            Color::Red,
        )
    } else if state.input_locked {
        (" Waiting… ".to_string(), Color::DarkGray)
    } else {
        (" Prompt ".to_string(), Color::Blue)
    };

    let hint = " F1/Enter Smart │ F2 GPT │ F3 Claude │ Alt+1/2/3 Context │ Alt+Q Py │ Alt+W Bash │ Alt+E Auto │ Alt+M Diag │ F4 Exit ";
    let input_block = Block::default()
        .title(title)
        .title_bottom(Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let input = Paragraph::new(input_buffer)
        .block(input_block)
        .wrap(Wrap { trim: false })
        .style(if state.input_locked {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        });
    f.render_widget(input, chunks[2]);

    out.0 = total_lines;
    out.1 = content_height;
}
