//! 对话记录与 Project State
//!
//! 两者都有上限：对话记录按行滚动，Project State 只保留最近 N 条。

use std::collections::VecDeque;

/// 对话记录：只追加的显示行，超出上限时丢弃最旧的行
#[derive(Debug, Clone)]
pub struct Transcript {
    lines: VecDeque<String>,
    max_lines: usize,
}

impl Transcript {
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            max_lines: max_lines.max(1),
        }
    }

    /// 追加一段文本（按换行拆分为多行）
    pub fn push(&mut self, text: &str) {
        for line in text.split('\n') {
            self.lines.push_back(line.to_string());
        }
        while self.lines.len() > self.max_lines {
            self.lines.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }

    /// 组装为完整上下文（发给后端的全文）
    pub fn as_text(&self) -> String {
        self.lines.iter().cloned().collect::<Vec<_>>().join("\n")
    }

    /// 清屏：用 banner 替换全部内容
    pub fn reset(&mut self, banner: &str) {
        self.lines.clear();
        self.push(banner);
    }
}

const PROJECT_NOT_STARTED: &str = "Project has not started yet. The goal is undefined.";

/// Project State：每次处理请求追加一条 `User / Action / Result` 叙事
#[derive(Debug, Clone)]
pub struct ProjectState {
    entries: VecDeque<String>,
    max_entries: usize,
}

impl ProjectState {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn record(&mut self, input: &str, action: &str, result: &str) {
        self.entries.push_back(format!(
            "---\nUser: '{}'\nAction: {}\nResult: {}\n---",
            input, action, result
        ));
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn narrative(&self) -> String {
        if self.entries.is_empty() {
            return PROJECT_NOT_STARTED.to_string();
        }
        self.entries.iter().cloned().collect::<Vec<_>>().join("\n\n")
    }
}
