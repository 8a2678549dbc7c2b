//! 自主任务队列（FIFO）与建议列表解析

use std::collections::VecDeque;
use std::sync::OnceLock;

use regex::Regex;

/// 行首为项目符号（`-` / `•` / `*`）或 `1.` 形式的编号时视为一条任务
fn list_item() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:[-•*]|\d+\.)").expect("static regex"))
}

/// 从自由文本中解析任务：只看未缩进的行，去掉前导的符号、数字、点与空格
pub fn parse_suggestions(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.trim().is_empty() && list_item().is_match(line))
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| matches!(c, '-' | '•' | '*' | '.' | ' ') || c.is_ascii_digit())
                .to_string()
        })
        .filter(|task| !task.is_empty())
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    tasks: VecDeque<String>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: impl Into<String>) {
        self.tasks.push_back(task.into());
    }

    pub fn extend(&mut self, tasks: impl IntoIterator<Item = String>) {
        self.tasks.extend(tasks);
    }

    pub fn pop(&mut self) -> Option<String> {
        self.tasks.pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.tasks.iter()
    }
}
