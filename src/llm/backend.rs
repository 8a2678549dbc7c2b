//! 后端身份：一个决策者 + 两个专家
//!
//! 哪个后端负责决策由配置决定，Gateway 本身不区分。

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Gemini,
    Gpt,
    Claude,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Gemini, Backend::Gpt, Backend::Claude];

    /// 对话记录与来源标注中使用的名称
    pub fn display_name(self) -> &'static str {
        match self {
            Backend::Gemini => "Gemini",
            Backend::Gpt => "GPT-4o",
            Backend::Claude => "Claude",
        }
    }

    /// 错误文本前缀：`<label> Error: <message>`
    pub fn error_label(self) -> &'static str {
        match self {
            Backend::Gemini => "Gemini",
            Backend::Gpt => "GPT",
            Backend::Claude => "Claude",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Backend::Gemini => "gemini",
            Backend::Gpt => "gpt",
            Backend::Claude => "claude",
        };
        f.write_str(s)
    }
}
