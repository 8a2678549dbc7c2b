//! 代码制品：从模型回复中提取的可执行/可应用文本单元
//!
//! - **extractor**: 按标记对扫描回复（@Python / @Bash / @SelfMod）
//! - **pending**: 每种类型一个待处理槽位 + 共享来源

pub mod extractor;
pub mod pending;

pub use extractor::{extract, extract_kind};
pub use pending::PendingStore;

use std::fmt;

/// 制品类型；与标记对一一对应
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Python,
    Bash,
    SelfMod,
}

impl ArtifactKind {
    /// 提取顺序：Bash、Python、SelfMod
    pub const ALL: [ArtifactKind; 3] = [ArtifactKind::Bash, ArtifactKind::Python, ArtifactKind::SelfMod];

    pub fn open_marker(self) -> &'static str {
        match self {
            ArtifactKind::Python => "@Python",
            ArtifactKind::Bash => "@Bash",
            ArtifactKind::SelfMod => "@SelfMod",
        }
    }

    pub fn close_marker(self) -> &'static str {
        match self {
            ArtifactKind::Python => "@EndPython",
            ArtifactKind::Bash => "@EndBash",
            ArtifactKind::SelfMod => "@EndSelfMod",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArtifactKind::Python => "Python",
            ArtifactKind::Bash => "Bash",
            ArtifactKind::SelfMod => "Self-modification",
        };
        f.write_str(s)
    }
}

/// 已暂存的制品
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub body: String,
    /// 来源（产生该制品的后端或 Agent 名）
    pub source: String,
}
