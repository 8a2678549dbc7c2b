//! 自动执行策略：自主模式下哪些 Python 制品可以跳过手动确认

use crate::artifact::{Artifact, ArtifactKind};
use crate::config::AutonomySection;

pub trait AutoExecPolicy: Send + Sync {
    fn is_auto_safe(&self, artifact: &Artifact) -> bool;
}

/// 默认策略：Python 代码包含标记（默认 `print`）且长度低于阈值（默认 100 字符）
#[derive(Debug, Clone)]
pub struct MarkerLengthPolicy {
    marker: String,
    max_len: usize,
}

impl MarkerLengthPolicy {
    pub fn new(marker: impl Into<String>, max_len: usize) -> Self {
        Self {
            marker: marker.into(),
            max_len,
        }
    }

    pub fn from_config(cfg: &AutonomySection) -> Self {
        Self::new(cfg.auto_exec_marker.clone(), cfg.auto_exec_max_len)
    }
}

impl AutoExecPolicy for MarkerLengthPolicy {
    fn is_auto_safe(&self, artifact: &Artifact) -> bool {
        artifact.kind == ArtifactKind::Python
            && artifact.body.contains(&self.marker)
            && artifact.body.chars().count() < self.max_len
    }
}

/// 从不自动执行
#[derive(Debug, Clone, Default)]
pub struct NeverAutoExec;

impl AutoExecPolicy for NeverAutoExec {
    fn is_auto_safe(&self, _artifact: &Artifact) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python(body: &str) -> Artifact {
        Artifact {
            kind: ArtifactKind::Python,
            body: body.to_string(),
            source: "Autonomous-Agent".to_string(),
        }
    }

    #[test]
    fn test_short_print_is_safe() {
        let policy = MarkerLengthPolicy::new("print", 100);
        assert!(policy.is_auto_safe(&python("print('hello')")));
    }

    #[test]
    fn test_long_or_unmarked_is_not_safe() {
        let policy = MarkerLengthPolicy::new("print", 100);
        assert!(!policy.is_auto_safe(&python("import os; os.remove('x')")));
        assert!(!policy.is_auto_safe(&python(&format!("print('{}')", "a".repeat(100)))));
    }

    #[test]
    fn test_length_bound_is_exclusive() {
        let policy = MarkerLengthPolicy::new("print", 10);
        assert!(policy.is_auto_safe(&python("print(1) ")));
        assert!(!policy.is_auto_safe(&python("print(12) ")));
    }

    #[test]
    fn test_bash_is_never_auto_safe() {
        let policy = MarkerLengthPolicy::new("echo", 100);
        let artifact = Artifact {
            kind: ArtifactKind::Bash,
            body: "echo hi".into(),
            source: "GPT-4o".into(),
        };
        assert!(!policy.is_auto_safe(&artifact));
        assert!(!NeverAutoExec.is_auto_safe(&python("print(1)")));
    }
}
