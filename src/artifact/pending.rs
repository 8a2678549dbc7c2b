//! 待处理操作：每种类型一个槽位，外加一个共享来源字段
//!
//! 同类型再次暂存会覆盖旧内容（不可恢复）；来源只记录最近一次暂存，不区分类型。

use crate::artifact::{Artifact, ArtifactKind};

#[derive(Debug, Default, Clone)]
pub struct PendingStore {
    python: Option<String>,
    bash: Option<String>,
    self_mod: Option<String>,
    source: Option<String>,
}

impl PendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: ArtifactKind) -> &Option<String> {
        match kind {
            ArtifactKind::Python => &self.python,
            ArtifactKind::Bash => &self.bash,
            ArtifactKind::SelfMod => &self.self_mod,
        }
    }

    fn slot_mut(&mut self, kind: ArtifactKind) -> &mut Option<String> {
        match kind {
            ArtifactKind::Python => &mut self.python,
            ArtifactKind::Bash => &mut self.bash,
            ArtifactKind::SelfMod => &mut self.self_mod,
        }
    }

    /// 空内容等同于清空该槽位（例如先出现结束标记的区间）
    pub fn stage(&mut self, kind: ArtifactKind, body: impl Into<String>, source: impl Into<String>) {
        *self.slot_mut(kind) = Some(body.into()).filter(|b| !b.is_empty());
        self.source = Some(source.into());
    }

    /// 取出并清空该槽位；来源字段保持不变
    pub fn take(&mut self, kind: ArtifactKind) -> Option<Artifact> {
        let body = self.slot_mut(kind).take()?;
        Some(Artifact {
            kind,
            body,
            source: self.provenance().to_string(),
        })
    }

    pub fn peek(&self, kind: ArtifactKind) -> Option<Artifact> {
        self.slot(kind).as_ref().map(|body| Artifact {
            kind,
            body: body.clone(),
            source: self.provenance().to_string(),
        })
    }

    pub fn is_staged(&self, kind: ArtifactKind) -> bool {
        self.slot(kind).is_some()
    }

    /// 最近一次暂存的来源；从未暂存时为空串
    pub fn provenance(&self) -> &str {
        self.source.as_deref().unwrap_or("")
    }

    pub fn clear_all(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_replaces_previous_body() {
        let mut store = PendingStore::new();
        store.stage(ArtifactKind::Bash, "echo one", "GPT-4o");
        store.stage(ArtifactKind::Bash, "echo two", "Claude");
        let artifact = store.take(ArtifactKind::Bash).unwrap();
        assert_eq!(artifact.body, "echo two");
        assert_eq!(artifact.source, "Claude");
        assert!(store.take(ArtifactKind::Bash).is_none());
    }

    #[test]
    fn test_provenance_is_shared_across_kinds() {
        let mut store = PendingStore::new();
        store.stage(ArtifactKind::Python, "print(1)", "GPT-4o");
        store.stage(ArtifactKind::Bash, "ls", "Claude");
        assert_eq!(store.peek(ArtifactKind::Python).unwrap().source, "Claude");
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut store = PendingStore::new();
        store.stage(ArtifactKind::Python, "print(1)", "GPT-4o");
        assert!(store.is_staged(ArtifactKind::Python));
        assert!(!store.is_staged(ArtifactKind::Bash));
        assert!(!store.is_staged(ArtifactKind::SelfMod));
    }

    #[test]
    fn test_empty_body_leaves_slot_empty() {
        let mut store = PendingStore::new();
        store.stage(ArtifactKind::Bash, "ls", "GPT-4o");
        store.stage(ArtifactKind::Bash, "", "Claude");
        assert!(!store.is_staged(ArtifactKind::Bash));
        assert!(store.take(ArtifactKind::Bash).is_none());
        assert_eq!(store.provenance(), "Claude");
    }

    #[test]
    fn test_clear_all() {
        let mut store = PendingStore::new();
        store.stage(ArtifactKind::Python, "print(1)", "GPT-4o");
        store.stage(ArtifactKind::SelfMod, "{}", "GPT-4o");
        store.clear_all();
        assert!(ArtifactKind::ALL.iter().all(|k| !store.is_staged(*k)));
        assert_eq!(store.provenance(), "");
    }
}
