//! Memory Bundle：memory / patterns / functions / evolution_log 四部分作为一个整体持久化

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 当前本地时间的 ISO 8601 表示（不带时区）
pub fn now_iso() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedPattern {
    pub pattern: String,
    pub learned_from: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionKind {
    /// 结构化自修改记录
    SelfModification,
    /// 非结构化自修改代码
    CodeExecution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionEntry {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: EvolutionKind,
    pub description: String,
    pub source: String,
    /// 记录时对话记录的大小（行数）
    #[serde(default)]
    pub conversation_context: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryBundle {
    pub memory: Map<String, Value>,
    pub patterns: Vec<LearnedPattern>,
    /// 仅存储，不执行
    pub functions: BTreeMap<String, String>,
    pub evolution_log: Vec<EvolutionEntry>,
}

impl MemoryBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge_memory(&mut self, update: Map<String, Value>) {
        self.memory.extend(update);
    }

    pub fn learn_pattern(&mut self, pattern: impl Into<String>, learned_from: impl Into<String>) {
        self.patterns.push(LearnedPattern {
            pattern: pattern.into(),
            learned_from: learned_from.into(),
            timestamp: now_iso(),
        });
    }

    pub fn add_function(&mut self, name: impl Into<String>, code: impl Into<String>) {
        self.functions.insert(name.into(), code.into());
    }

    pub fn log_evolution(
        &mut self,
        kind: EvolutionKind,
        description: impl Into<String>,
        source: impl Into<String>,
        conversation_context: usize,
    ) {
        self.evolution_log.push(EvolutionEntry {
            timestamp: now_iso(),
            kind,
            description: description.into(),
            source: source.into(),
            conversation_context,
        });
    }

    pub fn recent_patterns(&self, n: usize) -> &[LearnedPattern] {
        let start = self.patterns.len().saturating_sub(n);
        &self.patterns[start..]
    }

    pub fn recent_evolution(&self, n: usize) -> &[EvolutionEntry] {
        let start = self.evolution_log.len().saturating_sub(n);
        &self.evolution_log[start..]
    }

    pub fn function_names(&self) -> Vec<&str> {
        self.functions.keys().map(String::as_str).collect()
    }

    // ---------- 提示词中的摘要 ----------

    pub fn memory_summary(&self) -> String {
        if self.memory.is_empty() {
            "No stored memories".to_string()
        } else {
            Value::Object(self.memory.clone()).to_string()
        }
    }

    pub fn patterns_summary(&self, n: usize) -> String {
        if self.patterns.is_empty() {
            "No learned patterns".to_string()
        } else {
            to_json(self.recent_patterns(n))
        }
    }

    pub fn evolution_summary(&self, n: usize) -> String {
        if self.evolution_log.is_empty() {
            "No evolution history".to_string()
        } else {
            to_json(self.recent_evolution(n))
        }
    }
}

/// 序列化为紧凑 JSON；失败时退回 Debug 表示
pub(crate) fn to_json<T: Serialize + std::fmt::Debug + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_slices_clamp() {
        let mut bundle = MemoryBundle::new();
        bundle.learn_pattern("a", "GPT-4o");
        assert_eq!(bundle.recent_patterns(3).len(), 1);
        for p in ["b", "c", "d"] {
            bundle.learn_pattern(p, "GPT-4o");
        }
        let recent: Vec<&str> = bundle.recent_patterns(3).iter().map(|p| p.pattern.as_str()).collect();
        assert_eq!(recent, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_merge_memory_overwrites_keys() {
        let mut bundle = MemoryBundle::new();
        let mut first = Map::new();
        first.insert("lang".into(), Value::from("rust"));
        first.insert("level".into(), Value::from(1));
        bundle.merge_memory(first);
        let mut second = Map::new();
        second.insert("level".into(), Value::from(2));
        bundle.merge_memory(second);
        assert_eq!(bundle.memory["lang"], "rust");
        assert_eq!(bundle.memory["level"], 2);
    }

    #[test]
    fn test_summaries_for_empty_bundle() {
        let bundle = MemoryBundle::new();
        assert_eq!(bundle.memory_summary(), "No stored memories");
        assert_eq!(bundle.patterns_summary(3), "No learned patterns");
        assert_eq!(bundle.evolution_summary(2), "No evolution history");
    }

    #[test]
    fn test_summaries_keep_most_recent_entries() {
        let mut bundle = MemoryBundle::new();
        for p in ["one", "two", "three", "four"] {
            bundle.learn_pattern(p, "GPT-4o");
        }
        bundle.log_evolution(EvolutionKind::SelfModification, "first", "Claude", 1);
        bundle.log_evolution(EvolutionKind::CodeExecution, "second", "Claude", 2);
        bundle.log_evolution(EvolutionKind::CodeExecution, "third", "Claude", 3);

        let patterns: Vec<Value> = serde_json::from_str(&bundle.patterns_summary(3)).unwrap();
        assert_eq!(patterns.len(), 3);
        assert_eq!(patterns[0]["pattern"], "two");
        let evolution: Vec<Value> = serde_json::from_str(&bundle.evolution_summary(2)).unwrap();
        assert_eq!(evolution.len(), 2);
        assert_eq!(evolution[1]["description"], "third");
    }

    #[test]
    fn test_evolution_entry_serializes_type_field() {
        let mut bundle = MemoryBundle::new();
        bundle.log_evolution(EvolutionKind::CodeExecution, "ran", "Claude", 12);
        let v = serde_json::to_value(&bundle.evolution_log[0]).unwrap();
        assert_eq!(v["type"], "code_execution");
        assert_eq!(v["conversation_context"], 12);
    }
}
