//! 自修改应用器
//!
//! - Structured：依次应用 memory_update / new_pattern / new_function，并总是记一条 self_modification 演化
//! - RawCode：交给 CodeRuntime 执行，成功后记一条 code_execution 演化（描述截取代码前 100 字符）
//! - Malformed：只报告错误
//!
//! 槽位清空与持久化由调用方（Engine）负责，在所有分支都会发生。

use std::sync::Arc;

use serde_json::Value;

use crate::memory::{EvolutionKind, MemoryBundle};
use crate::selfmod::{parse_self_mod, CodeRuntime, RuntimeScope, SelfModParse, SelfModRecord};

/// 演化日志中代码描述的最大字符数
const CODE_DESCRIPTION_CHARS: usize = 100;

/// 一次应用的结果：对话记录行 + 是否成功
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    pub lines: Vec<String>,
    pub applied: bool,
}

pub struct SelfModApplier {
    runtime: Arc<dyn CodeRuntime>,
}

impl SelfModApplier {
    pub fn new(runtime: Arc<dyn CodeRuntime>) -> Self {
        Self { runtime }
    }

    /// `source` 为当前共享来源；`conversation_context` 写入演化条目
    pub async fn apply(
        &self,
        body: &str,
        source: &str,
        bundle: &mut MemoryBundle,
        conversation_context: usize,
    ) -> ApplyReport {
        match parse_self_mod(body) {
            SelfModParse::Structured(record) => {
                apply_record(record, source, bundle, conversation_context)
            }
            SelfModParse::RawCode(code) => {
                self.apply_code(&code, source, bundle, conversation_context)
                    .await
            }
            SelfModParse::Malformed(reason) => {
                tracing::warn!(reason = %reason, "malformed self-modification");
                ApplyReport {
                    lines: vec![format!("Self-modification error: {}", reason)],
                    applied: false,
                }
            }
        }
    }

    async fn apply_code(
        &self,
        code: &str,
        source: &str,
        bundle: &mut MemoryBundle,
        conversation_context: usize,
    ) -> ApplyReport {
        let scope = RuntimeScope::from_bundle(bundle);
        let result = match self.runtime.run(code, scope).await {
            Ok(new_scope) => new_scope.apply_to(bundle, source),
            Err(e) => Err(e),
        };

        match result {
            Ok(history) => {
                let mut lines = history;
                lines.push("Self-modification code executed successfully".to_string());
                let head: String = code.chars().take(CODE_DESCRIPTION_CHARS).collect();
                bundle.log_evolution(
                    EvolutionKind::CodeExecution,
                    format!("Executed self-mod code: {}...", head),
                    source,
                    conversation_context,
                );
                ApplyReport {
                    lines,
                    applied: true,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "self-modification code failed");
                ApplyReport {
                    lines: vec![format!("Self-modification failed: {}", e)],
                    applied: false,
                }
            }
        }
    }
}

fn apply_record(
    record: SelfModRecord,
    source: &str,
    bundle: &mut MemoryBundle,
    conversation_context: usize,
) -> ApplyReport {
    let summary = serde_json::to_string(&record).unwrap_or_else(|_| format!("{:?}", record));
    let mut lines = Vec::new();

    if let Some(update) = record.memory_update {
        lines.push(format!(
            "Memory updated: {}",
            Value::Object(update.clone())
        ));
        bundle.merge_memory(update);
    }
    if let Some(pattern) = record.new_pattern {
        lines.push(format!("New pattern learned: {}", pattern));
        bundle.learn_pattern(pattern, source);
    }
    if let Some(function) = record.new_function {
        lines.push(format!("New function added: {}", function.name));
        bundle.add_function(function.name, function.code);
    }

    bundle.log_evolution(
        EvolutionKind::SelfModification,
        format!("Applied modification: {}", summary),
        source,
        conversation_context,
    );
    ApplyReport {
        lines,
        applied: true,
    }
}
