//! 非结构化自修改代码的运行时
//!
//! 代码只能看到受限的变量集：`ai_memory`、`learned_patterns`、`custom_functions`、
//! `update_history`（向对话记录追加一行）与 `datetime`。运行结束后把三个结构回写到 Memory Bundle。
//! 默认实现 `PythonRuntime` 借助沙箱的 Python 解释器：生成一段 harness，
//! 以 JSON 传入状态、`exec` 代码、再以带标记的一行 JSON 输出结果状态。

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::artifact::ArtifactKind;
use crate::memory::{now_iso, LearnedPattern, MemoryBundle};
use crate::sandbox::{ExecutionOutcome, Sandbox};

const SCOPE_MARKER: &str = "__MAESTRO_SCOPE__";

/// 代码可见的状态；patterns / functions 用宽松的 JSON 表示，回写时再校验
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeScope {
    #[serde(default)]
    pub memory: Map<String, Value>,
    #[serde(default)]
    pub patterns: Vec<Value>,
    #[serde(default)]
    pub functions: Map<String, Value>,
    /// 代码通过 update_history 追加的行
    #[serde(default)]
    pub history: Vec<String>,
}

impl RuntimeScope {
    pub fn from_bundle(bundle: &MemoryBundle) -> Self {
        Self {
            memory: bundle.memory.clone(),
            patterns: bundle
                .patterns
                .iter()
                .filter_map(|p| serde_json::to_value(p).ok())
                .collect(),
            functions: bundle
                .functions
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
            history: Vec::new(),
        }
    }

    /// 校验后整体回写；任一条目非法则不修改 bundle。返回 history 行。
    pub fn apply_to(self, bundle: &mut MemoryBundle, source: &str) -> Result<Vec<String>, String> {
        let mut patterns = Vec::with_capacity(self.patterns.len());
        for value in self.patterns {
            let pattern = match value {
                Value::String(text) => LearnedPattern {
                    pattern: text,
                    learned_from: source.to_string(),
                    timestamp: now_iso(),
                },
                other => serde_json::from_value::<LearnedPattern>(other)
                    .map_err(|e| format!("invalid entry in learned_patterns: {}", e))?,
            };
            patterns.push(pattern);
        }

        let functions: BTreeMap<String, String> = self
            .functions
            .into_iter()
            .map(|(name, code)| match code {
                Value::String(s) => (name, s),
                other => (name, other.to_string()),
            })
            .collect();

        bundle.memory = self.memory;
        bundle.patterns = patterns;
        bundle.functions = functions;
        Ok(self.history)
    }
}

#[async_trait]
pub trait CodeRuntime: Send + Sync {
    async fn run(&self, code: &str, scope: RuntimeScope) -> Result<RuntimeScope, String>;
}

/// 通过沙箱 Python 解释器执行自修改代码
pub struct PythonRuntime {
    sandbox: Arc<dyn Sandbox>,
}

impl PythonRuntime {
    pub fn new(sandbox: Arc<dyn Sandbox>) -> Self {
        Self { sandbox }
    }
}

/// JSON 字符串字面量同时是合法的 Python 字符串字面量
fn py_literal(s: &str) -> Result<String, String> {
    serde_json::to_string(s).map_err(|e| e.to_string())
}

pub(crate) fn build_harness(code: &str, scope: &RuntimeScope) -> Result<String, String> {
    let state = serde_json::to_string(scope).map_err(|e| e.to_string())?;
    Ok(format!(
        r#"import datetime
import json

_state = json.loads({state})
_history = []


def update_history(text):
    _history.append(str(text))


_scope = {{
    "ai_memory": _state["memory"],
    "learned_patterns": _state["patterns"],
    "custom_functions": _state["functions"],
    "update_history": update_history,
    "datetime": datetime,
}}
exec(compile({code}, "<self-mod>", "exec"), _scope)
print({marker} + json.dumps({{
    "memory": _scope["ai_memory"],
    "patterns": _scope["learned_patterns"],
    "functions": _scope["custom_functions"],
    "history": _history,
}}, default=str))
"#,
        state = py_literal(&state)?,
        code = py_literal(code)?,
        marker = py_literal(SCOPE_MARKER)?,
    ))
}

/// 从 stdout 中找最后一条带标记的行并解析
pub(crate) fn parse_scope(stdout: &str) -> Result<RuntimeScope, String> {
    let line = stdout
        .lines()
        .rev()
        .find_map(|l| l.strip_prefix(SCOPE_MARKER))
        .ok_or_else(|| "self-modification produced no state".to_string())?;
    serde_json::from_str(line).map_err(|e| format!("unreadable state: {}", e))
}

fn last_line(text: &str) -> String {
    text.lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("no output")
        .to_string()
}

#[async_trait]
impl CodeRuntime for PythonRuntime {
    async fn run(&self, code: &str, scope: RuntimeScope) -> Result<RuntimeScope, String> {
        let harness = build_harness(code, &scope)?;
        match self.sandbox.run(ArtifactKind::Python, &harness).await {
            ExecutionOutcome::Success { stdout } => parse_scope(&stdout),
            ExecutionOutcome::Failure { stderr, .. } => Err(last_line(&stderr)),
            ExecutionOutcome::TimedOut { after } => {
                Err(format!("timed out after {}s", after.as_secs()))
            }
            ExecutionOutcome::LaunchError(e) => Err(e),
        }
    }
}
