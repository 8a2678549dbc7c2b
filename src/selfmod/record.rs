//! 自修改记录的两阶段解析
//!
//! 先尝试严格的结构化记录，失败时落到命名的回退分支；结果用 tagged union 表示，不用错误做控制流。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFunction {
    pub name: String,
    pub code: String,
}

/// 结构化自修改：三个字段均可选，任意子集均合法
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelfModRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_update: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_function: Option<NewFunction>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelfModParse {
    Structured(SelfModRecord),
    /// 不是 JSON：按代码执行
    RawCode(String),
    /// 是 JSON 但形状不对，或内容为空
    Malformed(String),
}

pub fn parse_self_mod(body: &str) -> SelfModParse {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return SelfModParse::Malformed("empty self-modification".to_string());
    }

    match serde_json::from_str::<Value>(trimmed) {
        Err(e) => {
            tracing::debug!(error = %e, "self-mod is not JSON, treating as code");
            SelfModParse::RawCode(body.to_string())
        }
        Ok(value @ Value::Object(_)) => match serde_json::from_value::<SelfModRecord>(value) {
            Ok(record) => SelfModParse::Structured(record),
            Err(e) => SelfModParse::Malformed(e.to_string()),
        },
        Ok(other) => SelfModParse::Malformed(format!(
            "expected a JSON object, got {}",
            json_type(&other)
        )),
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
