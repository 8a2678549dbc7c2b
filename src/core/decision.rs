//! 决策解析：剥离代码围栏后解析 `{"action", "prompt"}`

use serde::Deserialize;

use crate::core::OrchestratorError;
use crate::llm::Backend;

/// 路由决策
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// 决策者直接回答
    Respond(String),
    /// 转发给专家
    Delegate { backend: Backend, prompt: String },
}

#[derive(Deserialize)]
struct RawDecision {
    action: String,
    prompt: String,
}

/// 去掉模型常见的 ```json / ``` 围栏
pub fn strip_fences(raw: &str) -> String {
    let mut s = raw.trim().to_string();
    if s.starts_with("```json") {
        s = s.replace("```json", "").replace("```", "").trim().to_string();
    }
    if s.starts_with("```") {
        s = s.replace("```", "").trim().to_string();
    }
    s
}

pub fn parse_decision(raw: &str) -> Result<Decision, OrchestratorError> {
    let fail = |reason: String| OrchestratorError::DecisionParse {
        reason,
        raw: raw.to_string(),
    };

    let decision: RawDecision =
        serde_json::from_str(&strip_fences(raw)).map_err(|e| fail(e.to_string()))?;

    match decision.action.as_str() {
        "respond_to_user" => Ok(Decision::Respond(decision.prompt)),
        "delegate_to_gpt" => Ok(Decision::Delegate {
            backend: Backend::Gpt,
            prompt: decision.prompt,
        }),
        "delegate_to_claude" => Ok(Decision::Delegate {
            backend: Backend::Claude,
            prompt: decision.prompt,
        }),
        other => Err(fail(format!("unknown action '{}'", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_delegate() {
        let raw = "```json\n{\"action\":\"delegate_to_gpt\",\"prompt\":\"x\"}\n```";
        assert_eq!(
            parse_decision(raw).unwrap(),
            Decision::Delegate {
                backend: Backend::Gpt,
                prompt: "x".into()
            }
        );
    }

    #[test]
    fn test_fenced_respond() {
        let raw = "```json\n{\"action\":\"respond_to_user\",\"prompt\":\"OK\"}\n```";
        assert_eq!(parse_decision(raw).unwrap(), Decision::Respond("OK".into()));
    }

    #[test]
    fn test_bare_fence_and_plain_json() {
        let raw = "```\n{\"action\":\"respond_to_user\",\"prompt\":\"hello\"}\n```";
        assert_eq!(parse_decision(raw).unwrap(), Decision::Respond("hello".into()));

        let raw = "  {\"action\":\"delegate_to_claude\",\"prompt\":\"poem\"}  ";
        assert!(matches!(
            parse_decision(raw).unwrap(),
            Decision::Delegate { backend: Backend::Claude, .. }
        ));
    }

    #[test]
    fn test_unknown_action_is_error() {
        let err = parse_decision(r#"{"action":"delete_everything","prompt":"x"}"#).unwrap_err();
        assert!(matches!(err, OrchestratorError::DecisionParse { .. }));
        assert!(err.to_string().contains("unknown action"));
    }

    #[test]
    fn test_non_json_reports_raw_output() {
        let err = parse_decision("Sure! I'll ask GPT.").unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("Error parsing decision: "));
        assert!(text.ends_with("\nRaw output: Sure! I'll ask GPT."));
    }
}
