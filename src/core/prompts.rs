//! 固定提示词模板
//!
//! 所有模板都是纯函数：输入当前状态的文本摘要，输出完整提示词。

use crate::memory::MemoryBundle;

/// 决策提示词的输入
pub struct DecisionContext<'a> {
    pub project_state: &'a str,
    pub user_input: &'a str,
    pub bundle: &'a MemoryBundle,
    pub autonomous_status: &'a str,
}

/// 决策后端的路由提示词：要求只返回 `{"action", "prompt"}` JSON
pub fn decision_prompt(ctx: &DecisionContext<'_>) -> String {
    format!(
        r#"You are an AI Project Manager named Gemini-Orchestrator. Your role is to manage a project by delegating tasks to specialist AIs.

You have access to these specialists:
- 'gpt': GPT-4o - Best for complex logic, code generation, technical analysis
- 'claude': Claude 3.5 Sonnet - Best for creative writing, nuanced text, ethical reasoning

SELF-DEVELOPMENT CAPABILITIES:
You can suggest system modifications using these tags:
- @Bash/@EndBash for bash/shell commands
- @Python/@EndPython for Python scripts
- @SelfMod/@EndSelfMod for system modifications (new functions, learning patterns, memory updates)

Current AI Memory: {memory}
Recent Learning Patterns: {patterns}
Evolution Log: {evolution}
Autonomous Mode: {autonomous}

Current project state: {project_state}
User's request: "{user_input}"

Your task: Decide the single next action. You can now also suggest self-improvements! Respond with ONLY a valid JSON object:

{{"action": "respond_to_user", "prompt": "Your direct response"}}
{{"action": "delegate_to_gpt", "prompt": "Specific prompt for GPT"}}
{{"action": "delegate_to_claude", "prompt": "Specific prompt for Claude"}}

Respond with only the JSON, no additional text."#,
        memory = ctx.bundle.memory_summary(),
        patterns = ctx.bundle.patterns_summary(3),
        evolution = ctx.bundle.evolution_summary(2),
        autonomous = ctx.autonomous_status,
        project_state = ctx.project_state,
        user_input = ctx.user_input,
    )
}

/// 全上下文提示词：完整对话记录 + 记忆 + 全部模式 + 最新输入
pub fn full_context_prompt(transcript: &str, bundle: &MemoryBundle, user_input: &str) -> String {
    format!(
        "Here is our full conversation context:\n\n{}\n\nAI Memory: {}\nLearned Patterns: {}\n\nLatest input: {}\n\n\
         Please respond based on all context. You can suggest code using @Bash/@EndBash, @Python/@EndPython, or @SelfMod/@EndSelfMod tags.",
        transcript,
        bundle.memory_summary(),
        bundle.patterns_summary(usize::MAX),
        user_input
    )
}

pub fn request_python_prompt(user_input: &str) -> String {
    format!(
        "Create a Python script for: {}\n\nPlease provide the script using @Python and @EndPython tags so it can be executed directly. \
         Make sure the code is complete and ready to run.",
        user_input
    )
}

pub fn request_bash_prompt(user_input: &str) -> String {
    format!(
        "Create a Bash script for: {}\n\nPlease provide the script using @Bash and @EndBash tags so it can be executed directly. \
         Make sure the commands are safe and well-commented.",
        user_input
    )
}

/// 自主任务提示词
pub fn task_prompt(task: &str, python_pending: bool, bash_pending: bool, bundle: &MemoryBundle) -> String {
    let patterns = if bundle.patterns.is_empty() {
        "None".to_string()
    } else {
        bundle.patterns_summary(3)
    };
    format!(
        r#"You are an autonomous AI agent working inside a self-developing AI orchestrator system.

Current system state:
- Pending Python code: {python_pending}
- Pending Bash code: {bash_pending}
- AI Memory: {memory}
- Recent patterns: {patterns}

Your task: {task}

Please either:
1. Provide executable code using @Python/@EndPython or @Bash/@EndBash tags
2. Provide a self-modification using @SelfMod/@EndSelfMod tags
3. Suggest improvements to the system

Be autonomous and proactive in improving the system!"#,
        memory = bundle.memory_summary(),
    )
}

/// 自省提示词：队列为空时让专家给出 1-3 条改进任务
pub fn reflection_prompt(bundle: &MemoryBundle) -> String {
    let names = bundle.function_names();
    let capabilities = if names.is_empty() {
        "Basic system".to_string()
    } else {
        names.join(", ")
    };
    let evolution = if bundle.evolution_log.is_empty() {
        "No recent changes".to_string()
    } else {
        bundle.evolution_summary(2)
    };
    format!(
        r#"You are an autonomous AI agent. Analyze this AI orchestrator system and suggest 1-3 concrete improvements.

Current capabilities: {capabilities}
Recent evolution: {evolution}

Suggest practical improvements like:
- New utility functions
- System optimizations
- Better error handling
- User experience improvements

Format as a simple list of tasks."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_prompt_embeds_state() {
        let mut bundle = MemoryBundle::new();
        bundle.merge_memory(serde_json::from_str(r#"{"lang":"rust"}"#).unwrap());
        let prompt = decision_prompt(&DecisionContext {
            project_state: "Project has not started yet. The goal is undefined.",
            user_input: "build a parser",
            bundle: &bundle,
            autonomous_status: "Active with 2 queued tasks",
        });
        assert!(prompt.contains(r#"User's request: "build a parser""#));
        assert!(prompt.contains(r#"Current AI Memory: {"lang":"rust"}"#));
        assert!(prompt.contains("Recent Learning Patterns: No learned patterns"));
        assert!(prompt.contains("Evolution Log: No evolution history"));
        assert!(prompt.contains("Autonomous Mode: Active with 2 queued tasks"));
        assert!(prompt.contains(r#"{"action": "delegate_to_claude""#));
    }

    #[test]
    fn test_reflection_prompt_defaults() {
        let prompt = reflection_prompt(&MemoryBundle::new());
        assert!(prompt.contains("Current capabilities: Basic system"));
        assert!(prompt.contains("Recent evolution: No recent changes"));
    }

    #[test]
    fn test_task_prompt_flags() {
        let prompt = task_prompt("add logging", true, false, &MemoryBundle::new());
        assert!(prompt.contains("- Pending Python code: true"));
        assert!(prompt.contains("- Pending Bash code: false"));
        assert!(prompt.contains("- Recent patterns: None"));
        assert!(prompt.contains("Your task: add logging"));
    }

    #[test]
    fn test_script_request_templates() {
        assert!(request_python_prompt("sum a list").contains("@Python and @EndPython"));
        assert!(request_bash_prompt("list files").starts_with("Create a Bash script for: list files"));
    }
}
