//! 自主 Agent 状态：开关、任务队列、执行后端与自动执行策略
//!
//! 每次触发只走一步：队列非空则执行队首任务，否则进入自省、生成新任务。
//! 具体的后端调用与制品处理由 Engine 完成，这里只决定下一步做什么。

use crate::artifact::Artifact;
use crate::autonomy::{parse_suggestions, AutoExecPolicy, TaskQueue};
use crate::llm::Backend;

/// 开启自主模式时放入队列的第一条任务
pub const SEED_TASK: &str = "Analyze the current system and suggest first improvement";

/// 自主 Agent 执行任务时使用的来源名
pub const AGENT_SOURCE: &str = "Autonomous-Agent";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutonomyStep {
    /// 执行队首任务
    Execute(String),
    /// 队列为空：自省并生成新任务
    Reflect,
}

pub struct AutonomousAgent {
    enabled: bool,
    queue: TaskQueue,
    specialist: Backend,
    policy: Box<dyn AutoExecPolicy>,
}

impl AutonomousAgent {
    pub fn new(specialist: Backend, policy: Box<dyn AutoExecPolicy>) -> Self {
        Self {
            enabled: false,
            queue: TaskQueue::new(),
            specialist,
            policy,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 开启并放入种子任务
    pub fn activate(&mut self) {
        self.enabled = true;
        self.queue.push(SEED_TASK);
    }

    pub fn deactivate(&mut self) {
        self.enabled = false;
    }

    pub fn specialist(&self) -> Backend {
        self.specialist
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// 关闭时返回 None
    pub fn next_step(&mut self) -> Option<AutonomyStep> {
        if !self.enabled {
            return None;
        }
        Some(match self.queue.pop() {
            Some(task) => AutonomyStep::Execute(task),
            None => AutonomyStep::Reflect,
        })
    }

    /// 解析自省回复并入队，返回新增任务数
    pub fn queue_suggestions(&mut self, reply: &str) -> usize {
        let tasks = parse_suggestions(reply);
        let added = tasks.len();
        self.queue.extend(tasks);
        added
    }

    pub fn is_auto_safe(&self, artifact: &Artifact) -> bool {
        self.policy.is_auto_safe(artifact)
    }

    /// 提示词中的状态描述
    pub fn status(&self) -> String {
        if self.enabled {
            format!("Active with {} queued tasks", self.queue.len())
        } else {
            "Inactive".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autonomy::{MarkerLengthPolicy, NeverAutoExec};

    #[test]
    fn test_disabled_agent_takes_no_step() {
        let mut agent = AutonomousAgent::new(Backend::Gpt, Box::new(NeverAutoExec));
        assert_eq!(agent.next_step(), None);
        assert_eq!(agent.status(), "Inactive");
    }

    #[test]
    fn test_activation_seeds_then_reflects() {
        let mut agent = AutonomousAgent::new(Backend::Gpt, Box::new(NeverAutoExec));
        agent.activate();
        assert_eq!(agent.status(), "Active with 1 queued tasks");
        assert_eq!(agent.next_step(), Some(AutonomyStep::Execute(SEED_TASK.to_string())));
        assert_eq!(agent.next_step(), Some(AutonomyStep::Reflect));
    }

    #[test]
    fn test_queue_suggestions() {
        let mut agent = AutonomousAgent::new(Backend::Claude, Box::new(MarkerLengthPolicy::new("print", 100)));
        agent.activate();
        agent.next_step();
        assert_eq!(agent.queue_suggestions("- one\n- two\nnot a task"), 2);
        assert_eq!(agent.next_step(), Some(AutonomyStep::Execute("one".to_string())));
    }
}
