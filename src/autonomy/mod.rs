//! 自主模式：任务队列、建议解析、自动执行策略与单步调度

pub mod agent;
pub mod policy;
pub mod queue;

pub use agent::{AutonomousAgent, AutonomyStep, AGENT_SOURCE, SEED_TASK};
pub use policy::{AutoExecPolicy, MarkerLengthPolicy, NeverAutoExec};
pub use queue::{parse_suggestions, TaskQueue};
