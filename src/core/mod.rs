//! 核心编排层：错误类型、提示词、决策解析、Engine、状态投影与主控循环

pub mod builder;
pub mod decision;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod prompts;
pub mod state;

pub use builder::EngineBuilder;
pub use decision::{parse_decision, strip_fences, Decision};
pub use engine::{Engine, SubmitAction, ORCHESTRATOR_SOURCE};
pub use error::OrchestratorError;
pub use orchestrator::{create_orchestrator, dispatch, spawn_engine, Command};
pub use state::{PendingFlags, Phase, UiState};
