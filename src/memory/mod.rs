//! 记忆层：Memory Bundle（记忆 / 模式 / 函数表 / 演化日志）、持久化、对话记录与 Project State

pub mod bundle;
pub mod store;
pub mod transcript;

pub use bundle::{now_iso, EvolutionEntry, EvolutionKind, LearnedPattern, MemoryBundle};
pub use store::{MemoryStore, PersistenceError};
pub use transcript::{ProjectState, Transcript};
