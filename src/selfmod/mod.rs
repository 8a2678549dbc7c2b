//! 自修改：解析（结构化记录 / 原始代码 / 非法）、代码运行时、应用器

pub mod applier;
pub mod record;
pub mod runtime;

pub use applier::{ApplyReport, SelfModApplier};
pub use record::{parse_self_mod, NewFunction, SelfModParse, SelfModRecord};
pub use runtime::{CodeRuntime, PythonRuntime, RuntimeScope};
