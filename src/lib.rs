//! Maestro - 终端多模型编排器
//!
//! 模块划分：
//! - **artifact**: 从模型回复中提取 @Python / @Bash / @SelfMod 制品并暂存
//! - **autonomy**: 自主模式（任务队列、建议解析、自动执行策略）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: Engine、决策解析、提示词、状态投影与主控循环
//! - **llm**: 后端客户端（OpenAI 兼容 / Mock）与 Gateway
//! - **memory**: Memory Bundle、持久化、对话记录与 Project State
//! - **observability**: 日志初始化
//! - **sandbox**: 子进程执行脚本（超时、进程组终止、临时文件清理）
//! - **selfmod**: 自修改解析与应用
//! - **ui**: Ratatui TUI 界面

pub mod artifact;
pub mod autonomy;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod sandbox;
pub mod selfmod;
pub mod ui;
