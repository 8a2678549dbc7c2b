//! Engine 构建器：统一 TUI 与测试的初始化逻辑
//!
//! 默认组件全部来自配置（各后端客户端、ProcessSandbox、PythonRuntime、MarkerLengthPolicy），
//! 每个组件都可用 `with_*` 替换，测试据此注入脚本化客户端与假沙箱。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::autonomy::{AutoExecPolicy, AutonomousAgent, MarkerLengthPolicy};
use crate::config::AppConfig;
use crate::core::engine::{Engine, WELCOME_BANNER};
use crate::llm::{create_client, Backend, BackendGateway, LlmClient};
use crate::memory::{MemoryBundle, MemoryStore, ProjectState, Transcript};
use crate::sandbox::{ProcessSandbox, Sandbox};
use crate::selfmod::{CodeRuntime, PythonRuntime, SelfModApplier};

pub struct EngineBuilder {
    config: AppConfig,
    clients: HashMap<Backend, Arc<dyn LlmClient>>,
    sandbox: Option<Arc<dyn Sandbox>>,
    runtime: Option<Arc<dyn CodeRuntime>>,
    policy: Option<Box<dyn AutoExecPolicy>>,
}

impl EngineBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            clients: HashMap::new(),
            sandbox: None,
            runtime: None,
            policy: None,
        }
    }

    /// 替换某个后端的客户端
    pub fn with_client(mut self, backend: Backend, client: Arc<dyn LlmClient>) -> Self {
        self.clients.insert(backend, client);
        self
    }

    pub fn with_sandbox(mut self, sandbox: Arc<dyn Sandbox>) -> Self {
        self.sandbox = Some(sandbox);
        self
    }

    /// 替换原始自修改代码的运行时（默认在沙箱解释器中运行 Python）
    pub fn with_runtime(mut self, runtime: Arc<dyn CodeRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn with_policy(mut self, policy: Box<dyn AutoExecPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    fn build_gateway(&mut self) -> BackendGateway {
        let timeout = match self.config.llm.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let mut gateway = BackendGateway::new().with_request_timeout(timeout);
        for backend in Backend::ALL {
            let client = self
                .clients
                .remove(&backend)
                .unwrap_or_else(|| create_client(&self.config.llm, backend));
            gateway = gateway.with_client(backend, client);
        }
        gateway
    }

    /// 构建 Engine：写入欢迎信息并加载记忆文件（缺失时为空，损坏时提示后为空）
    pub fn build(mut self) -> Engine {
        let gateway = self.build_gateway();
        let sandbox = self
            .sandbox
            .take()
            .unwrap_or_else(|| Arc::new(ProcessSandbox::from_config(&self.config.sandbox)));
        let runtime = self
            .runtime
            .take()
            .unwrap_or_else(|| Arc::new(PythonRuntime::new(sandbox.clone())));
        let policy = self
            .policy
            .take()
            .unwrap_or_else(|| Box::new(MarkerLengthPolicy::from_config(&self.config.autonomy)));

        let mut transcript = Transcript::new(self.config.app.max_transcript_lines);
        transcript.push(WELCOME_BANNER);

        let store = MemoryStore::new(&self.config.memory.path);
        let bundle = match store.load() {
            Ok(Some(bundle)) => {
                tracing::info!(path = %store.path().display(), "memory loaded");
                transcript.push("AI memory loaded successfully!");
                bundle
            }
            Ok(None) => MemoryBundle::new(),
            Err(e) => {
                tracing::warn!(error = %e, "memory load failed, starting empty");
                transcript.push(&format!("Could not load AI memory: {}", e));
                MemoryBundle::new()
            }
        };

        let autonomy = AutonomousAgent::new(self.config.autonomy.specialist, policy);

        Engine::new(
            gateway,
            sandbox,
            SelfModApplier::new(runtime),
            store,
            bundle,
            transcript,
            ProjectState::new(self.config.app.max_project_entries),
            autonomy,
            self.config.llm.decider,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_corrupt_memory_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memory.json");
        std::fs::write(&path, "not json").unwrap();
        let mut cfg = AppConfig::default();
        cfg.memory.path = path;

        let engine = EngineBuilder::new(cfg).build();

        assert_eq!(engine.bundle(), &MemoryBundle::new());
        assert!(engine.transcript().contains("Could not load AI memory"));
    }

    #[test]
    fn test_existing_memory_is_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memory.json");
        let mut bundle = MemoryBundle::new();
        bundle.learn_pattern("prefer small scripts", "GPT-4o");
        MemoryStore::new(&path).save(&bundle).unwrap();
        let mut cfg = AppConfig::default();
        cfg.memory.path = path;
        cfg.llm.decider = Backend::Claude;

        let engine = EngineBuilder::new(cfg).build();

        assert_eq!(engine.bundle().patterns.len(), 1);
        assert_eq!(engine.decider(), Backend::Claude);
        assert!(engine.transcript().contains("AI memory loaded successfully!"));
    }
}
