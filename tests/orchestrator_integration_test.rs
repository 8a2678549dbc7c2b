//! 编排集成测试：脚本化后端 + 临时目录，覆盖路由、暂存执行、自修改持久化与自主模式

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use maestro::artifact::ArtifactKind;
    use maestro::config::AppConfig;
    use maestro::core::{spawn_engine, Command, Engine, EngineBuilder, SubmitAction};
    use maestro::llm::{Backend, ScriptedLlmClient};
    use maestro::memory::{EvolutionKind, MemoryStore};
    use maestro::sandbox::{ExecutionOutcome, Sandbox};
    use maestro::selfmod::{CodeRuntime, RuntimeScope};
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.memory.path = dir.path().join("ai_memory.json");
        cfg.sandbox.shell = "sh".to_string();
        cfg.sandbox.python = "sh".to_string();
        cfg.sandbox.timeout_secs = 5;
        cfg
    }

    /// 记录每次执行请求并返回固定输出的沙箱
    #[derive(Default)]
    struct RecordingSandbox {
        runs: Mutex<Vec<(ArtifactKind, String)>>,
    }

    impl RecordingSandbox {
        fn runs(&self) -> Vec<(ArtifactKind, String)> {
            self.runs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sandbox for RecordingSandbox {
        async fn run(&self, kind: ArtifactKind, body: &str) -> ExecutionOutcome {
            self.runs.lock().unwrap().push((kind, body.to_string()));
            ExecutionOutcome::Success {
                stdout: "ran\n".to_string(),
            }
        }
    }

    /// 把代码当作一条新记忆写入的运行时
    struct MemoryWritingRuntime;

    #[async_trait]
    impl CodeRuntime for MemoryWritingRuntime {
        async fn run(&self, code: &str, mut scope: RuntimeScope) -> Result<RuntimeScope, String> {
            if code.contains("raise") {
                return Err("NameError: boom".to_string());
            }
            scope
                .memory
                .insert("last_code".to_string(), serde_json::Value::String(code.to_string()));
            scope.history.push("runtime touched memory".to_string());
            Ok(scope)
        }
    }

    fn engine_with(dir: &TempDir, backend: Backend, client: Arc<ScriptedLlmClient>) -> Engine {
        EngineBuilder::new(config(dir))
            .with_client(backend, client)
            .build()
    }

    #[tokio::test]
    async fn test_respond_stages_bash_then_runs_it() {
        let dir = TempDir::new().unwrap();
        let gemini = Arc::new(ScriptedLlmClient::new().with_reply(
            r#"{"action":"respond_to_user","prompt":"Try this: @Bash echo hello @EndBash"}"#,
        ));
        let mut engine = engine_with(&dir, Backend::Gemini, gemini.clone());

        engine.submit(SubmitAction::Orchestrate, "greet me").await;

        assert!(gemini.prompts()[0].contains(r#"User's request: "greet me""#));
        assert!(engine.transcript().contains("BASH CODE READY from Orchestrator:"));
        assert_eq!(engine.pending().provenance(), "Orchestrator");
        assert!(engine.project().narrative().contains("Action: orchestrate"));

        let outcome = engine.run_pending(ArtifactKind::Bash).await.unwrap();
        assert_eq!(
            outcome,
            ExecutionOutcome::Success {
                stdout: "hello\n".to_string()
            }
        );
        assert!(engine.transcript().contains("Bash execution successful:"));
        assert!(!engine.pending().is_staged(ArtifactKind::Bash));
    }

    #[tokio::test]
    async fn test_failed_script_still_clears_slot() {
        let dir = TempDir::new().unwrap();
        let mut engine = EngineBuilder::new(config(&dir)).build();
        engine.extract_and_stage("@Bash echo oops >&2; exit 4 @EndBash", "GPT-4o");

        let outcome = engine.run_pending(ArtifactKind::Bash).await.unwrap();

        assert!(matches!(outcome, ExecutionOutcome::Failure { code: Some(4), .. }));
        assert!(engine.transcript().contains("Bash execution failed:"));
        assert!(!engine.pending().is_staged(ArtifactKind::Bash));
    }

    #[tokio::test]
    async fn test_timed_out_script_clears_slot() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir);
        cfg.sandbox.timeout_secs = 1;
        let mut engine = EngineBuilder::new(cfg).build();
        engine.extract_and_stage("@Python sleep 5 @EndPython", "GPT-4o");

        let outcome = engine.run_pending(ArtifactKind::Python).await.unwrap();

        assert!(matches!(outcome, ExecutionOutcome::TimedOut { .. }));
        assert!(!engine.pending().is_staged(ArtifactKind::Python));
        assert!(engine.transcript().contains("Python execution timed out (1s limit)"));
    }

    #[tokio::test]
    async fn test_inverted_markers_stage_nothing_runnable() {
        let dir = TempDir::new().unwrap();
        let mut engine = EngineBuilder::new(config(&dir)).build();

        engine.extract_and_stage("@EndBash x @Bash", "GPT-4o");

        assert!(engine.transcript().contains("BASH CODE READY from GPT-4o:"));
        assert!(!engine.pending().is_staged(ArtifactKind::Bash));
        assert!(!engine.snapshot().pending.bash);
        assert!(engine.run_pending(ArtifactKind::Bash).await.is_none());
        assert!(engine.transcript().contains("No bash code pending"));
    }

    #[tokio::test]
    async fn test_fenced_delegation_reaches_claude() {
        let dir = TempDir::new().unwrap();
        let gemini = Arc::new(ScriptedLlmClient::new().with_reply(
            "```json\n{\"action\":\"delegate_to_claude\",\"prompt\":\"write a haiku\"}\n```",
        ));
        let claude = Arc::new(ScriptedLlmClient::new().with_reply("autumn wind"));
        let mut engine = EngineBuilder::new(config(&dir))
            .with_client(Backend::Gemini, gemini)
            .with_client(Backend::Claude, claude.clone())
            .build();

        engine.submit(SubmitAction::Orchestrate, "poem please").await;

        assert_eq!(claude.prompts(), vec!["write a haiku".to_string()]);
        assert!(engine.transcript().contains("Delegating to Claude..."));
        assert!(engine.project().narrative().contains("Result: autumn wind"));
    }

    #[tokio::test]
    async fn test_unparseable_decision_becomes_result() {
        let dir = TempDir::new().unwrap();
        let gemini = Arc::new(ScriptedLlmClient::new().with_reply("I think GPT should do it"));
        let gpt = Arc::new(ScriptedLlmClient::new());
        let mut engine = EngineBuilder::new(config(&dir))
            .with_client(Backend::Gemini, gemini)
            .with_client(Backend::Gpt, gpt.clone())
            .build();

        engine.submit(SubmitAction::Orchestrate, "do it").await;

        assert!(gpt.prompts().is_empty());
        assert!(engine.transcript().contains("Error parsing decision:"));
        let narrative = engine.project().narrative();
        assert!(narrative.contains("Result: Error parsing decision:"));
        assert!(narrative.contains("Raw output: I think GPT should do it"));
    }

    #[tokio::test]
    async fn test_provider_failure_flows_through_as_text() {
        let dir = TempDir::new().unwrap();
        let gpt = Arc::new(ScriptedLlmClient::new().with_failure("connection refused"));
        let mut engine = engine_with(&dir, Backend::Gpt, gpt);

        engine.submit(SubmitAction::RequestBash, "list files").await;

        assert!(engine.transcript().contains("GPT Error: connection refused"));
        assert!(!engine.pending().is_staged(ArtifactKind::Bash));
    }

    #[tokio::test]
    async fn test_structured_self_mod_is_persisted() {
        let dir = TempDir::new().unwrap();
        let claude = Arc::new(ScriptedLlmClient::new().with_reply(
            r#"@SelfMod {"memory_update":{"tone":"terse"},"new_pattern":"ask before deleting","new_function":{"name":"greet","code":"def greet(): pass"}} @EndSelfMod"#,
        ));
        let mut engine = engine_with(&dir, Backend::Claude, claude);

        engine.submit(SubmitAction::Force(Backend::Claude), "improve yourself").await;
        let report = engine.apply_self_mod().await.unwrap();

        assert!(report.applied);
        assert!(!engine.pending().is_staged(ArtifactKind::SelfMod));
        assert!(engine.transcript().contains("New function added: greet"));
        assert!(engine.transcript().contains("AI memory saved successfully!"));

        let saved = MemoryStore::new(dir.path().join("ai_memory.json"))
            .load()
            .unwrap()
            .unwrap();
        assert_eq!(saved.memory["tone"], "terse");
        assert_eq!(saved.patterns[0].pattern, "ask before deleting");
        assert_eq!(saved.patterns[0].learned_from, "Claude");
        assert!(saved.functions.contains_key("greet"));
        assert_eq!(saved.evolution_log.len(), 1);
        assert_eq!(saved.evolution_log[0].kind, EvolutionKind::SelfModification);
        assert_eq!(saved.evolution_log[0].source, "Claude");
    }

    #[tokio::test]
    async fn test_raw_self_mod_uses_runtime() {
        let dir = TempDir::new().unwrap();
        let mut engine = EngineBuilder::new(config(&dir))
            .with_runtime(Arc::new(MemoryWritingRuntime))
            .build();

        engine.extract_and_stage("@SelfMod ai_memory['x'] = 1 @EndSelfMod", "GPT-4o");
        let report = engine.apply_self_mod().await.unwrap();

        assert!(report.applied);
        assert!(engine.transcript().contains("runtime touched memory"));
        assert!(engine.transcript().contains("Self-modification code executed successfully"));
        let last = engine.bundle().evolution_log.last().unwrap();
        assert_eq!(last.kind, EvolutionKind::CodeExecution);
        assert!(last.description.starts_with("Executed self-mod code: ai_memory['x'] = 1"));

        engine.extract_and_stage("@SelfMod raise ValueError() @EndSelfMod", "GPT-4o");
        let report = engine.apply_self_mod().await.unwrap();
        assert!(!report.applied);
        assert!(engine.transcript().contains("Self-modification failed: NameError: boom"));
        assert_eq!(engine.bundle().evolution_log.len(), 1);
        assert!(!engine.pending().is_staged(ArtifactKind::SelfMod));
    }

    #[tokio::test]
    async fn test_malformed_self_mod_changes_nothing_but_persists() {
        let dir = TempDir::new().unwrap();
        let mut engine = EngineBuilder::new(config(&dir)).build();

        engine.extract_and_stage(r#"@SelfMod [1, 2, 3] @EndSelfMod"#, "Claude");
        let report = engine.apply_self_mod().await.unwrap();

        assert!(!report.applied);
        assert!(engine.transcript().contains("Self-modification error:"));
        assert!(engine.bundle().evolution_log.is_empty());
        assert!(dir.path().join("ai_memory.json").exists());
    }

    #[tokio::test]
    async fn test_autonomous_mode_auto_executes_then_reflects() {
        let dir = TempDir::new().unwrap();
        let gpt = Arc::new(
            ScriptedLlmClient::new()
                .with_reply("Here you go @Python print('hi') @EndPython")
                .with_reply("forced answer")
                .with_reply("Ideas:\n- Add a cache\n2. Improve errors\n  - nested"),
        );
        let sandbox = Arc::new(RecordingSandbox::default());
        let mut engine = EngineBuilder::new(config(&dir))
            .with_client(Backend::Gpt, gpt.clone())
            .with_sandbox(sandbox.clone())
            .build();

        engine.toggle_autonomous().await;

        assert!(engine.autonomy().is_enabled());
        assert!(gpt.prompts()[0].contains("Your task: Analyze the current system and suggest first improvement"));
        assert_eq!(sandbox.runs(), vec![(ArtifactKind::Python, "print('hi')".to_string())]);
        assert!(engine.transcript().contains("Autonomous Agent auto-executing safe Python code..."));
        assert!(engine.transcript().contains("Executing Python code from Autonomous-Agent..."));
        assert!(!engine.pending().is_staged(ArtifactKind::Python));

        // 队列已空：提交后的自主步骤进入自省并解析出两条任务
        engine.submit(SubmitAction::Force(Backend::Gpt), "anything").await;

        assert!(gpt.prompts()[2].contains("Current capabilities: Basic system"));
        assert_eq!(engine.autonomy().queue().len(), 2);
        let tasks: Vec<&String> = engine.autonomy().queue().iter().collect();
        assert_eq!(tasks, vec!["Add a cache", "Improve errors"]);
        assert!(engine.transcript().contains("Autonomous Agent queued 2 new tasks"));

        engine.toggle_autonomous().await;
        assert!(!engine.autonomy().is_enabled());
        assert!(engine.transcript().contains("Autonomous agent deactivated."));
    }

    #[tokio::test]
    async fn test_long_python_is_not_auto_executed() {
        let dir = TempDir::new().unwrap();
        let body = format!("print('{}')", "x".repeat(120));
        let gpt = Arc::new(
            ScriptedLlmClient::new().with_reply(format!("@Python {} @EndPython", body)),
        );
        let sandbox = Arc::new(RecordingSandbox::default());
        let mut engine = EngineBuilder::new(config(&dir))
            .with_client(Backend::Gpt, gpt)
            .with_sandbox(sandbox.clone())
            .build();

        engine.toggle_autonomous().await;

        assert!(sandbox.runs().is_empty());
        assert!(engine.pending().is_staged(ArtifactKind::Python));
    }

    #[tokio::test]
    async fn test_commands_over_channel_publish_snapshots() {
        let dir = TempDir::new().unwrap();
        let gpt = Arc::new(ScriptedLlmClient::new().with_reply("@Bash echo hi @EndBash"));
        let engine = engine_with(&dir, Backend::Gpt, gpt);
        let (cmd_tx, mut state_rx) = spawn_engine(engine);

        cmd_tx
            .send(Command::Submit(SubmitAction::RequestBash, "say hi".to_string()))
            .unwrap();
        let state = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                state_rx.changed().await.unwrap();
                let state = state_rx.borrow().clone();
                if !state.input_locked {
                    break state;
                }
            }
        })
        .await
        .unwrap();

        assert!(state.pending.bash);
        assert_eq!(state.pending.source.as_deref(), Some("GPT-4o"));
        assert!(state.transcript.iter().any(|l| l.contains("BASH CODE READY")));

        cmd_tx.send(Command::Quit).unwrap();
    }
}
