//! 编排引擎：所有用户动作与自主步骤的唯一执行者
//!
//! Engine 是上下文对象，持有 Gateway、沙箱、自修改应用器、记忆、暂存槽位、对话记录与自主 Agent。
//! 每个动作都把结果写成对话记录行，不向调用方返回错误；由单一 owner 任务串行调用（见 orchestrator）。

use std::sync::Arc;

use crate::artifact::{extract, ArtifactKind, PendingStore};
use crate::autonomy::{AutonomousAgent, AutonomyStep, AGENT_SOURCE};
use crate::core::prompts::{self, DecisionContext};
use crate::core::state::{PendingFlags, Phase, UiState};
use crate::core::{parse_decision, Decision, OrchestratorError};
use crate::llm::{Backend, BackendGateway};
use crate::memory::{MemoryBundle, MemoryStore, ProjectState, Transcript};
use crate::sandbox::{ExecutionOutcome, Sandbox};
use crate::selfmod::{ApplyReport, SelfModApplier};

/// 决策者直接回答时制品的来源名
pub const ORCHESTRATOR_SOURCE: &str = "Orchestrator";

pub const WELCOME_BANNER: &str = "Welcome to the AI Orchestrator - Autonomous Agent!

Instructions:
- F1 / Enter: Smart orchestration (decider routes the request)
- F2: Force GPT-4o
- F3: Force Claude
- F4 / Ctrl+C / Ctrl+Q: Exit

- Alt+1 / Alt+2 / Alt+3: Send ALL context to Gemini / GPT-4o / Claude

- Alt+Q: Request Python script
- Alt+W: Request Bash script
- Alt+E: Toggle autonomous agent mode
- Alt+P: Execute pending Python script
- Alt+B: Execute pending Bash script
- Alt+S: Apply pending self-modification
- Alt+D: Deny/Clear pending operations
- Alt+M: Show system diagnostics
- Ctrl+L: Clear screen
";

pub const CLEARED_BANNER: &str = "Screen cleared. AI Orchestrator ready!

F1:Smart | F2:GPT | F3:Claude | F4:Exit
Alt+Q:Python | Alt+W:Bash | Alt+E:Autonomous | Alt+P:RunPy | Alt+B:RunBash
";

/// 需要用户输入的提交动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitAction {
    /// 决策者路由
    Orchestrate,
    /// 原样发给指定后端
    Force(Backend),
    /// 完整上下文发给指定后端
    Context(Backend),
    RequestPython,
    RequestBash,
}

impl SubmitAction {
    /// Project State 中记录的动作名
    pub fn label(&self) -> String {
        match self {
            SubmitAction::Orchestrate => "orchestrate".to_string(),
            SubmitAction::Force(b) => format!("force_{}", b),
            SubmitAction::Context(b) => format!("context_{}", b),
            SubmitAction::RequestPython => "request_python".to_string(),
            SubmitAction::RequestBash => "request_bash".to_string(),
        }
    }
}

/// 脚本请求固定发往 GPT
const SCRIPT_BACKEND: Backend = Backend::Gpt;

pub struct Engine {
    gateway: BackendGateway,
    sandbox: Arc<dyn Sandbox>,
    applier: SelfModApplier,
    store: MemoryStore,
    bundle: MemoryBundle,
    pending: PendingStore,
    transcript: Transcript,
    project: ProjectState,
    autonomy: AutonomousAgent,
    decider: Backend,
    last_error: Option<String>,
}

impl Engine {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        gateway: BackendGateway,
        sandbox: Arc<dyn Sandbox>,
        applier: SelfModApplier,
        store: MemoryStore,
        bundle: MemoryBundle,
        transcript: Transcript,
        project: ProjectState,
        autonomy: AutonomousAgent,
        decider: Backend,
    ) -> Self {
        Self {
            gateway,
            sandbox,
            applier,
            store,
            bundle,
            pending: PendingStore::new(),
            transcript,
            project,
            autonomy,
            decider,
            last_error: None,
        }
    }

    pub fn bundle(&self) -> &MemoryBundle {
        &self.bundle
    }

    pub fn pending(&self) -> &PendingStore {
        &self.pending
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn project(&self) -> &ProjectState {
        &self.project
    }

    pub fn autonomy(&self) -> &AutonomousAgent {
        &self.autonomy
    }

    pub fn decider(&self) -> Backend {
        self.decider
    }

    fn say(&mut self, text: impl AsRef<str>) {
        self.transcript.push(text.as_ref());
    }

    /// 处理一次带输入的提交；空白输入直接忽略
    pub async fn submit(&mut self, action: SubmitAction, input: &str) {
        let input = input.trim();
        if input.is_empty() {
            return;
        }
        self.last_error = None;

        if !matches!(action, SubmitAction::Context(_)) {
            self.say(format!("\n--- You: {} ---", input));
        }

        let output = match action {
            SubmitAction::Orchestrate => self.orchestrate(input).await,
            SubmitAction::Force(backend) => {
                self.say(format!("Forcing delegation to {}...", backend.display_name()));
                let reply = self.gateway.call(backend, input).await;
                self.say(format!("{} Direct:\n{}", backend.display_name(), reply));
                self.extract_and_stage(&reply, backend.display_name());
                reply
            }
            SubmitAction::Context(backend) => {
                let prompt =
                    prompts::full_context_prompt(&self.transcript.as_text(), &self.bundle, input);
                self.say(format!(
                    "\n--- Sending FULL CONTEXT + AI MEMORY to {} ---",
                    backend.display_name()
                ));
                let reply = self.gateway.call(backend, &prompt).await;
                self.say(format!(
                    "{} (Full Context+Memory):\n{}",
                    backend.display_name(),
                    reply
                ));
                self.extract_and_stage(&reply, backend.display_name());
                reply
            }
            SubmitAction::RequestPython => {
                self.request_script(ArtifactKind::Python, &prompts::request_python_prompt(input))
                    .await
            }
            SubmitAction::RequestBash => {
                self.request_script(ArtifactKind::Bash, &prompts::request_bash_prompt(input))
                    .await
            }
        };

        self.project.record(input, &action.label(), &output);

        if self.autonomy.is_enabled() {
            self.autonomous_step().await;
        }
    }

    /// 智能路由：决策者给出 respond / delegate，解析失败时错误文本即结果
    pub async fn orchestrate(&mut self, input: &str) -> String {
        self.say("Orchestrator analyzing...");

        let status = self.autonomy.status();
        let narrative = self.project.narrative();
        let prompt = prompts::decision_prompt(&DecisionContext {
            project_state: &narrative,
            user_input: input,
            bundle: &self.bundle,
            autonomous_status: &status,
        });
        let raw = self.gateway.call(self.decider, &prompt).await;

        match parse_decision(&raw) {
            Ok(Decision::Respond(answer)) => {
                self.say(format!("Orchestrator Response:\n{}", answer));
                self.extract_and_stage(&answer, ORCHESTRATOR_SOURCE);
                answer
            }
            Ok(Decision::Delegate { backend, prompt }) => {
                tracing::info!(decider = %self.decider, target = %backend, "delegating request");
                self.say(format!("Delegating to {}...", backend.display_name()));
                let reply = self.gateway.call(backend, &prompt).await;
                self.say(format!("{} Response:\n{}", backend.display_name(), reply));
                self.extract_and_stage(&reply, backend.display_name());
                reply
            }
            Err(e) => {
                tracing::warn!(error = %e, "decision parse failed");
                let text = e.to_string();
                self.say(&text);
                text
            }
        }
    }

    async fn request_script(&mut self, kind: ArtifactKind, prompt: &str) -> String {
        let name = SCRIPT_BACKEND.display_name();
        self.say(format!("Requesting {} script from {}...", kind, name));
        let reply = self.gateway.call(SCRIPT_BACKEND, prompt).await;
        self.say(format!("{} {} Script:\n{}", name, kind, reply));
        self.extract_and_stage(&reply, name);
        reply
    }

    /// 提取回复中的制品并暂存，每个制品写入标题、代码块与操作提示
    pub fn extract_and_stage(&mut self, text: &str, source: &str) -> Vec<ArtifactKind> {
        let found = extract(text);
        for (kind, body) in &found {
            self.pending.stage(*kind, body.as_str(), source);
            tracing::info!(kind = %kind, source, chars = body.chars().count(), "artifact staged");

            let (header, lang, key, verb) = match kind {
                ArtifactKind::Bash => ("BASH CODE READY", "bash", "Alt+B", "run"),
                ArtifactKind::Python => ("PYTHON CODE READY", "python", "Alt+P", "run"),
                ArtifactKind::SelfMod => ("SELF-MODIFICATION READY", "", "Alt+S", "apply"),
            };
            self.say(format!("{} from {}:", header, source));
            self.say(format!("```{}\n{}\n```", lang, body));
            self.say(format!(
                "Press {} to {}, Alt+D to deny, or Alt+1/2/3 to send to another AI for review",
                key, verb
            ));
            if *kind == ArtifactKind::SelfMod {
                self.say("WARNING: This will modify the AI system itself!");
            }
        }
        found.into_iter().map(|(kind, _)| kind).collect()
    }

    /// 执行暂存的 Python / Bash 脚本；槽位在执行前取出，因此无论结果如何都会被清空
    pub async fn run_pending(&mut self, kind: ArtifactKind) -> Option<ExecutionOutcome> {
        if kind == ArtifactKind::SelfMod {
            self.apply_self_mod().await;
            return None;
        }
        self.last_error = None;

        let Some(artifact) = self.pending.take(kind) else {
            let name = match kind {
                ArtifactKind::Bash => "bash",
                _ => "Python",
            };
            self.say(format!("No {} code pending", name));
            return None;
        };

        self.say(format!("Executing {} code from {}...", kind, artifact.source));
        tracing::info!(kind = %kind, source = %artifact.source, "executing staged script");
        let outcome = self.sandbox.run(kind, &artifact.body).await;

        if let Some(e) = OrchestratorError::from_outcome(kind, &outcome) {
            tracing::warn!(error = %e, "script execution did not succeed");
        }
        self.say(outcome.describe(kind));
        Some(outcome)
    }

    /// 应用暂存的自修改；任何分支都会清空槽位并持久化
    pub async fn apply_self_mod(&mut self) -> Option<ApplyReport> {
        self.last_error = None;
        let Some(artifact) = self.pending.take(ArtifactKind::SelfMod) else {
            self.say("No self-modification pending");
            return None;
        };

        self.say(format!("Applying self-modification from {}...", artifact.source));
        let context = self.transcript.len();
        let report = self
            .applier
            .apply(&artifact.body, &artifact.source, &mut self.bundle, context)
            .await;
        for line in &report.lines {
            self.transcript.push(line);
        }
        self.persist();
        Some(report)
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear_all();
        self.say("All pending operations cleared");
    }

    pub async fn toggle_autonomous(&mut self) {
        if self.autonomy.is_enabled() {
            self.autonomy.deactivate();
            tracing::info!("autonomous mode off");
            self.say("Autonomous agent deactivated.");
        } else {
            self.autonomy.activate();
            tracing::info!(specialist = %self.autonomy.specialist(), "autonomous mode on");
            self.say("AUTONOMOUS AGENT ACTIVATED! The AI will now work independently to improve the system.");
            self.autonomous_step().await;
        }
    }

    /// 自主模式的一步：执行队首任务，或在队列为空时自省出新任务
    pub async fn autonomous_step(&mut self) {
        let Some(step) = self.autonomy.next_step() else {
            return;
        };
        let specialist = self.autonomy.specialist();

        match step {
            AutonomyStep::Execute(task) => {
                self.say(format!("Autonomous Agent executing task: {}", task));
                let prompt = prompts::task_prompt(
                    &task,
                    self.pending.is_staged(ArtifactKind::Python),
                    self.pending.is_staged(ArtifactKind::Bash),
                    &self.bundle,
                );
                let reply = self.gateway.call(specialist, &prompt).await;
                self.say(format!("Autonomous Agent Response:\n{}", reply));
                self.extract_and_stage(&reply, AGENT_SOURCE);

                let auto_safe = self
                    .pending
                    .peek(ArtifactKind::Python)
                    .is_some_and(|artifact| self.autonomy.is_auto_safe(&artifact));
                if auto_safe {
                    self.say("Autonomous Agent auto-executing safe Python code...");
                    self.run_pending(ArtifactKind::Python).await;
                }
            }
            AutonomyStep::Reflect => {
                self.say("Autonomous Agent thinking of new improvements...");
                let prompt = prompts::reflection_prompt(&self.bundle);
                let reply = self.gateway.call(specialist, &prompt).await;
                let added = self.autonomy.queue_suggestions(&reply);
                tracing::debug!(added, "parsed autonomous suggestions");
                self.say(format!(
                    "Autonomous Agent queued {} new tasks",
                    self.autonomy.queue().len()
                ));
            }
        }
    }

    pub fn show_diagnostics(&mut self) {
        let functions = self.bundle.function_names().join(", ");
        let evolution = if self.bundle.evolution_log.is_empty() {
            "None".to_string()
        } else {
            self.bundle.evolution_summary(3)
        };
        let mut lines = vec![
            "\nSYSTEM DIAGNOSTICS".to_string(),
            format!("Current AI Memory: {}", self.bundle.memory_summary()),
            format!("Learned Patterns: {}", self.bundle.patterns.len()),
            format!("Custom Functions: [{}]", functions),
            format!("Recent Evolution: {}", evolution),
            format!(
                "Autonomous Mode: {}",
                if self.autonomy.is_enabled() { "Active" } else { "Inactive" }
            ),
            format!("Queued Tasks: {}", self.autonomy.queue().len()),
        ];
        for backend in Backend::ALL {
            let (prompt, completion, total) = self.gateway.token_usage(backend);
            lines.push(format!(
                "Tokens {}: prompt {} / completion {} / total {}",
                backend.display_name(),
                prompt,
                completion,
                total
            ));
        }
        for line in lines {
            self.say(line);
        }
    }

    pub fn clear_screen(&mut self) {
        self.transcript.reset(CLEARED_BANNER);
    }

    /// 整体重写记忆文件；失败只记录，不中断当前动作
    pub fn persist(&mut self) {
        match self.store.save(&self.bundle) {
            Ok(()) => self.say("AI memory saved successfully!"),
            Err(e) => {
                let e = OrchestratorError::from(e);
                tracing::warn!(error = %e, "persist failed");
                self.say(e.to_string());
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// 投影为 UI 状态
    pub fn snapshot(&self) -> UiState {
        UiState {
            phase: Phase::Idle,
            transcript: self.transcript.lines(),
            autonomous: self.autonomy.is_enabled(),
            queued_tasks: self.autonomy.queue().len(),
            pending: PendingFlags {
                python: self.pending.is_staged(ArtifactKind::Python),
                bash: self.pending.is_staged(ArtifactKind::Bash),
                self_mod: self.pending.is_staged(ArtifactKind::SelfMod),
                source: Some(self.pending.provenance().to_string()).filter(|s| !s.is_empty()),
            },
            input_locked: false,
            error_message: self.last_error.clone(),
        }
    }
}
