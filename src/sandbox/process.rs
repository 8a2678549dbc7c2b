//! 基于子进程的沙箱实现
//!
//! - Bash：`<shell> -c <body>`
//! - Python：写入新建的临时 .py 文件后以 `<python> <path>` 执行，结束后无条件删除临时文件
//!
//! 子进程作为新进程组的组长启动；超时后对整个进程组发送 SIGKILL，保证后代进程一并终止。

use std::io::Write;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::artifact::ArtifactKind;
use crate::config::SandboxSection;
use crate::sandbox::{ExecutionOutcome, Sandbox};

pub struct ProcessSandbox {
    shell: String,
    python: String,
    timeout: Duration,
}

impl ProcessSandbox {
    pub fn new(shell: impl Into<String>, python: impl Into<String>, timeout: Duration) -> Self {
        Self {
            shell: shell.into(),
            python: python.into(),
            timeout,
        }
    }

    pub fn from_config(cfg: &SandboxSection) -> Self {
        Self::new(
            cfg.shell.clone(),
            cfg.python.clone(),
            Duration::from_secs(cfg.timeout_secs),
        )
    }

    async fn run_bash(&self, body: &str) -> ExecutionOutcome {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(body);
        self.run_command(cmd).await
    }

    async fn run_python(&self, body: &str) -> ExecutionOutcome {
        let mut file = match tempfile::Builder::new()
            .prefix("maestro-")
            .suffix(".py")
            .tempfile()
        {
            Ok(f) => f,
            Err(e) => return ExecutionOutcome::LaunchError(format!("temp file: {}", e)),
        };
        if let Err(e) = file.write_all(body.as_bytes()).and_then(|_| file.flush()) {
            return ExecutionOutcome::LaunchError(format!("temp file: {}", e));
        }

        // TempPath 在 drop 时删除文件，任何返回路径都不会遗留
        let path = file.into_temp_path();
        let mut cmd = Command::new(&self.python);
        cmd.arg(&*path);
        let outcome = self.run_command(cmd).await;

        if let Err(e) = path.close() {
            tracing::warn!(error = %e, "failed to remove temporary script");
        }
        outcome
    }

    async fn run_command(&self, mut cmd: Command) -> ExecutionOutcome {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let child = match cmd.spawn() {
            Ok(c) => c,
            Err(e) => return ExecutionOutcome::LaunchError(e.to_string()),
        };
        let pid = child.id();

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();
                if output.status.success() {
                    ExecutionOutcome::Success { stdout }
                } else {
                    ExecutionOutcome::Failure {
                        code: output.status.code(),
                        stderr,
                    }
                }
            }
            Ok(Err(e)) => ExecutionOutcome::LaunchError(e.to_string()),
            Err(_) => {
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "script execution timed out");
                ExecutionOutcome::TimedOut {
                    after: self.timeout,
                }
            }
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    // 子进程以 process_group(0) 启动，pgid == pid
    let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
    if rc != 0 {
        tracing::debug!(pid, error = %std::io::Error::last_os_error(), "killpg failed");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {
    // 非 Unix 平台依赖 kill_on_drop 终止直接子进程
}

#[async_trait]
impl Sandbox for ProcessSandbox {
    async fn run(&self, kind: ArtifactKind, body: &str) -> ExecutionOutcome {
        tracing::info!(kind = %kind, chars = body.chars().count(), "executing staged script");
        match kind {
            ArtifactKind::Bash => self.run_bash(body).await,
            ArtifactKind::Python => self.run_python(body).await,
            ArtifactKind::SelfMod => ExecutionOutcome::LaunchError(
                "self-modifications are applied, not executed".to_string(),
            ),
        }
    }
}
