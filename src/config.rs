//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `MAESTRO__*` 覆盖（双下划线表示嵌套，如 `MAESTRO__LLM__DECIDER=gpt`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::llm::Backend;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub sandbox: SandboxSection,
    pub memory: MemorySection,
    pub autonomy: AutonomySection,
}

/// [app] 段：应用名与叙事上限
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 对话记录保留的显示行数（滚动窗口）
    pub max_transcript_lines: usize,
    /// Project State 保留的最近条目数（每次请求一条）
    pub max_project_entries: usize,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            max_transcript_lines: 2000,
            max_project_entries: 20,
        }
    }
}

/// [llm] 段：决策后端、请求超时与各后端的模型/端点
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 负责路由决策的后端（默认 gemini）
    pub decider: Backend,
    /// 单次请求超时（秒），0 表示不设上限
    pub request_timeout_secs: u64,
    pub gemini: BackendSection,
    pub gpt: BackendSection,
    pub claude: BackendSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            decider: Backend::Gemini,
            request_timeout_secs: 0,
            gemini: BackendSection::default(),
            gpt: BackendSection::default(),
            claude: BackendSection::default(),
        }
    }
}

impl LlmSection {
    pub fn backend(&self, backend: Backend) -> &BackendSection {
        match backend {
            Backend::Gemini => &self.gemini,
            Backend::Gpt => &self.gpt,
            Backend::Claude => &self.claude,
        }
    }
}

/// 单个后端的覆盖项；未设置时使用 llm::providers 中的默认值
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BackendSection {
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// 读取 API Key 的环境变量名
    pub api_key_env: Option<String>,
}

/// [sandbox] 段：脚本执行的解释器与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SandboxSection {
    pub timeout_secs: u64,
    /// Bash 脚本通过 `<shell> -c` 执行
    pub shell: String,
    /// Python 脚本写入临时文件后由该解释器执行
    pub python: String,
}

impl Default for SandboxSection {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            shell: "sh".to_string(),
            python: "/usr/bin/python3".to_string(),
        }
    }
}

/// [memory] 段：Memory Bundle 的持久化路径
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemorySection {
    pub path: PathBuf,
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("ai_memory.json"),
        }
    }
}

/// [autonomy] 段：自主模式的执行后端与自动执行策略
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AutonomySection {
    pub specialist: Backend,
    /// Python 代码包含该标记才可能被自动执行
    pub auto_exec_marker: String,
    /// 自动执行的代码长度上限（字符数，不含）
    pub auto_exec_max_len: usize,
}

impl Default for AutonomySection {
    fn default() -> Self {
        Self {
            specialist: Backend::Gpt,
            auto_exec_marker: "print".to_string(),
            auto_exec_max_len: 100,
        }
    }
}

/// 从 config 目录加载配置，环境变量 MAESTRO__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 MAESTRO__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("MAESTRO")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
