//! Memory Bundle 持久化
//!
//! 单文件 JSON：`{memory, patterns, functions, evolution, last_saved}`。每次变更后整体重写：
//! 先写 `<path>.tmp` 再 rename。文件不存在时视为空记忆，不算错误。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::memory::{EvolutionEntry, LearnedPattern, MemoryBundle};

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed memory file {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Serialize, Deserialize)]
struct PersistedBundle {
    #[serde(default)]
    memory: Map<String, Value>,
    #[serde(default)]
    patterns: Vec<LearnedPattern>,
    #[serde(default)]
    functions: BTreeMap<String, String>,
    #[serde(default)]
    evolution: Vec<EvolutionEntry>,
    #[serde(default)]
    last_saved: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    path: PathBuf,
}

impl MemoryStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取记忆文件；文件不存在时返回 Ok(None)
    pub fn load(&self) -> Result<Option<MemoryBundle>, PersistenceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&self.path).map_err(|source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let persisted: PersistedBundle =
            serde_json::from_str(&data).map_err(|source| PersistenceError::Format {
                path: self.path.clone(),
                source,
            })?;
        Ok(Some(MemoryBundle {
            memory: persisted.memory,
            patterns: persisted.patterns,
            functions: persisted.functions,
            evolution_log: persisted.evolution,
        }))
    }

    /// 整体重写记忆文件；父目录不存在时自动创建
    pub fn save(&self, bundle: &MemoryBundle) -> Result<(), PersistenceError> {
        let io_err = |source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let persisted = PersistedBundle {
            memory: bundle.memory.clone(),
            patterns: bundle.patterns.clone(),
            functions: bundle.functions.clone(),
            evolution: bundle.evolution_log.clone(),
            last_saved: Some(crate::memory::now_iso()),
        };
        let json = serde_json::to_string_pretty(&persisted).map_err(|source| {
            PersistenceError::Format {
                path: self.path.clone(),
                source,
            }
        })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        tracing::debug!(path = %self.path.display(), "memory bundle saved");
        Ok(())
    }
}
