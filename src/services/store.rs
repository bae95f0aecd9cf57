use crate::utils::{AppError, AppResult};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Store keys shared with earlier releases of the app. Values written under
/// these names must stay readable by them.
pub mod keys {
    pub const THEME: &str = "theme";
    pub const BACKGROUND_IMAGE: &str = "backgroundImage";
    pub const POMODOROS_COMPLETED: &str = "pomodorosCompleted";
    pub const POMODORO_DURATION: &str = "pomodoroDuration";
    pub const SHORT_BREAK_DURATION: &str = "shortBreakDuration";
    pub const LONG_BREAK_DURATION: &str = "longBreakDuration";
}

const STORE_FILE: &str = "store.json";

/// Key-value store for user preferences.
/// 使用本地 JSON 文件持久化用户偏好。
pub struct StoreService {
    values: Mutex<Map<String, Value>>,
    data_dir: PathBuf,
}

impl StoreService {
    /// Create a store over the given data directory
    /// 记录数据目录并初始化内存缓存。
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            values: Mutex::new(Map::new()),
            data_dir: data_dir.into(),
        }
    }

    /// Default per-user data directory, falling back to the working directory.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("tomadoro"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Load persisted values from disk
    /// 创建数据目录并加载偏好文件；文件缺失或损坏时保留默认值。
    pub async fn initialize(&self) -> AppResult<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir).map_err(|e| {
                AppError::StoreError(format!("Failed to create data directory: {}", e))
            })?;
        }

        let file_path = self.store_file();
        if file_path.exists() {
            let content = std::fs::read_to_string(&file_path).map_err(|e| {
                AppError::StoreError(format!("Failed to read store file: {}", e))
            })?;

            match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(loaded) => {
                    let mut values = self.values.lock().await;
                    *values = loaded;
                }
                Err(e) => {
                    // Keep compiled-in defaults; the next set() rewrites the file.
                    warn!("Ignoring unreadable store file {}: {}", file_path.display(), e);
                }
            }
        }

        info!("Preference store ready at {}", self.data_dir.display());
        Ok(())
    }

    /// Path of the store file
    fn store_file(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE)
    }

    /// Read a value by key
    pub async fn get(&self, key: &str) -> Option<Value> {
        let values = self.values.lock().await;
        values.get(key).cloned()
    }

    /// Write a value and persist the whole map
    /// 同步更新内存缓存并整体重写 store.json。
    pub async fn set(&self, key: impl Into<String>, value: Value) -> AppResult<()> {
        let mut values = self.values.lock().await;
        values.insert(key.into(), value);

        let json = serde_json::to_string_pretty(&*values)?;
        std::fs::write(self.store_file(), json)
            .map_err(|e| AppError::StoreError(format!("Failed to write store file: {}", e)))?;

        Ok(())
    }
}
