//! State core for a desktop pomodoro timer: a three-mode countdown with
//! automatic cycling, theme/background preferences, and a JSON-file
//! key-value store. Consumed in-process by a UI layer through direct calls
//! and the watch/broadcast subscriptions each service exposes.

pub mod models;
pub mod services;
pub mod utils;

pub use models::{Durations, Theme, ThemeInfo, TimerEvent, TimerInfo, TimerMode};
pub use services::{StoreService, ThemeService, TimerService};
pub use utils::{AppError, AppResult};

use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Handles to the assembled state services.
pub struct AppServices {
    pub store: Arc<StoreService>,
    pub timer: Arc<TimerService>,
    pub theme: Arc<ThemeService>,
}

impl AppServices {
    /// Build the store and both state services, then load persisted values
    /// 两段式初始化：先以默认值构造，再等待存储加载完成，保证首帧前状态已就绪。
    pub async fn init(data_dir: impl Into<PathBuf>) -> Self {
        let store = Arc::new(StoreService::new(data_dir));
        if let Err(e) = store.initialize().await {
            warn!("Store unavailable, continuing with defaults: {}", e);
        }

        let timer = TimerService::new(Arc::clone(&store));
        let theme = ThemeService::new(Arc::clone(&store));

        timer.load_from_store().await;
        theme.load_from_store().await;

        Self { store, timer, theme }
    }

    /// Assemble over the platform's default data directory.
    pub async fn init_default() -> Self {
        Self::init(StoreService::default_data_dir()).await
    }
}
