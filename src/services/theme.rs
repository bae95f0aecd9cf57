use crate::models::{Theme, ThemeInfo, TimerMode};
use crate::services::store::{keys, StoreService};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::warn;

/// Flat color drawn for the Custom theme: the background image supplies the
/// visual, not a color.
const TRANSPARENT: &str = "bg-transparent";

/// Fixed color class for each concrete theme and countdown slot.
fn theme_color_table(theme: Theme, slot: TimerMode) -> &'static str {
    match (theme, slot) {
        (Theme::Warm, TimerMode::Focus) => "bg-amber-600",
        (Theme::Warm, TimerMode::ShortBreak) => "bg-orange-500",
        (Theme::Warm, TimerMode::LongBreak) => "bg-amber-500",
        (Theme::Purple, TimerMode::Focus) => "bg-violet-500",
        (Theme::Purple, TimerMode::ShortBreak) => "bg-violet-400",
        (Theme::Purple, TimerMode::LongBreak) => "bg-violet-300",
        (Theme::Dark, TimerMode::Focus) => "bg-black",
        (Theme::Dark, TimerMode::ShortBreak) => "bg-black-900",
        (Theme::Dark, TimerMode::LongBreak) => "bg-black-800",
        (Theme::Pink, TimerMode::Focus) => "bg-pink-600",
        (Theme::Pink, TimerMode::ShortBreak) => "bg-rose-500",
        (Theme::Pink, TimerMode::LongBreak) => "bg-rose-400",
        (Theme::Custom, _) => TRANSPARENT,
    }
}

/// Theme service for appearance preferences.
/// 管理主题与自定义背景图，并写回存储。
pub struct ThemeService {
    state: Mutex<ThemeServiceState>,
    store: Arc<StoreService>,
    update_tx: watch::Sender<ThemeInfo>,
    // Keep one receiver alive so updates never hit a closed channel
    _update_rx: watch::Receiver<ThemeInfo>,
}

struct ThemeServiceState {
    theme: Theme,
    background_image: Option<String>,
}

impl ThemeService {
    /// Create a new theme service
    /// 默认使用 Warm 主题，无背景图。
    pub fn new(store: Arc<StoreService>) -> Arc<Self> {
        let state = ThemeServiceState {
            theme: Theme::Warm,
            background_image: None,
        };

        let (update_tx, update_rx) = watch::channel(Self::info_from(&state));

        Arc::new(Self {
            state: Mutex::new(state),
            store,
            update_tx,
            _update_rx: update_rx,
        })
    }

    /// Load persisted theme and background image
    /// 从存储恢复主题偏好；非空背景图会把主题切回 Custom。
    pub async fn load_from_store(&self) {
        if let Some(value) = self.store.get(keys::THEME).await {
            match value.as_str() {
                Some(name) => {
                    if let Some(theme) = Theme::from_store_value(name) {
                        self.state.lock().unwrap().theme = theme;
                    }
                }
                None => warn!("Ignoring unexpected {} value: {}", keys::THEME, value),
            }
        }

        if let Some(value) = self.store.get(keys::BACKGROUND_IMAGE).await {
            match value.as_str() {
                // Empty string means no image was saved
                Some("") => {}
                Some(data) => {
                    let mut state = self.state.lock().unwrap();
                    state.background_image = Some(data.to_string());
                    state.theme = Theme::Custom;
                }
                None => warn!(
                    "Ignoring unexpected {} value",
                    keys::BACKGROUND_IMAGE
                ),
            }
        }

        self.emit_theme_update();
    }

    /// Select a theme
    /// 选择主题；非 Custom 时同时清除背景图。
    pub fn set_theme(&self, theme: Theme) {
        {
            let mut state = self.state.lock().unwrap();
            state.theme = theme;
            if theme != Theme::Custom {
                state.background_image = None;
            }
        }

        self.persist(keys::THEME, Value::from(theme.as_str()));
        if theme != Theme::Custom {
            self.persist(keys::BACKGROUND_IMAGE, Value::from(""));
        }
        self.emit_theme_update();
    }

    /// Use a custom background image
    /// 设置背景图并把主题切换为 Custom。
    pub fn set_background_image(&self, data: impl Into<String>) {
        let data = data.into();
        {
            let mut state = self.state.lock().unwrap();
            state.background_image = Some(data.clone());
            state.theme = Theme::Custom;
        }

        self.persist(keys::BACKGROUND_IMAGE, Value::from(data));
        self.persist(keys::THEME, Value::from(Theme::Custom.as_str()));
        self.emit_theme_update();
    }

    /// Remove the background image and return to the default theme.
    pub fn clear_background_image(&self) {
        {
            let mut state = self.state.lock().unwrap();
            state.background_image = None;
            state.theme = Theme::Warm;
        }

        self.persist(keys::BACKGROUND_IMAGE, Value::from(""));
        self.persist(keys::THEME, Value::from(Theme::Warm.as_str()));
        self.emit_theme_update();
    }

    /// Color class for a countdown slot under the current theme.
    pub fn theme_color(&self, slot: TimerMode) -> &'static str {
        let state = self.state.lock().unwrap();
        theme_color_table(state.theme, slot)
    }

    /// Current snapshot for UI
    pub fn get_info(&self) -> ThemeInfo {
        let state = self.state.lock().unwrap();
        Self::info_from(&state)
    }

    /// Watch channel carrying a fresh snapshot after every change.
    pub fn subscribe(&self) -> watch::Receiver<ThemeInfo> {
        self.update_tx.subscribe()
    }

    fn info_from(state: &ThemeServiceState) -> ThemeInfo {
        ThemeInfo {
            theme: state.theme,
            background_image: state.background_image.clone(),
        }
    }

    /// Push the current snapshot to watchers
    /// 将主题状态推送给订阅方。
    fn emit_theme_update(&self) {
        let _ = self.update_tx.send(self.get_info());
    }

    /// Fire-and-forget store write
    /// 异步落盘，失败时仅记录日志。
    fn persist(&self, key: &'static str, value: Value) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.set(key, value).await {
                warn!("Failed to persist {}: {}", key, e);
            }
        });
    }
}
