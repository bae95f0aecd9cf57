use crate::models::{Durations, TimerEvent, TimerInfo, TimerMode};
use crate::services::store::{keys, StoreService};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration as TokioDuration, MissedTickBehavior};
use tracing::{debug, warn};

/// Timer service for the focus/break countdown.
/// 负责倒计时状态、阶段轮换与完成计数的持久化。
pub struct TimerService {
    state: Mutex<TimerServiceState>,
    store: Arc<StoreService>,
    update_tx: watch::Sender<TimerInfo>,
    // Keep one receiver alive so updates never hit a closed channel
    _update_rx: watch::Receiver<TimerInfo>,
    events_tx: broadcast::Sender<TimerEvent>,
}

struct TimerServiceState {
    mode: TimerMode,
    time_left_seconds: u32,
    is_running: bool,
    completed_focus_sessions: u32,
    durations: Durations,
    ticker: Option<JoinHandle<()>>,
}

impl TimerService {
    /// Create a new timer service
    /// 以默认时长构造，初始处于空闲的专注阶段。
    pub fn new(store: Arc<StoreService>) -> Arc<Self> {
        let durations = Durations::default();
        let state = TimerServiceState {
            mode: TimerMode::Focus,
            time_left_seconds: durations.seconds_for(TimerMode::Focus),
            is_running: false,
            completed_focus_sessions: 0,
            durations,
            ticker: None,
        };

        let (update_tx, update_rx) = watch::channel(Self::info_from(&state));
        let (events_tx, _) = broadcast::channel(16);

        Arc::new(Self {
            state: Mutex::new(state),
            store,
            update_tx,
            _update_rx: update_rx,
            events_tx,
        })
    }

    /// Load persisted counter and durations
    /// 从存储读取完成计数与自定义时长；缺失或类型不符时保留默认值。
    pub async fn load_from_store(&self) {
        if let Some(value) = self.store.get(keys::POMODOROS_COMPLETED).await {
            match counter_from_value(&value) {
                Some(count) => {
                    let mut state = self.state.lock().unwrap();
                    state.completed_focus_sessions = count;
                }
                None => warn!(
                    "Ignoring unexpected {} value: {}",
                    keys::POMODOROS_COMPLETED,
                    value
                ),
            }
        }

        self.load_duration(keys::POMODORO_DURATION, TimerMode::Focus)
            .await;
        self.load_duration(keys::SHORT_BREAK_DURATION, TimerMode::ShortBreak)
            .await;
        self.load_duration(keys::LONG_BREAK_DURATION, TimerMode::LongBreak)
            .await;

        self.emit_timer_update();
    }

    /// Apply one stored duration. The visible countdown follows it only while
    /// idle in the matching mode.
    async fn load_duration(&self, key: &'static str, mode: TimerMode) {
        let Some(value) = self.store.get(key).await else {
            return;
        };
        let Some(minutes) = value.as_u64().and_then(|m| u32::try_from(m).ok()) else {
            warn!("Ignoring unexpected {} value: {}", key, value);
            return;
        };
        let minutes = minutes.max(1);

        let mut state = self.state.lock().unwrap();
        match mode {
            TimerMode::Focus => state.durations.focus_minutes = minutes,
            TimerMode::ShortBreak => state.durations.short_break_minutes = minutes,
            TimerMode::LongBreak => state.durations.long_break_minutes = minutes,
        }
        if state.mode == mode && !state.is_running {
            state.time_left_seconds = state.durations.seconds_for(mode);
        }
    }

    /// Start the countdown
    /// 已在运行时不重复启动；否则启动每秒一次的滴答任务。
    pub fn start(self: Arc<Self>) {
        {
            let mut state = self.state.lock().unwrap();
            if state.is_running {
                return;
            }
            state.is_running = true;

            let service = Arc::clone(&self);
            let handle = tokio::spawn(async move {
                let mut interval = time::interval(TokioDuration::from_secs(1));
                // Skip the backlog after a system sleep instead of replaying it.
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                // A tokio interval fires immediately; consume that tick so the
                // countdown decrements once per elapsed second.
                interval.tick().await;
                loop {
                    interval.tick().await;
                    service.tick();
                }
            });
            state.ticker = Some(handle);
        }

        self.emit_timer_update();
    }

    /// Pause the countdown
    /// 停止滴答任务；重复调用是幂等的。
    pub fn pause(&self) {
        let ticker = {
            let mut state = self.state.lock().unwrap();
            if !state.is_running && state.ticker.is_none() {
                return;
            }
            state.is_running = false;
            state.ticker.take()
        };

        if let Some(handle) = ticker {
            handle.abort();
        }

        self.emit_timer_update();
    }

    /// Pause and restore the current mode's full duration.
    pub fn reset(&self) {
        self.pause();
        {
            let mut state = self.state.lock().unwrap();
            state.time_left_seconds = state.durations.seconds_for(state.mode);
        }
        self.emit_timer_update();
    }

    /// Switch mode, abandoning any countdown in progress
    /// 切换阶段并重置剩余时间。
    pub fn set_mode(&self, mode: TimerMode) {
        self.pause();
        {
            let mut state = self.state.lock().unwrap();
            state.mode = mode;
            state.time_left_seconds = state.durations.seconds_for(mode);
        }

        debug!("Timer mode set to {:?}", mode);
        let _ = self.events_tx.send(TimerEvent::ModeChanged(mode));
        self.emit_timer_update();
    }

    /// Update the configurable durations (minutes)
    /// 更新自定义时长并逐项持久化；空闲时立即刷新显示时间。
    pub fn set_durations(&self, focus: u32, short_break: u32, long_break: u32) {
        let durations = Durations {
            focus_minutes: focus.max(1),
            short_break_minutes: short_break.max(1),
            long_break_minutes: long_break.max(1),
        };

        let is_running = {
            let mut state = self.state.lock().unwrap();
            state.durations = durations;
            state.is_running
        };

        self.persist(keys::POMODORO_DURATION, Value::from(durations.focus_minutes));
        self.persist(
            keys::SHORT_BREAK_DURATION,
            Value::from(durations.short_break_minutes),
        );
        self.persist(
            keys::LONG_BREAK_DURATION,
            Value::from(durations.long_break_minutes),
        );

        if !is_running {
            self.reset();
        } else {
            self.emit_timer_update();
        }
    }

    /// One countdown step (the ticker calls this once per second)
    /// 递减剩余时间；观察到零之后进入完成处理。
    pub fn tick(&self) {
        let finished = {
            let mut state = self.state.lock().unwrap();
            if !state.is_running {
                return;
            }
            if state.time_left_seconds > 0 {
                state.time_left_seconds -= 1;
                false
            } else {
                true
            }
        };

        if finished {
            self.complete();
        } else {
            self.emit_timer_update();
        }
    }

    /// Finish the current countdown and rotate to the next mode.
    fn complete(&self) {
        self.pause();

        let previous_mode = self.state.lock().unwrap().mode;
        let _ = self.events_tx.send(TimerEvent::Finished);

        if previous_mode == TimerMode::Focus {
            let completed = {
                let mut state = self.state.lock().unwrap();
                state.completed_focus_sessions += 1;
                state.completed_focus_sessions
            };
            self.persist(keys::POMODOROS_COMPLETED, Value::from(completed));

            // Every 4th focus session earns the long break
            if completed % 4 == 0 {
                self.set_mode(TimerMode::LongBreak);
            } else {
                self.set_mode(TimerMode::ShortBreak);
            }
        } else {
            self.set_mode(TimerMode::Focus);
        }
    }

    /// Current snapshot for UI
    pub fn get_info(&self) -> TimerInfo {
        let state = self.state.lock().unwrap();
        Self::info_from(&state)
    }

    /// Watch channel carrying a fresh snapshot after every change.
    pub fn subscribe(&self) -> watch::Receiver<TimerInfo> {
        self.update_tx.subscribe()
    }

    /// Broadcast channel carrying mode changes and completions.
    pub fn subscribe_events(&self) -> broadcast::Receiver<TimerEvent> {
        self.events_tx.subscribe()
    }

    fn info_from(state: &TimerServiceState) -> TimerInfo {
        TimerInfo {
            mode: state.mode,
            time_left_seconds: state.time_left_seconds,
            total_seconds: state.durations.seconds_for(state.mode),
            is_running: state.is_running,
            completed_focus_sessions: state.completed_focus_sessions,
        }
    }

    /// Push the current snapshot to watchers
    /// 将计时器状态推送给订阅方，驱动 UI 更新。
    fn emit_timer_update(&self) {
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

/// Accept both the bare number and the legacy `{ "value": N }` wrapper
/// written by older releases.
fn counter_from_value(value: &Value) -> Option<u32> {
    let number = match value {
        Value::Object(map) => map.get("value")?,
        other => other,
    };
    number.as_u64().and_then(|n| u32::try_from(n).ok())
}

#[cfg(test)]
mod tests {
    use super::counter_from_value;
    use serde_json::json;

    #[test]
    fn counter_accepts_bare_and_wrapped_numbers() {
        assert_eq!(counter_from_value(&json!(12)), Some(12));
        assert_eq!(counter_from_value(&json!({ "value": 7 })), Some(7));
    }

    #[test]
    fn counter_rejects_unexpected_shapes() {
        assert_eq!(counter_from_value(&json!("12")), None);
        assert_eq!(counter_from_value(&json!(-3)), None);
        assert_eq!(counter_from_value(&json!({ "count": 7 })), None);
        assert_eq!(counter_from_value(&json!(null)), None);
    }
}
