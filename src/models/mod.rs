use serde::{Deserialize, Serialize};

/// Countdown mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerMode {
    Focus,
    ShortBreak,
    LongBreak,
}

/// Color theme preference
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Theme {
    Warm,
    Purple,
    Dark,
    Pink,
    Custom,
}

impl Theme {
    /// Name stored under the `theme` key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Warm => "Warm",
            Theme::Purple => "Purple",
            Theme::Dark => "Dark",
            Theme::Pink => "Pink",
            Theme::Custom => "Custom",
        }
    }

    /// Parse a stored theme name. `Custom` is never selected by name alone;
    /// it is derived from a stored background image instead.
    pub fn from_store_value(value: &str) -> Option<Self> {
        match value {
            "Warm" => Some(Theme::Warm),
            "Purple" => Some(Theme::Purple),
            "Dark" => Some(Theme::Dark),
            "Pink" => Some(Theme::Pink),
            _ => None,
        }
    }
}

/// User-configurable countdown durations, in minutes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Durations {
    pub focus_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            focus_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
        }
    }
}

impl Durations {
    /// Configured minutes for a mode.
    pub fn minutes_for(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Focus => self.focus_minutes,
            TimerMode::ShortBreak => self.short_break_minutes,
            TimerMode::LongBreak => self.long_break_minutes,
        }
    }

    /// Countdown length for a mode, in seconds.
    pub fn seconds_for(&self, mode: TimerMode) -> u32 {
        self.minutes_for(mode) * 60
    }
}

/// Timer snapshot for UI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerInfo {
    pub mode: TimerMode,
    pub time_left_seconds: u32,
    pub total_seconds: u32,
    pub is_running: bool,
    pub completed_focus_sessions: u32,
}

impl TimerInfo {
    /// Whole minutes left on the countdown.
    pub fn minutes(&self) -> u32 {
        self.time_left_seconds / 60
    }

    /// Seconds within the current minute.
    pub fn seconds(&self) -> u32 {
        self.time_left_seconds % 60
    }

    /// Zero-padded `MM:SS` display string.
    pub fn formatted(&self) -> String {
        format!("{:02}:{:02}", self.minutes(), self.seconds())
    }
}

/// Theme snapshot for UI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ThemeInfo {
    pub theme: Theme,
    pub background_image: Option<String>,
}

/// Discrete timer notifications, alongside the rolling snapshot channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    ModeChanged(TimerMode),
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_durations_match_compiled_in_values() {
        let durations = Durations::default();
        assert_eq!(durations.seconds_for(TimerMode::Focus), 1500);
        assert_eq!(durations.seconds_for(TimerMode::ShortBreak), 300);
        assert_eq!(durations.seconds_for(TimerMode::LongBreak), 900);
    }

    #[test]
    fn formatted_time_is_zero_padded() {
        let mut info = TimerInfo {
            mode: TimerMode::Focus,
            time_left_seconds: 1500,
            total_seconds: 1500,
            is_running: false,
            completed_focus_sessions: 0,
        };
        assert_eq!(info.formatted(), "25:00");

        info.time_left_seconds = 65;
        assert_eq!(info.formatted(), "01:05");

        info.time_left_seconds = 0;
        assert_eq!(info.formatted(), "00:00");
    }

    #[test]
    fn custom_theme_is_not_parsed_from_name() {
        assert_eq!(Theme::from_store_value("Pink"), Some(Theme::Pink));
        assert_eq!(Theme::from_store_value("Custom"), None);
        assert_eq!(Theme::from_store_value("neon"), None);
    }
}
