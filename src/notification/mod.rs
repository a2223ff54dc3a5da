use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;

/// Host surface that keeps an ongoing "tracking active" indicator on screen.
pub trait NotificationSurface: Send + Sync {
    fn show_active_indicator(&self);
    fn withdraw_indicator(&self);
    fn is_visible(&self) -> bool;
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorContent {
    #[serde(default = "default_channel_id")]
    pub channel_id: String,
    #[serde(default = "default_channel_name")]
    pub channel_name: String,
    #[serde(default = "default_channel_description")]
    pub channel_description: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_text")]
    pub text: String,
}

fn default_channel_id() -> String {
    "location_service_channel".to_string()
}

fn default_channel_name() -> String {
    "Location Service".to_string()
}

fn default_channel_description() -> String {
    "Tracks worker location while on duty".to_string()
}

fn default_title() -> String {
    "Duty Beacon".to_string()
}

fn default_text() -> String {
    "Location tracking active".to_string()
}

impl Default for IndicatorContent {
    fn default() -> Self {
        IndicatorContent {
            channel_id: default_channel_id(),
            channel_name: default_channel_name(),
            channel_description: default_channel_description(),
            title: default_title(),
            text: default_text(),
        }
    }
}

/// Indicator rendered into the agent log, for hosts without a notification shade.
pub struct LogSurface {
    content: IndicatorContent,
    visible: AtomicBool,
}

impl LogSurface {
    pub fn new(content: IndicatorContent) -> Self {
        log::debug!(
            "Notification channel {} ({}): {}",
            content.channel_id,
            content.channel_name,
            content.channel_description
        );
        LogSurface {
            content,
            visible: AtomicBool::new(false),
        }
    }
}

impl NotificationSurface for LogSurface {
    fn show_active_indicator(&self) {
        if !self.visible.swap(true, Ordering::SeqCst) {
            log::info!(
                "[{}] {}: {}",
                self.content.channel_id,
                self.content.title,
                self.content.text
            );
        }
    }

    fn withdraw_indicator(&self) {
        if self.visible.swap(false, Ordering::SeqCst) {
            log::info!("[{}] indicator withdrawn", self.content.channel_id);
        }
    }

    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}
