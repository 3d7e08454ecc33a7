//! 响应超时策略
//!
//! 请求方等待和接单方来电提示共用同一份超时配置，
//! 不再在多个界面组件里各写一个 30 秒倒计时。

use std::time::Duration;

use domain::Timestamp;

/// 默认响应窗口：30 秒
pub const DEFAULT_RESPONSE_WINDOW_SECS: u64 = 30;

/// 响应超时策略
#[derive(Debug, Clone, Copy)]
pub struct TimeoutPolicy {
    window: Duration,
}

impl TimeoutPolicy {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// `sent_at` 时刻发出的请求，到 `now` 是否已超过响应窗口。
    pub fn expired(&self, sent_at: Timestamp, now: Timestamp) -> bool {
        let elapsed = now.signed_duration_since(sent_at);
        match elapsed.to_std() {
            Ok(elapsed) => elapsed > self.window,
            // now 早于 sent_at（时钟回拨），按未超时处理
            Err(_) => false,
        }
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self::from_secs(DEFAULT_RESPONSE_WINDOW_SECS)
    }
}
