// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;
use tracing::{debug, warn};

use crate::config::settings::{CountRange, DelayRange, HumanizeSettings};
use crate::engines::traits::{BrowserSession, EngineError};

/// 人类行为模拟器
///
/// 在页面之间插入随机等待，并在提取前模拟鼠标移动和滚动
#[derive(Debug, Clone)]
pub struct Humanizer {
    settings: HumanizeSettings,
}

impl Humanizer {
    pub fn new(settings: HumanizeSettings) -> Self {
        Self { settings }
    }

    /// 不做任何等待和模拟
    pub fn disabled() -> Self {
        Self {
            settings: HumanizeSettings {
                enabled: false,
                ..HumanizeSettings::default()
            },
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// 翻页前的随机等待
    pub async fn page_delay(&self) {
        self.pause(self.settings.page_delay).await;
    }

    /// 两个动作之间的随机等待
    pub async fn action_delay(&self) {
        self.pause(self.settings.action_delay).await;
    }

    /// 固定的短暂等待，用于商店自己的滚动节奏
    pub async fn short_pause(&self, duration: Duration) {
        if self.settings.enabled {
            tokio::time::sleep(duration).await;
        }
    }

    /// 在当前页面上模拟用户行为
    ///
    /// 失败只记录日志，不影响抓取
    pub async fn simulate(&self, session: &mut dyn BrowserSession) {
        if !self.settings.enabled {
            return;
        }
        if let Err(e) = self.simulate_inner(session).await {
            warn!(error = %e, "human_simulation_failed");
        }
    }

    async fn simulate_inner(&self, session: &mut dyn BrowserSession) -> Result<(), EngineError> {
        let moves = sample_count(self.settings.mouse_moves);
        for _ in 0..moves {
            let x = rand::random_range(100.0..=1000.0);
            let y = rand::random_range(100.0..=800.0);
            session.move_mouse(x, y).await?;
            self.action_delay().await;
        }

        let steps = sample_count(self.settings.scroll_steps);
        for _ in 0..steps {
            let delta = rand::random_range(80..=240);
            session.scroll_by(delta).await?;
            self.action_delay().await;
        }

        self.pause(self.settings.settle_delay).await;
        debug!(moves, steps, "human_simulation_done");
        Ok(())
    }

    async fn pause(&self, range: DelayRange) {
        if !self.settings.enabled {
            return;
        }
        tokio::time::sleep(sample_delay(range)).await;
    }
}

fn sample_delay(range: DelayRange) -> Duration {
    let (lo, hi) = ordered(range.min_ms, range.max_ms);
    Duration::from_millis(rand::random_range(lo..=hi))
}

fn sample_count(range: CountRange) -> u32 {
    let (lo, hi) = ordered(range.min, range.max);
    rand::random_range(lo..=hi)
}

fn ordered<T: PartialOrd>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
