// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含数据库、抓取器、浏览器、检测关键字、调度器和指标等所有配置项
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 抓取循环配置
    pub scraper: ScraperSettings,
    /// 人类行为模拟配置
    pub humanize: HumanizeSettings,
    /// 浏览器配置
    pub browser: BrowserSettings,
    /// 验证码与缺货检测配置
    pub detection: DetectionSettings,
    /// 调度器配置
    pub scheduler: SchedulerSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
    /// 启动时是否执行迁移
    pub run_migrations: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://gpuscout.db?mode=rwc".to_string(),
            max_connections: Some(10),
            min_connections: Some(1),
            connect_timeout: Some(10),
            idle_timeout: Some(300),
            run_migrations: true,
        }
    }
}

/// 抓取循环配置设置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperSettings {
    /// 是否以无头模式运行浏览器
    pub headless: bool,
    /// 每次运行最多抓取的页数
    pub max_pages: u32,
    /// 单页导航超时（毫秒）
    pub timeout_ms: u64,
    /// 合理价格下限
    pub min_price: f64,
    /// 合理价格上限
    pub max_price: f64,
    /// 累计错误达到该值时停止
    pub error_threshold: u32,
    /// 连续页面加载失败达到该值时停止
    pub consecutive_failure_limit: u32,
    /// 页面被视为有效列表页所需的最少商品卡片数
    pub min_product_cards: usize,
    /// 每个页面的导航尝试次数
    pub navigation_attempts: u32,
    /// 导航重试的基础退避时间（毫秒）
    pub retry_base_delay_ms: u64,
    /// 调试快照目录，未设置时不写快照
    pub debug_snapshot_dir: Option<String>,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            headless: true,
            max_pages: 20,
            timeout_ms: 30_000,
            min_price: 100.0,
            max_price: 50_000.0,
            error_threshold: 3,
            consecutive_failure_limit: 3,
            min_product_cards: 6,
            navigation_attempts: 1,
            retry_base_delay_ms: 2_000,
            debug_snapshot_dir: None,
        }
    }
}

/// 毫秒级随机区间
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }
}

/// 整数随机区间
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

/// 人类行为模拟配置
///
/// 所有延迟都是随机区间，避免固定节奏被反爬系统识别
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HumanizeSettings {
    /// 是否启用模拟
    pub enabled: bool,
    /// 导航前的等待
    pub page_delay: DelayRange,
    /// 鼠标移动、滚动等动作之间的等待
    pub action_delay: DelayRange,
    /// 滚动结束后的等待
    pub settle_delay: DelayRange,
    /// 鼠标移动次数
    pub mouse_moves: CountRange,
    /// 滚动步数
    pub scroll_steps: CountRange,
}

impl Default for HumanizeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            page_delay: DelayRange::new(2_000, 5_000),
            action_delay: DelayRange::new(100, 500),
            settle_delay: DelayRange::new(1_000, 3_000),
            mouse_moves: CountRange { min: 2, max: 5 },
            scroll_steps: CountRange { min: 5, max: 15 },
        }
    }
}

/// 浏览器引擎类型
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BrowserEngine {
    /// 真实的 Chromium 浏览器
    #[default]
    Chromium,
    /// 从磁盘回放的 HTML 快照
    Snapshot,
}

/// 浏览器配置设置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub engine: BrowserEngine,
    /// Chromium 可执行文件路径
    pub executable: Option<String>,
    /// 连接已有 Chrome 实例的调试地址，设置后不再启动新浏览器
    pub remote_debugging_url: Option<String>,
    /// 固定 User-Agent，未设置时从轮换池中随机选择
    pub user_agent: Option<String>,
    pub user_agents: Vec<String>,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub locale: String,
    /// 快照回放目录
    pub snapshot_dir: String,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            engine: BrowserEngine::Chromium,
            executable: None,
            remote_debugging_url: None,
            user_agent: None,
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36".to_string(),
            ],
            viewport_width: 1920,
            viewport_height: 1080,
            locale: "pt-BR".to_string(),
            snapshot_dir: "data/debug".to_string(),
        }
    }
}

/// 页面检测配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    /// 页面标题中出现即视为验证码拦截
    pub captcha_title_keywords: Vec<String>,
    /// 页面 HTML 中出现即视为验证码拦截
    pub captcha_content_markers: Vec<String>,
    /// 商品卡片文本中出现即视为缺货
    pub unavailable_keywords: Vec<String>,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            captcha_title_keywords: ["captcha", "cloudflare", "just a moment", "verify", "challenge"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            captcha_content_markers: [
                "cf-challenge",
                "challenge-platform",
                "g-recaptcha",
                "h-captcha",
                "captcha-delivery",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            unavailable_keywords: [
                "indisponível",
                "esgotado",
                "avise-me",
                "out of stock",
                "sold out",
                "unavailable",
                "notify me",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// 调度器配置设置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub enabled: bool,
    /// 两次调度周期之间的间隔（分钟）
    pub interval_minutes: u64,
    /// 启动时立即执行一轮
    pub run_on_startup: bool,
    /// 只执行一轮后退出
    pub run_once: bool,
    /// 参与调度的店铺标识
    pub stores: Vec<String>,
    /// 同时进行的店铺抓取上限
    pub max_concurrent: usize,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: 360,
            run_on_startup: true,
            run_once: false,
            stores: vec![
                "pichau".to_string(),
                "kabum".to_string(),
                "terabyte".to_string(),
            ],
            max_concurrent: 1,
        }
    }
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub listen_addr: String,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "0.0.0.0:9000".to_string(),
        }
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 按顺序加载内置默认值、config/default、config/{APP_ENVIRONMENT} 以及 GPUSCOUT__ 前缀的环境变量
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            .set_default("scraper.max_pages", 20)?
            .set_default("scraper.timeout_ms", 30_000)?
            .set_default("scraper.error_threshold", 3)?
            .set_default("scheduler.max_concurrent", 1)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("GPUSCOUT")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("scheduler.stores")
                    .with_list_parse_key("browser.user_agents"),
            );

        builder.build()?.try_deserialize()
    }
}
