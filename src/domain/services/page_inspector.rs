// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use deunicode::deunicode;

use crate::config::settings::DetectionSettings;

/// 大小写和重音不敏感的关键字匹配
///
/// "Indisponível" 与 "indisponivel" 视为同一个关键字
#[derive(Debug, Clone, Default)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
}

impl KeywordMatcher {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| fold(k.as_ref()))
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// 返回第一个出现在文本中的关键字
    pub fn find(&self, text: &str) -> Option<&str> {
        if self.keywords.is_empty() || text.is_empty() {
            return None;
        }
        let folded = fold(text);
        self.keywords
            .iter()
            .find(|k| folded.contains(k.as_str()))
            .map(String::as_str)
    }

    pub fn matches(&self, text: &str) -> bool {
        self.find(text).is_some()
    }
}

fn fold(text: &str) -> String {
    deunicode(text).to_lowercase()
}

/// 被识别出的拦截信号
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeSignal {
    /// 标题命中关键字
    Title(String),
    /// 页面内容命中验证码组件标记
    Content(String),
}

impl ChallengeSignal {
    pub fn marker(&self) -> &str {
        match self {
            ChallengeSignal::Title(k) | ChallengeSignal::Content(k) => k,
        }
    }
}

/// 页面级检测：验证码墙、维护页和缺货关键字
///
/// 关键字列表是手工维护的，页面措辞变化时可能漏检
#[derive(Debug, Clone, Default)]
pub struct PageInspector {
    captcha_title: KeywordMatcher,
    captcha_content: KeywordMatcher,
    unavailable: KeywordMatcher,
}

impl PageInspector {
    pub fn new(settings: &DetectionSettings) -> Self {
        Self {
            captcha_title: KeywordMatcher::new(&settings.captcha_title_keywords),
            captcha_content: KeywordMatcher::new(&settings.captcha_content_markers),
            unavailable: KeywordMatcher::new(&settings.unavailable_keywords),
        }
    }

    /// 检查页面是否为验证码或机器人挑战页
    pub fn detect_challenge(&self, title: &str, content: &str) -> Option<ChallengeSignal> {
        if let Some(k) = self.captcha_title.find(title) {
            return Some(ChallengeSignal::Title(k.to_string()));
        }
        self.captcha_content
            .find(content)
            .map(|k| ChallengeSignal::Content(k.to_string()))
    }

    /// 检查标题是否包含店铺的维护页短语
    pub fn detect_maintenance<'a>(&self, title: &str, phrases: &[&'a str]) -> Option<&'a str> {
        let folded = fold(title);
        phrases
            .iter()
            .find(|p| folded.contains(&fold(p)))
            .copied()
    }

    /// 缺货关键字，交给各商店在卡片里查找
    pub fn unavailable_keywords(&self) -> &KeywordMatcher {
        &self.unavailable
    }
}
