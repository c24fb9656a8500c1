// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;
use tracing::debug;

use crate::domain::services::page_inspector::KeywordMatcher;
use crate::engines::traits::{BrowserSession, ElementHandle, EngineError};

/// 指向卡片自身的特殊选择器
pub const SCOPE_SELECTOR: &str = ":scope";

const CLOSEST_PREFIX: &str = "closest(";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("selector set '{0}' has no selectors")]
pub struct EmptySelectorSet(pub String);

/// 按优先级排列的一组候选选择器
///
/// 商店页面结构随时可能变化，依次尝试多个选择器可以在小改动后继续工作。
/// 除普通 CSS 外还支持两种写法：
/// - `:scope` 表示卡片元素本身
/// - `closest(<css>)` 表示最近的匹配祖先
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSet {
    description: String,
    selectors: Vec<String>,
}

impl SelectorSet {
    /// 创建选择器组，空白选择器会被忽略
    ///
    /// # 返回值
    ///
    /// 没有任何有效选择器时返回 [`EmptySelectorSet`]
    pub fn try_new<I, S>(description: impl Into<String>, selectors: I) -> Result<Self, EmptySelectorSet>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let description = description.into();
        let selectors: Vec<String> = selectors
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if selectors.is_empty() {
            return Err(EmptySelectorSet(description));
        }
        Ok(Self {
            description,
            selectors,
        })
    }

    /// 用字面量创建选择器组
    ///
    /// # Panics
    ///
    /// 列表为空时 panic，只用于编译期已知的常量列表
    pub fn new(description: &str, selectors: &[&str]) -> Self {
        match Self::try_new(description, selectors) {
            Ok(set) => set,
            Err(e) => panic!("{}", e),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.selectors.iter().map(String::as_str)
    }

    pub fn primary(&self) -> &str {
        &self.selectors[0]
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

/// 一个商店的全部选择器
#[derive(Debug, Clone)]
pub struct StoreSelectors {
    pub product_card: SelectorSet,
    pub title: SelectorSet,
    pub price: SelectorSet,
    pub link: SelectorSet,
    pub availability: SelectorSet,
}

/// 命中的值和命中它的选择器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matched {
    pub value: String,
    pub selector: String,
}

#[derive(Debug, Clone, Copy)]
enum Probe<'a> {
    Text,
    TextContaining(&'a str),
    Attribute(&'a str),
    Present,
}

/// 在商品卡片内按 [`SelectorSet`] 提取字段
///
/// 所有字段共用同一个"依次尝试"的算法；单个选择器出错只记录日志并尝试下一个
pub struct FieldExtractor<'s> {
    session: &'s mut dyn BrowserSession,
}

impl<'s> FieldExtractor<'s> {
    pub fn new(session: &'s mut dyn BrowserSession) -> Self {
        Self { session }
    }

    pub fn session(&mut self) -> &mut dyn BrowserSession {
        &mut *self.session
    }

    /// 第一个非空文本
    pub async fn extract_text(&mut self, scope: ElementHandle, set: &SelectorSet) -> Option<Matched> {
        self.first_match(scope, set, Probe::Text).await
    }

    /// 第一个包含 `needle` 的文本
    pub async fn extract_text_containing(
        &mut self,
        scope: ElementHandle,
        set: &SelectorSet,
        needle: &str,
    ) -> Option<Matched> {
        self.first_match(scope, set, Probe::TextContaining(needle)).await
    }

    /// 第一个存在的元素，值为空字符串
    pub async fn locate(&mut self, scope: ElementHandle, set: &SelectorSet) -> Option<Matched> {
        self.first_match(scope, set, Probe::Present).await
    }

    /// 第一个非空属性值
    pub async fn extract_attribute(
        &mut self,
        scope: ElementHandle,
        set: &SelectorSet,
        attribute: &str,
    ) -> Option<Matched> {
        self.first_match(scope, set, Probe::Attribute(attribute)).await
    }

    /// 判断商品是否有货
    ///
    /// 出现任一缺货标识元素，或卡片文本包含缺货关键字，即视为缺货。
    /// 返回 `(是否有货, 命中的标识选择器)`
    pub async fn is_available(
        &mut self,
        scope: ElementHandle,
        indicators: &SelectorSet,
        keywords: &KeywordMatcher,
    ) -> (bool, Option<String>) {
        if let Some(hit) = self.locate(scope, indicators).await {
            return (false, Some(hit.selector));
        }

        match self.session.text(scope).await {
            Ok(Some(text)) if keywords.matches(&text) => (false, None),
            Ok(_) => (true, None),
            Err(e) => {
                debug!(error = %e, "availability_text_failed");
                (true, None)
            }
        }
    }

    /// 卡片的完整文本
    pub async fn card_text(&mut self, scope: ElementHandle) -> Option<String> {
        match self.session.text(scope).await {
            Ok(text) => text.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                debug!(error = %e, "card_text_failed");
                None
            }
        }
    }

    async fn first_match(&mut self, scope: ElementHandle, set: &SelectorSet, probe: Probe<'_>) -> Option<Matched> {
        for selector in set.iter() {
            let element = match self.resolve(scope, selector).await {
                Ok(Some(element)) => element,
                Ok(None) => continue,
                Err(e) => {
                    debug!(selector, field = set.description(), error = %e, "selector_failed");
                    continue;
                }
            };

            let value = match probe {
                Probe::Text | Probe::TextContaining(_) => self.session.text(element).await,
                Probe::Attribute(name) => self.session.attribute(element, name).await,
                Probe::Present => Ok(Some(String::new())),
            };

            let accepted = |v: &str| match probe {
                Probe::Present => true,
                Probe::TextContaining(needle) => v.contains(needle),
                Probe::Text | Probe::Attribute(_) => !v.trim().is_empty(),
            };

            match value {
                Ok(Some(v)) if accepted(&v) => {
                    return Some(Matched {
                        value: v.trim().to_string(),
                        selector: selector.to_string(),
                    });
                }
                Ok(_) => continue,
                Err(e) => {
                    debug!(selector, field = set.description(), error = %e, "selector_read_failed");
                    continue;
                }
            }
        }
        None
    }

    async fn resolve(
        &mut self,
        scope: ElementHandle,
        selector: &str,
    ) -> Result<Option<ElementHandle>, EngineError> {
        if selector == SCOPE_SELECTOR {
            return Ok(Some(scope));
        }
        if let Some(inner) = selector
            .strip_prefix(CLOSEST_PREFIX)
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return self.session.closest(scope, inner.trim()).await;
        }
        self.session.find_within(scope, selector).await
    }
}
