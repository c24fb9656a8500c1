// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::product::{ChipBrand, EnrichedProduct, StoredProduct};

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 存储的数据无法映射回领域模型
    #[error("Invalid stored value: {0}")]
    InvalidData(String),
}

/// 商品统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductStats {
    pub total: u64,
    pub available: u64,
    /// 店铺标识 -> 商品数
    pub by_store: BTreeMap<String, u64>,
    /// 芯片品牌 -> 商品数
    pub by_chip_brand: BTreeMap<String, u64>,
    pub average_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// 商品仓库特质
///
/// URL 是商品的自然键。并发的编排器只依赖按 URL 的 upsert 保证一致性，
/// 实现不应假设调用方持有任何锁。
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// 按 URL 插入或原地更新商品
    ///
    /// # 参数
    ///
    /// * `product` - 富化后的商品
    ///
    /// # 返回值
    ///
    /// * `Ok(Uuid)` - 持久化记录的ID；同一 URL 多次写入返回同一个ID
    /// * `Err(RepositoryError)` - 写入失败
    async fn upsert(&self, product: &EnrichedProduct) -> Result<Uuid, RepositoryError>;

    /// 根据 URL 查找商品
    async fn find_by_url(&self, url: &str) -> Result<Option<StoredProduct>, RepositoryError>;

    /// 按价格升序返回有货的商品
    ///
    /// # 参数
    ///
    /// * `limit` - 最多返回的条数
    /// * `chip_brand` - 可选的芯片品牌过滤
    async fn best_deals(
        &self,
        limit: u64,
        chip_brand: Option<ChipBrand>,
    ) -> Result<Vec<StoredProduct>, RepositoryError>;

    /// 汇总统计
    async fn stats(&self) -> Result<ProductStats, RepositoryError>;

    /// 删除超过指定天数未更新的商品，返回删除条数
    async fn delete_older_than(&self, days: i64) -> Result<u64, RepositoryError>;
}
