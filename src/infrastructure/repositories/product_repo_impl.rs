// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::product::{ChipBrand, EnrichedProduct, Price, Store, StoredProduct};
use crate::domain::repositories::product_repository::{
    ProductRepository, ProductStats, RepositoryError,
};
use crate::infrastructure::database::entities::product;

/// 商品仓库实现
#[derive(Clone)]
pub struct ProductRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl ProductRepoImpl {
    /// 创建新的商品仓库实现
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductRepository for ProductRepoImpl {
    async fn upsert(&self, item: &EnrichedProduct) -> Result<Uuid, RepositoryError> {
        let now = Utc::now();
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(item.title.clone()),
            price_amount: Set(item.price.amount),
            price_currency: Set(item.price.currency.clone()),
            price_raw: Set(item.price.raw.clone()),
            url: Set(item.url.clone()),
            store: Set(item.store.id().to_string()),
            chip_brand: Set(item.chip_brand.as_str().to_string()),
            manufacturer: Set(item.manufacturer.clone()),
            model_name: Set(item.model.clone()),
            available: Set(item.available),
            scraped_at: Set(item.scraped_at.into()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        // id and created_at survive the conflict update
        product::Entity::insert(model)
            .on_conflict(
                OnConflict::column(product::Column::Url)
                    .update_columns([
                        product::Column::Title,
                        product::Column::PriceAmount,
                        product::Column::PriceCurrency,
                        product::Column::PriceRaw,
                        product::Column::Store,
                        product::Column::ChipBrand,
                        product::Column::Manufacturer,
                        product::Column::ModelName,
                        product::Column::Available,
                        product::Column::ScrapedAt,
                        product::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await?;

        let stored = product::Entity::find()
            .filter(product::Column::Url.eq(item.url.as_str()))
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(stored.id)
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<StoredProduct>, RepositoryError> {
        product::Entity::find()
            .filter(product::Column::Url.eq(url))
            .one(self.db.as_ref())
            .await?
            .map(StoredProduct::try_from)
            .transpose()
    }

    async fn best_deals(
        &self,
        limit: u64,
        chip_brand: Option<ChipBrand>,
    ) -> Result<Vec<StoredProduct>, RepositoryError> {
        product::Entity::find()
            .filter(product::Column::Available.eq(true))
            .apply_if(chip_brand, |query, brand| {
                query.filter(product::Column::ChipBrand.eq(brand.as_str()))
            })
            .order_by_asc(product::Column::PriceAmount)
            .limit(limit)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(StoredProduct::try_from)
            .collect()
    }

    async fn stats(&self) -> Result<ProductStats, RepositoryError> {
        let rows: Vec<(String, String, bool, f64)> = product::Entity::find()
            .select_only()
            .column(product::Column::Store)
            .column(product::Column::ChipBrand)
            .column(product::Column::Available)
            .column(product::Column::PriceAmount)
            .into_tuple()
            .all(self.db.as_ref())
            .await?;

        let mut stats = ProductStats::default();
        let mut sum = 0.0;
        for (store, chip_brand, available, price) in rows {
            stats.total += 1;
            if available {
                stats.available += 1;
            }
            *stats.by_store.entry(store).or_default() += 1;
            *stats.by_chip_brand.entry(chip_brand).or_default() += 1;
            sum += price;
            stats.min_price = Some(stats.min_price.map_or(price, |m: f64| m.min(price)));
            stats.max_price = Some(stats.max_price.map_or(price, |m: f64| m.max(price)));
        }
        if stats.total > 0 {
            stats.average_price = Some(sum / stats.total as f64);
        }
        Ok(stats)
    }

    async fn delete_older_than(&self, days: i64) -> Result<u64, RepositoryError> {
        let cutoff = Utc::now() - Duration::days(days);
        let result = product::Entity::delete_many()
            .filter(product::Column::UpdatedAt.lt(cutoff))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}

impl TryFrom<product::Model> for StoredProduct {
    type Error = RepositoryError;

    fn try_from(model: product::Model) -> Result<Self, Self::Error> {
        let store = model
            .store
            .parse::<Store>()
            .map_err(RepositoryError::InvalidData)?;
        let chip_brand = model
            .chip_brand
            .parse::<ChipBrand>()
            .map_err(RepositoryError::InvalidData)?;

        Ok(Self {
            id: model.id,
            product: EnrichedProduct {
                title: model.title,
                price: Price {
                    amount: model.price_amount,
                    currency: model.price_currency,
                    raw: model.price_raw,
                },
                url: model.url,
                store,
                chip_brand,
                manufacturer: model.manufacturer,
                model: model.model_name,
                available: model.available,
                scraped_at: model.scraped_at.into(),
            },
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}
