use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Products::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Products::Title).string().not_null())
                    .col(ColumnDef::new(Products::PriceAmount).double().not_null())
                    .col(
                        ColumnDef::new(Products::PriceCurrency)
                            .string()
                            .not_null()
                            .default("BRL"),
                    )
                    .col(ColumnDef::new(Products::PriceRaw).string().not_null())
                    // URL is the natural key, upserts conflict on it
                    .col(
                        ColumnDef::new(Products::Url)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Products::Store).string().not_null())
                    .col(ColumnDef::new(Products::ChipBrand).string().not_null())
                    .col(ColumnDef::new(Products::Manufacturer).string().not_null())
                    .col(ColumnDef::new(Products::Model).string().not_null())
                    .col(
                        ColumnDef::new(Products::Available)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Products::ScrapedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Products::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Products::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_store_chip")
                    .table(Products::Table)
                    .col(Products::Store)
                    .col(Products::ChipBrand)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_price")
                    .table(Products::Table)
                    .col(Products::PriceAmount)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    Title,
    PriceAmount,
    PriceCurrency,
    PriceRaw,
    Url,
    Store,
    ChipBrand,
    Manufacturer,
    Model,
    Available,
    ScrapedAt,
    CreatedAt,
    UpdatedAt,
}
