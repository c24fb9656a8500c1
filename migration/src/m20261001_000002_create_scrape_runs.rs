use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScrapeRuns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScrapeRuns::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScrapeRuns::Store).string().not_null())
                    .col(
                        ColumnDef::new(ScrapeRuns::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ScrapeRuns::FinishedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(ScrapeRuns::ExecutionTimeSecs).double())
                    .col(ColumnDef::new(ScrapeRuns::PagesScraped).integer().not_null().default(0))
                    .col(ColumnDef::new(ScrapeRuns::ProductsFound).integer().not_null().default(0))
                    .col(ColumnDef::new(ScrapeRuns::ProductsSaved).integer().not_null().default(0))
                    .col(ColumnDef::new(ScrapeRuns::ProductsSkipped).integer().not_null().default(0))
                    .col(ColumnDef::new(ScrapeRuns::UnavailableCount).integer().not_null().default(0))
                    .col(ColumnDef::new(ScrapeRuns::Errors).integer().not_null().default(0))
                    .col(ColumnDef::new(ScrapeRuns::CaptchasDetected).integer().not_null().default(0))
                    .col(ColumnDef::new(ScrapeRuns::Success).boolean().not_null().default(false))
                    .col(ColumnDef::new(ScrapeRuns::StopReason).string())
                    .col(ColumnDef::new(ScrapeRuns::ErrorMessage).text())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scrape_runs_store_started")
                    .table(ScrapeRuns::Table)
                    .col(ScrapeRuns::Store)
                    .col(ScrapeRuns::StartedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScrapeRuns::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScrapeRuns {
    Table,
    Id,
    Store,
    StartedAt,
    FinishedAt,
    ExecutionTimeSecs,
    PagesScraped,
    ProductsFound,
    ProductsSaved,
    ProductsSkipped,
    UnavailableCount,
    Errors,
    CaptchasDetected,
    Success,
    StopReason,
    ErrorMessage,
}
