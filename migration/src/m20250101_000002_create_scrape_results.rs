// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 抓取结果表迁移
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScrapeResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScrapeResults::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScrapeResults::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(ScrapeResults::Url).text().not_null())
                    .col(ColumnDef::new(ScrapeResults::Title).text().not_null())
                    .col(ColumnDef::new(ScrapeResults::Description).text().not_null())
                    .col(ColumnDef::new(ScrapeResults::Keywords).text().not_null())
                    .col(ColumnDef::new(ScrapeResults::Author).string().not_null())
                    .col(ColumnDef::new(ScrapeResults::Language).string().not_null())
                    .col(ColumnDef::new(ScrapeResults::Favicon).text().not_null())
                    .col(ColumnDef::new(ScrapeResults::ImageUrl).text().not_null())
                    .col(ColumnDef::new(ScrapeResults::SiteName).string().not_null())
                    .col(ColumnDef::new(ScrapeResults::Links).json().not_null())
                    .col(ColumnDef::new(ScrapeResults::Images).json().not_null())
                    .col(ColumnDef::new(ScrapeResults::Headers).json().not_null())
                    .col(ColumnDef::new(ScrapeResults::StatusCode).integer().not_null())
                    .col(ColumnDef::new(ScrapeResults::ContentType).string().not_null())
                    .col(ColumnDef::new(ScrapeResults::WordCount).big_integer().not_null())
                    .col(ColumnDef::new(ScrapeResults::LoadTimeMs).big_integer().not_null())
                    .col(
                        ColumnDef::new(ScrapeResults::CreatedAt)
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
                    .name("idx_scrape_results_owner_created_at")
                    .table(ScrapeResults::Table)
                    .col(ScrapeResults::OwnerId)
                    .col(ScrapeResults::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScrapeResults::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScrapeResults {
    Table,
    Id,
    OwnerId,
    Url,
    Title,
    Description,
    Keywords,
    Author,
    Language,
    Favicon,
    ImageUrl,
    SiteName,
    Links,
    Images,
    Headers,
    StatusCode,
    ContentType,
    WordCount,
    LoadTimeMs,
    CreatedAt,
}
