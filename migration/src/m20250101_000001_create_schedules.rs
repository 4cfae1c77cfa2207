// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 定时任务表迁移
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    /// 应用数据库迁移
    ///
    /// # 参数
    ///
    /// * `manager` - 数据库模式管理器
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 迁移成功
    /// * `Err(DbErr)` - 迁移失败
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Schedules::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Schedules::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Schedules::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Schedules::Name).string().not_null())
                    .col(ColumnDef::new(Schedules::Url).text().not_null())
                    .col(ColumnDef::new(Schedules::CronExpression).string().not_null())
                    .col(
                        ColumnDef::new(Schedules::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Schedules::LastRun).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Schedules::NextRun).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(Schedules::RunCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Schedules::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Schedules::UpdatedAt)
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
                    .name("idx_schedules_owner_id")
                    .table(Schedules::Table)
                    .col(Schedules::OwnerId)
                    .to_owned(),
            )
            .await?;

        // Start() 加载活跃任务时使用
        manager
            .create_index(
                Index::create()
                    .name("idx_schedules_active_next_run")
                    .table(Schedules::Table)
                    .col(Schedules::Active)
                    .col(Schedules::NextRun)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Schedules::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Schedules {
    Table,
    Id,
    OwnerId,
    Name,
    Url,
    CronExpression,
    Active,
    LastRun,
    NextRun,
    RunCount,
    CreatedAt,
    UpdatedAt,
}
