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

use crate::domain::models::schedule::Schedule;
use crate::domain::repositories::schedule_repository::ScheduleRepository;
use crate::infrastructure::database::entities::schedule as schedule_entity;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 定时任务仓库实现
///
/// 基于SeaORM实现的定时任务数据访问层
#[derive(Clone)]
pub struct ScheduleRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ScheduleRepositoryImpl {
    /// 创建新的定时任务仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    ///
    /// # 返回值
    ///
    /// 返回新的定时任务仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<schedule_entity::Model> for Schedule {
    fn from(model: schedule_entity::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            name: model.name,
            url: model.url,
            cron_expression: model.cron_expression,
            active: model.active,
            last_run: model.last_run.map(Into::into),
            next_run: model.next_run.map(Into::into),
            run_count: model.run_count,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<&Schedule> for schedule_entity::ActiveModel {
    fn from(schedule: &Schedule) -> Self {
        Self {
            id: Set(schedule.id),
            owner_id: Set(schedule.owner_id),
            name: Set(schedule.name.clone()),
            url: Set(schedule.url.clone()),
            cron_expression: Set(schedule.cron_expression.clone()),
            active: Set(schedule.active),
            last_run: Set(schedule.last_run.map(Into::into)),
            next_run: Set(schedule.next_run.map(Into::into)),
            run_count: Set(schedule.run_count),
            created_at: Set(schedule.created_at.into()),
            updated_at: Set(schedule.updated_at.into()),
        }
    }
}

#[async_trait]
impl ScheduleRepository for ScheduleRepositoryImpl {
    async fn create(&self, schedule: &Schedule) -> Result<Schedule, RepositoryError> {
        let model = schedule_entity::ActiveModel::from(schedule)
            .insert(self.db.as_ref())
            .await?;
        Ok(model.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Schedule>, RepositoryError> {
        let model = schedule_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<Schedule>, RepositoryError> {
        let models = schedule_entity::Entity::find()
            .filter(schedule_entity::Column::OwnerId.eq(owner_id))
            .order_by_desc(schedule_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_active(&self) -> Result<Vec<Schedule>, RepositoryError> {
        let models = schedule_entity::Entity::find()
            .filter(schedule_entity::Column::Active.eq(true))
            .order_by_asc(schedule_entity::Column::NextRun)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update(&self, schedule: &Schedule) -> Result<Schedule, RepositoryError> {
        // 执行统计只由 update_last_run 写回，这里不覆盖
        let active_model = schedule_entity::ActiveModel {
            id: Set(schedule.id),
            name: Set(schedule.name.clone()),
            url: Set(schedule.url.clone()),
            cron_expression: Set(schedule.cron_expression.clone()),
            active: Set(schedule.active),
            next_run: Set(schedule.next_run.map(Into::into)),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        match active_model.update(self.db.as_ref()).await {
            Ok(model) => Ok(model.into()),
            Err(DbErr::RecordNotUpdated) => Err(RepositoryError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = schedule_entity::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn update_last_run(
        &self,
        id: Uuid,
        last_run: DateTime<Utc>,
        run_count: i64,
    ) -> Result<(), RepositoryError> {
        let result = schedule_entity::Entity::update_many()
            .col_expr(
                schedule_entity::Column::LastRun,
                Expr::value::<Option<DateTime<FixedOffset>>>(Some(last_run.into())),
            )
            .col_expr(schedule_entity::Column::RunCount, Expr::value(run_count))
            .col_expr(
                schedule_entity::Column::UpdatedAt,
                Expr::value::<DateTime<FixedOffset>>(Utc::now().into()),
            )
            .filter(schedule_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn update_next_run(
        &self,
        id: Uuid,
        next_run: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = schedule_entity::Entity::update_many()
            .col_expr(
                schedule_entity::Column::NextRun,
                Expr::value::<Option<DateTime<FixedOffset>>>(Some(next_run.into())),
            )
            .col_expr(
                schedule_entity::Column::UpdatedAt,
                Expr::value::<DateTime<FixedOffset>>(Utc::now().into()),
            )
            .filter(schedule_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
