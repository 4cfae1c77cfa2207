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

use crate::domain::models::pagination::PaginationRequest;
use crate::domain::models::scrape_result::ScrapeResult;
use crate::domain::repositories::scrape_result_repository::ScrapeResultRepository;
use crate::infrastructure::database::entities::scrape_result as scrape_result_entity;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 抓取结果仓库实现
pub struct ScrapeResultRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ScrapeResultRepositoryImpl {
    /// 创建新的抓取结果仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    ///
    /// # 返回值
    ///
    /// 返回新的抓取结果仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<&ScrapeResult> for scrape_result_entity::ActiveModel {
    type Error = RepositoryError;

    fn try_from(result: &ScrapeResult) -> Result<Self, Self::Error> {
        let to_json = |value: serde_json::Result<serde_json::Value>| {
            value.map_err(|e| RepositoryError::InvalidData(e.to_string()))
        };

        Ok(Self {
            id: Set(result.id),
            owner_id: Set(result.owner_id),
            url: Set(result.url.clone()),
            title: Set(result.title.clone()),
            description: Set(result.description.clone()),
            keywords: Set(result.keywords.clone()),
            author: Set(result.author.clone()),
            language: Set(result.language.clone()),
            favicon: Set(result.favicon.clone()),
            image_url: Set(result.image_url.clone()),
            site_name: Set(result.site_name.clone()),
            links: Set(to_json(serde_json::to_value(&result.links))?),
            images: Set(to_json(serde_json::to_value(&result.images))?),
            headers: Set(to_json(serde_json::to_value(&result.headers))?),
            status_code: Set(i32::from(result.status_code)),
            content_type: Set(result.content_type.clone()),
            word_count: Set(result.word_count as i64),
            load_time_ms: Set(result.load_time_ms as i64),
            created_at: Set(result.created_at.into()),
        })
    }
}

impl TryFrom<scrape_result_entity::Model> for ScrapeResult {
    type Error = RepositoryError;

    fn try_from(model: scrape_result_entity::Model) -> Result<Self, Self::Error> {
        let invalid = |e: serde_json::Error| RepositoryError::InvalidData(e.to_string());

        Ok(Self {
            id: model.id,
            owner_id: model.owner_id,
            url: model.url,
            title: model.title,
            description: model.description,
            keywords: model.keywords,
            author: model.author,
            language: model.language,
            favicon: model.favicon,
            image_url: model.image_url,
            site_name: model.site_name,
            links: serde_json::from_value(model.links).map_err(invalid)?,
            images: serde_json::from_value(model.images).map_err(invalid)?,
            headers: serde_json::from_value(model.headers).map_err(invalid)?,
            status_code: u16::try_from(model.status_code).map_err(|_| {
                RepositoryError::InvalidData(format!("status code {}", model.status_code))
            })?,
            content_type: model.content_type,
            word_count: model.word_count.max(0) as u64,
            load_time_ms: model.load_time_ms.max(0) as u64,
            created_at: model.created_at.into(),
        })
    }
}

fn into_results(
    models: Vec<scrape_result_entity::Model>,
) -> Result<Vec<ScrapeResult>, RepositoryError> {
    models.into_iter().map(ScrapeResult::try_from).collect()
}

#[async_trait]
impl ScrapeResultRepository for ScrapeResultRepositoryImpl {
    async fn save(&self, result: &ScrapeResult) -> Result<(), RepositoryError> {
        let active_model = scrape_result_entity::ActiveModel::try_from(result)?;

        scrape_result_entity::Entity::insert(active_model)
            .exec(self.db.as_ref())
            .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScrapeResult>, RepositoryError> {
        let model = scrape_result_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        model.map(ScrapeResult::try_from).transpose()
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<ScrapeResult>, RepositoryError> {
        let models = scrape_result_entity::Entity::find()
            .filter(scrape_result_entity::Column::OwnerId.eq(owner_id))
            .order_by_desc(scrape_result_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        into_results(models)
    }

    async fn find_by_owner_paginated(
        &self,
        owner_id: Uuid,
        pagination: PaginationRequest,
    ) -> Result<(Vec<ScrapeResult>, u64), RepositoryError> {
        let total = self.count_by_owner(owner_id).await?;

        let models = scrape_result_entity::Entity::find()
            .filter(scrape_result_entity::Column::OwnerId.eq(owner_id))
            .order_by_desc(scrape_result_entity::Column::CreatedAt)
            .offset(pagination.offset())
            .limit(pagination.per_page)
            .all(self.db.as_ref())
            .await?;

        Ok((into_results(models)?, total))
    }

    async fn count_by_owner(&self, owner_id: Uuid) -> Result<u64, RepositoryError> {
        let count = scrape_result_entity::Entity::find()
            .filter(scrape_result_entity::Column::OwnerId.eq(owner_id))
            .count(self.db.as_ref())
            .await?;

        Ok(count)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = scrape_result_entity::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
