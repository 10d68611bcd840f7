// 智能体实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 智能体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "agents")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "String(Some(128))")]
    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(column_type = "String(Some(500))", nullable)]
    pub avatar: Option<String>,

    /// 角色设定提示词
    #[sea_orm(column_type = "Text", nullable)]
    pub role_prompt: Option<String>,

    /// 开场白
    #[sea_orm(column_type = "Text", nullable)]
    pub opening_statement: Option<String>,

    /// 对话模型
    #[sea_orm(nullable)]
    pub model_id: Option<Uuid>,

    /// 关联知识库 ID 列表
    #[sea_orm(column_type = "Json")]
    pub dataset_ids: Json,

    /// 标签 ID 列表
    #[sea_orm(column_type = "Json")]
    pub tag_ids: Json,

    /// 是否已发布到广场
    pub is_public: bool,

    pub created_by: Uuid,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 解析关联知识库 ID
    pub fn dataset_id_list(&self) -> Vec<Uuid> {
        serde_json::from_value(self.dataset_ids.clone()).unwrap_or_default()
    }

    /// 解析标签 ID
    pub fn tag_id_list(&self) -> Vec<Uuid> {
        serde_json::from_value(self.tag_ids.clone()).unwrap_or_default()
    }
}
