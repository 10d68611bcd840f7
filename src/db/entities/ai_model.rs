// AI 模型实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 模型类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    #[sea_orm(string_value = "chat")]
    Chat,
    #[sea_orm(string_value = "embedding")]
    Embedding,
    #[sea_orm(string_value = "rerank")]
    Rerank,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ai_models")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub provider_id: Uuid,

    /// 展示名称
    #[sea_orm(column_type = "String(Some(64))")]
    pub name: String,

    /// 厂商模型标识，如 `gpt-4o-mini`
    #[sea_orm(column_type = "String(Some(128))")]
    pub model: String,

    pub model_type: ModelType,

    /// 上下文长度
    pub max_context: i32,

    pub is_active: bool,

    /// 同类型中的默认模型
    pub is_default: bool,

    pub sort: i32,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ai_provider::Entity",
        from = "Column::ProviderId",
        to = "super::ai_provider::Column::Id"
    )]
    Provider,
}

impl Related<super::ai_provider::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Provider.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
