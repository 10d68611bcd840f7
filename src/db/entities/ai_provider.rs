// AI 模型提供商实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 模型提供商
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ai_providers")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// 提供商标识，对应 `ProviderKind`
    #[sea_orm(column_type = "String(Some(32))")]
    pub provider: String,

    #[sea_orm(column_type = "String(Some(64))")]
    pub name: String,

    /// 覆盖默认接口地址
    #[sea_orm(column_type = "String(Some(500))", nullable)]
    pub base_url: Option<String>,

    #[sea_orm(column_type = "String(Some(500))", nullable)]
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    pub is_active: bool,

    pub sort: i32,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ai_model::Entity")]
    Models,
}

impl Related<super::ai_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Models.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
