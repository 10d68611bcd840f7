// 字典配置实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 字典项，`(group, key)` 唯一
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dicts")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "String(Some(64))")]
    pub group: String,

    #[sea_orm(column_type = "String(Some(128))")]
    pub key: String,

    #[sea_orm(column_type = "Text")]
    pub value: String,

    #[sea_orm(column_type = "String(Some(255))", nullable)]
    pub remark: Option<String>,

    pub sort: i32,

    pub is_enabled: bool,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
