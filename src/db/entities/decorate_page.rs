// 页面装修实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "decorate_pages")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// 页面标识，如 `home`
    #[sea_orm(column_type = "String(Some(64))", unique)]
    pub name: String,

    #[sea_orm(column_type = "String(Some(128))")]
    pub title: String,

    /// 页面组件配置
    #[sea_orm(column_type = "Json")]
    pub data: Json,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
