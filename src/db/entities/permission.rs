// 权限实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 权限点，由控制台路由声明并在启动时同步
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "permissions")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// 权限代码，如 `console:user:list`
    #[sea_orm(column_type = "String(Some(128))", unique)]
    pub code: String,

    #[sea_orm(column_type = "String(Some(128))")]
    pub name: String,

    /// 所属分组
    #[sea_orm(column_type = "String(Some(64))")]
    pub group_name: String,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
