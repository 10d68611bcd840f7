// 扩展插件实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 扩展类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "lowercase")]
pub enum ExtensionType {
    #[sea_orm(string_value = "application")]
    Application,
    #[sea_orm(string_value = "functional")]
    Functional,
}

/// 扩展状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "lowercase")]
pub enum ExtensionStatus {
    #[sea_orm(string_value = "enabled")]
    Enabled,
    #[sea_orm(string_value = "disabled")]
    Disabled,
}

/// 已安装的扩展
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "extensions")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// 扩展唯一标识
    #[sea_orm(column_type = "String(Some(128))", unique)]
    pub identifier: String,

    #[sea_orm(column_type = "String(Some(128))")]
    pub name: String,

    /// 语义化版本号
    #[sea_orm(column_type = "String(Some(32))")]
    pub version: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub author: Option<String>,

    #[sea_orm(column_type = "String(Some(500))", nullable)]
    pub icon: Option<String>,

    pub extension_type: ExtensionType,

    pub status: ExtensionStatus,

    /// 本地开发的扩展
    pub is_local: bool,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
