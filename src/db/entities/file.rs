// 上传文件实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "files")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "String(Some(255))")]
    pub original_name: String,

    /// 相对存储根目录的路径，如 `20240101/xxx.png`
    #[sea_orm(column_type = "String(Some(500))")]
    #[serde(skip_serializing)]
    pub storage_path: String,

    /// 公开访问地址
    #[sea_orm(column_type = "String(Some(500))")]
    pub url: String,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub mime_type: Option<String>,

    pub size: i64,

    #[sea_orm(column_type = "String(Some(16))")]
    pub extension: String,

    #[sea_orm(nullable)]
    pub uploaded_by: Option<Uuid>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
