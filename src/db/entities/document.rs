// 文档实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 文档来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "lowercase")]
pub enum DocumentSource {
    #[sea_orm(string_value = "text")]
    Text,
    #[sea_orm(string_value = "file")]
    File,
}

/// 文档处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub dataset_id: Uuid,

    #[sea_orm(column_type = "String(Some(255))")]
    pub name: String,

    pub source: DocumentSource,

    /// 来源为文件时的上传记录
    #[sea_orm(nullable)]
    pub file_id: Option<Uuid>,

    /// 原文字符数
    pub char_count: i32,

    pub status: DocumentStatus,

    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,

    pub segment_count: i32,

    pub enabled: bool,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dataset::Entity",
        from = "Column::DatasetId",
        to = "super::dataset::Column::Id"
    )]
    Dataset,
    #[sea_orm(has_many = "super::segment::Entity")]
    Segments,
}

impl Related<super::dataset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dataset.def()
    }
}

impl Related<super::segment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Segments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
