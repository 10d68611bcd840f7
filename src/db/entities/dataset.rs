// 知识库实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 知识库
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "datasets")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// 知识库 ID
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// 知识库名称（同一创建者下唯一）
    #[sea_orm(column_type = "String(Some(128))")]
    pub name: String,

    /// 知识库描述
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// 向量模型
    #[sea_orm(nullable)]
    pub embedding_model_id: Option<Uuid>,

    /// 分段最大字符数
    pub chunk_size: i32,

    /// 分段重叠字符数
    pub chunk_overlap: i32,

    /// 分段分隔符
    #[sea_orm(column_type = "String(Some(32))")]
    pub separator: String,

    /// 文档数量
    pub document_count: i32,

    /// 分段数量
    pub segment_count: i32,

    /// 创建者
    pub created_by: Uuid,

    /// 创建时间
    pub created_at: DateTimeWithTimeZone,

    /// 更新时间
    pub updated_at: DateTimeWithTimeZone,

    /// 删除时间
    #[sea_orm(nullable)]
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// 一对多：知识库 -> 文档
    #[sea_orm(has_many = "super::document::Entity")]
    Documents,
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
