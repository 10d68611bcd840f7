// 表结构同步
// 根据实体定义创建缺失的表和索引

use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Schema};
use tracing::{debug, info, instrument};

use crate::db::entities::{dict, prelude::*, tag};

/// 表结构同步器
pub struct SchemaSynchronizer;

impl SchemaSynchronizer {
    /// 创建全部表，按外键依赖顺序执行
    #[instrument(skip(db))]
    pub async fn sync(db: &DatabaseConnection) -> Result<(), DbErr> {
        info!("同步数据库表结构");

        Self::create_table(db, User).await?;
        Self::create_table(db, Role).await?;
        Self::create_table(db, Permission).await?;
        Self::create_table(db, UserRole).await?;
        Self::create_table(db, RolePermission).await?;
        Self::create_table(db, Menu).await?;
        Self::create_table(db, AiProvider).await?;
        Self::create_table(db, AiModel).await?;
        Self::create_table(db, Dataset).await?;
        Self::create_table(db, Document).await?;
        Self::create_table(db, Segment).await?;
        Self::create_table(db, Agent).await?;
        Self::create_table(db, Conversation).await?;
        Self::create_table(db, Message).await?;
        Self::create_table(db, RechargeRule).await?;
        Self::create_table(db, Order).await?;
        Self::create_table(db, AccountLog).await?;
        Self::create_table(db, Dict).await?;
        Self::create_table(db, DecoratePage).await?;
        Self::create_table(db, Tag).await?;
        Self::create_table(db, Extension).await?;
        Self::create_table(db, File).await?;

        Self::create_index(
            db,
            Index::create()
                .name("uk_dicts_group_key")
                .table(Dict)
                .col(dict::Column::Group)
                .col(dict::Column::Key)
                .unique()
                .if_not_exists()
                .to_owned(),
        )
        .await?;

        Self::create_index(
            db,
            Index::create()
                .name("uk_tags_name_type")
                .table(Tag)
                .col(tag::Column::Name)
                .col(tag::Column::TagType)
                .unique()
                .if_not_exists()
                .to_owned(),
        )
        .await?;

        info!("数据库表结构同步完成");
        Ok(())
    }

    async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr>
    where
        E: EntityTrait,
    {
        debug!(table = %entity.table_name(), "创建数据表");

        let backend = db.get_database_backend();
        let schema = Schema::new(backend);
        let mut stmt = schema.create_table_from_entity(entity);
        stmt.if_not_exists();
        db.execute(backend.build(&stmt)).await?;
        Ok(())
    }

    async fn create_index(db: &DatabaseConnection, stmt: IndexCreateStatement) -> Result<(), DbErr> {
        let backend = db.get_database_backend();
        db.execute(backend.build(&stmt)).await?;
        Ok(())
    }
}
