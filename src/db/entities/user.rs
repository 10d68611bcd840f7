// 用户实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 用户状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "disabled")]
    Disabled,
}

/// 用户实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// 用户 ID
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// 用户名（全局唯一）
    #[sea_orm(column_type = "String(Some(64))", unique)]
    pub username: String,

    /// 密码哈希
    #[sea_orm(column_type = "String(Some(255))")]
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// 昵称
    #[sea_orm(column_type = "String(Some(64))")]
    pub nickname: String,

    #[sea_orm(column_type = "String(Some(255))", nullable)]
    pub email: Option<String>,

    #[sea_orm(column_type = "String(Some(500))", nullable)]
    pub avatar: Option<String>,

    /// 超级管理员拥有全部权限，不可删除或禁用
    pub is_root: bool,

    pub status: UserStatus,

    /// 算力余额
    pub power: i64,

    #[sea_orm(nullable)]
    pub last_login_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,

    /// 软删除时间
    #[sea_orm(nullable)]
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 是否可以登录
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active && self.deleted_at.is_none()
    }
}
