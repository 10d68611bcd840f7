// 菜单实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 菜单类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "lowercase")]
pub enum MenuType {
    #[sea_orm(string_value = "directory")]
    Directory,
    #[sea_orm(string_value = "menu")]
    Menu,
    #[sea_orm(string_value = "button")]
    Button,
}

/// 控制台菜单
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "menus")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// 上级菜单，顶级菜单为空
    #[sea_orm(nullable)]
    pub parent_id: Option<Uuid>,

    #[sea_orm(column_type = "String(Some(64))")]
    pub name: String,

    #[sea_orm(column_type = "String(Some(255))", nullable)]
    pub path: Option<String>,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub icon: Option<String>,

    #[sea_orm(column_type = "String(Some(255))", nullable)]
    pub component: Option<String>,

    /// 访问菜单所需的权限代码
    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub permission_code: Option<String>,

    pub menu_type: MenuType,

    pub sort: i32,

    pub is_visible: bool,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
