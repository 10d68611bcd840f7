// 菜单服务
// 平铺 CRUD，以及按排序构建的菜单树

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::api::auth::AuthenticatedUser;
use crate::api::extractors::{rules, Validate};
use crate::db::entities::{menu, menu::MenuType, prelude::*};
use crate::errors::{PlatformError, PlatformResult};

/// 创建或更新菜单
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuRequest {
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub path: Option<String>,
    pub icon: Option<String>,
    pub component: Option<String>,
    pub permission_code: Option<String>,
    pub menu_type: MenuType,
    #[serde(default)]
    pub sort: i32,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

fn default_visible() -> bool {
    true
}

impl Validate for MenuRequest {
    fn validate(&self) -> PlatformResult<()> {
        rules::length("name", &self.name, 1, 64)?;
        rules::max_length("path", self.path.as_deref(), 255)?;
        rules::max_length("permissionCode", self.permission_code.as_deref(), 128)?;
        Ok(())
    }
}

/// 菜单树节点
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuNode {
    #[serde(flatten)]
    pub menu: menu::Model,
    pub children: Vec<MenuNode>,
}

/// 由平铺列表构建菜单树，同级按 `sort` 再按 id 排序
///
/// 父节点不在列表中的菜单作为根节点。
pub fn build_tree(mut menus: Vec<menu::Model>) -> Vec<MenuNode> {
    menus.sort_by(|a, b| a.sort.cmp(&b.sort).then(a.id.cmp(&b.id)));

    let ids: Vec<Uuid> = menus.iter().map(|m| m.id).collect();
    let mut children: HashMap<Option<Uuid>, Vec<menu::Model>> = HashMap::new();
    for menu in menus {
        let parent = menu.parent_id.filter(|p| ids.contains(p));
        children.entry(parent).or_default().push(menu);
    }

    fn attach(
        parent: Option<Uuid>,
        children: &mut HashMap<Option<Uuid>, Vec<menu::Model>>,
    ) -> Vec<MenuNode> {
        let Some(level) = children.remove(&parent) else {
            return Vec::new();
        };
        level
            .into_iter()
            .map(|menu| {
                let id = menu.id;
                MenuNode {
                    menu,
                    children: attach(Some(id), children),
                }
            })
            .collect()
    }

    attach(None, &mut children)
}

/// 菜单服务
pub struct MenuService {
    db: DatabaseConnection,
}

impl MenuService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> PlatformResult<Vec<menu::Model>> {
        let menus = Menu::find()
            .order_by_asc(menu::Column::Sort)
            .order_by_asc(menu::Column::Id)
            .all(&self.db)
            .await?;
        Ok(menus)
    }

    pub async fn tree(&self) -> PlatformResult<Vec<MenuNode>> {
        Ok(build_tree(self.list().await?))
    }

    /// 当前用户可见的菜单树
    ///
    /// 没有权限代码的目录在拥有可见子菜单时保留，超级管理员看到全部。
    pub async fn user_tree(&self, user: &AuthenticatedUser) -> PlatformResult<Vec<MenuNode>> {
        let tree = self.tree().await?;
        if user.is_root {
            return Ok(tree);
        }
        Ok(filter_tree(tree, user))
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(&self, request: MenuRequest) -> PlatformResult<menu::Model> {
        if let Some(parent_id) = request.parent_id {
            self.get(parent_id).await?;
        }

        let now = Utc::now();
        let menu = menu::ActiveModel {
            id: Set(Uuid::new_v4()),
            parent_id: Set(request.parent_id),
            name: Set(request.name.trim().to_string()),
            path: Set(request.path),
            icon: Set(request.icon),
            component: Set(request.component),
            permission_code: Set(request.permission_code.filter(|c| !c.is_empty())),
            menu_type: Set(request.menu_type),
            sort: Set(request.sort),
            is_visible: Set(request.is_visible),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?;

        info!(menu_id = %menu.id, "菜单已创建");
        Ok(menu)
    }

    #[instrument(skip(self, request))]
    pub async fn update(&self, id: Uuid, request: MenuRequest) -> PlatformResult<menu::Model> {
        let menu = self.get(id).await?;
        if let Some(parent_id) = request.parent_id {
            if parent_id == id {
                return Err(PlatformError::validation("parentId", "上级菜单不能是自身"));
            }
            self.get(parent_id).await?;
        }

        let mut active: menu::ActiveModel = menu.into();
        active.parent_id = Set(request.parent_id);
        active.name = Set(request.name.trim().to_string());
        active.path = Set(request.path);
        active.icon = Set(request.icon);
        active.component = Set(request.component);
        active.permission_code = Set(request.permission_code.filter(|c| !c.is_empty()));
        active.menu_type = Set(request.menu_type);
        active.sort = Set(request.sort);
        active.is_visible = Set(request.is_visible);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// 存在子菜单时拒绝删除
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> PlatformResult<()> {
        let menu = self.get(id).await?;
        let children = Menu::find()
            .filter(menu::Column::ParentId.eq(id))
            .count(&self.db)
            .await?;
        if children > 0 {
            return Err(PlatformError::business("请先删除子菜单"));
        }

        menu.delete(&self.db).await?;
        info!(menu_id = %id, "菜单已删除");
        Ok(())
    }

    async fn get(&self, id: Uuid) -> PlatformResult<menu::Model> {
        Menu::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| PlatformError::not_found(format!("菜单 {}", id)))
    }
}

fn filter_tree(nodes: Vec<MenuNode>, user: &AuthenticatedUser) -> Vec<MenuNode> {
    nodes
        .into_iter()
        .filter_map(|node| {
            let children = filter_tree(node.children, user);
            let allowed = match node.menu.permission_code.as_deref() {
                Some(code) => user.has_permission(code),
                None => node.menu.menu_type != MenuType::Directory || !children.is_empty(),
            };
            allowed.then_some(MenuNode {
                menu: node.menu,
                children,
            })
        })
        .collect()
}
