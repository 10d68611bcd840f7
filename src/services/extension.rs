// 扩展管理服务
// 只维护扩展的安装记录和启用状态，不负责加载扩展代码

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::api::extractors::{rules, Validate};
use crate::db::entities::{
    extension,
    extension::{ExtensionStatus, ExtensionType},
    prelude::*,
};
use crate::errors::{PlatformError, PlatformResult};

/// 语义化版本号，如 `1.2.0`、`2.0.0-beta.1`
static SEMVER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?(?:\+[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?$",
    )
    .expect("版本号正则无效")
});

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_-]*(\.[a-z0-9_-]+)*$").expect("扩展标识正则无效"));

/// 扩展市场中的条目
#[derive(Debug, Clone, Copy)]
pub struct MarketplaceItem {
    pub identifier: &'static str,
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub author: &'static str,
    pub extension_type: ExtensionType,
}

/// 内置扩展市场目录
pub const MARKETPLACE: &[MarketplaceItem] = &[
    MarketplaceItem {
        identifier: "agentdock.web-search",
        name: "联网搜索",
        version: "1.0.0",
        description: "为智能体提供实时网络搜索能力",
        author: "agentdock",
        extension_type: ExtensionType::Functional,
    },
    MarketplaceItem {
        identifier: "agentdock.image-gen",
        name: "AI 绘画",
        version: "1.1.0",
        description: "文生图应用",
        author: "agentdock",
        extension_type: ExtensionType::Application,
    },
    MarketplaceItem {
        identifier: "agentdock.wechat-bot",
        name: "公众号机器人",
        version: "0.9.2",
        description: "把智能体接入微信公众号",
        author: "agentdock",
        extension_type: ExtensionType::Application,
    },
    MarketplaceItem {
        identifier: "agentdock.sensitive-filter",
        name: "敏感词过滤",
        version: "1.0.3",
        description: "对话内容敏感词检测",
        author: "agentdock",
        extension_type: ExtensionType::Functional,
    },
];

/// 市场列表项，附带本地安装情况
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceEntry {
    pub identifier: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub extension_type: ExtensionType,
    pub installed: bool,
    pub installed_version: Option<String>,
    pub has_update: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionQuery {
    pub keyword: Option<String>,
    pub extension_type: Option<ExtensionType>,
    pub status: Option<ExtensionStatus>,
}

/// 安装扩展
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallExtensionRequest {
    pub identifier: String,
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub icon: Option<String>,
    pub extension_type: ExtensionType,
    #[serde(default)]
    pub is_local: bool,
}

impl Validate for InstallExtensionRequest {
    fn validate(&self) -> PlatformResult<()> {
        rules::length("identifier", &self.identifier, 2, 128)?;
        rules::pattern(
            "identifier",
            &self.identifier,
            &IDENTIFIER_RE,
            "只能包含小写字母、数字、下划线、短横线和点",
        )?;
        rules::length("name", &self.name, 1, 128)?;
        validate_version(&self.version)?;
        rules::max_length("description", self.description.as_deref(), 2000)?;
        rules::max_length("author", self.author.as_deref(), 128)?;
        rules::max_length("icon", self.icon.as_deref(), 500)?;
        Ok(())
    }
}

/// 更新扩展信息，未提供的字段保持不变
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExtensionRequest {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub icon: Option<String>,
}

impl Validate for UpdateExtensionRequest {
    fn validate(&self) -> PlatformResult<()> {
        if let Some(name) = &self.name {
            rules::length("name", name, 1, 128)?;
        }
        if let Some(version) = &self.version {
            validate_version(version)?;
        }
        rules::max_length("description", self.description.as_deref(), 2000)?;
        rules::max_length("author", self.author.as_deref(), 128)?;
        rules::max_length("icon", self.icon.as_deref(), 500)?;
        Ok(())
    }
}

pub fn validate_version(version: &str) -> PlatformResult<()> {
    rules::pattern("version", version, &SEMVER_RE, "版本号需符合语义化版本格式，如 1.0.0")
}

/// 扩展服务
pub struct ExtensionService {
    db: DatabaseConnection,
}

impl ExtensionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// 扩展市场，标记已安装的条目和可升级的版本
    pub async fn marketplace(&self) -> PlatformResult<Vec<MarketplaceEntry>> {
        let installed: HashMap<String, String> = Extension::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|ext| (ext.identifier, ext.version))
            .collect();

        Ok(MARKETPLACE
            .iter()
            .map(|item| {
                let installed_version = installed.get(item.identifier).cloned();
                MarketplaceEntry {
                    identifier: item.identifier.to_string(),
                    name: item.name.to_string(),
                    version: item.version.to_string(),
                    description: item.description.to_string(),
                    author: item.author.to_string(),
                    extension_type: item.extension_type,
                    installed: installed_version.is_some(),
                    has_update: installed_version
                        .as_deref()
                        .is_some_and(|v| v != item.version),
                    installed_version,
                }
            })
            .collect())
    }

    pub async fn list(&self, query: ExtensionQuery) -> PlatformResult<Vec<extension::Model>> {
        let mut select = Extension::find();
        if let Some(keyword) = query.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(extension::Column::Name.contains(keyword))
                    .add(extension::Column::Identifier.contains(keyword)),
            );
        }
        if let Some(extension_type) = query.extension_type {
            select = select.filter(extension::Column::ExtensionType.eq(extension_type));
        }
        if let Some(status) = query.status {
            select = select.filter(extension::Column::Status.eq(status));
        }
        Ok(select
            .order_by_desc(extension::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// 安装扩展，安装后默认停用
    #[instrument(skip(self, request), fields(identifier = %request.identifier))]
    pub async fn install(&self, request: InstallExtensionRequest) -> PlatformResult<extension::Model> {
        let identifier = request.identifier.trim().to_string();
        let exists = Extension::find()
            .filter(extension::Column::Identifier.eq(identifier.as_str()))
            .one(&self.db)
            .await?;
        if exists.is_some() {
            return Err(PlatformError::conflict(format!("扩展 {} 已安装", identifier)));
        }

        let now = Utc::now();
        let ext = extension::ActiveModel {
            id: Set(Uuid::new_v4()),
            identifier: Set(identifier),
            name: Set(request.name.trim().to_string()),
            version: Set(request.version),
            description: Set(request.description),
            author: Set(request.author),
            icon: Set(request.icon),
            extension_type: Set(request.extension_type),
            status: Set(ExtensionStatus::Disabled),
            is_local: Set(request.is_local),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?;

        info!(extension_id = %ext.id, version = %ext.version, "扩展已安装");
        Ok(ext)
    }

    #[instrument(skip(self, request))]
    pub async fn update(&self, id: Uuid, request: UpdateExtensionRequest) -> PlatformResult<extension::Model> {
        let ext = self.get(id).await?;
        let mut active: extension::ActiveModel = ext.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(version) = request.version {
            active.version = Set(version);
        }
        if request.description.is_some() {
            active.description = Set(request.description);
        }
        if request.author.is_some() {
            active.author = Set(request.author);
        }
        if request.icon.is_some() {
            active.icon = Set(request.icon);
        }
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn set_enabled(&self, id: Uuid, enabled: bool) -> PlatformResult<extension::Model> {
        let ext = self.get(id).await?;
        let mut active: extension::ActiveModel = ext.into();
        active.status = Set(if enabled {
            ExtensionStatus::Enabled
        } else {
            ExtensionStatus::Disabled
        });
        active.updated_at = Set(Utc::now().into());
        let ext = active.update(&self.db).await?;
        info!(identifier = %ext.identifier, enabled, "扩展状态已变更");
        Ok(ext)
    }

    #[instrument(skip(self))]
    pub async fn uninstall(&self, id: Uuid) -> PlatformResult<()> {
        let ext = self.get(id).await?;
        let identifier = ext.identifier.clone();
        ext.delete(&self.db).await?;
        info!(identifier = %identifier, "扩展已卸载");
        Ok(())
    }

    async fn get(&self, id: Uuid) -> PlatformResult<extension::Model> {
        Extension::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| PlatformError::not_found(format!("扩展 {}", id)))
    }
}
