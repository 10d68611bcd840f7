// JWT 认证
// 令牌签发与校验，以及控制台 / Web 端共用的 Bearer 校验器

use actix_web::{dev::ServiceRequest, web, Error, HttpMessage};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::config::SecurityConfig;
use crate::db::entities::user;
use crate::db::{PermissionRepository, UserRepository};
use crate::errors::{PlatformError, PlatformResult};

/// JWT 声明结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// 用户 ID
    pub sub: String,
    pub username: String,
    pub is_root: bool,
    /// 签发时的权限代码
    pub permissions: Vec<String>,
    /// 签发时间
    pub iat: i64,
    /// 过期时间
    pub exp: i64,
    /// 签发者
    pub iss: String,
}

/// 已认证用户
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub username: String,
    pub is_root: bool,
    pub permissions: Vec<String>,
    pub authenticated_at: DateTime<Utc>,
}

impl AuthenticatedUser {
    /// 超级管理员拥有全部权限
    pub fn has_permission(&self, code: &str) -> bool {
        self.is_root || self.permissions.iter().any(|p| p == code)
    }
}

/// 签发的令牌
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    /// 有效期（秒）
    pub expires_in: u64,
}

/// JWT 工具
pub struct JwtUtils;

impl JwtUtils {
    /// 为用户签发访问令牌
    pub fn generate_token(
        user: &user::Model,
        permissions: Vec<String>,
        config: &SecurityConfig,
    ) -> PlatformResult<IssuedToken> {
        let now = Utc::now();
        let expires_in = config.jwt_expiration;
        let exp = now + Duration::seconds(expires_in as i64);

        let claims = JwtClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            is_root: user.is_root,
            permissions,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: config.jwt_issuer.clone(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )?;

        Ok(IssuedToken { token, expires_in })
    }

    /// 校验令牌签名、过期时间和签发者
    pub fn verify_token(token: &str, config: &SecurityConfig) -> PlatformResult<JwtClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.jwt_issuer.as_str()]);

        let data = decode::<JwtClaims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &validation,
        )?;
        Ok(data.claims)
    }
}

/// 由令牌解析当前用户
///
/// 用户必须仍然存在且处于启用状态，权限以数据库为准重新加载，
/// 角色变更无需重新登录即可生效。
pub async fn authenticate(state: &AppState, token: &str) -> PlatformResult<AuthenticatedUser> {
    let claims = JwtUtils::verify_token(token, &state.config.security)?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| PlatformError::authentication("无效的访问令牌"))?;

    let user = UserRepository::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| PlatformError::authentication("用户不存在或已被删除"))?;

    if !user.is_active() {
        return Err(PlatformError::authentication("账号已被禁用"));
    }

    let permissions = if user.is_root {
        Vec::new()
    } else {
        PermissionRepository::codes_for_user(&state.db, user.id).await?
    };

    Ok(AuthenticatedUser {
        user_id: user.id,
        username: user.username,
        is_root: user.is_root,
        permissions,
        authenticated_at: Utc::now(),
    })
}

/// `HttpAuthentication::bearer` 使用的校验器
pub async fn jwt_validator(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
        return Err((PlatformError::internal("应用状态未初始化").into(), req));
    };

    match authenticate(&state, credentials.token()).await {
        Ok(user) => {
            debug!(user_id = %user.user_id, path = %req.path(), "请求认证通过");
            req.extensions_mut().insert(user);
            Ok(req)
        }
        Err(err) => {
            warn!(path = %req.path(), error = %err, "令牌校验失败");
            Err((err.into(), req))
        }
    }
}
