// 自定义提取器
// 当前用户、分页参数和带校验的 JSON 请求体

use actix_web::{dev::Payload, web, FromRequest, HttpMessage, HttpRequest};
use agentdock_common::PaginationParams;
use futures::future::{ready, LocalBoxFuture, Ready};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::ops::Deref;
use uuid::Uuid;

use crate::api::auth::AuthenticatedUser;
use crate::errors::{PlatformError, PlatformResult};

/// 当前登录用户
///
/// 仅在 Bearer 校验器之后可用，未认证时返回 401。
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthenticatedUser);

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.0.user_id
    }

    /// 校验权限，超级管理员直接通过
    pub fn require_permission(&self, code: &str) -> PlatformResult<()> {
        if self.0.has_permission(code) {
            Ok(())
        } else {
            Err(PlatformError::forbidden(code))
        }
    }
}

impl Deref for AuthUser {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result: Result<Self, Self::Error> = req
            .extensions()
            .get::<AuthenticatedUser>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| PlatformError::unauthorized().into());
        ready(result)
    }
}

/// 分页参数提取器，读取 `page` / `pageSize` 并修正越界值
#[derive(Debug, Clone, Copy)]
pub struct Pagination(pub PaginationParams);

impl Deref for Pagination {
    type Target = PaginationParams;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for Pagination {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result: Result<Self, Self::Error> = serde_urlencoded::from_str::<PaginationParams>(req.query_string())
            .map(|params| Pagination(params.normalized()))
            .map_err(|e| PlatformError::validation("page", format!("分页参数无效: {}", e)).into());
        ready(result)
    }
}

/// 请求体校验
pub trait Validate {
    fn validate(&self) -> PlatformResult<()>;
}

/// 反序列化后执行 [`Validate`] 的 JSON 提取器
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> FromRequest for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
{
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let json = web::Json::<T>::from_request(req, payload);
        Box::pin(async move {
            let value = json.await?.into_inner();
            value.validate()?;
            Ok(ValidatedJson(value))
        })
    }
}

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("邮箱正则无效")
});

/// 字段校验函数
pub mod rules {
    use super::*;

    /// 字符数在 `min..=max` 之间（首尾空白不计）
    pub fn length(field: &str, value: &str, min: usize, max: usize) -> PlatformResult<()> {
        let count = value.trim().chars().count();
        if count < min || count > max {
            return Err(PlatformError::validation(
                field,
                format!("{} 长度必须在 {} 到 {} 个字符之间", field, min, max),
            ));
        }
        Ok(())
    }

    /// 可选字段，存在时检查最大长度
    pub fn max_length(field: &str, value: Option<&str>, max: usize) -> PlatformResult<()> {
        match value {
            Some(v) if v.chars().count() > max => Err(PlatformError::validation(
                field,
                format!("{} 不能超过 {} 个字符", field, max),
            )),
            _ => Ok(()),
        }
    }

    pub fn not_blank(field: &str, value: &str) -> PlatformResult<()> {
        if value.trim().is_empty() {
            return Err(PlatformError::validation(field, format!("{} 不能为空", field)));
        }
        Ok(())
    }

    pub fn email(field: &str, value: Option<&str>) -> PlatformResult<()> {
        match value {
            Some(v) if !v.is_empty() && !EMAIL_RE.is_match(v) => {
                Err(PlatformError::validation(field, "邮箱格式不正确"))
            }
            _ => Ok(()),
        }
    }

    pub fn range<N>(field: &str, value: N, min: N, max: N) -> PlatformResult<()>
    where
        N: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            return Err(PlatformError::validation(
                field,
                format!("{} 必须在 {} 到 {} 之间", field, min, max),
            ));
        }
        Ok(())
    }

    pub fn pattern(field: &str, value: &str, re: &Regex, hint: &str) -> PlatformResult<()> {
        if !re.is_match(value) {
            return Err(PlatformError::validation(field, hint));
        }
        Ok(())
    }

    pub fn url(field: &str, value: Option<&str>) -> PlatformResult<()> {
        match value {
            Some(v) if !v.is_empty() && url::Url::parse(v).is_err() => {
                Err(PlatformError::validation(field, format!("{} 不是有效的 URL", field)))
            }
            _ => Ok(()),
        }
    }
}
