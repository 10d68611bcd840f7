// 模型提供商适配器
// 各提供商均兼容 OpenAI 接口，仅基础地址与密钥不同

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::ai::{AIError, AIErrorCode};

/// 模型提供商类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Hunyuan,
    Ollama,
    SiliconFlow,
    Volcengine,
    Xai,
    Zhipu,
    Custom,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 8] = [
        ProviderKind::OpenAi,
        ProviderKind::Hunyuan,
        ProviderKind::Ollama,
        ProviderKind::SiliconFlow,
        ProviderKind::Volcengine,
        ProviderKind::Xai,
        ProviderKind::Zhipu,
        ProviderKind::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Hunyuan => "hunyuan",
            Self::Ollama => "ollama",
            Self::SiliconFlow => "siliconflow",
            Self::Volcengine => "volcengine",
            Self::Xai => "xai",
            Self::Zhipu => "zhipu",
            Self::Custom => "custom",
        }
    }

    /// 展示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Hunyuan => "腾讯混元",
            Self::Ollama => "Ollama",
            Self::SiliconFlow => "硅基流动",
            Self::Volcengine => "火山引擎",
            Self::Xai => "x.ai",
            Self::Zhipu => "智谱 AI",
            Self::Custom => "自定义",
        }
    }

    /// 默认接口地址，自定义提供商必须显式配置
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("https://api.openai.com/v1"),
            Self::Hunyuan => Some("https://api.hunyuan.cloud.tencent.com/v1"),
            Self::Ollama => Some("http://localhost:11434/v1"),
            Self::SiliconFlow => Some("https://api.siliconflow.cn/v1"),
            Self::Volcengine => Some("https://ark.cn-beijing.volces.com/api/v3"),
            Self::Xai => Some("https://api.x.ai/v1"),
            Self::Zhipu => Some("https://open.bigmodel.cn/api/paas/v4"),
            Self::Custom => None,
        }
    }

    /// 本地部署的提供商不需要 API Key
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama | Self::Custom)
    }

    /// 是否提供 `/rerank` 接口
    pub fn supports_rerank(&self) -> bool {
        matches!(self, Self::SiliconFlow | Self::Custom)
    }
}

impl FromStr for ProviderKind {
    type Err = AIError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AIError::invalid_config(format!("未知的模型提供商: {}", s)))
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 适配器配置
#[derive(Debug, Clone, Default)]
pub struct AdapterConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

/// 对话消息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// 对话补全请求
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// 对话补全结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    pub tokens_used: u32,
    pub finish_reason: String,
}

/// 向量化结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingResponse {
    pub embeddings: Vec<Vec<f32>>,
    pub model: String,
    pub tokens_used: u32,
}

/// 重排序结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RerankResult {
    pub index: usize,
    pub score: f32,
}

/// 模型提供商适配器
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// 提供商类型
    fn kind(&self) -> ProviderKind;

    /// 实际使用的接口地址
    fn base_url(&self) -> &str;

    /// 对话补全
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AIError>;

    /// 文本向量化
    async fn embed(&self, model: &str, inputs: &[String]) -> Result<EmbeddingResponse, AIError>;

    /// 文档重排序
    async fn rerank(
        &self,
        _model: &str,
        _query: &str,
        _documents: &[String],
    ) -> Result<Vec<RerankResult>, AIError> {
        Err(AIError::unsupported(format!(
            "{} 不支持重排序",
            self.kind().display_name()
        )))
    }
}

/// OpenAI 兼容接口适配器
pub struct OpenAiCompatibleAdapter {
    kind: ProviderKind,
    base_url: String,
    http_client: reqwest::Client,
}

impl OpenAiCompatibleAdapter {
    pub fn new(kind: ProviderKind, config: &AdapterConfig) -> Result<Self, AIError> {
        let base_url = config
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .or_else(|| kind.default_base_url())
            .ok_or_else(|| AIError::invalid_config(format!("{} 必须配置接口地址", kind.display_name())))?
            .trim_end_matches('/')
            .to_string();

        url::Url::parse(&base_url).map_err(|e| {
            AIError::with_cause(
                AIErrorCode::InvalidConfig,
                format!("接口地址格式无效: {}", base_url),
                e,
            )
        })?;

        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty());

        if kind.requires_api_key() && api_key.is_none() {
            return Err(AIError::invalid_config(format!(
                "{} 必须配置 API Key",
                kind.display_name()
            )));
        }

        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(key) = api_key {
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| AIError::with_cause(AIErrorCode::InvalidConfig, "无效的 API Key", e))?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let timeout = if config.timeout_secs == 0 { 60 } else { config.timeout_secs };
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .default_headers(headers)
            .build()
            .map_err(|e| AIError::with_cause(AIErrorCode::InvalidConfig, "创建 HTTP 客户端失败", e))?;

        Ok(Self {
            kind,
            base_url,
            http_client,
        })
    }

    pub fn openai(config: &AdapterConfig) -> Result<Self, AIError> {
        Self::new(ProviderKind::OpenAi, config)
    }

    pub fn hunyuan(config: &AdapterConfig) -> Result<Self, AIError> {
        Self::new(ProviderKind::Hunyuan, config)
    }

    pub fn ollama(config: &AdapterConfig) -> Result<Self, AIError> {
        Self::new(ProviderKind::Ollama, config)
    }

    pub fn siliconflow(config: &AdapterConfig) -> Result<Self, AIError> {
        Self::new(ProviderKind::SiliconFlow, config)
    }

    pub fn volcengine(config: &AdapterConfig) -> Result<Self, AIError> {
        Self::new(ProviderKind::Volcengine, config)
    }

    pub fn xai(config: &AdapterConfig) -> Result<Self, AIError> {
        Self::new(ProviderKind::Xai, config)
    }

    pub fn zhipu(config: &AdapterConfig) -> Result<Self, AIError> {
        Self::new(ProviderKind::Zhipu, config)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, AIError> {
        let context = format!("{} 请求失败", self.kind.display_name());
        let response = self
            .http_client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|e| AIError::from_reqwest(&context, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AIError::response(format!(
                "{} 返回错误状态 {}: {}",
                self.kind.display_name(),
                status.as_u16(),
                error_text
            )));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| AIError::from_reqwest("解析响应失败", e))
    }
}

fn parse_vector(value: &serde_json::Value) -> Result<Vec<f32>, AIError> {
    value
        .as_array()
        .ok_or_else(|| AIError::response("嵌入向量格式错误"))?
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| AIError::response("嵌入向量包含非数值元素"))
        })
        .collect()
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatibleAdapter {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    #[instrument(skip(self, request), fields(provider = %self.kind, model = %request.model))]
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AIError> {
        debug!("发送对话补全请求，消息数: {}", request.messages.len());

        let body = serde_json::to_value(request)
            .map_err(|e| AIError::with_cause(AIErrorCode::Request, "序列化请求失败", e))?;
        let json = self.post_json("chat/completions", &body).await?;

        let choice = json["choices"]
            .get(0)
            .ok_or_else(|| AIError::response("响应中缺少 choices"))?;
        let content = choice["message"]["content"]
            .as_str()
            .ok_or_else(|| AIError::response("响应中缺少消息内容"))?
            .to_string();

        Ok(ChatResponse {
            content,
            model: json["model"].as_str().unwrap_or(&request.model).to_string(),
            tokens_used: json["usage"]["total_tokens"].as_u64().unwrap_or(0) as u32,
            finish_reason: choice["finish_reason"].as_str().unwrap_or("stop").to_string(),
        })
    }

    #[instrument(skip(self, inputs), fields(provider = %self.kind, count = inputs.len()))]
    async fn embed(&self, model: &str, inputs: &[String]) -> Result<EmbeddingResponse, AIError> {
        let body = serde_json::json!({
            "model": model,
            "input": inputs,
        });
        let json = self.post_json("embeddings", &body).await?;

        let data = json["data"]
            .as_array()
            .ok_or_else(|| AIError::response("嵌入响应格式错误"))?;
        let embeddings = data
            .iter()
            .map(|item| parse_vector(&item["embedding"]))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EmbeddingResponse {
            embeddings,
            model: json["model"].as_str().unwrap_or(model).to_string(),
            tokens_used: json["usage"]["total_tokens"].as_u64().unwrap_or(0) as u32,
        })
    }

    async fn rerank(
        &self,
        model: &str,
        query: &str,
        documents: &[String],
    ) -> Result<Vec<RerankResult>, AIError> {
        if !self.kind.supports_rerank() {
            return Err(AIError::unsupported(format!(
                "{} 不支持重排序",
                self.kind.display_name()
            )));
        }

        let body = serde_json::json!({
            "model": model,
            "query": query,
            "documents": documents,
        });
        let json = self.post_json("rerank", &body).await?;

        let results = json["results"]
            .as_array()
            .ok_or_else(|| AIError::response("重排序响应格式错误"))?;

        results
            .iter()
            .map(|item| {
                let index = item["index"]
                    .as_u64()
                    .ok_or_else(|| AIError::response("重排序结果缺少 index"))?;
                let score = item["relevance_score"].as_f64().unwrap_or(0.0);
                Ok(RerankResult {
                    index: index as usize,
                    score: score as f32,
                })
            })
            .collect()
    }
}

/// 根据提供商类型构建适配器
pub fn build_adapter(
    kind: ProviderKind,
    config: &AdapterConfig,
) -> Result<Box<dyn ProviderAdapter>, AIError> {
    let adapter = match kind {
        ProviderKind::OpenAi => OpenAiCompatibleAdapter::openai(config)?,
        ProviderKind::Hunyuan => OpenAiCompatibleAdapter::hunyuan(config)?,
        ProviderKind::Ollama => OpenAiCompatibleAdapter::ollama(config)?,
        ProviderKind::SiliconFlow => OpenAiCompatibleAdapter::siliconflow(config)?,
        ProviderKind::Volcengine => OpenAiCompatibleAdapter::volcengine(config)?,
        ProviderKind::Xai => OpenAiCompatibleAdapter::xai(config)?,
        ProviderKind::Zhipu => OpenAiCompatibleAdapter::zhipu(config)?,
        ProviderKind::Custom => OpenAiCompatibleAdapter::new(ProviderKind::Custom, config)?,
    };
    Ok(Box::new(adapter))
}
