// 文本分块
// 按分隔符切分文本，再合并到目标长度并保留尾部重叠

use serde::{Deserialize, Serialize};
use tracing::debug;

/// 默认分隔符
pub const DEFAULT_SEPARATOR: &str = "\n\n";

/// 分块配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChunkerConfig {
    /// 单个分段的最大字符数
    pub chunk_size: usize,
    /// 相邻分段的重叠字符数
    pub chunk_overlap: usize,
    /// 分隔符，支持 `\n` 转义写法
    pub separator: String,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

/// 文本分块器
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separator: String,
}

impl TextChunker {
    pub fn new(config: &ChunkerConfig) -> Self {
        let chunk_size = config.chunk_size.max(1);
        let separator = match Self::unescape(&config.separator) {
            s if s.is_empty() => DEFAULT_SEPARATOR.to_string(),
            s => s,
        };

        Self {
            chunk_size,
            // 重叠必须小于分段长度，否则硬切分无法前进
            chunk_overlap: config.chunk_overlap.min(chunk_size - 1),
            separator,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// 切分文本
    pub fn split(&self, text: &str) -> Vec<String> {
        let normalized = text.replace("\r\n", "\n");
        let separator_len = self.separator.chars().count();

        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for piece in normalized
            .split(self.separator.as_str())
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
        {
            let piece_len = piece.chars().count();

            if piece_len > self.chunk_size {
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                chunks.extend(self.hard_split(piece));
                continue;
            }

            if current.is_empty() {
                current.push_str(piece);
                current_len = piece_len;
                continue;
            }

            if current_len + separator_len + piece_len <= self.chunk_size {
                current.push_str(&self.separator);
                current.push_str(piece);
                current_len += separator_len + piece_len;
                continue;
            }

            let tail = Self::tail(&current, self.chunk_overlap);
            chunks.push(std::mem::take(&mut current));

            let tail_len = tail.chars().count();
            if tail_len > 0 && tail_len + piece_len <= self.chunk_size {
                current.push_str(&tail);
                current_len = tail_len;
            } else {
                current_len = 0;
            }
            current.push_str(piece);
            current_len += piece_len;
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        debug!(
            "文本分块完成: {} 字符 -> {} 个分段",
            normalized.chars().count(),
            chunks.len()
        );
        chunks
    }

    /// 超长片段按固定窗口切分，窗口之间保留重叠
    fn hard_split(&self, piece: &str) -> Vec<String> {
        let chars: Vec<char> = piece.chars().collect();
        let step = self.chunk_size - self.chunk_overlap;
        let mut result = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(chars.len());
            result.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }

        result
    }

    fn tail(text: &str, count: usize) -> String {
        if count == 0 {
            return String::new();
        }
        let total = text.chars().count();
        text.chars().skip(total.saturating_sub(count)).collect()
    }

    /// 把 `\n`、`\t` 等转义写法还原为实际字符
    fn unescape(separator: &str) -> String {
        separator
            .replace("\\r\\n", "\n")
            .replace("\\n", "\n")
            .replace("\\t", "\t")
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(&ChunkerConfig::default())
    }
}
