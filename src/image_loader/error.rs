//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 图片加载链路只有三类失败：
//! - `ValidationError`：输入配置本身不合法，在任何 I/O 之前即可判定
//! - `SourceError`：读取 / 下载 / 解码阶段的 I/O 失败
//! - `NormalizationError`：流水线没有拿到任何可用帧
//!
//! 三者通过 `LoadError` 汇总，调用侧可按分支匹配，也可以直接取人类可读文案。
//! 帧尺寸不一致被丢弃、多帧被折叠为单帧属于数据策略，不在这里建模。

/// 输入校验错误。
///
/// `Display` 文案即为返回给宿主的拒绝原因。
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("请输入图片 URL")]
    EmptyUrl,

    #[error("URL 必须以 http:// 或 https:// 开头：{0}")]
    UnsupportedScheme(String),

    #[error("无效的图片文件：{0}")]
    MissingFile(String),

    #[error("未知来源模式：{0}（可选：file / url）")]
    UnknownMode(String),
}

/// 读取、下载与解码阶段的错误。
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("URL 格式错误：{0}")]
    InvalidUrl(String),

    #[error("网络错误：{0}")]
    Network(String),

    #[error("HTTP {}：{}", .0, status_message(*.0))]
    HttpStatus(u16),

    #[error("解码错误：{0}")]
    DecodeFailed(String),

    #[error("文件错误：{0}")]
    Io(String),

    #[error("文件名超出受管目录范围：{0}")]
    OutsideNamespace(String),
}

impl SourceError {
    /// 非 2xx 响应时携带的状态码。
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus(code) => Some(*code),
            _ => None,
        }
    }
}

/// 归一化阶段错误。
#[derive(Debug, thiserror::Error)]
pub enum NormalizationError {
    #[error("没有可用的图片帧")]
    Empty,

    #[error("批次拼接失败：{0}")]
    Batch(String),
}

/// 单次加载调用的汇总错误类型。
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),
}

impl LoadError {
    /// 稳定的错误分类码，供宿主侧按类别展示。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Source(_) => "source",
            Self::Normalization(_) => "normalization",
        }
    }
}

impl From<ValidationError> for String {
    /// 兼容宿主“返回原因字符串”的校验约定。
    fn from(error: ValidationError) -> Self {
        error.to_string()
    }
}

/// 常见 HTTP 状态码文案。
fn status_message(code: u16) -> &'static str {
    match code {
        404 => "未找到",
        403 => "访问被拒绝",
        500..=599 => "服务器错误",
        _ => "请求失败",
    }
}
