//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，宿主侧的所有入口（注册、schema、指纹、
//! 校验、执行）统一返回 `Result<T, AppError>`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `LoadError` 及其三个分支提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，满足宿主 IPC 要求。

use serde::Serialize;

use crate::image_loader::{LoadError, NormalizationError, SourceError, ValidationError};

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 图片加载链路错误（校验 / 读取下载解码 / 归一化）
    #[error("{0}")]
    Load(#[from] LoadError),

    /// 操作注册表不可用或操作不存在
    #[error("操作注册表错误: {0}")]
    Registry(String),
}

impl AppError {
    /// 稳定的错误分类码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Load(err) => err.code(),
            Self::Registry(_) => "registry",
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(error: ValidationError) -> Self {
        Self::Load(error.into())
    }
}

impl From<SourceError> for AppError {
    fn from(error: SourceError) -> Self {
        Self::Load(error.into())
    }
}

impl From<NormalizationError> for AppError {
    fn from(error: NormalizationError) -> Self {
        Self::Load(error.into())
    }
}

/// 宿主 IPC 要求返回值实现 `Serialize`。
/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
