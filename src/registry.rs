//! # 操作注册表
//!
//! ## 设计思路
//!
//! 宿主通过“操作名 → 操作实现”的表发现可调用的操作。每个操作声明
//! 输入 / 输出 schema，并提供指纹、校验、执行三个入口。
//! 注册表是进程内唯一的全局状态，启动时写入，之后只读。
//!
//! ## 实现思路
//!
//! - `OPERATIONS` 使用 `Lazy<RwLock<BTreeMap<..>>>`，按名称有序。
//! - 重复注册会替换旧实现并记录警告。
//! - schema 可序列化为 JSON，直接交给宿主前端。

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use ndarray::Array4;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::AppError;
use crate::image_loader::ValidationError;

/// 宿主传入的输入值（字段名 → 字符串值）。
pub type OperationInputs = BTreeMap<String, String>;

static OPERATIONS: Lazy<RwLock<BTreeMap<String, Arc<dyn Operation>>>> =
    Lazy::new(|| RwLock::new(BTreeMap::new()));

/// 可注册到宿主的操作。
pub trait Operation: Send + Sync {
    /// 当前输入 / 输出 schema（选项可能随受管目录内容变化）。
    fn schema(&self) -> Result<OperationSchema, AppError>;

    /// 变更检测指纹，前后不同即需要重新执行。
    fn fingerprint(&self, inputs: &OperationInputs) -> Result<String, AppError>;

    /// 执行前校验，`Err` 的文案即为拒绝原因。
    fn validate(&self, inputs: &OperationInputs) -> Result<(), ValidationError>;

    /// 执行操作，输出顺序与 schema 中的 `outputs` 一致。
    fn execute(&self, inputs: &OperationInputs) -> Result<Vec<OutputValue>, AppError>;
}

/// 操作声明。
#[derive(Debug, Clone, Serialize)]
pub struct OperationSchema {
    pub name: String,
    pub display_name: String,
    pub category: String,
    pub inputs: Vec<InputField>,
    pub outputs: Vec<OutputKind>,
}

/// 单个输入字段声明。
#[derive(Debug, Clone, Serialize)]
pub struct InputField {
    pub name: String,
    #[serde(flatten)]
    pub kind: InputKind,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputKind {
    /// 下拉选择。
    Choice {
        options: Vec<String>,
        default: Option<String>,
    },
    /// 自由文本。
    Text {
        default: String,
        multiline: bool,
        placeholder: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputKind {
    #[serde(rename = "IMAGE")]
    Image,
    #[serde(rename = "MASK")]
    Mask,
}

/// 操作输出值。
#[derive(Debug, Clone)]
pub enum OutputValue {
    Image(Array4<f32>),
    Mask(Array4<f32>),
}

impl OutputValue {
    pub fn kind(&self) -> OutputKind {
        match self {
            Self::Image(_) => OutputKind::Image,
            Self::Mask(_) => OutputKind::Mask,
        }
    }

    pub fn tensor(&self) -> &Array4<f32> {
        match self {
            Self::Image(tensor) | Self::Mask(tensor) => tensor,
        }
    }
}

/// 注册操作；同名操作会被替换，返回被替换的旧实现。
pub fn register_operation(
    name: &str,
    operation: Arc<dyn Operation>,
) -> Result<Option<Arc<dyn Operation>>, AppError> {
    let mut table = OPERATIONS
        .write()
        .map_err(|_| AppError::Registry("注册表写入锁已中毒".to_string()))?;

    let previous = table.insert(name.to_string(), operation);
    if previous.is_some() {
        log::warn!("⚠️ 操作 {} 已存在，替换为新实现", name);
    } else {
        log::info!("⚙️ 已注册操作：{}", name);
    }

    Ok(previous)
}

/// 按名称查找操作。
pub fn lookup_operation(name: &str) -> Result<Option<Arc<dyn Operation>>, AppError> {
    let table = OPERATIONS
        .read()
        .map_err(|_| AppError::Registry("注册表读取锁已中毒".to_string()))?;

    Ok(table.get(name).cloned())
}

/// 已注册的操作名（有序）。
pub fn registered_operations() -> Result<Vec<String>, AppError> {
    let table = OPERATIONS
        .read()
        .map_err(|_| AppError::Registry("注册表读取锁已中毒".to_string()))?;

    Ok(table.keys().cloned().collect())
}
