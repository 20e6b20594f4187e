//! # 图片加载模块（image_loader）
//!
//! ## 设计思路
//!
//! 该模块将“来源解析 → 加载 → 解码 → 归一化 → 宿主操作暴露”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `commands`：宿主操作适配（输入三元组 ↔ 加载器）
//! - `handler`：编排整条处理流水线
//! - `loader`：负责文件读取与 URL 下载
//! - `pipeline`：负责解码与帧展开
//! - `normalizer`：负责方向校正、遮罩提取与批次拼接
//! - `policy`：指纹与输入校验策略
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 调用链
//!
//! ```text
//! 宿主调用
//!    ↓
//! commands.rs（参数适配）
//!    ├─ policy.rs（validate / fingerprint，调用主流程之前）
//!    ↓
//! handler.rs（统一编排 + 阶段耗时日志）
//!    ├─ loader.rs（文件读取 / 单次 GET）
//!    ├─ pipeline.rs（解码 + 帧展开）
//!    └─ normalizer.rs（图像批次 + 遮罩批次）
//!    ↓
//! 返回 AppError 给宿主
//! ```

pub mod commands;
mod config;
mod error;
mod handler;
mod loader;
mod normalizer;
mod pipeline;
mod policy;
mod source;

pub use commands::{
    LOAD_IMAGE_DISPLAY_NAME, LOAD_IMAGE_OPERATION, LoadImageInputs, LoadImageOperation,
    register_operations,
};
pub use config::{DEFAULT_USER_AGENT, LoaderConfig};
pub use error::{LoadError, NormalizationError, SourceError, ValidationError};
pub use handler::ImageLoader;
pub use normalizer::normalize;
pub use source::{
    ContainerFormat, DecodedFrame, FrameSequence, LoadedImage, NormalizedImage, NormalizedMask,
    RawImageSource, SourceMode,
};
