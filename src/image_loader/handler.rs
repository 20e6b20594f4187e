//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ImageLoader` 只负责流程编排，不与宿主注册机制绑定。
//! 处理链路固定为：
//! 1. 按来源加载原始字节（文件 / URL）
//! 2. 解码为帧序列（URL 始终只有一帧）
//! 3. 归一化为图像批次与遮罩批次
//!
//! ## 实现思路
//!
//! - 每次调用独立，不持有可变状态，可在不同输入上并发调用。
//! - 记录 `load/decode/normalize/total` 阶段耗时，便于性能诊断。

use std::time::Instant;

use super::source::{FrameSequence, LoadedImage, RawImageSource};
use super::{LoadError, LoaderConfig, SourceError, ValidationError, normalize};
use crate::namespace::InputNamespace;

/// 图片加载器。
///
/// 封装配置与受管命名空间，并编排各子模块实现完整流程。
#[derive(Debug, Clone)]
pub struct ImageLoader {
    pub(super) config: LoaderConfig,
    pub(super) namespace: InputNamespace,
}

impl ImageLoader {
    /// 根据配置创建加载器，受管命名空间取自配置中的目录。
    ///
    /// # 示例
    /// ```rust
    /// use image_source_loader::image_loader::{ImageLoader, LoaderConfig};
    ///
    /// let loader = ImageLoader::new(LoaderConfig::with_input_dir("/srv/comfy/input"));
    /// assert!(loader.namespace().input_dir().ends_with("input"));
    /// ```
    pub fn new(config: LoaderConfig) -> Self {
        let namespace = config.namespace();
        Self { config, namespace }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn namespace(&self) -> &InputNamespace {
        &self.namespace
    }

    /// 加载并解码来源，得到帧序列。
    pub fn resolve(&self, source: &RawImageSource) -> Result<FrameSequence, SourceError> {
        match source {
            RawImageSource::Local { path } => {
                let raw = self.load_from_file(path)?;
                Self::decode_sequence(&raw)
            }
            RawImageSource::Remote { url } => {
                let raw = self.load_from_url(url.trim())?;
                Self::decode_still(&raw)
            }
        }
    }

    /// 处理主入口：加载、解码并归一化。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use image_source_loader::image_loader::{ImageLoader, LoaderConfig, RawImageSource};
    ///
    /// let loader = ImageLoader::new(LoaderConfig::default());
    /// let loaded = loader.load(&RawImageSource::Local { path: "example.png".into() })?;
    /// println!("{:?}", loaded.image.shape());
    /// # Ok::<(), image_source_loader::image_loader::LoadError>(())
    /// ```
    pub fn load(&self, source: &RawImageSource) -> Result<LoadedImage, LoadError> {
        if let RawImageSource::Remote { url } = source {
            if url.trim().is_empty() {
                return Err(ValidationError::EmptyUrl.into());
            }
        }

        let total_start = Instant::now();

        let load_start = Instant::now();
        let sequence = self.resolve(source)?;
        let load_elapsed = load_start.elapsed();

        let normalize_start = Instant::now();
        let frame_total = sequence.len();
        let loaded = normalize(sequence)?;
        let normalize_elapsed = normalize_start.elapsed();

        log::info!(
            "✅ 图片加载完成 - 来源: {} 输出: {}/{} 帧 {}x{} load+decode={}ms normalize={}ms total={}ms",
            source.mode().as_str(),
            loaded.frame_count(),
            frame_total,
            loaded.width(),
            loaded.height(),
            load_elapsed.as_millis(),
            normalize_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(loaded)
    }
}
