//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入语义”和“流水线中间结果”解耦：
//! - `SourceMode` / `RawImageSource` 表示宿主选择的来源
//! - `RawImageData` 表示已加载但未解码的字节
//! - `DecodedFrame` / `FrameSequence` 表示解码后的帧序列与容器格式标记
//! - `LoadedImage` 表示最终输出的图像批次与遮罩批次

use image::metadata::Orientation;
use image::{DynamicImage, GenericImageView, ImageFormat};
use ndarray::Array4;

use super::ValidationError;

/// 图像批次：`(N, H, W, 3)`，取值 `[0, 1]`。
pub type NormalizedImage = Array4<f32>;

/// 遮罩批次：`(N, H, W, 1)`，取值 `[0, 1]`，1 表示源像素完全透明。
pub type NormalizedMask = Array4<f32>;

/// 不按动画批次处理的容器格式。
///
/// 这些格式内部的多张子图彼此独立，只取第一张。
const EXCLUDED_BATCH_FORMATS: &[ContainerFormat] = &[ContainerFormat::MultiPicture];

/// 来源模式（宿主下拉框的两个取值）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    File,
    Url,
}

impl SourceMode {
    /// 从宿主字符串解析来源模式。
    ///
    /// # 示例
    /// ```rust
    /// use image_source_loader::image_loader::SourceMode;
    ///
    /// let mode = SourceMode::parse(" URL ")?;
    /// assert_eq!(mode.as_str(), "url");
    /// # Ok::<(), image_source_loader::image_loader::ValidationError>(())
    /// ```
    pub fn parse(mode: &str) -> Result<Self, ValidationError> {
        match mode.trim().to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "url" => Ok(Self::Url),
            other => Err(ValidationError::UnknownMode(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Url => "url",
        }
    }
}

/// 图片输入来源。每次调用只有一个分支生效。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawImageSource {
    /// 受管输入目录中的文件名（可带 `[input]` / `[output]` / `[temp]` 标注）。
    Local { path: String },
    /// 网络地址来源。
    Remote { url: String },
}

impl RawImageSource {
    /// 按来源模式从宿主三元组中挑出生效字段。
    pub fn from_inputs(mode: SourceMode, image: &str, url: &str) -> Self {
        match mode {
            SourceMode::File => Self::Local {
                path: image.to_string(),
            },
            SourceMode::Url => Self::Remote {
                url: url.to_string(),
            },
        }
    }

    pub fn mode(&self) -> SourceMode {
        match self {
            Self::Local { .. } => SourceMode::File,
            Self::Remote { .. } => SourceMode::Url,
        }
    }
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

/// 单个解码帧。
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub image: DynamicImage,
    /// EXIF 方向；`None` 表示无需变换。
    pub orientation: Option<Orientation>,
}

impl DecodedFrame {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image,
            orientation: None,
        }
    }

    pub fn with_orientation(image: DynamicImage, orientation: Orientation) -> Self {
        let orientation = (orientation != Orientation::NoTransforms).then_some(orientation);
        Self { image, orientation }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// 来源容器格式标记。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    /// 普通格式（含 GIF / APNG / WebP 动画）。
    Standard(ImageFormat),
    /// 多图容器（MPO）：子图是独立画面而非动画序列。
    MultiPicture,
}

impl ContainerFormat {
    /// 多帧时是否按批次拼接。
    pub fn batches_frames(self) -> bool {
        !EXCLUDED_BATCH_FORMATS.contains(&self)
    }
}

/// 解码阶段输出：按文件顺序排列的帧。
#[derive(Debug, Clone)]
pub struct FrameSequence {
    pub format: ContainerFormat,
    pub frames: Vec<DecodedFrame>,
}

impl FrameSequence {
    pub fn single(format: ContainerFormat, frame: DecodedFrame) -> Self {
        Self {
            format,
            frames: vec![frame],
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// 最终输出：图像批次与遮罩批次，批次顺序一致。
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub image: NormalizedImage,
    pub mask: NormalizedMask,
}

impl LoadedImage {
    pub fn frame_count(&self) -> usize {
        self.image.shape()[0]
    }

    pub fn height(&self) -> usize {
        self.image.shape()[1]
    }

    pub fn width(&self) -> usize {
        self.image.shape()[2]
    }

    pub fn into_parts(self) -> (NormalizedImage, NormalizedMask) {
        (self.image, self.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_mode_parses_host_values() {
        assert_eq!(SourceMode::parse("file").expect("parse failed"), SourceMode::File);
        assert_eq!(SourceMode::parse(" Url ").expect("parse failed"), SourceMode::Url);
        assert!(matches!(
            SourceMode::parse("ftp"),
            Err(ValidationError::UnknownMode(_))
        ));
    }

    #[test]
    fn from_inputs_selects_only_active_field() {
        let local = RawImageSource::from_inputs(SourceMode::File, "cat.png", "https://x/y.png");
        let remote = RawImageSource::from_inputs(SourceMode::Url, "cat.png", "https://x/y.png");

        assert_eq!(local, RawImageSource::Local { path: "cat.png".into() });
        assert_eq!(remote, RawImageSource::Remote { url: "https://x/y.png".into() });
        assert_eq!(remote.mode(), SourceMode::Url);
    }

    #[test]
    fn multi_picture_container_is_not_batched() {
        assert!(ContainerFormat::Standard(ImageFormat::Gif).batches_frames());
        assert!(ContainerFormat::Standard(ImageFormat::Jpeg).batches_frames());
        assert!(!ContainerFormat::MultiPicture.batches_frames());
    }

    #[test]
    fn identity_orientation_is_dropped() {
        let frame = DecodedFrame::with_orientation(
            DynamicImage::new_rgb8(2, 2),
            Orientation::NoTransforms,
        );
        assert!(frame.orientation.is_none());

        let rotated =
            DecodedFrame::with_orientation(DynamicImage::new_rgb8(2, 2), Orientation::Rotate90);
        assert_eq!(rotated.orientation, Some(Orientation::Rotate90));
    }
}
