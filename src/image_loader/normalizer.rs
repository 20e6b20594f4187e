//! # 帧归一化模块
//!
//! ## 设计思路
//!
//! 无论来源是本地文件还是网络地址，所有帧都走同一套处理：
//!
//! 1. 按 EXIF 方向旋转 / 翻转
//! 2. 16 位整型灰度按 `1/255` 缩放回 8 位范围
//! 3. 提取遮罩：有 alpha 时 `1 - alpha`，否则全零
//! 4. 转为 3 通道浮点 RGB，取值 `[0, 1]`
//!
//! ## 批次策略
//!
//! 第一帧的宽高是批次的规范尺寸，之后尺寸不同的帧整帧丢弃（图像与遮罩都不保留），
//! 不视为错误。剩余多帧且容器不在排除列表中时沿批次维拼接，否则只返回第一帧。

use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use ndarray::{Array4, Axis, concatenate};

use super::source::{DecodedFrame, FrameSequence, LoadedImage, NormalizedImage, NormalizedMask};
use super::NormalizationError;

/// 将帧序列归一化为图像批次与遮罩批次。
///
/// # 示例
/// ```rust
/// use image::{DynamicImage, ImageFormat};
/// use image_source_loader::image_loader::{normalize, ContainerFormat, DecodedFrame, FrameSequence};
///
/// let sequence = FrameSequence::single(
///     ContainerFormat::Standard(ImageFormat::Png),
///     DecodedFrame::new(DynamicImage::new_rgb8(4, 2)),
/// );
/// let loaded = normalize(sequence)?;
/// assert_eq!(loaded.image.shape(), &[1, 2, 4, 3]);
/// assert_eq!(loaded.mask.shape(), &[1, 2, 4, 1]);
/// # Ok::<(), image_source_loader::image_loader::NormalizationError>(())
/// ```
pub fn normalize(sequence: FrameSequence) -> Result<LoadedImage, NormalizationError> {
    let FrameSequence { format, frames } = sequence;
    let total = frames.len();

    let mut images: Vec<NormalizedImage> = Vec::with_capacity(total);
    let mut masks: Vec<NormalizedMask> = Vec::with_capacity(total);
    let mut canonical_size: Option<(u32, u32)> = None;

    for (index, frame) in frames.into_iter().enumerate() {
        let image = rescale_wide_luma(apply_orientation(frame));
        let size = image.dimensions();

        match canonical_size {
            None => canonical_size = Some(size),
            Some(expected) if expected != size => {
                log::debug!(
                    "丢弃尺寸不一致的帧 #{}：{}x{}（规范尺寸 {}x{}）",
                    index,
                    size.0,
                    size.1,
                    expected.0,
                    expected.1
                );
                continue;
            }
            Some(_) => {}
        }

        masks.push(extract_mask(&image));
        images.push(to_rgb_tensor(&image));
    }

    if images.is_empty() {
        return Err(NormalizationError::Empty);
    }

    if images.len() > 1 && format.batches_frames() {
        log::debug!("拼接 {}/{} 帧为批次（{:?}）", images.len(), total, format);
        return Ok(LoadedImage {
            image: stack_batch(&images)?,
            mask: stack_batch(&masks)?,
        });
    }

    if images.len() > 1 {
        log::debug!("容器 {:?} 不按动画处理，仅保留第一帧", format);
    }

    let image = images.swap_remove(0);
    let mask = masks.swap_remove(0);
    Ok(LoadedImage { image, mask })
}

fn apply_orientation(frame: DecodedFrame) -> DynamicImage {
    let DecodedFrame {
        mut image,
        orientation,
    } = frame;

    if let Some(orientation) = orientation {
        image.apply_orientation(orientation);
    }

    image
}

/// 16 位整型灰度按 `1/255` 缩放（向下取整），并截断到 8 位范围。
fn rescale_wide_luma(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma16(buffer) => {
            let (width, height) = buffer.dimensions();
            let rescaled = GrayImage::from_fn(width, height, |x, y| {
                let sample = buffer.get_pixel(x, y)[0] / 255;
                Luma([sample.min(255) as u8])
            });
            DynamicImage::ImageLuma8(rescaled)
        }
        other => other,
    }
}

fn extract_mask(image: &DynamicImage) -> NormalizedMask {
    let (width, height) = image.dimensions();
    let shape = (1, height as usize, width as usize, 1);

    if !image.color().has_alpha() {
        return Array4::zeros(shape);
    }

    let rgba = image.to_rgba32f();
    Array4::from_shape_fn(shape, |(_, y, x, _)| {
        1.0 - rgba.get_pixel(x as u32, y as u32)[3].clamp(0.0, 1.0)
    })
}

fn to_rgb_tensor(image: &DynamicImage) -> NormalizedImage {
    let (width, height) = image.dimensions();
    let rgb = image.to_rgb32f();

    Array4::from_shape_fn((1, height as usize, width as usize, 3), |(_, y, x, c)| {
        rgb.get_pixel(x as u32, y as u32)[c].clamp(0.0, 1.0)
    })
}

fn stack_batch(parts: &[Array4<f32>]) -> Result<Array4<f32>, NormalizationError> {
    let views: Vec<_> = parts.iter().map(|part| part.view()).collect();
    concatenate(Axis(0), &views).map_err(|e| NormalizationError::Batch(e.to_string()))
}
