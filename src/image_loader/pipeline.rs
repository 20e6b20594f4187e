//! # 解码流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 帧序列”的过程集中管理。本地来源按容器格式展开全部帧，
//! 网络来源始终只解码为单张静态图。
//!
//! ## 实现思路
//!
//! 1. 通过文件签名（magic bytes）尽早拒绝明显不是图片的内容
//! 2. 猜测格式，并识别 MPO 多图容器
//! 3. GIF / APNG / 动画 WebP 走动画解码器展开所有帧，容器的 EXIF 方向作用于每一帧
//! 4. 其他格式按静态图解码，同时读取 EXIF 方向

use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::metadata::Orientation;
use image::{AnimationDecoder, DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;

use super::source::{ContainerFormat, DecodedFrame, FrameSequence, RawImageData};
use super::{ImageLoader, SourceError};

/// JPEG APP2 段中 MPF（Multi-Picture Format）扩展的标识。
const MPF_IDENTIFIER: &[u8] = b"MPF\0";

impl ImageLoader {
    /// 将原始字节解码为完整帧序列（本地来源）。
    pub(crate) fn decode_sequence(raw: &RawImageData) -> Result<FrameSequence, SourceError> {
        Self::validate_image_signature(&raw.bytes)?;
        let format = Self::guess_format(&raw.bytes)?;
        let container = Self::container_format(format, &raw.bytes);

        let frames = match format {
            ImageFormat::Gif => {
                let mut decoder = GifDecoder::new(Cursor::new(raw.bytes.as_slice()))
                    .map_err(|e| SourceError::DecodeFailed(format!("GIF 解码失败：{}", e)))?;
                let orientation = Self::read_orientation(&mut decoder);
                Self::collect_animation_frames(decoder, orientation)?
            }
            ImageFormat::Png => {
                let mut decoder = PngDecoder::new(Cursor::new(raw.bytes.as_slice()))
                    .map_err(|e| SourceError::DecodeFailed(format!("PNG 解码失败：{}", e)))?;
                let is_apng = decoder
                    .is_apng()
                    .map_err(|e| SourceError::DecodeFailed(format!("PNG 解码失败：{}", e)))?;

                if is_apng {
                    let orientation = Self::read_orientation(&mut decoder);
                    let apng = decoder
                        .apng()
                        .map_err(|e| SourceError::DecodeFailed(format!("APNG 解码失败：{}", e)))?;
                    Self::collect_animation_frames(apng, orientation)?
                } else {
                    vec![Self::decode_still_frame(&raw.bytes, format)?]
                }
            }
            ImageFormat::WebP => {
                let mut decoder = WebPDecoder::new(Cursor::new(raw.bytes.as_slice()))
                    .map_err(|e| SourceError::DecodeFailed(format!("WebP 解码失败：{}", e)))?;

                if decoder.has_animation() {
                    let orientation = Self::read_orientation(&mut decoder);
                    Self::collect_animation_frames(decoder, orientation)?
                } else {
                    vec![Self::decode_still_frame(&raw.bytes, format)?]
                }
            }
            _ => vec![Self::decode_still_frame(&raw.bytes, format)?],
        };

        log::info!(
            "✅ 图片解码成功 - 来源: {} 格式: {:?} 帧数: {}",
            raw.source_hint,
            container,
            frames.len()
        );

        Ok(FrameSequence { format: container, frames })
    }

    /// 将原始字节解码为单张静态图（网络来源）。
    pub(crate) fn decode_still(raw: &RawImageData) -> Result<FrameSequence, SourceError> {
        Self::validate_image_signature(&raw.bytes)?;
        let format = Self::guess_format(&raw.bytes)?;
        let frame = Self::decode_still_frame(&raw.bytes, format)?;
        let (width, height) = frame.dimensions();

        log::info!(
            "✅ 图片解码成功 - 来源: {} 格式: {:?} 尺寸: {}x{}",
            raw.source_hint,
            format,
            width,
            height
        );

        Ok(FrameSequence::single(
            Self::container_format(format, &raw.bytes),
            frame,
        ))
    }

    fn guess_format(bytes: &[u8]) -> Result<ImageFormat, SourceError> {
        image::guess_format(bytes)
            .map_err(|e| SourceError::DecodeFailed(format!("不支持的图片格式：{}", e)))
    }

    fn container_format(format: ImageFormat, bytes: &[u8]) -> ContainerFormat {
        if format == ImageFormat::Jpeg && Self::is_multi_picture(bytes) {
            ContainerFormat::MultiPicture
        } else {
            ContainerFormat::Standard(format)
        }
    }

    /// 解码静态图并读取 EXIF 方向。
    ///
    /// 方向信息读取失败不影响解码，只记录警告并按无方向处理。
    fn decode_still_frame(bytes: &[u8], format: ImageFormat) -> Result<DecodedFrame, SourceError> {
        let mut decoder = ImageReader::with_format(Cursor::new(bytes), format)
            .into_decoder()
            .map_err(|e| SourceError::DecodeFailed(format!("图片解码失败：{}", e)))?;

        let orientation = Self::read_orientation(&mut decoder);
        let image = DynamicImage::from_decoder(decoder)
            .map_err(|e| SourceError::DecodeFailed(format!("图片解码失败：{}", e)))?;

        Ok(DecodedFrame::with_orientation(image, orientation))
    }

    /// 从容器读取 EXIF 方向，失败时按原方向处理。
    fn read_orientation<D: ImageDecoder>(decoder: &mut D) -> Orientation {
        decoder.orientation().unwrap_or_else(|err| {
            log::warn!("⚠️ 读取 EXIF 方向失败，按原方向处理：{}", err);
            Orientation::NoTransforms
        })
    }

    /// 展开动画帧，容器级 EXIF 方向作用于每一帧。
    fn collect_animation_frames<'a, D>(
        decoder: D,
        orientation: Orientation,
    ) -> Result<Vec<DecodedFrame>, SourceError>
    where
        D: AnimationDecoder<'a>,
    {
        let frames = decoder
            .into_frames()
            .collect_frames()
            .map_err(|e| SourceError::DecodeFailed(format!("动画帧解码失败：{}", e)))?;

        Ok(frames
            .into_iter()
            .map(|frame| {
                DecodedFrame::with_orientation(
                    DynamicImage::ImageRgba8(frame.into_buffer()),
                    orientation,
                )
            })
            .collect())
    }

    /// 扫描 JPEG 头部标记段，查找 APP2 中的 MPF 标识。
    ///
    /// 遇到 SOS / EOI 即停止，只看图像数据之前的元数据段。
    fn is_multi_picture(bytes: &[u8]) -> bool {
        if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
            return false;
        }

        let mut pos = 2;
        while pos + 4 <= bytes.len() {
            if bytes[pos] != 0xFF {
                return false;
            }

            let marker = bytes[pos + 1];
            if marker == 0xFF {
                pos += 1;
                continue;
            }
            if marker == 0xDA || marker == 0xD9 {
                return false;
            }

            let segment_len = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
            if segment_len < 2 {
                return false;
            }

            let payload_end = (pos + 2 + segment_len).min(bytes.len());
            let payload = &bytes[pos + 4..payload_end];
            if marker == 0xE2 && payload.starts_with(MPF_IDENTIFIER) {
                return true;
            }

            pos += 2 + segment_len;
        }

        false
    }

    /// 通过文件签名校验输入是否为图片。
    ///
    /// 签名无法识别时交给解码器判断；识别为非图片类型时直接拒绝。
    fn validate_image_signature(bytes: &[u8]) -> Result<(), SourceError> {
        if bytes.is_empty() {
            return Err(SourceError::DecodeFailed("图片内容为空".to_string()));
        }

        if let Some(kind) = infer::get(bytes) {
            if kind.matcher_type() != infer::MatcherType::Image {
                return Err(SourceError::DecodeFailed(format!(
                    "文件签名不是图片类型：{}",
                    kind.mime_type()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifEncoder;
    use image::{Frame, GenericImageView, ImageBuffer, Rgb, Rgba};

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        image
            .write_to(&mut cursor, format)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    fn raw(bytes: Vec<u8>) -> RawImageData {
        RawImageData {
            bytes,
            source_hint: "test",
        }
    }

    fn create_gif_bytes(frame_count: u8, width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut bytes);
            let frames = (0..frame_count).map(|i| {
                Frame::new(ImageBuffer::from_pixel(
                    width,
                    height,
                    Rgba([i.wrapping_mul(60), 0, 0, 255]),
                ))
            });
            encoder.encode_frames(frames).expect("failed to encode gif");
        }
        bytes
    }

    #[test]
    fn png_still_decodes_to_single_frame() {
        let png = encode(DynamicImage::new_rgb8(5, 3), ImageFormat::Png);

        let sequence = ImageLoader::decode_sequence(&raw(png)).expect("decode failed");

        assert_eq!(sequence.len(), 1);
        assert_eq!(sequence.format, ContainerFormat::Standard(ImageFormat::Png));
        assert_eq!(sequence.frames[0].dimensions(), (5, 3));
        assert!(sequence.frames[0].orientation.is_none());
    }

    #[test]
    fn animated_gif_yields_every_frame_in_order() {
        let gif = create_gif_bytes(3, 4, 2);

        let sequence = ImageLoader::decode_sequence(&raw(gif)).expect("decode failed");

        assert_eq!(sequence.len(), 3);
        assert_eq!(sequence.format, ContainerFormat::Standard(ImageFormat::Gif));
        for frame in &sequence.frames {
            assert_eq!(frame.image.dimensions(), (4, 2));
        }
    }

    const APNG_RGB_3FRAMES: &[u8] = include_bytes!("../../tests/fixtures/rgb_3frames.apng");
    const WEBP_RGB_3FRAMES_ROTATE90: &[u8] =
        include_bytes!("../../tests/fixtures/rgb_3frames_rotate90.webp");

    const FRAME_COLORS: [Rgba<u8>; 3] = [
        Rgba([255, 0, 0, 255]),
        Rgba([0, 255, 0, 255]),
        Rgba([0, 0, 255, 255]),
    ];

    /// 在 SOI 之后插入只含 Orientation 标签的 APP1 Exif 段。
    fn with_exif_orientation(jpeg: &[u8], orientation: u8) -> Vec<u8> {
        let mut tiff = b"MM\x00\x2a\x00\x00\x00\x08\x00\x01".to_vec();
        tiff.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        tiff.extend_from_slice(&[0x00, orientation, 0x00, 0x00]);
        tiff.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let mut payload = b"Exif\x00\x00".to_vec();
        payload.extend_from_slice(&tiff);
        let segment_len = (payload.len() + 2) as u16;

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&segment_len.to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    fn first_pixel(frame: &DecodedFrame) -> Rgba<u8> {
        *frame.image.to_rgba8().get_pixel(0, 0)
    }

    #[test]
    fn apng_yields_every_frame_in_order() {
        let sequence =
            ImageLoader::decode_sequence(&raw(APNG_RGB_3FRAMES.to_vec())).expect("decode failed");

        assert_eq!(sequence.format, ContainerFormat::Standard(ImageFormat::Png));
        assert_eq!(sequence.len(), 3);
        for (frame, expected) in sequence.frames.iter().zip(FRAME_COLORS) {
            assert_eq!(frame.dimensions(), (4, 2));
            assert_eq!(first_pixel(frame), expected);
            assert!(frame.orientation.is_none());
        }
    }

    #[test]
    fn animated_webp_yields_every_frame_with_container_orientation() {
        let sequence = ImageLoader::decode_sequence(&raw(WEBP_RGB_3FRAMES_ROTATE90.to_vec()))
            .expect("decode failed");

        assert_eq!(sequence.format, ContainerFormat::Standard(ImageFormat::WebP));
        assert_eq!(sequence.len(), 3);
        for (frame, expected) in sequence.frames.iter().zip(FRAME_COLORS) {
            assert_eq!(frame.dimensions(), (4, 2));
            assert_eq!(first_pixel(frame), expected);
            assert_eq!(frame.orientation, Some(Orientation::Rotate90));
        }

        let loaded = crate::image_loader::normalize(sequence).expect("normalize failed");
        assert_eq!(loaded.image.shape(), &[3, 4, 2, 3]);
    }

    #[test]
    fn jpeg_exif_orientation_is_read_from_file() {
        let jpeg = encode(
            DynamicImage::ImageRgb8(ImageBuffer::from_pixel(4, 2, Rgb([200, 100, 50]))),
            ImageFormat::Jpeg,
        );
        let rotated = with_exif_orientation(&jpeg, 6);

        let sequence = ImageLoader::decode_sequence(&raw(rotated)).expect("decode failed");
        assert_eq!(sequence.frames[0].dimensions(), (4, 2));
        assert_eq!(sequence.frames[0].orientation, Some(Orientation::Rotate90));

        let loaded = crate::image_loader::normalize(sequence).expect("normalize failed");
        assert_eq!(loaded.image.shape(), &[1, 4, 2, 3]);
        assert_eq!(loaded.mask.shape(), &[1, 4, 2, 1]);
    }

    #[test]
    fn still_decode_keeps_only_first_gif_frame() {
        let gif = create_gif_bytes(3, 4, 2);

        let sequence = ImageLoader::decode_still(&raw(gif)).expect("decode failed");

        assert_eq!(sequence.len(), 1);
    }

    #[test]
    fn jpeg_with_mpf_segment_is_tagged_multi_picture() {
        let jpeg = encode(
            DynamicImage::ImageRgb8(ImageBuffer::from_pixel(4, 4, Rgb([10, 20, 30]))),
            ImageFormat::Jpeg,
        );
        let mut mpo = vec![0xFF, 0xD8, 0xFF, 0xE2, 0x00, 0x08];
        mpo.extend_from_slice(MPF_IDENTIFIER);
        mpo.extend_from_slice(&[0x00, 0x00]);
        mpo.extend_from_slice(&jpeg[2..]);

        assert!(ImageLoader::is_multi_picture(&mpo));
        assert!(!ImageLoader::is_multi_picture(&jpeg));

        let sequence = ImageLoader::decode_sequence(&raw(mpo)).expect("decode failed");
        assert_eq!(sequence.format, ContainerFormat::MultiPicture);
        assert_eq!(sequence.frames[0].dimensions(), (4, 4));
    }

    #[test]
    fn corrupt_bytes_fail_with_decode_error() {
        let mut png = encode(DynamicImage::new_rgb8(8, 8), ImageFormat::Png);
        png.truncate(30);

        let result = ImageLoader::decode_sequence(&raw(png));

        assert!(matches!(result, Err(SourceError::DecodeFailed(_))));
    }

    #[test]
    fn non_image_payload_is_rejected() {
        let result = ImageLoader::decode_still(&raw(b"%PDF-1.7 not an image".to_vec()));
        assert!(matches!(result, Err(SourceError::DecodeFailed(_))));

        let empty = ImageLoader::decode_sequence(&raw(Vec::new()));
        assert!(matches!(empty, Err(SourceError::DecodeFailed(_))));
    }
}
