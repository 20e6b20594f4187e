//! # 宿主操作适配层
//!
//! ## 设计思路
//!
//! 适配层只做“宿主输入三元组 → `RawImageSource`”的转换和结果封装，
//! 不承载业务逻辑。所有实际处理交由 `ImageLoader`。

use std::sync::Arc;

use super::source::{RawImageSource, SourceMode};
use super::{ImageLoader, LoadError, LoaderConfig, ValidationError};
use crate::error::AppError;
use crate::registry::{
    self, InputField, InputKind, Operation, OperationInputs, OperationSchema, OutputKind,
    OutputValue,
};

pub const LOAD_IMAGE_OPERATION: &str = "LoadImageFileOrURL";
pub const LOAD_IMAGE_DISPLAY_NAME: &str = "Load Image (File/URL)";
const LOAD_IMAGE_CATEGORY: &str = "image";
const URL_PLACEHOLDER: &str = "https://example.com/image.png";

/// 宿主传入的三个字段。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadImageInputs {
    pub source: SourceMode,
    pub image: String,
    pub url: String,
}

impl LoadImageInputs {
    /// 从宿主输入表解析，缺省字段按 schema 默认值处理。
    pub fn from_inputs(inputs: &OperationInputs) -> Result<Self, ValidationError> {
        let source = match inputs.get("source") {
            Some(mode) => SourceMode::parse(mode)?,
            None => SourceMode::File,
        };

        Ok(Self {
            source,
            image: inputs.get("image").cloned().unwrap_or_default(),
            url: inputs.get("url").cloned().unwrap_or_default(),
        })
    }

    pub fn to_source(&self) -> RawImageSource {
        RawImageSource::from_inputs(self.source, &self.image, &self.url)
    }
}

/// “从文件或 URL 加载图片”操作。
pub struct LoadImageOperation {
    loader: ImageLoader,
}

impl LoadImageOperation {
    pub fn new(loader: ImageLoader) -> Self {
        Self { loader }
    }
}

impl Operation for LoadImageOperation {
    fn schema(&self) -> Result<OperationSchema, AppError> {
        let files = self.loader.namespace().list_files().map_err(LoadError::from)?;

        Ok(OperationSchema {
            name: LOAD_IMAGE_OPERATION.to_string(),
            display_name: LOAD_IMAGE_DISPLAY_NAME.to_string(),
            category: LOAD_IMAGE_CATEGORY.to_string(),
            inputs: vec![
                InputField {
                    name: "source".to_string(),
                    kind: InputKind::Choice {
                        options: vec![
                            SourceMode::File.as_str().to_string(),
                            SourceMode::Url.as_str().to_string(),
                        ],
                        default: Some(SourceMode::File.as_str().to_string()),
                    },
                },
                InputField {
                    name: "image".to_string(),
                    kind: InputKind::Choice {
                        options: files,
                        default: None,
                    },
                },
                InputField {
                    name: "url".to_string(),
                    kind: InputKind::Text {
                        default: String::new(),
                        multiline: false,
                        placeholder: Some(URL_PLACEHOLDER.to_string()),
                    },
                },
            ],
            outputs: vec![OutputKind::Image, OutputKind::Mask],
        })
    }

    fn fingerprint(&self, inputs: &OperationInputs) -> Result<String, AppError> {
        let inputs = LoadImageInputs::from_inputs(inputs)?;
        Ok(self.loader.fingerprint(&inputs.to_source())?)
    }

    fn validate(&self, inputs: &OperationInputs) -> Result<(), ValidationError> {
        let inputs = LoadImageInputs::from_inputs(inputs)?;
        self.loader.validate(&inputs.to_source())
    }

    fn execute(&self, inputs: &OperationInputs) -> Result<Vec<OutputValue>, AppError> {
        let inputs = LoadImageInputs::from_inputs(inputs)?;
        let (image, mask) = self.loader.load(&inputs.to_source())?.into_parts();

        Ok(vec![OutputValue::Image(image), OutputValue::Mask(mask)])
    }
}

/// 启动时注册本模块提供的操作。
pub fn register_operations(config: LoaderConfig) -> Result<(), AppError> {
    let operation = LoadImageOperation::new(ImageLoader::new(config));
    registry::register_operation(LOAD_IMAGE_OPERATION, Arc::new(operation))?;
    Ok(())
}
