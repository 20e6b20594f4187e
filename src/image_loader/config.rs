//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有可调参数集中到 `LoaderConfig`：下载超时、请求头里的 User-Agent、
//! 以及受管目录（input / output / temp）的根路径。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的配置（30 秒超时、桌面浏览器 UA）。
//! - 支持从 JSON 文件加载，字段缺失时回落到默认值。
//! - 配置文件不存在或解析失败时记录警告并整体回落默认值，不阻断启动。

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::namespace::InputNamespace;

/// 模拟常见桌面浏览器，避免被简单的爬虫拦截策略拒绝。
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 图片加载配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// 网络下载超时时间（秒），覆盖连接到读完响应体的全过程。
    pub download_timeout: u64,
    /// 下载请求使用的 User-Agent。
    pub user_agent: String,
    /// 受管输入目录。
    pub input_dir: PathBuf,
    /// 受管输出目录（`[output]` 标注）。
    pub output_dir: PathBuf,
    /// 受管临时目录（`[temp]` 标注）。
    pub temp_dir: PathBuf,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            download_timeout: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            temp_dir: PathBuf::from("temp"),
        }
    }
}

impl LoaderConfig {
    /// 以指定输入目录构建配置，output / temp 取其同级目录。
    pub fn with_input_dir(input_dir: impl Into<PathBuf>) -> Self {
        let input_dir = input_dir.into();
        let parent = input_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self {
            output_dir: parent.join("output"),
            temp_dir: parent.join("temp"),
            input_dir,
            ..Self::default()
        }
    }

    /// 从 JSON 文件加载配置。
    pub fn load_from_path(config_path: &Path) -> Self {
        if !config_path.exists() {
            log::warn!("配置文件不存在，使用默认配置: {}", config_path.display());
            return Self::default();
        }

        let content = match fs::read_to_string(config_path) {
            Ok(content) => content,
            Err(err) => {
                log::warn!("读取配置文件失败，使用默认配置: {}: {}", config_path.display(), err);
                return Self::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("解析配置文件失败，使用默认配置: {}: {}", config_path.display(), err);
                Self::default()
            }
        }
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout)
    }

    /// 按配置的三个根目录构建受管命名空间。
    pub fn namespace(&self) -> InputNamespace {
        InputNamespace::with_roots(&self.input_dir, &self.output_dir, &self.temp_dir)
    }
}
