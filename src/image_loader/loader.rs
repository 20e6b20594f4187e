//! # 加载模块
//!
//! ## 设计思路
//!
//! 统一处理两种来源的原始字节加载：
//! - 文件：在受管目录内解析文件名，同步读取全部字节。
//! - URL：先做协议与格式校验，再发出一次阻塞 GET（固定 UA、固定超时），
//!   完整缓冲响应体后返回。无重试、无流式读取，重定向沿用 HTTP 客户端默认策略。
//!
//! 网络错误统一映射到 `SourceError`，日志中的 URL 会去掉 query / fragment。

use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use reqwest::Url;

use super::source::RawImageData;
use super::{ImageLoader, LoaderConfig, SourceError};

impl ImageLoader {
    /// 从受管目录读取图片原始字节。
    pub(super) fn load_from_file(&self, name: &str) -> Result<RawImageData, SourceError> {
        let path = self.namespace.resolve(name)?;
        log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

        let bytes = std::fs::read(&path).map_err(|e| {
            SourceError::Io(format!("无法读取图片文件 {}：{}", path.display(), e))
        })?;

        Ok(RawImageData {
            bytes,
            source_hint: "file",
        })
    }

    /// 从 URL 下载图片原始字节。
    pub(super) fn load_from_url(&self, url: &str) -> Result<RawImageData, SourceError> {
        let parsed = Self::parse_http_url(url)?;
        log::info!("🌐 开始下载图片 - URL: {}", Self::redact_url_for_log(url));

        let client = Self::build_http_client(&self.config)?;
        let response = client
            .get(parsed)
            .header(USER_AGENT, self.config.user_agent.as_str())
            .send()
            .map_err(|e| self.map_reqwest_error(e, url))?;

        let status = response.status();
        if !status.is_success() {
            log::warn!(
                "⚠️ 下载失败 - HTTP {} URL: {}",
                status.as_u16(),
                Self::redact_url_for_log(url)
            );
            return Err(SourceError::HttpStatus(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .map_err(|e| self.map_reqwest_error(e, url))?
            .to_vec();
        log::debug!("✅ 下载完成 - {} bytes", bytes.len());

        Ok(RawImageData {
            bytes,
            source_hint: "url",
        })
    }

    /// 解析 URL 并限制为 HTTP/HTTPS，在任何网络访问之前执行。
    fn parse_http_url(url: &str) -> Result<Url, SourceError> {
        let parsed = Url::parse(url).map_err(|e| SourceError::InvalidUrl(format!("{}：{}", e, url)))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(SourceError::InvalidUrl(format!("仅支持 HTTP/HTTPS：{}", url)));
        }

        Ok(parsed)
    }

    fn build_http_client(config: &LoaderConfig) -> Result<Client, SourceError> {
        Client::builder()
            .timeout(config.download_timeout())
            .build()
            .map_err(|e| SourceError::Network(format!("无法创建 HTTP 客户端：{}", e)))
    }

    /// 统一映射 reqwest 错误到业务错误。
    fn map_reqwest_error(&self, e: reqwest::Error, url: &str) -> SourceError {
        let err_msg = Self::sanitize_error_message_with_redacted_url(&e.to_string(), url);

        if e.is_timeout() {
            SourceError::Network(format!("下载超时（{}秒）", self.config.download_timeout))
        } else if e.is_connect() {
            SourceError::Network(format!("无法连接：{}", err_msg))
        } else {
            SourceError::Network(format!("请求失败：{}", err_msg))
        }
    }

    pub(super) fn redact_url_for_log(url: &str) -> String {
        let Ok(parsed) = Url::parse(url) else {
            return "<invalid-url>".to_string();
        };

        let host = parsed.host_str().unwrap_or("<unknown-host>");
        let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
        let path = parsed.path();

        format!("{}://{}{}{}", parsed.scheme(), host, port, path)
    }

    fn sanitize_error_message_with_redacted_url(error_msg: &str, url: &str) -> String {
        let redacted = Self::redact_url_for_log(url);
        error_msg.replace(url, &redacted)
    }
}
