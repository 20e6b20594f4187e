//! # 指纹与输入校验策略
//!
//! ## 设计思路
//!
//! 两个策略都由宿主在调用主流程之前查询，彼此独立，也不依赖加载流水线：
//!
//! - 指纹：宿主比较前后两次指纹，不同则认为缓存结果已过期。
//!   - 本地文件：对完整文件内容做 SHA-256（强失效）。
//!   - URL：只对 URL 文本做 SHA-256，远端内容变化不会改变指纹（弱失效，已知取舍）。
//! - 校验：只检查结构性问题，不做任何网络访问。

use std::fs::File;
use std::io;

use sha2::{Digest, Sha256};

use super::source::RawImageSource;
use super::{ImageLoader, SourceError, ValidationError};

impl ImageLoader {
    /// 计算来源指纹。
    ///
    /// URL 为空时返回空字符串。
    pub fn fingerprint(&self, source: &RawImageSource) -> Result<String, SourceError> {
        match source {
            RawImageSource::Remote { url } => {
                if url.trim().is_empty() {
                    return Ok(String::new());
                }
                Ok(format!("{:x}", Sha256::digest(url.as_bytes())))
            }
            RawImageSource::Local { path } => {
                let file_path = self.namespace.resolve(path)?;
                let mut file = File::open(&file_path).map_err(|e| {
                    SourceError::Io(format!("无法打开图片文件 {}：{}", file_path.display(), e))
                })?;

                let mut hasher = Sha256::new();
                io::copy(&mut file, &mut hasher).map_err(|e| {
                    SourceError::Io(format!("无法读取图片文件 {}：{}", file_path.display(), e))
                })?;

                Ok(format!("{:x}", hasher.finalize()))
            }
        }
    }

    /// 在调用主流程前校验输入。
    ///
    /// # 示例
    /// ```rust
    /// use image_source_loader::image_loader::{ImageLoader, LoaderConfig, RawImageSource};
    ///
    /// let loader = ImageLoader::new(LoaderConfig::default());
    /// let ok = loader.validate(&RawImageSource::Remote { url: "http://example.com/a.png".into() });
    /// assert!(ok.is_ok());
    /// ```
    pub fn validate(&self, source: &RawImageSource) -> Result<(), ValidationError> {
        match source {
            RawImageSource::Remote { url } => {
                if url.trim().is_empty() {
                    return Err(ValidationError::EmptyUrl);
                }
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(ValidationError::UnsupportedScheme(url.clone()));
                }
                Ok(())
            }
            RawImageSource::Local { path } => {
                if !self.namespace.exists(path) {
                    return Err(ValidationError::MissingFile(path.clone()));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader::LoaderConfig;
    use proptest::prelude::*;
    use std::fs;
    use std::path::Path;

    fn loader_in(dir: &Path) -> ImageLoader {
        let input = dir.join("input");
        fs::create_dir_all(&input).expect("create input dir failed");
        ImageLoader::new(LoaderConfig::with_input_dir(input))
    }

    fn remote(url: &str) -> RawImageSource {
        RawImageSource::Remote { url: url.into() }
    }

    fn local(path: &str) -> RawImageSource {
        RawImageSource::Local { path: path.into() }
    }

    #[test]
    fn local_fingerprint_tracks_file_content() {
        let dir = tempfile::tempdir().expect("create temp dir failed");
        let loader = loader_in(dir.path());
        let file = dir.path().join("input/cat.png");
        fs::write(&file, b"not really a png").expect("write failed");

        let first = loader.fingerprint(&local("cat.png")).expect("fingerprint failed");
        let second = loader.fingerprint(&local("cat.png")).expect("fingerprint failed");
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);

        fs::write(&file, b"not really a pnh").expect("write failed");
        let changed = loader.fingerprint(&local("cat.png")).expect("fingerprint failed");
        assert_ne!(first, changed);
    }

    #[test]
    fn local_fingerprint_of_missing_file_fails() {
        let dir = tempfile::tempdir().expect("create temp dir failed");
        let loader = loader_in(dir.path());

        assert!(matches!(
            loader.fingerprint(&local("missing.png")),
            Err(SourceError::Io(_))
        ));
    }

    #[test]
    fn remote_fingerprint_is_hash_of_url_text() {
        let loader = ImageLoader::new(LoaderConfig::default());

        let fp = loader
            .fingerprint(&remote("https://example.com/a.png"))
            .expect("fingerprint failed");

        assert_eq!(fp, format!("{:x}", Sha256::digest(b"https://example.com/a.png")));
        assert_eq!(loader.fingerprint(&remote("  ")).expect("fingerprint failed"), "");
    }

    #[test]
    fn validate_remote_rules() {
        let loader = ImageLoader::new(LoaderConfig::default());

        assert!(matches!(loader.validate(&remote("")), Err(ValidationError::EmptyUrl)));
        assert!(matches!(loader.validate(&remote(" \t")), Err(ValidationError::EmptyUrl)));
        assert!(matches!(
            loader.validate(&remote("ftp://x")),
            Err(ValidationError::UnsupportedScheme(_))
        ));
        assert!(loader.validate(&remote("http://example.com/a.png")).is_ok());
        assert!(loader.validate(&remote("https://example.com/a.png")).is_ok());
    }

    #[test]
    fn validate_local_names_missing_file() {
        let dir = tempfile::tempdir().expect("create temp dir failed");
        let loader = loader_in(dir.path());
        fs::write(dir.path().join("input/present.png"), b"x").expect("write failed");

        assert!(loader.validate(&local("present.png")).is_ok());

        let reason: String = loader
            .validate(&local("absent.png"))
            .expect_err("missing file should be rejected")
            .into();
        assert!(reason.contains("absent.png"));
    }

    proptest! {
        #[test]
        fn remote_fingerprint_is_deterministic(path in "[a-z0-9/]{1,24}") {
            let loader = ImageLoader::new(LoaderConfig::default());
            let url = format!("https://example.com/{}", path);

            let a = loader.fingerprint(&remote(&url)).expect("fingerprint failed");
            let b = loader.fingerprint(&remote(&url)).expect("fingerprint failed");

            prop_assert_eq!(a.len(), 64);
            prop_assert_eq!(a, b);
        }
    }
}
