//! 受管输入目录模块
//!
//! # 设计思路
//!
//! 本地来源只能从宿主管理的目录中选择文件，不接受任意路径。
//! 文件名可带标注后缀选择根目录：
//!
//! - `cat.png` / `cat.png [input]` → 输入目录
//! - `cat.png [output]` → 输出目录
//! - `cat.png [temp]` → 临时目录
//!
//! # 实现思路
//!
//! - 标注后缀解析后，剩余部分只允许由普通路径分量组成（拒绝绝对路径与 `..`）。
//! - `list_files` 只列出输入目录下的普通文件，按名称排序，供宿主下拉框使用。
//! - 所有可能失败的操作均返回 `Result`，不使用 `expect()` / `unwrap()`。

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::image_loader::SourceError;

/// 标注后缀选择的根目录。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceRoot {
    Input,
    Output,
    Temp,
}

impl NamespaceRoot {
    fn from_annotation(annotation: &str) -> Option<Self> {
        match annotation {
            "input" => Some(Self::Input),
            "output" => Some(Self::Output),
            "temp" => Some(Self::Temp),
            _ => None,
        }
    }
}

/// 宿主受管的文件命名空间。
#[derive(Debug, Clone)]
pub struct InputNamespace {
    input_dir: PathBuf,
    output_dir: PathBuf,
    temp_dir: PathBuf,
}

impl InputNamespace {
    pub fn with_roots(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            temp_dir: temp_dir.into(),
        }
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    fn root_dir(&self, root: NamespaceRoot) -> &Path {
        match root {
            NamespaceRoot::Input => &self.input_dir,
            NamespaceRoot::Output => &self.output_dir,
            NamespaceRoot::Temp => &self.temp_dir,
        }
    }

    /// 列出输入目录下的普通文件名（已排序）。
    ///
    /// # 返回
    /// - `Ok(Vec<String>)`：文件名列表，非 UTF-8 文件名会被跳过
    /// - `Err(SourceError::Io)`：目录不可读
    pub fn list_files(&self) -> Result<Vec<String>, SourceError> {
        let entries = fs::read_dir(&self.input_dir).map_err(|e| {
            SourceError::Io(format!(
                "无法读取输入目录 '{}': {}",
                self.input_dir.display(),
                e
            ))
        })?;

        let mut files: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        files.sort();

        Ok(files)
    }

    /// 将（可带标注的）文件名解析为受管目录内的绝对/相对路径。
    pub fn resolve(&self, name: &str) -> Result<PathBuf, SourceError> {
        let (relative, root) = split_annotation(name);

        if relative.is_empty() || !is_contained(Path::new(relative)) {
            return Err(SourceError::OutsideNamespace(name.to_string()));
        }

        Ok(self.root_dir(root).join(relative))
    }

    /// 文件名是否指向受管目录内已存在的文件。
    pub fn exists(&self, name: &str) -> bool {
        self.resolve(name).map(|path| path.is_file()).unwrap_or(false)
    }
}

/// 拆出 `name [root]` 形式的标注，缺省为输入目录。
fn split_annotation(name: &str) -> (&str, NamespaceRoot) {
    let trimmed = name.trim();

    if let Some(stripped) = trimmed.strip_suffix(']') {
        if let Some((relative, annotation)) = stripped.rsplit_once(" [") {
            if let Some(root) = NamespaceRoot::from_annotation(annotation) {
                return (relative.trim_end(), root);
            }
        }
    }

    (trimmed, NamespaceRoot::Input)
}

fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|component| matches!(component, Component::Normal(_)))
}
