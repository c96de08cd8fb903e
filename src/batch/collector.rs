//! # 文件收集器
//!
//! 根据输入路径和模式收集待处理文件列表。
//!
//! ## 功能
//! - 支持单文件和目录输入
//! - glob 模式匹配（逗号分隔多个模式）
//! - 递归目录搜索
//!
//! ## 依赖关系
//! - 被 `commands/disp.rs` 调用
//! - 使用 `walkdir` 遍历目录，`glob` 匹配文件名

use crate::error::{Result, XdhError};
use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 默认匹配的结构文件
pub const DEFAULT_PATTERN: &str = "*.xyz,*.gjf,*.com";

/// 文件收集器
pub struct FileCollector {
    input: PathBuf,
    patterns: Vec<Pattern>,
    raw_pattern: String,
    recursive: bool,
}

impl FileCollector {
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            patterns: Vec::new(),
            raw_pattern: "*".to_string(),
            recursive: false,
        }
    }

    /// 设置匹配模式（逗号分隔的多模式）
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        self.patterns = pattern
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Pattern::new(s).map_err(|e| {
                    XdhError::InvalidArgument(format!("Invalid pattern '{}': {}", s, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.raw_pattern = pattern.to_string();
        Ok(self)
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 收集所有匹配的文件（按路径排序）
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        if self.input.is_file() {
            return Ok(vec![self.input.clone()]);
        }

        if !self.input.is_dir() {
            return Err(XdhError::FileNotFound {
                path: self.input.display().to_string(),
            });
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };

        let mut files: Vec<PathBuf> = WalkDir::new(&self.input)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|entry| self.matches(entry.path()))
            .map(|e| e.path().to_path_buf())
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(XdhError::NoFilesFound {
                pattern: format!("{}/{}", self.input.display(), self.raw_pattern),
            });
        }
        Ok(files)
    }

    /// 文件名是否匹配任一模式；未设置模式时全部匹配
    fn matches(&self, path: &Path) -> bool {
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        self.patterns.is_empty() || self.patterns.iter().any(|p| p.matches(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_collect_with_patterns() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.xyz"));
        touch(&dir.path().join("a.gjf"));
        touch(&dir.path().join("notes.txt"));
        fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir.path().join("sub").join("c.xyz"));

        let flat = FileCollector::new(dir.path().to_path_buf())
            .with_pattern(DEFAULT_PATTERN)
            .unwrap()
            .collect()
            .unwrap();
        let names: Vec<_> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.gjf", "b.xyz"]);

        let deep = FileCollector::new(dir.path().to_path_buf())
            .with_pattern("*.xyz")
            .unwrap()
            .recursive(true)
            .collect()
            .unwrap();
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn test_single_file_and_errors() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("h2.xyz");
        touch(&file);

        let single = FileCollector::new(file.clone()).collect().unwrap();
        assert_eq!(single, vec![file]);

        let none = FileCollector::new(dir.path().to_path_buf())
            .with_pattern("*.gjf")
            .unwrap()
            .collect();
        assert!(matches!(none, Err(XdhError::NoFilesFound { .. })));

        let missing = FileCollector::new(dir.path().join("missing")).collect();
        assert!(matches!(missing, Err(XdhError::FileNotFound { .. })));

        assert!(FileCollector::new(dir.path().to_path_buf())
            .with_pattern("[*.xyz")
            .is_err());
    }
}
