//! # 解析器模块
//!
//! 提供 Gaussian 输入/日志以及 XYZ 结构文件的解析器。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: gjf, gaussian_log, xyz

pub mod gaussian_log;
pub mod gjf;
pub mod xyz;

use crate::error::{Result, XdhError};
use crate::models::Geometry;
use std::path::Path;

/// 从文件路径推断格式并读取几何结构
///
/// Gaussian 输入含多个作业时取第一个作业的分子说明。
pub fn parse_geometry_file(path: &Path) -> Result<Geometry> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "xyz" => xyz::parse_xyz_file(path),
        "gjf" | "com" => {
            let decks = gjf::parse_gjf_file(path)?;
            let first = decks.first().ok_or_else(|| XdhError::ParseError {
                format: "gjf".to_string(),
                path: path.display().to_string(),
                reason: "No job found".to_string(),
            })?;
            let mut geom = first.geometry()?;
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                geom.name = stem.to_string();
            }
            Ok(geom)
        }
        _ => Err(XdhError::InvalidArgument(format!(
            "Cannot determine structure format for: {}",
            path.display()
        ))),
    }
}
