//! # XYZ 格式解析器
//!
//! ```text
//! 3                       # 原子数
//! water                   # 注释行（作为结构名）
//! O  0.000  0.000  0.117  # 元素 x y z (Å)
//! H  0.000  0.757 -0.470
//! H  0.000 -0.757 -0.470
//! ```
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/geometry.rs`

use crate::error::{Result, XdhError};
use crate::models::{Atom, Geometry};
use std::fs;
use std::path::Path;

/// 解析 XYZ 文件
pub fn parse_xyz_file(path: &Path) -> Result<Geometry> {
    let content = fs::read_to_string(path).map_err(|e| XdhError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_xyz_content(
        &content,
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown"),
    )
}

/// 从字符串内容解析 XYZ 格式
pub fn parse_xyz_content(content: &str, default_name: &str) -> Result<Geometry> {
    let err = |reason: String| XdhError::ParseError {
        format: "xyz".to_string(),
        path: default_name.to_string(),
        reason,
    };

    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 2 {
        return Err(err("File too short".to_string()));
    }

    let count: usize = lines[0]
        .trim()
        .parse()
        .map_err(|_| err(format!("Invalid atom count: '{}'", lines[0].trim())))?;

    let end = count
        .checked_add(2)
        .ok_or_else(|| err(format!("Invalid atom count: '{}'", lines[0].trim())))?;
    if lines.len() < end {
        return Err(err(format!(
            "Expected {} atoms, found {}",
            count,
            lines.len() - 2
        )));
    }

    let atoms = lines[2..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 4 {
                return Err(err(format!("Invalid atom line {}: '{}'", i + 3, line)));
            }
            let mut position = [0.0; 3];
            for k in 0..3 {
                position[k] = parts[k + 1]
                    .parse()
                    .map_err(|_| err(format!("Invalid coordinate at line {}", i + 3)))?;
            }
            Atom::from_label(parts[0], position)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Geometry::new(default_name, atoms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_xyz_basic() {
        let content = "3\nwater\nO 0.0 0.0 0.1173\nh 0.0 0.7572 -0.4692\n1 0.0 -0.7572 -0.4692\n";
        let geom = parse_xyz_content(content, "water").unwrap();

        assert_eq!(geom.name, "water");
        assert_eq!(geom.len(), 3);
        assert_eq!(geom.atoms[0].z, 8);
        assert_eq!(geom.atoms[1].z, 1);
        assert_eq!(geom.atoms[2].z, 1);
        assert!((geom.atoms[2].position[1] + 0.7572).abs() < 1e-12);
    }

    #[test]
    fn test_parse_xyz_truncated() {
        let content = "3\nwater\nO 0.0 0.0 0.1173\n";
        assert!(matches!(
            parse_xyz_content(content, "water"),
            Err(XdhError::ParseError { .. })
        ));
    }

    #[test]
    fn test_parse_xyz_huge_atom_count() {
        let content = "18446744073709551615\nwater\nO 0.0 0.0 0.1173\n";
        assert!(matches!(
            parse_xyz_content(content, "water"),
            Err(XdhError::ParseError { .. })
        ));
    }

    #[test]
    fn test_parse_xyz_unknown_element() {
        let content = "1\n\nQq 0.0 0.0 0.0\n";
        assert!(matches!(
            parse_xyz_content(content, "bad"),
            Err(XdhError::UnknownElement(_))
        ));
    }
}
