//! # 分子几何数据模型
//!
//! 定义色散计算使用的有序原子列表（元素 + 笛卡尔坐标，单位 Å）。
//!
//! ## 依赖关系
//! - 被 `parsers/xyz.rs`, `parsers/gjf.rs` 构造
//! - 被 `dispersion/engine.rs` 使用

use crate::error::{Result, XdhError};
use serde::{Deserialize, Serialize};

/// 元素符号表，下标即原子序数（0 为虚原子 X）
const SYMBOLS: [&str; 87] = [
    "X", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge",
    "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd",
    "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn",
];

/// 由元素标签解析原子序数
///
/// 接受元素符号（大小写不敏感，允许 `C1`、`H12` 这类带编号的标签）或原子序数。
pub fn atomic_number(label: &str) -> Result<usize> {
    let label = label.trim();

    if let Ok(z) = label.parse::<usize>() {
        if z < SYMBOLS.len() {
            return Ok(z);
        }
        return Err(XdhError::UnknownElement(label.to_string()));
    }

    let symbol: String = label.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    SYMBOLS
        .iter()
        .position(|s| s.eq_ignore_ascii_case(&symbol))
        .ok_or_else(|| XdhError::UnknownElement(label.to_string()))
}

/// 原子序数对应的元素符号
pub fn element_symbol(z: usize) -> &'static str {
    SYMBOLS.get(z).copied().unwrap_or("X")
}

/// 原子信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// 原子序数
    pub z: usize,

    /// 笛卡尔坐标 [x, y, z] (Å)
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(z: usize, position: [f64; 3]) -> Self {
        Atom { z, position }
    }

    /// 由元素标签构造
    pub fn from_label(label: &str, position: [f64; 3]) -> Result<Self> {
        Ok(Atom::new(atomic_number(label)?, position))
    }

    pub fn symbol(&self) -> &'static str {
        element_symbol(self.z)
    }

    /// 与另一原子的距离 (Å)
    pub fn distance(&self, other: &Atom) -> f64 {
        self.position
            .iter()
            .zip(other.position.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

/// 分子几何
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Geometry {
    /// 名称（通常取自文件名）
    pub name: String,

    /// 有序原子列表
    pub atoms: Vec<Atom>,
}

impl Geometry {
    pub fn new(name: impl Into<String>, atoms: Vec<Atom>) -> Self {
        Geometry {
            name: name.into(),
            atoms,
        }
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// 计算化学式（元素按字母序）
    pub fn formula(&self) -> String {
        use std::collections::BTreeMap;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

        for atom in &self.atoms {
            *counts.entry(atom.symbol()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(el, count)| {
                if count == 1 {
                    el.to_string()
                } else {
                    format!("{}{}", el, count)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }
}
