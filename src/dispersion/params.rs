//! # 元素色散参数表
//!
//! 每个元素的范德华半径 R0 (Å)、六次项系数 C6 (J·mol⁻¹·nm⁶) 和十二次项系数
//! C12 (J·mol⁻¹·nm¹²)。六次项参数取自 Grimme (J. Comput. Chem. 27, 1787) 与
//! Martin (J. Phys. Chem. A 113, 8434)；十二次项系数由 C6 与 R0 按 Lennard-Jones
//! 关系 `e[(s/r)^-12 - 2(s/r)^-6]` 推得。
//!
//! 参数表构造后只读。外部提供的表格整表替换内置表，不做合并。
//!
//! ## 依赖关系
//! - 被 `dispersion/engine.rs` 使用
//! - 使用 `csv` + `serde` 读取覆盖参数

use crate::error::{Result, XdhError};
use crate::models::geometry::atomic_number;
use serde::Deserialize;
use std::path::Path;

/// 默认阻尼参数 d
pub const DEFAULT_DAMPING: f64 = 20.0;

#[rustfmt::skip]
const R0_TABLE: [f64; 55] = [
    1.000,
    1.001, 1.012,
    0.825, 1.408, 1.485, 1.452, 1.397, 1.342, 1.287, 1.243,
    1.144, 1.364, 1.639, 1.716, 1.705, 1.683, 1.639, 1.595,
    1.485, 1.474, 1.562, 1.562, 1.562, 1.562, 1.562, 1.562,
    1.562, 1.562, 1.562, 1.562, 1.650, 1.727, 1.760, 1.771, 1.749, 1.727,
    1.628, 1.606, 1.639, 1.639, 1.639, 1.639, 1.639, 1.639,
    1.639, 1.639, 1.639, 1.639, 1.672, 1.804, 1.881, 1.892, 1.892, 1.881,
];

#[rustfmt::skip]
const C6_TABLE: [f64; 55] = [
    0.00,
    0.14, 0.08,
    1.61, 1.61, 3.13, 1.75, 1.23, 0.70, 0.75, 0.63,
    5.71, 5.71, 10.79, 9.23, 7.84, 5.57, 5.07, 4.61,
    10.08, 10.08, 10.08, 10.08, 10.08, 10.08, 10.08, 10.08,
    10.08, 10.08, 10.08, 10.08, 16.99, 17.10, 16.37, 12.64, 12.47, 12.01,
    24.67, 24.67, 24.67, 24.67, 24.67, 24.67, 24.67, 24.67,
    24.67, 24.67, 24.67, 24.67, 37.32, 38.71, 38.44, 31.74, 31.50, 29.99,
];

#[rustfmt::skip]
const C12_TABLE: [f64; 21] = [
    0.00,
    0.704E-07, 4.30E-08,
    2.54E-07, 0.627E-05, 1.68E-05, 0.82E-05, 4.57E-06, 2.044E-06, 1.704E-06, 1.16E-06,
    0.64E-05, 1.84E-05, 1.046E-04, 1.18E-04, 0.963E-04, 0.633E-04, 4.914E-05, 3.795E-05,
    0.54E-04, 0.517E-04,
];

/// 按原子序数索引的单列参数
#[derive(Debug, Clone, PartialEq)]
pub struct ParamColumn {
    name: &'static str,
    values: Vec<Option<f64>>,
}

impl ParamColumn {
    fn from_slice(name: &'static str, values: &[f64]) -> Self {
        ParamColumn {
            name,
            values: values.iter().copied().map(Some).collect(),
        }
    }

    pub fn get(&self, z: usize) -> Result<f64> {
        self.values
            .get(z)
            .copied()
            .flatten()
            .ok_or(XdhError::MissingParameter {
                table: self.name,
                z,
            })
    }
}

/// 元素参数表
#[derive(Debug, Clone, PartialEq)]
pub struct ElementTable {
    r0: ParamColumn,
    c6: ParamColumn,
    c12: ParamColumn,
}

impl Default for ElementTable {
    fn default() -> Self {
        ElementTable {
            r0: ParamColumn::from_slice("R0", &R0_TABLE),
            c6: ParamColumn::from_slice("C6", &C6_TABLE),
            c12: ParamColumn::from_slice("C12", &C12_TABLE),
        }
    }
}

impl ElementTable {
    pub fn r0(&self, z: usize) -> Result<f64> {
        self.r0.get(z)
    }

    pub fn c6(&self, z: usize) -> Result<f64> {
        self.c6.get(z)
    }

    pub fn c12(&self, z: usize) -> Result<f64> {
        self.c12.get(z)
    }

    /// 应用覆盖参数：提供了的列整列替换
    pub fn with_overrides(mut self, overrides: ParamOverrides) -> Self {
        if let Some(values) = overrides.r0 {
            self.r0.values = values;
        }
        if let Some(values) = overrides.c6 {
            self.c6.values = values;
        }
        if let Some(values) = overrides.c12 {
            self.c12.values = values;
        }
        self
    }
}

/// 用户提供的参数表
///
/// 每一列要么完全缺省（沿用内置表），要么构成一张新表。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamOverrides {
    pub r0: Option<Vec<Option<f64>>>,
    pub c6: Option<Vec<Option<f64>>>,
    pub c12: Option<Vec<Option<f64>>>,
}

/// CSV 中的一行：`element,r0,c6,c12`
#[derive(Debug, Deserialize)]
struct ParamRecord {
    element: String,
    #[serde(default)]
    r0: Option<String>,
    #[serde(default)]
    c6: Option<String>,
    #[serde(default)]
    c12: Option<String>,
}

impl ParamOverrides {
    /// 从 CSV 文件读取覆盖参数
    pub fn from_csv(path: &Path) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;
        Self::from_reader(reader, &path.display().to_string())
    }

    fn from_reader<R: std::io::Read>(mut reader: csv::Reader<R>, source: &str) -> Result<Self> {
        let mut r0 = Vec::new();
        let mut c6 = Vec::new();
        let mut c12 = Vec::new();

        for (line, record) in reader.deserialize::<ParamRecord>().enumerate() {
            let record = record?;
            let z = atomic_number(&record.element)?;
            let at = format!("{} (row {}, element {})", source, line + 1, record.element);

            if let Some(v) = parse_cell(record.r0.as_deref(), "r0", &at)? {
                r0.push((z, v));
            }
            if let Some(v) = parse_cell(record.c6.as_deref(), "c6", &at)? {
                c6.push((z, v));
            }
            if let Some(v) = parse_cell(record.c12.as_deref(), "c12", &at)? {
                c12.push((z, v));
            }
        }

        Ok(ParamOverrides {
            r0: dense(r0),
            c6: dense(c6),
            c12: dense(c12),
        })
    }
}

/// 解析单元格；空单元格视为未提供
fn parse_cell(cell: Option<&str>, column: &str, at: &str) -> Result<Option<f64>> {
    match cell.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => {
            let value: f64 = text.parse().map_err(|_| {
                XdhError::InvalidParameter(format!(
                    "{} should be a number but got '{}' at {}",
                    column, text, at
                ))
            })?;
            if !value.is_finite() || value < 0.0 {
                return Err(XdhError::InvalidParameter(format!(
                    "{} must be a finite non-negative number, got {} at {}",
                    column, value, at
                )));
            }
            Ok(Some(value))
        }
    }
}

fn dense(entries: Vec<(usize, f64)>) -> Option<Vec<Option<f64>>> {
    let max_z = entries.iter().map(|(z, _)| *z).max()?;
    let mut values = vec![None; max_z + 1];
    for (z, v) in entries {
        values[z] = Some(v);
    }
    Some(values)
}

/// 解析阻尼参数 d
///
/// 非数值或非正数立即报错，不进入任何计算。
pub fn parse_damping(text: &str) -> Result<f64> {
    let d: f64 = text.trim().parse().map_err(|_| {
        XdhError::InvalidParameter(format!("damping parameter should be a float, got '{}'", text))
    })?;
    if !d.is_finite() || d <= 0.0 {
        return Err(XdhError::InvalidParameter(format!(
            "damping parameter must be positive and finite, got {}",
            d
        )));
    }
    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides_from(text: &str) -> Result<ParamOverrides> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());
        ParamOverrides::from_reader(reader, "inline")
    }

    #[test]
    fn test_builtin_values() {
        let table = ElementTable::default();
        assert_eq!(table.r0(6).unwrap(), 1.452);
        assert_eq!(table.c6(6).unwrap(), 1.75);
        assert_eq!(table.c12(8).unwrap(), 2.044e-6);
        assert_eq!(table.c6(54).unwrap(), 29.99);
    }

    #[test]
    fn test_c12_table_is_shorter() {
        let table = ElementTable::default();
        assert!(table.c6(26).is_ok());
        assert!(matches!(
            table.c12(26),
            Err(XdhError::MissingParameter { table: "C12", z: 26 })
        ));
    }

    #[test]
    fn test_override_replaces_whole_column() {
        let overrides = overrides_from("element,r0,c6,c12\nH,,2.0,\nC,,3.0,\n").unwrap();
        assert!(overrides.r0.is_none());
        assert!(overrides.c12.is_none());

        let table = ElementTable::default().with_overrides(overrides);
        assert_eq!(table.c6(1).unwrap(), 2.0);
        assert_eq!(table.c6(6).unwrap(), 3.0);
        // 未在覆盖表中出现的元素不会回退到内置值
        assert!(table.c6(8).is_err());
        assert!(table.c6(5).is_err());
        // 未覆盖的列保持内置值
        assert_eq!(table.r0(8).unwrap(), 1.342);
    }

    #[test]
    fn test_override_rejects_non_numeric() {
        let err = overrides_from("element,r0,c6,c12\nO,1.3,abc,\n").unwrap_err();
        match err {
            XdhError::InvalidParameter(msg) => {
                assert!(msg.contains("c6"));
                assert!(msg.contains("abc"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_damping() {
        assert_eq!(parse_damping("20").unwrap(), 20.0);
        assert_eq!(parse_damping(" 23.5 ").unwrap(), 23.5);
        assert!(matches!(
            parse_damping("twenty"),
            Err(XdhError::InvalidParameter(_))
        ));
        assert!(parse_damping("-1").is_err());
        assert!(parse_damping("NaN").is_err());
    }
}
