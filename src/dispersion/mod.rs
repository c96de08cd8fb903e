//! # 色散校正模块
//!
//! 经验成对色散能（Grimme 六次项及其十二次项扩展）。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/geometry.rs`
//! - 子模块: params, engine

pub mod engine;
pub mod params;

pub use engine::{DispersionEngine, DispersionModel, DispersionResult, PairTerm};
pub use params::{parse_damping, ElementTable, ParamOverrides, DEFAULT_DAMPING};
