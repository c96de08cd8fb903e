//! # 数据模型模块
//!
//! 分子几何结构与能量分量数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `dispersion/` 和 `commands/` 使用
//! - 子模块: geometry, energy

pub mod energy;
pub mod geometry;

pub use energy::{EnergyComponents, HybridEnergy, XcPass};
pub use geometry::{Atom, Geometry};
