//! # 方法模块
//!
//! 方法注册表与路由关键字解析。
//!
//! ## 依赖关系
//! - 被 `commands/run.rs`, `models/energy.rs` 使用
//! - 子模块: registry, resolver

pub mod registry;
pub mod resolver;

pub use registry::{HybridMethodSpec, COMPONENT_NAMES};
pub use resolver::{resolve, HybridRequest, OptionList, Resolution};
