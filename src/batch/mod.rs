//! # 批量处理模块
//!
//! 对一组结构文件并行执行色散计算。
//!
//! ## 功能
//! - 自动检测输入类型（文件/目录）
//! - 按 glob 模式收集文件
//! - 基于 rayon 的并行处理与进度反馈
//!
//! ## 依赖关系
//! - 被 `commands/disp.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::FileCollector;
pub use runner::{BatchResult, BatchRunner, ProcessResult};
