//! # 外部作业模块
//!
//! 启动 Gaussian、增量同步并过滤其日志。
//!
//! ## 依赖关系
//! - 被 `commands/run.rs` 使用
//! - 子模块: filter, launcher, sync

pub mod filter;
pub mod launcher;
pub mod sync;

pub use launcher::{GaussianLauncher, GaussianVersion};
pub use sync::{JobOutcome, JobPaths, JobSynchronizer, SyncConfig, DEFAULT_SYNC_INTERVAL};
