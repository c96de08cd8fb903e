//! # run 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/run.rs`

use crate::job::DEFAULT_SYNC_INTERVAL;
use clap::Args;
use std::path::PathBuf;

/// run 子命令参数
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Gaussian input file (.gjf/.com), may contain several --Link1-- jobs
    pub input: PathBuf,

    /// Print level: 0 removes the job log, 1 keeps it, 2 also keeps scratch files and pair tables
    #[arg(short = 'p', long = "print-level", env = "XDH_PRINT_LEVEL", default_value_t = 1)]
    pub print_level: u8,

    /// Gaussian version to run (03, 09 or 16)
    #[arg(short = 'g', long = "gaussian-version", default_value_t = 16)]
    pub gaussian_version: u32,

    /// Seconds between log synchronizations (0 copies the log only when the job ends)
    #[arg(short = 's', long = "sync-interval", default_value_t = DEFAULT_SYNC_INTERVAL)]
    pub sync_interval: u64,

    /// Gaussian executable overriding the version default
    #[arg(long, env = "XDH_GAUSSIAN_EXE")]
    pub gaussian_exe: Option<String>,

    /// CSV file replacing the built-in R0/C6/C12 tables (columns: element,r0,c6,c12)
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Damping parameter of the dispersion model
    #[arg(long)]
    pub damping: Option<String>,
}
