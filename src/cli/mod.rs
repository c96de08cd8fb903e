//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `run`: 运行 Gaussian 输入中的 xDH / DFT+D / 纯色散作业
//! - `disp`: 对结构文件批量计算色散能
//!
//! 全局参数 `-v/-q/--log-file` 控制诊断日志。
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: run, disp

pub mod disp;
pub mod run;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// xdh - Gaussian 单点计算的色散校正与 xDH 双杂化能量
#[derive(Parser, Debug)]
#[command(name = "xdh")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(
    about = "Dispersion corrections and XYG3-type doubly hybrid energies on top of Gaussian",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase diagnostic verbosity (-v INFO, -vv DEBUG, -vvv TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only report diagnostic errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Also write diagnostics to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// 可用的子命令
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the xDH, DFT+D or pure dispersion jobs of a Gaussian input file
    Run(run::RunArgs),

    /// Evaluate pairwise dispersion energies of structure files
    Disp(disp::DispArgs),
}
