//! # disp 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/disp.rs`

use crate::batch::collector::DEFAULT_PATTERN;
use crate::dispersion::DispersionModel;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 色散模型选择
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ModelArg {
    /// Damped six-order term (Grimme)
    #[value(name = "disp_g")]
    DispG,
    /// Undamped six-order term
    #[value(name = "disp_6")]
    Disp6,
    /// Undamped twelve-order term
    #[value(name = "disp_12")]
    Disp12,
    /// Undamped six- plus twelve-order terms
    #[value(name = "disp")]
    Disp,
    /// Damped twelve-order term
    #[value(name = "disp_12s")]
    Disp12s,
    /// Every model
    All,
}

impl ModelArg {
    pub fn models(&self) -> Vec<DispersionModel> {
        match self {
            ModelArg::DispG => vec![DispersionModel::SixDamped],
            ModelArg::Disp6 => vec![DispersionModel::SixUndamped],
            ModelArg::Disp12 => vec![DispersionModel::TwelveUndamped],
            ModelArg::Disp => vec![DispersionModel::SixPlusTwelve],
            ModelArg::Disp12s => vec![DispersionModel::TwelveDamped],
            ModelArg::All => DispersionModel::ALL.to_vec(),
        }
    }
}

/// disp 子命令参数
#[derive(Args, Debug)]
pub struct DispArgs {
    /// Structure file or directory (.xyz, .gjf, .com)
    pub input: PathBuf,

    /// Dispersion model
    #[arg(short, long, value_enum, default_value = "disp_g")]
    pub model: ModelArg,

    /// Filename patterns when the input is a directory (comma separated)
    #[arg(long, default_value = DEFAULT_PATTERN)]
    pub pattern: String,

    /// Search directories recursively
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Number of parallel jobs (0 uses all cores)
    #[arg(short = 'j', long, default_value_t = 0)]
    pub jobs: usize,

    /// Save all energies to a CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// CSV file replacing the built-in R0/C6/C12 tables (columns: element,r0,c6,c12)
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Damping parameter of the dispersion model
    #[arg(long)]
    pub damping: Option<String>,

    /// Print the per-pair contributions (single structure only)
    #[arg(long, default_value_t = false)]
    pub pairs: bool,
}
