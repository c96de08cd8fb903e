//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `dispersion/`, `job/`, `utils/`
//! - 子模块: run, disp

pub mod disp;
pub mod run;

use crate::cli::Commands;
use crate::dispersion::{parse_damping, DispersionEngine, ElementTable, ParamOverrides, DEFAULT_DAMPING};
use crate::error::Result;
use std::path::Path;

/// 执行命令
pub async fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Run(args) => run::execute(args).await,
        Commands::Disp(args) => disp::execute(args),
    }
}

/// 根据参数表覆盖与阻尼参数构建色散引擎
pub(crate) fn build_engine(params: Option<&Path>, damping: Option<&str>) -> Result<DispersionEngine> {
    let damping = damping.map(parse_damping).transpose()?.unwrap_or(DEFAULT_DAMPING);

    let table = match params {
        Some(path) => {
            tracing::info!("loading dispersion parameters from {}", path.display());
            ElementTable::default().with_overrides(ParamOverrides::from_csv(path)?)
        }
        None => ElementTable::default(),
    };

    Ok(DispersionEngine::new(table, damping))
}
