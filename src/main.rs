//! # xdh - Gaussian 色散校正与 xDH 双杂化能量
//!
//! 在 Gaussian 单点计算之上提供经验成对色散校正 (DFT+D 与纯色散)
//! 以及 XYG3 型双杂化泛函 (xDH) 能量。
//!
//! ## 子命令
//! - `run`  - 运行 Gaussian 输入文件中的作业并同步日志
//! - `disp` - 对结构文件批量计算色散能
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── methods/    (路由关键字解析与 xDH 系数)
//!   │     ├── dispersion/ (色散能与梯度)
//!   │     ├── job/        (Gaussian 启动、日志同步与过滤)
//!   │     ├── parsers/    (输入、日志与结构解析器)
//!   │     ├── batch/      (并行批处理)
//!   │     └── models/     (数据模型)
//!   ├── utils/      (终端输出与报告)
//!   ├── logging.rs  (诊断日志)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod dispersion;
mod error;
mod job;
mod logging;
mod methods;
mod models;
mod parsers;
mod utils;

use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        utils::output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    if let Err(e) = commands::run(cli.command).await {
        tracing::error!("{:?}", e);
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
