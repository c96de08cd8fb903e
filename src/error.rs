//! # 统一错误处理模块
//!
//! 定义 xdh 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 错误分类
//! - 参数错误：色散参数表或阻尼参数格式错误，立即失败
//! - 解析错误：Gaussian 日志缺少必需的能量分量，不做任何默认填充
//! - 暂时性 I/O：同步过程中日志暂不可用，由 `job::sync` 内部重试
//! - 不支持的组合：几何优化等本版本不支持的任务
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// xdh 统一错误类型
#[derive(Error, Debug)]
pub enum XdhError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid dispersion parameter: {0}")]
    InvalidParameter(String),

    #[error("No {table} parameter for element Z={z}")]
    MissingParameter { table: &'static str, z: usize },

    #[error("Unknown element: {0}")]
    UnknownElement(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Cannot find {field} in {path}")]
    ComponentNotFound { field: String, path: String },

    // ─────────────────────────────────────────────────────────────
    // 外部作业错误
    // ─────────────────────────────────────────────────────────────
    #[error("External command '{command}' not found in PATH")]
    CommandNotFound { command: String },

    #[error("External command failed: {command}\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Gaussian exited without producing a log file: {path}")]
    LogNotProduced { path: String },

    // ─────────────────────────────────────────────────────────────
    // 不支持的组合
    // ─────────────────────────────────────────────────────────────
    #[error("{0} is not supported in this version")]
    Unsupported(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("No matching files found with pattern: {pattern}")]
    NoFilesFound { pattern: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, XdhError>;
