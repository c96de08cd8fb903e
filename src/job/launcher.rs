//! # 外部作业启动器
//!
//! 在临时目录中启动 Gaussian 进程。启动方式抽象为 `JobLauncher` trait，
//! 便于替换为其他可执行程序或测试脚本。
//!
//! ## 依赖关系
//! - 被 `job/sync.rs`, `commands/run.rs` 使用

use crate::error::{Result, XdhError};
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use tokio::process::{Child, Command};

/// 启动外部计算进程
pub trait JobLauncher: Send + Sync {
    /// 在 `scratch` 目录中以 `input` 为输入启动进程
    fn launch(&self, scratch: &Path, input: &Path) -> Result<Child>;

    /// 用于日志与错误信息的命令名
    fn command(&self) -> &str;
}

/// 支持的 Gaussian 版本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaussianVersion {
    G03,
    G09,
    G16,
}

impl GaussianVersion {
    /// 由版本号（3/03/9/09/16）解析
    pub fn from_number(version: u32) -> Result<Self> {
        match version {
            3 => Ok(GaussianVersion::G03),
            9 => Ok(GaussianVersion::G09),
            16 => Ok(GaussianVersion::G16),
            other => Err(XdhError::InvalidArgument(format!(
                "Unsupported Gaussian version: {} (expected 03, 09 or 16)",
                other
            ))),
        }
    }

    pub fn executable(&self) -> &'static str {
        match self {
            GaussianVersion::G03 => "g03",
            GaussianVersion::G09 => "g09",
            GaussianVersion::G16 => "g16",
        }
    }

    pub fn number(&self) -> u32 {
        match self {
            GaussianVersion::G03 => 3,
            GaussianVersion::G09 => 9,
            GaussianVersion::G16 => 16,
        }
    }
}

impl fmt::Display for GaussianVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gaussian {:02}", self.number())
    }
}

/// Gaussian 启动器
#[derive(Debug, Clone)]
pub struct GaussianLauncher {
    executable: String,
}

impl GaussianLauncher {
    pub fn new(version: GaussianVersion) -> Self {
        GaussianLauncher {
            executable: version.executable().to_string(),
        }
    }

    /// 使用指定的可执行程序（覆盖版本默认值）
    pub fn with_executable(executable: impl Into<String>) -> Self {
        GaussianLauncher {
            executable: executable.into(),
        }
    }
}

impl JobLauncher for GaussianLauncher {
    fn launch(&self, scratch: &Path, input: &Path) -> Result<Child> {
        let input_name = input.file_name().unwrap_or(input.as_os_str());

        tracing::info!(
            "launching {} {} in {}",
            self.executable,
            input_name.to_string_lossy(),
            scratch.display()
        );

        Command::new(&self.executable)
            .arg(input_name)
            .current_dir(scratch)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(&self.executable, e))
    }

    fn command(&self) -> &str {
        &self.executable
    }
}

/// 将启动失败转换为错误类型
pub(crate) fn spawn_error(command: &str, e: std::io::Error) -> XdhError {
    if e.kind() == std::io::ErrorKind::NotFound {
        XdhError::CommandNotFound {
            command: command.to_string(),
        }
    } else {
        XdhError::CommandFailed {
            command: command.to_string(),
            stderr: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_version() {
        assert_eq!(GaussianVersion::from_number(16).unwrap(), GaussianVersion::G16);
        assert_eq!(GaussianVersion::from_number(3).unwrap().executable(), "g03");
        assert_eq!(GaussianVersion::G09.to_string(), "Gaussian 09");
        assert!(GaussianVersion::from_number(98).is_err());
    }

    #[test]
    fn test_launcher_command() {
        assert_eq!(GaussianLauncher::new(GaussianVersion::G09).command(), "g09");
        assert_eq!(
            GaussianLauncher::with_executable("/opt/g16/g16").command(),
            "/opt/g16/g16"
        );
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = GaussianLauncher::with_executable("xdh-no-such-gaussian-binary");
        let err = launcher
            .launch(dir.path(), &dir.path().join("Job_x.com"))
            .unwrap_err();
        assert!(matches!(err, XdhError::CommandNotFound { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dropped_child_is_killed() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        let exe = dir.path().join("slow-g16");
        std::fs::write(&exe, format!("#!/bin/sh\nsleep 1\ntouch '{}'\n", marker.display())).unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        let launcher = GaussianLauncher::with_executable(exe.display().to_string());
        let child = launcher.launch(dir.path(), &dir.path().join("Job_x.com")).unwrap();
        drop(child);

        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }
}
