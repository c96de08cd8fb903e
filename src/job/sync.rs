//! # 作业同步器
//!
//! 启动外部计算后，在其运行期间把不断增长的日志增量地过滤并写入输出。
//!
//! ## 状态流转
//! ```text
//! NotStarted -> launch -> Running(cursor = 0)
//!   Running: 日志不存在 -> 等待; 存在 -> 读取新增字节、过滤、输出、前移游标; 休眠
//!   进程退出 -> 最后一次读取 -> Done
//! ```
//!
//! 子进程和读取游标归一个 tokio 任务独占，通过 mpsc 通道把事件发给调用方；
//! 调用方是唯一的消费者，负责写入输出流。
//!
//! ## 依赖关系
//! - 使用 `job/filter.rs`, `job/launcher.rs`
//! - 被 `commands/run.rs` 使用

use super::filter::{FilterState, LogFilter};
use super::launcher::JobLauncher;
use crate::error::{Result, XdhError};
use std::io::{self, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::process::Child;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// 默认同步间隔（秒）
pub const DEFAULT_SYNC_INTERVAL: u64 = 6;

/// 同步配置
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// 两次读取之间的间隔；为 0 时只在进程结束后读取一次
    pub interval: Duration,
    /// 输出级别；小于 2 时删除临时目录
    pub print_level: u8,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            interval: Duration::from_secs(DEFAULT_SYNC_INTERVAL),
            print_level: 1,
        }
    }
}

/// 一次作业涉及的文件路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPaths {
    pub name: String,
    pub workdir: PathBuf,
    /// 临时目录 `<workdir>/.xdh_<name>`
    pub scratch: PathBuf,
    /// Gaussian 输入 `Job_<name>.com`
    pub input: PathBuf,
    /// 临时目录中的日志
    pub scratch_log: PathBuf,
    /// 复制到工作目录的日志
    pub log: PathBuf,
}

impl JobPaths {
    pub fn new(workdir: &Path, name: &str) -> Self {
        let scratch = workdir.join(format!(".xdh_{}", name));
        JobPaths {
            name: name.to_string(),
            workdir: workdir.to_path_buf(),
            input: scratch.join(format!("Job_{}.com", name)),
            scratch_log: scratch.join(format!("Job_{}.log", name)),
            log: workdir.join(format!("Job_{}.log", name)),
            scratch,
        }
    }
}

/// 同步任务发出的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// 过滤后的新日志文本
    Chunk(String),
    /// 日志尚未出现
    Waiting,
}

/// 作业结束后的结果
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub status: ExitStatus,
    /// 工作目录中的日志副本
    pub log: PathBuf,
    /// 从日志中读取的总字节数
    pub bytes_read: u64,
}

/// 日志读取游标，只会前移
#[derive(Debug)]
struct LogCursor {
    path: PathBuf,
    offset: u64,
    filter: LogFilter,
}

impl LogCursor {
    fn new(path: PathBuf) -> Self {
        LogCursor {
            path,
            offset: 0,
            filter: LogFilter::new(),
        }
    }

    /// 读取上次位置之后的新字节并过滤；没有新内容时返回 `None`
    async fn drain(&mut self) -> io::Result<Option<String>> {
        let mut file = fs::File::open(&self.path).await?;
        file.seek(SeekFrom::Start(self.offset)).await?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf).await?;
        if buf.is_empty() {
            return Ok(None);
        }

        self.offset += buf.len() as u64;
        Ok(Some(self.filter.feed(&buf)))
    }
}

/// 作业同步器
pub struct JobSynchronizer<L: JobLauncher> {
    launcher: L,
    config: SyncConfig,
}

impl<L: JobLauncher> JobSynchronizer<L> {
    pub fn new(launcher: L, config: SyncConfig) -> Self {
        JobSynchronizer { launcher, config }
    }

    /// 运行作业并把过滤后的日志写入 `sink`
    ///
    /// 输入文件需已写入 `paths.input`。返回时日志已复制到工作目录，
    /// 并按输出级别清理临时目录。
    pub async fn run<W: Write>(&self, paths: &JobPaths, sink: &mut W) -> Result<JobOutcome> {
        let child = self.launcher.launch(&paths.scratch, &paths.input)?;
        info!(
            "{} started for {} (pid {:?})",
            self.launcher.command(),
            paths.name,
            child.id()
        );

        let (tx, mut rx) = mpsc::channel(64);
        let cursor = LogCursor::new(paths.scratch_log.clone());
        let handle = tokio::spawn(drive(
            child,
            cursor,
            self.config.interval,
            self.launcher.command().to_string(),
            tx,
        ));

        let mut write_error = None;
        while let Some(event) = rx.recv().await {
            match event {
                SyncEvent::Chunk(text) => {
                    if let Err(e) = sink.write_all(text.as_bytes()).and_then(|_| sink.flush()) {
                        write_error = Some(e);
                        break;
                    }
                }
                SyncEvent::Waiting => {
                    debug!("waiting for {}", paths.scratch_log.display());
                }
            }
        }

        if let Some(e) = write_error {
            // 取消同步任务会丢弃子进程，启动器设置了 kill_on_drop
            handle.abort();
            let _ = handle.await;
            warn!(
                "output of {} is not writable, {} was stopped",
                paths.name,
                self.launcher.command()
            );
            if let Err(copy_err) = fs::copy(&paths.scratch_log, &paths.log).await {
                debug!("no partial log kept for {}: {}", paths.name, copy_err);
            }
            remove_scratch(paths, self.config.print_level).await;
            return Err(XdhError::FileWriteError {
                path: format!("output of {}", paths.name),
                source: e,
            });
        }

        let (status, bytes_read) = handle
            .await
            .map_err(|e| XdhError::Other(anyhow::Error::new(e)))??;

        info!(
            "{} finished for {} with {} ({} bytes of log)",
            self.launcher.command(),
            paths.name,
            status,
            bytes_read
        );

        collect_log(paths, self.config.print_level).await?;

        Ok(JobOutcome {
            status,
            log: paths.log.clone(),
            bytes_read,
        })
    }
}

/// 同步任务主体：独占子进程与游标
async fn drive(
    mut child: Child,
    mut cursor: LogCursor,
    interval: Duration,
    command: String,
    tx: mpsc::Sender<SyncEvent>,
) -> Result<(ExitStatus, u64)> {
    let status = loop {
        if interval.is_zero() {
            break child.wait().await.map_err(|e| XdhError::CommandFailed {
                command: command.clone(),
                stderr: e.to_string(),
            })?;
        }

        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(e) => {
                return Err(XdhError::CommandFailed {
                    command,
                    stderr: e.to_string(),
                })
            }
        }

        match cursor.drain().await {
            Ok(Some(text)) => send_chunk(&tx, text).await,
            Ok(None) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let _ = tx.send(SyncEvent::Waiting).await;
            }
            Err(e) => warn!("failed to read {}: {}", cursor.path.display(), e),
        }

        tokio::time::sleep(interval).await;
    };

    // 进程已退出：最后一次读取
    match cursor.drain().await {
        Ok(Some(text)) => send_chunk(&tx, text).await,
        Ok(None) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(XdhError::LogNotProduced {
                path: cursor.path.display().to_string(),
            })
        }
        Err(e) => {
            return Err(XdhError::FileReadError {
                path: cursor.path.display().to_string(),
                source: e,
            })
        }
    }
    if cursor.filter.state() == FilterState::InDetail {
        warn!(
            "{} ended inside the link 608 block, its tail was not copied to the output",
            cursor.path.display()
        );
    }
    send_chunk(&tx, cursor.filter.finish()).await;

    Ok((status, cursor.offset))
}

async fn send_chunk(tx: &mpsc::Sender<SyncEvent>, text: String) {
    if !text.is_empty() {
        let _ = tx.send(SyncEvent::Chunk(text)).await;
    }
}

/// 把日志复制到工作目录，并在输出级别小于 2 时删除临时目录
async fn collect_log(paths: &JobPaths, print_level: u8) -> Result<()> {
    fs::copy(&paths.scratch_log, &paths.log)
        .await
        .map_err(|e| XdhError::FileWriteError {
            path: paths.log.display().to_string(),
            source: e,
        })?;

    remove_scratch(paths, print_level).await;
    Ok(())
}

async fn remove_scratch(paths: &JobPaths, print_level: u8) {
    if print_level < 2 {
        if let Err(e) = fs::remove_dir_all(&paths.scratch).await {
            warn!("failed to remove {}: {}", paths.scratch.display(), e);
        }
    } else {
        debug!("keeping scratch directory {}", paths.scratch.display());
    }
}
