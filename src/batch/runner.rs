//! # 批量执行器
//!
//! 并行执行批量处理任务。
//!
//! ## 功能
//! - 基于 rayon 的并行迭代，结果保持输入顺序
//! - 进度条显示
//! - 错误收集与汇总报告
//!
//! ## 依赖关系
//! - 被 `commands/disp.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use crate::error::{Result, XdhError};
use crate::utils::progress;

use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// 单个文件处理结果
#[derive(Debug)]
pub enum ProcessResult<T> {
    Success(PathBuf, T),
    /// (文件路径, 错误信息)
    Failed(PathBuf, String),
}

/// 批量处理结果统计
#[derive(Debug)]
pub struct BatchResult<T> {
    pub successes: Vec<(PathBuf, T)>,
    pub failures: Vec<(PathBuf, String)>,
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        BatchResult {
            successes: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> BatchResult<T> {
    /// 合并处理结果
    pub fn merge(&mut self, result: ProcessResult<T>) {
        match result {
            ProcessResult::Success(path, value) => self.successes.push((path, value)),
            ProcessResult::Failed(path, err) => self.failures.push((path, err)),
        }
    }

    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }
}

/// 批量执行器
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
}

impl BatchRunner {
    /// `jobs` 为 0 时使用全部逻辑核
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// 并行处理文件列表
    pub fn run<T, F>(&self, files: Vec<PathBuf>, processor: F) -> Result<BatchResult<T>>
    where
        T: Send,
        F: Fn(&Path) -> Result<T> + Sync + Send,
    {
        let pb = progress::create_progress_bar(files.len() as u64, "Evaluating");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| XdhError::Other(anyhow::anyhow!("Failed to build thread pool: {}", e)))?;

        let results: Vec<ProcessResult<T>> = pool.install(|| {
            files
                .into_par_iter()
                .map(|file| {
                    let result = match processor(&file) {
                        Ok(value) => ProcessResult::Success(file, value),
                        Err(e) => ProcessResult::Failed(file, e.to_string()),
                    };
                    pb.inc(1);
                    result
                })
                .collect()
        });

        pb.finish_and_clear();

        let mut batch_result = BatchResult::default();
        for result in results {
            batch_result.merge(result);
        }
        Ok(batch_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_keeps_order_and_collects_failures() {
        let files: Vec<PathBuf> = (0..20).map(|i| PathBuf::from(format!("{}.xyz", i))).collect();

        let result = BatchRunner::new(4)
            .run(files, |path| {
                let stem: usize = path.file_stem().unwrap().to_str().unwrap().parse().unwrap();
                if stem % 5 == 0 {
                    Err(XdhError::InvalidArgument(format!("bad {}", stem)))
                } else {
                    Ok(stem * 2)
                }
            })
            .unwrap();

        assert_eq!(result.total(), 20);
        assert_eq!(result.failures.len(), 4);
        assert_eq!(result.successes[0], (PathBuf::from("1.xyz"), 2));
        let values: Vec<usize> = result.successes.iter().map(|(_, v)| *v).collect();
        assert!(values.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_zero_jobs_uses_all_cores() {
        assert_eq!(BatchRunner::new(0).jobs(), num_cpus::get());
        assert_eq!(BatchRunner::new(3).jobs(), 3);
    }
}
