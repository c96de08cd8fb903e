//! # 增量日志过滤器
//!
//! 把 Gaussian 日志中 link 608 的大段泛函细节剔除后再写入输出文件。
//!
//! 过滤按行进行，状态只会向前推进：
//! ```text
//! BeforeDetail --(Enter ...l608.exe)--> InDetail --Leave Link 608 at ...--> AfterDetail
//! ```
//! 标记行本身及其间的所有内容都被丢弃。`BeforeDetail` 阶段还会丢弃
//! 四行的 "Additional overlay cards" 回显。
//!
//! 未以换行结束的尾部会保留到下一块数据，因此输出与分块方式无关。
//!
//! ## 依赖关系
//! - 被 `job/sync.rs` 使用

use regex::Regex;
use std::sync::LazyLock;

static ENTER_L608_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*\(Enter\s+\S*l608\.exe\)\s*$").expect("valid l608 enter regex")
});

static LEAVE_L608_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*Leave\s+Link\s+608\s+at\s").expect("valid l608 leave regex")
});

const OVERLAY_ECHO_HEADER: &str = "Additional overlay cards:";
/// 回显头之后还需丢弃的行数（分隔线、卡片、分隔线）
const OVERLAY_ECHO_TAIL: usize = 3;

/// 过滤器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    BeforeDetail,
    InDetail,
    AfterDetail,
}

/// 按行工作的日志过滤器
#[derive(Debug)]
pub struct LogFilter {
    state: FilterState,
    pending: Vec<u8>,
    overlay_skip: usize,
}

impl Default for LogFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl LogFilter {
    pub fn new() -> Self {
        LogFilter {
            state: FilterState::BeforeDetail,
            pending: Vec::new(),
            overlay_skip: 0,
        }
    }

    pub fn state(&self) -> FilterState {
        self.state
    }

    /// 输入一块新读到的字节，返回可以输出的文本
    pub fn feed(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let Some(last_newline) = self.pending.iter().rposition(|&b| b == b'\n') else {
            return String::new();
        };

        let complete: Vec<u8> = self.pending.drain(..=last_newline).collect();
        let mut out = String::new();
        for line in complete.split_inclusive(|&b| b == b'\n') {
            self.process_line(&String::from_utf8_lossy(line), &mut out);
        }
        out
    }

    /// 输出残留的不完整行
    pub fn finish(&mut self) -> String {
        let mut out = String::new();
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.process_line(&String::from_utf8_lossy(&rest), &mut out);
        }
        out
    }

    fn process_line(&mut self, line: &str, out: &mut String) {
        let content = line.trim_end_matches(['\n', '\r']);

        match self.state {
            FilterState::BeforeDetail => {
                if self.overlay_skip > 0 {
                    self.overlay_skip -= 1;
                } else if content.trim() == OVERLAY_ECHO_HEADER {
                    self.overlay_skip = OVERLAY_ECHO_TAIL;
                } else if ENTER_L608_RE.is_match(content) {
                    self.state = FilterState::InDetail;
                } else {
                    out.push_str(line);
                }
            }
            FilterState::InDetail => {
                if LEAVE_L608_RE.is_match(content) {
                    self.state = FilterState::AfterDetail;
                }
            }
            FilterState::AfterDetail => out.push_str(line),
        }
    }
}

/// 一次性过滤完整文本
#[cfg(test)]
pub(crate) fn filter_log(text: &str) -> String {
    let mut filter = LogFilter::new();
    let mut out = filter.feed(text.as_bytes());
    out.push_str(&filter.finish());
    out
}
