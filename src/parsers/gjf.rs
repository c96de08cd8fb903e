//! # Gaussian 输入文件解析器
//!
//! 读写 Gaussian 输入文件 (.gjf / .com)。
//!
//! ## 输入格式说明
//! ```text
//! %nprocshared=8          # Link 0 命令（可选，多行）
//! %mem=4GB
//! #p XYG3/6-311+G(3df,2p) # 路由段，可跨多行，空行结束
//!
//! water                   # 标题段，空行结束
//!
//! 0 1                     # 电荷 自旋多重度
//! O   0.000   0.000   0.117
//! H   0.000   0.757  -0.470
//! H   0.000  -0.757  -0.470
//!                         # 空行后为附加段（基组、赝势等）
//! ```
//!
//! 多个作业用 `--Link1--` 分隔。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs`, `commands/run.rs` 使用
//! - 使用 `methods/resolver.rs` 的 `OptionList`
//! - 使用 `models/geometry.rs`

use crate::error::{Result, XdhError};
use crate::methods::OptionList;
use crate::models::{Atom, Geometry};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static LINK1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)--link1--").expect("valid Link1 regex"));

/// 路由段前缀（`#`, `#p`, `#n`, `#t`）
const ROUTE_PREFIXES: [&str; 4] = ["#", "#p", "#n", "#t"];

/// 一个 Gaussian 作业的输入
#[derive(Debug, Clone, PartialEq)]
pub struct InputDeck {
    pub name: String,
    pub link0: Vec<String>,
    pub route_prefix: String,
    pub options: OptionList,
    pub title: Vec<String>,
    pub charge: i32,
    pub multiplicity: u32,
    /// 分子说明段原文
    pub molecule: Vec<String>,
    /// 分子说明之后的附加段，按空行分块
    pub sections: Vec<Vec<String>>,
    /// ExtraOverlay 卡片，写在路由段之后
    pub overlay_cards: Vec<String>,
}

/// 按 `--Link1--` 拆分输入文件内容
pub fn split_link1(content: &str) -> Vec<String> {
    LINK1_RE
        .split(content)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 读取输入文件，返回其中全部作业
pub fn parse_gjf_file(path: &Path) -> Result<Vec<InputDeck>> {
    let content = fs::read_to_string(path).map_err(|e| XdhError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");

    let jobs = split_link1(&content);
    if jobs.len() <= 1 {
        return Ok(vec![InputDeck::parse(&content, stem)?]);
    }

    jobs.iter()
        .enumerate()
        .map(|(i, job)| InputDeck::parse(job, &format!("{}_link{}", stem, i)))
        .collect()
}

impl InputDeck {
    /// 从单个作业文本解析
    pub fn parse(content: &str, name: &str) -> Result<Self> {
        let err = |reason: String| XdhError::ParseError {
            format: "gjf".to_string(),
            path: name.to_string(),
            reason,
        };

        let lines: Vec<&str> = content.lines().collect();
        let mut idx = 0;

        while idx < lines.len() && lines[idx].trim().is_empty() {
            idx += 1;
        }

        // Link 0
        let mut link0 = Vec::new();
        while idx < lines.len() && lines[idx].trim_start().starts_with('%') {
            link0.push(lines[idx].trim().to_string());
            idx += 1;
        }

        // 路由段
        if idx >= lines.len() || !lines[idx].trim_start().starts_with('#') {
            return Err(err("Missing route section starting with '#'".to_string()));
        }
        let mut route = String::new();
        while idx < lines.len() && !lines[idx].trim().is_empty() {
            route.push(' ');
            route.push_str(lines[idx].trim());
            idx += 1;
        }
        let (route_prefix, options) = split_route(&route);
        idx += 1;

        // ExtraOverlay 卡片
        let mut overlay_cards = Vec::new();
        if options.contains_keyword("extraoverlay") {
            while idx < lines.len() && !lines[idx].trim().is_empty() {
                overlay_cards.push(lines[idx].trim().to_string());
                idx += 1;
            }
            idx += 1;
        }

        // 标题段
        let mut title = Vec::new();
        while idx < lines.len() && !lines[idx].trim().is_empty() {
            title.push(lines[idx].trim().to_string());
            idx += 1;
        }
        idx += 1;

        // 电荷与自旋多重度
        let cm_line = lines
            .get(idx)
            .ok_or_else(|| err("Missing charge and multiplicity".to_string()))?;
        let cm: Vec<&str> = cm_line.split_whitespace().collect();
        if cm.len() < 2 {
            return Err(err(format!("Invalid charge/multiplicity line: '{}'", cm_line)));
        }
        let charge: i32 = cm[0]
            .parse()
            .map_err(|_| err(format!("Invalid charge: {}", cm[0])))?;
        let multiplicity: u32 = cm[1]
            .parse()
            .map_err(|_| err(format!("Invalid multiplicity: {}", cm[1])))?;
        idx += 1;

        // 分子说明
        let mut molecule = Vec::new();
        while idx < lines.len() && !lines[idx].trim().is_empty() {
            molecule.push(lines[idx].trim().to_string());
            idx += 1;
        }

        // 附加段
        let mut sections = Vec::new();
        let mut block = Vec::new();
        for line in lines.iter().skip(idx) {
            if line.trim().is_empty() {
                if !block.is_empty() {
                    sections.push(std::mem::take(&mut block));
                }
            } else {
                block.push(line.trim_end().to_string());
            }
        }
        if !block.is_empty() {
            sections.push(block);
        }

        Ok(InputDeck {
            name: name.to_string(),
            link0,
            route_prefix,
            options,
            title,
            charge,
            multiplicity,
            molecule,
            sections,
            overlay_cards,
        })
    }

    /// 是否启用了溶剂模型
    pub fn uses_solvation(&self) -> bool {
        self.options.contains_keyword("scrf")
    }

    /// 将分子说明段解析为笛卡尔坐标几何结构
    ///
    /// 接受 `El x y z` 与 `El flag x y z` 两种写法，坐标后的 ONIOM 层标记等字段忽略；
    /// Z-矩阵不支持。
    pub fn geometry(&self) -> Result<Geometry> {
        let err = |reason: String| XdhError::ParseError {
            format: "gjf".to_string(),
            path: self.name.clone(),
            reason,
        };

        if self.molecule.is_empty() {
            return Err(err("Empty molecule specification".to_string()));
        }

        let atoms = self
            .molecule
            .iter()
            .map(|line| {
                let mut parts = line.split_whitespace();
                let first = parts.next().unwrap_or("");
                let label = first.split(['(', '-']).next().unwrap_or(first);

                let fields: Vec<&str> = parts
                    .take_while(|raw| raw.parse::<f64>().is_ok())
                    .collect();
                // 冻结标记是紧跟标签的整数
                let coords = match fields.as_slice() {
                    [flag, rest @ ..] if rest.len() >= 3 && flag.parse::<i32>().is_ok() => rest,
                    all => all,
                };
                if coords.len() < 3 {
                    return Err(err(format!("Not a Cartesian coordinate line: '{}'", line)));
                }

                let mut position = [0.0; 3];
                for (k, raw) in coords[..3].iter().enumerate() {
                    position[k] = raw
                        .parse()
                        .map_err(|_| err(format!("Invalid coordinate '{}' in '{}'", raw, line)))?;
                }
                Atom::from_label(label, position)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Geometry::new(self.name.clone(), atoms))
    }

    /// 追加一个附加段（如 xDH 泛函卡片）
    pub fn append_section(&mut self, block: Vec<String>) {
        if !block.is_empty() {
            self.sections.push(block);
        }
    }

    /// 生成 Gaussian 输入文本
    pub fn render(&self) -> String {
        let mut out = String::new();

        for line in &self.link0 {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&format!("{} {}\n\n", self.route_prefix, self.options.to_route()));

        if !self.overlay_cards.is_empty() {
            for card in &self.overlay_cards {
                out.push_str(card);
                out.push('\n');
            }
            out.push('\n');
        }

        if self.title.is_empty() {
            out.push_str(&self.name);
            out.push('\n');
        } else {
            for line in &self.title {
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push('\n');

        out.push_str(&format!("{} {}\n", self.charge, self.multiplicity));
        for line in &self.molecule {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');

        for block in &self.sections {
            for line in block {
                out.push_str(line);
                out.push('\n');
            }
            out.push('\n');
        }
        out.push('\n');

        out
    }

    /// 写入输入文件
    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render()).map_err(|e| XdhError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })
    }
}

/// 拆分路由前缀与关键字
fn split_route(route: &str) -> (String, OptionList) {
    let mut tokens: Vec<String> = route.split_whitespace().map(str::to_string).collect();
    let first = tokens.first().cloned().unwrap_or_default();

    let prefix = if ROUTE_PREFIXES.iter().any(|p| p.eq_ignore_ascii_case(&first)) {
        tokens.remove(0);
        first.to_lowercase()
    } else if let Some(rest) = first.strip_prefix('#') {
        tokens[0] = rest.to_string();
        "#".to_string()
    } else {
        "#".to_string()
    };
    (prefix, OptionList::new(tokens))
}
