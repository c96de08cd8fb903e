//! # 方法解析器
//!
//! 从路由关键字列表中识别至多一个色散或 xDH 关键字，取出后把对应的
//! 基础泛函（保留 `/基组` 后缀）写回列表，使下游仍然请求一个合法的
//! Gaussian 基态计算。
//!
//! 匹配规则：按列表顺序第一个命中的关键字生效，大小写不敏感。
//!
//! ## 依赖关系
//! - 使用 `methods/registry.rs`
//! - 被 `commands/run.rs` 使用

use super::registry::{self, HybridMethodSpec};
use crate::dispersion::DispersionModel;
use crate::error::{Result, XdhError};

/// 单点计算附加的 overlay 卡片（全电子）
const OVERLAY_ALL_ELECTRON: [&str; 3] = ["8/7=1,10=90/1;", "9/16=-1/6;", "6//8;"];
/// 单点计算附加的 overlay 卡片（冻核）
const OVERLAY_FROZEN_CORE: [&str; 3] = ["8/7=1,10=4/1;", "9/16=-1/6;", "6//8;"];
/// xDH 单点计算追加的路由关键字
const HYBRID_EXTRA_OPTIONS: [&str; 3] = ["IOP(5/33=1)", "NoSymm", "ExtraOverlay"];
/// xDH 单点计算中由本程序接管、从路由中移除的关键字
const HYBRID_DROPPED_KEYWORDS: [&str; 2] = ["extraoverlay", "oniom"];

/// 路由关键字列表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionList {
    tokens: Vec<String>,
}

impl OptionList {
    pub fn new(tokens: Vec<String>) -> Self {
        OptionList { tokens }
    }

    /// 按空白切分路由行
    pub fn from_route(route: &str) -> Self {
        OptionList {
            tokens: route.split_whitespace().map(str::to_string).collect(),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn push(&mut self, token: impl Into<String>) {
        self.tokens.push(token.into());
    }

    fn remove(&mut self, index: usize) -> String {
        self.tokens.remove(index)
    }

    /// 是否包含某个关键字（忽略 `=...` 与 `(...)` 选项）
    pub fn contains_keyword(&self, keyword: &str) -> bool {
        self.tokens.iter().any(|t| {
            let head = t.split(['=', '(']).next().unwrap_or("");
            head.eq_ignore_ascii_case(keyword)
        })
    }

    pub fn to_route(&self) -> String {
        self.tokens.join(" ")
    }
}

/// xDH 计算请求
#[derive(Debug, Clone, PartialEq)]
pub struct HybridRequest {
    pub spec: &'static HybridMethodSpec,
    pub frozen_core: bool,
    /// ExtraOverlay 卡片
    pub overlay_cards: Vec<String>,
    /// 追加在输入文件末尾的泛函卡片
    pub trailing_cards: Vec<String>,
}

/// 方法解析结果
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// 未识别到任何关键字
    None,
    /// 纯色散计算，不调用 Gaussian
    PureDispersion { model: DispersionModel },
    /// DFT+D：色散作为校正叠加到 Gaussian 基态能量上
    DftD {
        method: String,
        s6: f64,
        functional: &'static str,
    },
    /// xDH 双杂化计算
    Hybrid(HybridRequest),
}

impl Resolution {
    /// 色散项的缩放因子；未启用时为 0，不贡献任何能量
    pub fn dispersion_scale(&self) -> f64 {
        match self {
            Resolution::PureDispersion { .. } => 1.0,
            Resolution::DftD { s6, .. } => *s6,
            Resolution::None | Resolution::Hybrid(_) => 0.0,
        }
    }

    /// 需要计算的色散模型
    pub fn dispersion_model(&self) -> Option<DispersionModel> {
        match self {
            Resolution::PureDispersion { model } => Some(*model),
            Resolution::DftD { .. } => Some(DispersionModel::SixDamped),
            Resolution::None | Resolution::Hybrid(_) => None,
        }
    }

    /// 用于输出的方法名
    pub fn method_name(&self) -> String {
        match self {
            Resolution::None => "none".to_string(),
            Resolution::PureDispersion { model } => model.label().to_string(),
            Resolution::DftD { method, .. } => method.to_uppercase(),
            Resolution::Hybrid(req) => req.spec.name.to_string(),
        }
    }
}

/// 关键字拆分为 (方法名, 基组后缀)
fn split_basis(token: &str) -> (&str, Option<&str>) {
    match token.split_once('/') {
        Some((head, suffix)) => (head.trim(), Some(suffix.trim())),
        None => (token.trim(), None),
    }
}

/// 拆分 `XYG3(full)` 形式的方法修饰
fn split_modifier(head: &str) -> (&str, Option<&str>) {
    if let (Some(open), true) = (head.find('('), head.ends_with(')')) {
        (&head[..open], Some(&head[open + 1..head.len() - 1]))
    } else {
        (head, None)
    }
}

fn with_suffix(base: &str, suffix: Option<&str>) -> String {
    match suffix {
        Some(s) if !s.is_empty() => format!("{}/{}", base, s),
        _ => base.to_string(),
    }
}

/// 识别到的关键字
enum Matched {
    Hybrid(&'static HybridMethodSpec, Option<bool>),
    DftD(f64, &'static str),
    Dispersion(DispersionModel),
}

fn match_token(token: &str) -> Option<Matched> {
    let (head, _) = split_basis(token);
    let (name, modifier) = split_modifier(head);

    if let Some(spec) = registry::find_hybrid(name) {
        let full = modifier.map(|m| m.eq_ignore_ascii_case("full"));
        return Some(Matched::Hybrid(spec, full));
    }
    if let Some((s6, base)) = registry::find_dftd(head) {
        return Some(Matched::DftD(s6, base));
    }
    registry::find_dispersion(head).map(Matched::Dispersion)
}

fn is_dropped_keyword(token: &str) -> bool {
    let head = token.split(['=', '(']).next().unwrap_or("");
    HYBRID_DROPPED_KEYWORDS
        .iter()
        .any(|k| head.eq_ignore_ascii_case(k))
}

/// 解析路由关键字并改写列表
pub fn resolve(options: &mut OptionList) -> Result<Resolution> {
    let Some((index, matched)) = options
        .tokens()
        .iter()
        .enumerate()
        .find_map(|(i, t)| match_token(t).map(|m| (i, m)))
    else {
        return Ok(Resolution::None);
    };

    let token = options.remove(index);
    let (head, suffix) = split_basis(&token);

    if options.contains_keyword("opt") {
        return Err(XdhError::Unsupported(format!(
            "Geometry optimization with '{}'",
            head
        )));
    }

    let resolution = match matched {
        Matched::Dispersion(model) => {
            options.push(with_suffix(model.keyword(), suffix));
            Resolution::PureDispersion { model }
        }
        Matched::DftD(s6, functional) => {
            options.push(with_suffix(functional, suffix));
            Resolution::DftD {
                method: head.to_lowercase(),
                s6,
                functional,
            }
        }
        Matched::Hybrid(spec, modifier_full) => {
            let mut frozen_core = modifier_full.map(|full| !full).unwrap_or(true);

            // 独立的 fc / full 关键字只在 xDH 计算中消费
            let mut kept = Vec::with_capacity(options.tokens().len());
            for t in options.tokens() {
                if t.eq_ignore_ascii_case("fc") || is_dropped_keyword(t) {
                    continue;
                } else if t.eq_ignore_ascii_case("full") {
                    frozen_core = false;
                } else {
                    kept.push(t.clone());
                }
            }
            *options = OptionList::new(kept);

            options.push(with_suffix(spec.base_functional(), suffix));
            for extra in HYBRID_EXTRA_OPTIONS {
                options.push(extra);
            }

            let overlay = if frozen_core {
                OVERLAY_FROZEN_CORE
            } else {
                OVERLAY_ALL_ELECTRON
            };

            Resolution::Hybrid(HybridRequest {
                spec,
                frozen_core,
                overlay_cards: overlay.iter().map(|c| c.to_string()).collect(),
                trailing_cards: spec
                    .family
                    .functional_cards
                    .iter()
                    .map(|c| c.to_string())
                    .collect(),
            })
        }
    };

    Ok(resolution)
}
