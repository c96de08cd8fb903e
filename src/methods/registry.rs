//! # 方法注册表
//!
//! 静态的关键字表：xDH 双杂化泛函、DFT+D 泛函及纯色散关键字。
//! 所有表在编译期确定，运行时只读。
//!
//! ## 依赖关系
//! - 被 `methods/resolver.rs`, `models/energy.rs` 使用
//! - 使用 `dispersion/engine.rs` 中的 `DispersionModel`

use crate::dispersion::DispersionModel;

/// xDH 方法的七个能量分量系数，顺序固定：
/// Ex[HF], Ex[LDA], Ex[GGA], Ec[LDA], Ec[GGA], Ec[osPT2], Ec[ssPT2]
pub type Coefficients = [f64; 7];

/// 分量名称，与 `Coefficients` 顺序一致
pub const COMPONENT_NAMES: [&str; 7] = [
    "Ex[HF]", "Ex[LDA]", "Ex[GGA]", "Ec[LDA]", "Ec[GGA]", "Ec[osPT2]", "Ec[ssPT2]",
];

/// 双杂化方法家族：共享同一次 SCF/MP2 计算
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HybridFamily {
    pub name: &'static str,
    /// 提供 KS 轨道的基础泛函
    pub base_functional: &'static str,
    /// link 608 中三次泛函评估使用的 IOp 卡片
    pub functional_cards: [&'static str; 3],
}

/// 单个双杂化方法
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridMethodSpec {
    pub name: &'static str,
    pub family: &'static HybridFamily,
    pub coefficients: Coefficients,
}

impl HybridMethodSpec {
    pub fn base_functional(&self) -> &'static str {
        self.family.base_functional
    }

    /// 同家族的其余方法（按注册顺序）
    pub fn siblings(&self) -> impl Iterator<Item = &'static HybridMethodSpec> + '_ {
        family_members(self.family.name).filter(move |m| m.name != self.name)
    }
}

pub static XDH_B3LYP: HybridFamily = HybridFamily {
    name: "xDH@B3LYP",
    base_functional: "B3LYP",
    functional_cards: ["100", "205", "402"],
};

pub static XDH_PBE0: HybridFamily = HybridFamily {
    name: "xDH@PBE0",
    base_functional: "PBE1PBE",
    functional_cards: ["100", "1000", "9"],
};

#[rustfmt::skip]
pub static HYBRID_METHODS: [HybridMethodSpec; 7] = [
    HybridMethodSpec { name: "XYG3",    family: &XDH_B3LYP, coefficients: [0.8033, -0.0140,  0.2107, 0.0000, 0.6789, 0.3211, 0.3211] },
    HybridMethodSpec { name: "XYGJ-OS", family: &XDH_B3LYP, coefficients: [0.7731,  0.2269,  0.0000, 0.2309, 0.2754, 0.4364, 0.0000] },
    HybridMethodSpec { name: "revXYG3", family: &XDH_B3LYP, coefficients: [0.9196, -0.0222,  0.1026, 0.0000, 0.6059, 0.3941, 0.3941] },
    HybridMethodSpec { name: "XYG5",    family: &XDH_B3LYP, coefficients: [0.9150,  0.0612,  0.0238, 0.0000, 0.4957, 0.4548, 0.2764] },
    HybridMethodSpec { name: "XYG6",    family: &XDH_B3LYP, coefficients: [0.9105,  0.1576, -0.0681, 0.1800, 0.2244, 0.4695, 0.2426] },
    HybridMethodSpec { name: "XYG7",    family: &XDH_B3LYP, coefficients: [0.8971,  0.2055, -0.1408, 0.4056, 0.1159, 0.4052, 0.2589] },
    HybridMethodSpec { name: "XDHPBE0", family: &XDH_PBE0,  coefficients: [0.8335,  0.1665,  0.1665, 0.5292, 0.5292, 0.5428, 0.0000] },
];

/// 按名称查找双杂化方法（大小写不敏感）
pub fn find_hybrid(name: &str) -> Option<&'static HybridMethodSpec> {
    HYBRID_METHODS
        .iter()
        .find(|m| m.name.eq_ignore_ascii_case(name))
}

/// 某个家族的全部方法
pub fn family_members(family: &str) -> impl Iterator<Item = &'static HybridMethodSpec> + '_ {
    HYBRID_METHODS.iter().filter(move |m| m.family.name == family)
}

/// DFT+D 关键字：(关键字, s6, 基础泛函)
#[rustfmt::skip]
pub const DFTD_METHODS: [(&str, f64, &str); 11] = [
    ("b3lyp+d",  1.05, "b3lyp"),
    ("b971+d",   0.65, "b971"),
    ("b972+d",   1.05, "b972"),
    ("bmk+d",    0.65, "bmk"),
    ("blyp+d",   1.20, "blyp"),
    ("m062x+d",  0.06, "m062x"),
    ("pbe+d",    0.75, "pbepbe"),
    ("pbepbe+d", 0.75, "pbepbe"),
    ("pbe0+d",   0.70, "pbe0"),
    ("tpss+d",   1.00, "tpss"),
    ("x3lyp+d",  0.85, "x3lyp"),
];

/// 按关键字查找 DFT+D 方法，返回 (s6, 基础泛函)
pub fn find_dftd(keyword: &str) -> Option<(f64, &'static str)> {
    DFTD_METHODS
        .iter()
        .find(|(key, _, _)| key.eq_ignore_ascii_case(keyword))
        .map(|&(_, s6, base)| (s6, base))
}

/// 纯色散关键字：长短两种写法
#[rustfmt::skip]
const DISPERSION_KEYWORDS: [(&str, &str, DispersionModel); 5] = [
    ("disp_g",   "dispersion_g",   DispersionModel::SixDamped),
    ("disp_6",   "dispersion_6",   DispersionModel::SixUndamped),
    ("disp_12",  "dispersion_12",  DispersionModel::TwelveUndamped),
    ("disp",     "dispersion",     DispersionModel::SixPlusTwelve),
    ("disp_12s", "dispersion_12s", DispersionModel::TwelveDamped),
];

/// 按关键字查找纯色散模型
pub fn find_dispersion(keyword: &str) -> Option<DispersionModel> {
    DISPERSION_KEYWORDS
        .iter()
        .find(|(short, long, _)| {
            short.eq_ignore_ascii_case(keyword) || long.eq_ignore_ascii_case(keyword)
        })
        .map(|&(_, _, model)| model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_hybrid_case_insensitive() {
        assert_eq!(find_hybrid("xyg3").unwrap().name, "XYG3");
        assert_eq!(find_hybrid("XYGJ-os").unwrap().name, "XYGJ-OS");
        assert_eq!(find_hybrid("revxyg3").unwrap().name, "revXYG3");
        assert!(find_hybrid("b3lyp").is_none());
    }

    #[test]
    fn test_family_members() {
        let names: Vec<_> = family_members("xDH@B3LYP").map(|m| m.name).collect();
        assert_eq!(names, ["XYG3", "XYGJ-OS", "revXYG3", "XYG5", "XYG6", "XYG7"]);

        let xyg3 = find_hybrid("XYG3").unwrap();
        assert_eq!(xyg3.siblings().count(), 5);
        assert!(xyg3.siblings().all(|m| m.name != "XYG3"));

        let pbe0 = find_hybrid("XDHPBE0").unwrap();
        assert_eq!(pbe0.siblings().count(), 0);
        assert_eq!(pbe0.base_functional(), "PBE1PBE");
    }

    #[test]
    fn test_dftd_lookup() {
        assert_eq!(find_dftd("B3LYP+D"), Some((1.05, "b3lyp")));
        assert_eq!(find_dftd("pbe+d"), Some((0.75, "pbepbe")));
        assert_eq!(find_dftd("b3lyp"), None);
    }

    #[test]
    fn test_dispersion_lookup() {
        assert_eq!(find_dispersion("DISP_G"), Some(DispersionModel::SixDamped));
        assert_eq!(find_dispersion("dispersion"), Some(DispersionModel::SixPlusTwelve));
        assert_eq!(find_dispersion("disp_12s"), Some(DispersionModel::TwelveDamped));
        assert_eq!(find_dispersion("disp_7"), None);
    }
}
