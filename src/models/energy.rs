//! # 能量分量数据模型
//!
//! 一次 Gaussian 运行日志中提取的全部能量分量，以及由其线性组合得到的
//! xDH 能量。分量只解析一次，同家族的所有方法共用。
//!
//! ## 依赖关系
//! - 被 `parsers/gaussian_log.rs` 构造
//! - 使用 `methods/registry.rs` 中的系数
//! - 被 `commands/run.rs`, `utils/report.rs` 使用

use crate::methods::HybridMethodSpec;
use serde::Serialize;

/// 单次 DFT 评估的交换/相关能
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct XcPass {
    /// 不含交换相关的能量 (ENTVJ)
    pub e_no_xc: f64,
    pub exchange: f64,
    pub correlation: f64,
}

/// xDH 所需的能量分量
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyComponents {
    /// SCF 方法名（已规范化，如 B3LYP）
    pub scf_method: String,
    /// SCF 能量 (A.U.)
    pub scf_energy: f64,
    pub scf_cycles: u32,

    /// 三次评估：HF 交换、LDA、GGA
    pub hf: XcPass,
    pub lda: XcPass,
    pub gga: XcPass,

    /// 同自旋与异自旋 PT2 相关能
    pub os_pt2: f64,
    pub ss_pt2: f64,

    /// 溶剂化自由能校正，仅在使用溶剂模型时存在
    pub solvation: Option<f64>,
}

impl EnergyComponents {
    /// 参考能量：不含交换相关的 SCF 能量（加溶剂化校正）
    pub fn reference_energy(&self) -> f64 {
        self.hf.e_no_xc + self.solvation.unwrap_or(0.0)
    }

    /// 按固定顺序排列的七个分量
    pub fn ordered(&self) -> [f64; 7] {
        [
            self.hf.exchange,
            self.lda.exchange,
            self.gga.exchange,
            self.lda.correlation,
            self.gga.correlation,
            self.os_pt2,
            self.ss_pt2,
        ]
    }

    /// 计算某个 xDH 方法的能量
    pub fn hybrid_energy(&self, spec: &HybridMethodSpec) -> f64 {
        self.ordered()
            .iter()
            .zip(spec.coefficients.iter())
            .fold(self.reference_energy(), |acc, (comp, coeff)| acc + comp * coeff)
    }

    /// 计算主方法及其同家族方法的能量，主方法在前
    pub fn family_energies(&self, primary: &'static HybridMethodSpec) -> Vec<HybridEnergy> {
        std::iter::once(primary)
            .chain(primary.siblings())
            .map(|spec| HybridEnergy {
                method: spec.name.to_string(),
                family: spec.family.name.to_string(),
                energy: self.hybrid_energy(spec),
            })
            .collect()
    }
}

/// 单个 xDH 方法的能量
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HybridEnergy {
    pub method: String,
    pub family: String,
    pub energy: f64,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// 固定的分量样本
    pub fn components() -> EnergyComponents {
        EnergyComponents {
            scf_method: "B3LYP".to_string(),
            scf_energy: -76.4332,
            scf_cycles: 10,
            hf: XcPass {
                e_no_xc: -67.5,
                exchange: -8.9,
                correlation: 0.0,
            },
            lda: XcPass {
                e_no_xc: -67.5,
                exchange: -8.1,
                correlation: -0.9,
            },
            gga: XcPass {
                e_no_xc: -67.5,
                exchange: -8.95,
                correlation: -0.33,
            },
            os_pt2: -0.20,
            ss_pt2: -0.07,
            solvation: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::components;
    use super::*;
    use crate::methods::registry::find_hybrid;

    #[test]
    fn test_hybrid_energy_linear_combination() {
        let comps = components();
        let xyg3 = find_hybrid("XYG3").unwrap();

        let expected = -67.5
            + 0.8033 * -8.9
            + -0.0140 * -8.1
            + 0.2107 * -8.95
            + 0.0 * -0.9
            + 0.6789 * -0.33
            + 0.3211 * -0.20
            + 0.3211 * -0.07;
        assert!((comps.hybrid_energy(xyg3) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_family_members_differ_only_by_coefficients() {
        let comps = components();
        let xyg3 = find_hybrid("XYG3").unwrap();
        let xygjos = find_hybrid("XYGJ-OS").unwrap();

        let energies = comps.family_energies(xyg3);
        assert_eq!(energies.len(), 6);
        assert_eq!(energies[0].method, "XYG3");
        assert_eq!(energies[1].method, "XYGJ-OS");

        let diff: f64 = comps
            .ordered()
            .iter()
            .zip(xyg3.coefficients.iter().zip(xygjos.coefficients.iter()))
            .map(|(c, (a, b))| c * (a - b))
            .sum();
        assert!(((energies[0].energy - energies[1].energy) - diff).abs() < 1e-12);
    }

    #[test]
    fn test_solvation_shifts_reference() {
        let mut comps = components();
        let xyg3 = find_hybrid("XYG3").unwrap();
        let dry = comps.hybrid_energy(xyg3);

        comps.solvation = Some(-0.0123);
        assert!((comps.reference_energy() - (-67.5123)).abs() < 1e-12);
        assert!((comps.hybrid_energy(xyg3) - (dry - 0.0123)).abs() < 1e-12);
    }
}
