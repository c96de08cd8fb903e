//! # 成对色散能计算
//!
//! 对所有无序原子对 (i<j) 求和，不设截断。系数按几何平均组合
//! `C_ij = sqrt(C_i · C_j)`，阻尼函数为 Fermi 型开关
//! `1 / (1 + exp(-d·(Rij/Rr − 1)))`，其中 `Rr = R0_i + R0_j`。
//!
//! 能量单位为 Hartree；梯度单位为 Hartree/Bohr，仅对六次阻尼模型提供。
//!
//! ## 依赖关系
//! - 使用 `dispersion/params.rs` 参数表
//! - 使用 `models/geometry.rs`
//! - 被 `commands/run.rs`, `commands/disp.rs` 使用

use super::params::{ElementTable, DEFAULT_DAMPING};
use crate::error::{Result, XdhError};
use crate::models::Geometry;

use serde::Serialize;

pub const BOHR_TO_ANGSTROM: f64 = 0.5291772083;
const ANGSTROM_TO_NM: f64 = 0.1;
const KCAL_TO_KJ: f64 = 4.184;
pub const HARTREE_TO_KCAL: f64 = 627.5095;

/// J·mol⁻¹·nm⁶ → Hartree·Å⁶
pub const SCALE6: f64 = 1.0e-3
    / (KCAL_TO_KJ * HARTREE_TO_KCAL)
    / (ANGSTROM_TO_NM * ANGSTROM_TO_NM * ANGSTROM_TO_NM * ANGSTROM_TO_NM * ANGSTROM_TO_NM * ANGSTROM_TO_NM);

/// J·mol⁻¹·nm¹² → Hartree·Å¹²
pub const SCALE12: f64 = SCALE6
    / (ANGSTROM_TO_NM * ANGSTROM_TO_NM * ANGSTROM_TO_NM * ANGSTROM_TO_NM * ANGSTROM_TO_NM * ANGSTROM_TO_NM);

/// 色散校正模型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DispersionModel {
    /// Grimme 六次阻尼项 (disp_g)
    SixDamped,
    /// 无阻尼六次项 (disp_6)
    SixUndamped,
    /// 无阻尼十二次项 (disp_12)
    TwelveUndamped,
    /// 无阻尼六次 + 十二次项 (disp)
    SixPlusTwelve,
    /// 阻尼十二次项 (disp_12s)，阻尼参数取 d/2
    TwelveDamped,
}

impl DispersionModel {
    pub const ALL: [DispersionModel; 5] = [
        DispersionModel::SixDamped,
        DispersionModel::SixUndamped,
        DispersionModel::TwelveUndamped,
        DispersionModel::SixPlusTwelve,
        DispersionModel::TwelveDamped,
    ];

    /// 输出中使用的能量标签
    pub fn label(&self) -> &'static str {
        match self {
            DispersionModel::SixDamped => "Disp_G",
            DispersionModel::SixUndamped => "Disp_6",
            DispersionModel::TwelveUndamped => "Disp_12",
            DispersionModel::SixPlusTwelve => "Disp",
            DispersionModel::TwelveDamped => "Disp_12s",
        }
    }

    /// 路由行中的规范关键字
    pub fn keyword(&self) -> &'static str {
        match self {
            DispersionModel::SixDamped => "disp_g",
            DispersionModel::SixUndamped => "disp_6",
            DispersionModel::TwelveUndamped => "disp_12",
            DispersionModel::SixPlusTwelve => "disp",
            DispersionModel::TwelveDamped => "disp_12s",
        }
    }

    pub fn uses_c6(&self) -> bool {
        matches!(
            self,
            DispersionModel::SixDamped | DispersionModel::SixUndamped | DispersionModel::SixPlusTwelve
        )
    }

    pub fn uses_c12(&self) -> bool {
        matches!(
            self,
            DispersionModel::TwelveUndamped
                | DispersionModel::SixPlusTwelve
                | DispersionModel::TwelveDamped
        )
    }

    /// 该模型实际使用的阻尼参数；无阻尼模型返回 None
    pub fn effective_damping(&self, d: f64) -> Option<f64> {
        match self {
            DispersionModel::SixDamped => Some(d),
            DispersionModel::TwelveDamped => Some(d / 2.0),
            _ => None,
        }
    }
}

impl std::fmt::Display for DispersionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Fermi 型阻尼函数
pub fn damp(d: f64, rij: f64, rr: f64) -> f64 {
    1.0 / (1.0 + (-d * (rij / rr - 1.0)).exp())
}

/// 阻尼函数对 Rij 的导数
fn damp_derivative(d: f64, rij: f64, rr: f64) -> f64 {
    let e = (-d * (rij / rr - 1.0)).exp();
    d * e / (rr * (1.0 + e).powi(2))
}

/// 几何平均组合规则
pub fn combine(ci: f64, cj: f64) -> f64 {
    (ci * cj).sqrt()
}

/// 单个原子对的贡献
#[derive(Debug, Clone, Serialize)]
pub struct PairTerm {
    pub i: usize,
    pub j: usize,
    pub zi: usize,
    pub zj: usize,
    /// 原子间距 (Å)
    pub rij: f64,
    /// 范德华半径之和 (Å)，仅阻尼模型
    pub rr: Option<f64>,
    pub c6: Option<f64>,
    pub c12: Option<f64>,
    pub damp: Option<f64>,
    /// 该原子对的能量贡献 (Hartree)
    pub energy: f64,
}

/// 一次色散计算的结果
#[derive(Debug, Clone, Serialize)]
pub struct DispersionResult {
    pub model: DispersionModel,
    pub energy: f64,
    pub pairs: Vec<PairTerm>,
}

/// 色散计算引擎
#[derive(Debug, Clone)]
pub struct DispersionEngine {
    table: ElementTable,
    damping: f64,
}

impl Default for DispersionEngine {
    fn default() -> Self {
        DispersionEngine::new(ElementTable::default(), DEFAULT_DAMPING)
    }
}

impl DispersionEngine {
    pub fn new(table: ElementTable, damping: f64) -> Self {
        DispersionEngine { table, damping }
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    pub fn table(&self) -> &ElementTable {
        &self.table
    }

    /// 计算色散能
    pub fn energy(&self, geom: &Geometry, model: DispersionModel) -> Result<f64> {
        Ok(self.evaluate(geom, model)?.energy)
    }

    /// 计算色散能并保留逐对明细
    pub fn evaluate(&self, geom: &Geometry, model: DispersionModel) -> Result<DispersionResult> {
        if geom.len() < 2 {
            return Ok(DispersionResult {
                model,
                energy: 0.0,
                pairs: Vec::new(),
            });
        }

        let d = model.effective_damping(self.damping);
        let mut pairs = Vec::with_capacity(geom.len() * (geom.len() - 1) / 2);
        let mut acc = 0.0;

        for i in 0..geom.len() {
            for j in (i + 1)..geom.len() {
                let (ai, aj) = (&geom.atoms[i], &geom.atoms[j]);
                let rij = ai.distance(aj);
                if rij < 1e-8 {
                    return Err(XdhError::InvalidArgument(format!(
                        "atoms {} and {} of '{}' overlap",
                        i + 1,
                        j + 1,
                        geom.name
                    )));
                }

                let c6 = if model.uses_c6() {
                    Some(combine(self.table.c6(ai.z)?, self.table.c6(aj.z)?))
                } else {
                    None
                };
                let c12 = if model.uses_c12() {
                    Some(combine(self.table.c12(ai.z)?, self.table.c12(aj.z)?))
                } else {
                    None
                };
                let rr = match d {
                    Some(_) => Some(self.table.r0(ai.z)? + self.table.r0(aj.z)?),
                    None => None,
                };
                let dmp = d.zip(rr).map(|(d, rr)| damp(d, rij, rr));

                let r6 = rij.powi(-6);
                let r12 = rij.powi(-12);
                let c6v = c6.unwrap_or(0.0);
                let c12v = c12.unwrap_or(0.0);

                // TwelveDamped 在循环内只累加未缩放项
                let term = match model {
                    DispersionModel::SixDamped => -SCALE6 * dmp.unwrap_or(1.0) * c6v * r6,
                    DispersionModel::SixUndamped => -SCALE6 * c6v * r6,
                    DispersionModel::TwelveUndamped => SCALE12 * c12v * r12,
                    DispersionModel::SixPlusTwelve => -SCALE6 * c6v * r6 + SCALE12 * c12v * r12,
                    DispersionModel::TwelveDamped => dmp.unwrap_or(1.0) * c12v * r12,
                };
                acc += term;

                let energy = match model {
                    DispersionModel::TwelveDamped => -SCALE12 * term,
                    _ => term,
                };
                pairs.push(PairTerm {
                    i,
                    j,
                    zi: ai.z,
                    zj: aj.z,
                    rij,
                    rr,
                    c6,
                    c12,
                    damp: dmp,
                    energy,
                });
            }
        }

        let energy = match model {
            DispersionModel::TwelveDamped => -SCALE12 * acc,
            _ => acc,
        };

        Ok(DispersionResult {
            model,
            energy,
            pairs,
        })
    }

    /// 六次阻尼色散的笛卡尔梯度 (Hartree/Bohr)，已乘以 s6
    ///
    /// 每个原子的梯度是对所有 j≠i 的两项之和：无阻尼梯度乘阻尼，
    /// 以及阻尼梯度乘无阻尼能量。其他模型的梯度不在本版本范围内。
    pub fn gradient(&self, geom: &Geometry, model: DispersionModel, s6: f64) -> Result<Vec<[f64; 3]>> {
        if model != DispersionModel::SixDamped {
            return Err(XdhError::Unsupported(format!(
                "Gradient of the {} dispersion model",
                model.label()
            )));
        }

        let mut grad = vec![[0.0; 3]; geom.len()];
        if geom.len() < 2 {
            return Ok(grad);
        }

        let scale = -SCALE6 * BOHR_TO_ANGSTROM * s6;

        for (i, ai) in geom.atoms.iter().enumerate() {
            let mut g = [0.0; 3];
            for (j, aj) in geom.atoms.iter().enumerate() {
                if j == i {
                    continue;
                }
                let rij = ai.distance(aj);
                let rr = self.table.r0(ai.z)? + self.table.r0(aj.z)?;
                let cij = combine(self.table.c6(ai.z)?, self.table.c6(aj.z)?);
                let dmp = damp(self.damping, rij, rr);
                let ddmp = damp_derivative(self.damping, rij, rr);

                // d(R^-6)/dR = -6 R^-7；再乘 (x_i - x_j)/R
                let radial = cij * (dmp * -6.0 * rij.powi(-8) + ddmp * rij.powi(-7));
                for k in 0..3 {
                    g[k] += radial * (ai.position[k] - aj.position[k]);
                }
            }
            grad[i] = [scale * g[0], scale * g[1], scale * g[2]];
        }

        Ok(grad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispersion::params::ParamOverrides;
    use crate::models::Atom;

    fn carbon_dimer(r: f64) -> Geometry {
        Geometry::new(
            "C2",
            vec![Atom::new(6, [0.0, 0.0, 0.0]), Atom::new(6, [r, 0.0, 0.0])],
        )
    }

    fn water_dimer() -> Geometry {
        Geometry::new(
            "water_dimer",
            vec![
                Atom::new(8, [0.000, 0.000, 0.000]),
                Atom::new(1, [0.957, 0.000, 0.000]),
                Atom::new(1, [-0.240, 0.927, 0.000]),
                Atom::new(8, [2.910, 0.000, 0.120]),
                Atom::new(1, [3.250, 0.760, -0.330]),
                Atom::new(1, [3.250, -0.760, -0.330]),
            ],
        )
    }

    #[test]
    fn test_single_atom_is_zero_for_every_model() {
        let engine = DispersionEngine::default();
        let geom = Geometry::new("Ar", vec![Atom::new(18, [1.0, 2.0, 3.0])]);
        for model in DispersionModel::ALL {
            let result = engine.evaluate(&geom, model).unwrap();
            assert_eq!(result.energy, 0.0);
            assert!(result.pairs.is_empty());
        }
    }

    #[test]
    fn test_damp_limits() {
        let rr = 2.904;
        assert!((damp(20.0, rr, rr) - 0.5).abs() < 1e-15);
        assert!(damp(20.0, 1e-6, rr) < 1e-8);
        assert!(damp(20.0, 50.0, rr) > 1.0 - 1e-12);

        let mut prev = 0.0;
        for k in 1..100 {
            let value = damp(20.0, 0.1 * k as f64, rr);
            assert!(value > 0.0 && value < 1.0 + 1e-15);
            assert!(value >= prev);
            prev = value;
        }
    }

    #[test]
    fn test_combine_is_symmetric() {
        let table = ElementTable::default();
        for zi in 1..=20 {
            for zj in 1..=20 {
                let a = combine(table.c6(zi).unwrap(), table.c6(zj).unwrap());
                let b = combine(table.c6(zj).unwrap(), table.c6(zi).unwrap());
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn test_six_damped_regression() {
        let engine = DispersionEngine::default();
        let e = engine
            .energy(&carbon_dimer(3.0), DispersionModel::SixDamped)
            .unwrap();
        assert!((e - (-6.030129990097703e-4)).abs() < 1e-14);
    }

    #[test]
    fn test_undamped_regressions() {
        let engine = DispersionEngine::default();
        let geom = carbon_dimer(3.0);

        let e6 = engine.energy(&geom, DispersionModel::SixUndamped).unwrap();
        assert!((e6 - (-9.143206731113317e-4)).abs() < 1e-14);

        let e12 = engine.energy(&geom, DispersionModel::TwelveUndamped).unwrap();
        assert!((e12 - 5.876879889878831e-6).abs() < 1e-16);

        let both = engine.energy(&geom, DispersionModel::SixPlusTwelve).unwrap();
        assert!((both - (e6 + e12)).abs() < 1e-15);
    }

    #[test]
    fn test_twelve_damped_scaled_once() {
        let engine = DispersionEngine::default();
        let geom = water_dimer();
        let table = ElementTable::default();

        let mut acc = 0.0;
        for i in 0..geom.len() {
            for j in (i + 1)..geom.len() {
                let (ai, aj) = (&geom.atoms[i], &geom.atoms[j]);
                let rij = ai.distance(aj);
                let rr = table.r0(ai.z).unwrap() + table.r0(aj.z).unwrap();
                let c12 = combine(table.c12(ai.z).unwrap(), table.c12(aj.z).unwrap());
                acc += damp(DEFAULT_DAMPING / 2.0, rij, rr) * c12 * rij.powi(-12);
            }
        }

        let result = engine.evaluate(&geom, DispersionModel::TwelveDamped).unwrap();
        assert!((result.energy - (-SCALE12 * acc)).abs() < 1e-15);

        let pair_sum: f64 = result.pairs.iter().map(|p| p.energy).sum();
        assert!((pair_sum - result.energy).abs() < 1e-15);

        let dimer = engine
            .energy(&carbon_dimer(3.0), DispersionModel::TwelveDamped)
            .unwrap();
        assert!((dimer - (-3.419757178720846e-6)).abs() < 1e-16);
    }

    #[test]
    fn test_pair_terms_sum_to_energy() {
        let engine = DispersionEngine::default();
        let geom = water_dimer();
        for model in DispersionModel::ALL {
            let result = engine.evaluate(&geom, model).unwrap();
            assert_eq!(result.pairs.len(), 15);
            let sum: f64 = result.pairs.iter().map(|p| p.energy).sum();
            assert!((sum - result.energy).abs() < 1e-14);
        }
    }

    #[test]
    fn test_missing_c12_parameter_fails() {
        let engine = DispersionEngine::default();
        let geom = Geometry::new(
            "Fe2",
            vec![Atom::new(26, [0.0, 0.0, 0.0]), Atom::new(26, [2.5, 0.0, 0.0])],
        );
        assert!(engine.energy(&geom, DispersionModel::SixDamped).is_ok());
        assert!(matches!(
            engine.energy(&geom, DispersionModel::TwelveUndamped),
            Err(XdhError::MissingParameter { table: "C12", z: 26 })
        ));
    }

    #[test]
    fn test_override_table_changes_energy() {
        let overrides = ParamOverrides {
            c6: Some(vec![None, None, None, None, None, None, Some(3.5)]),
            ..Default::default()
        };
        let engine = DispersionEngine::new(
            ElementTable::default().with_overrides(overrides),
            DEFAULT_DAMPING,
        );
        let e = engine
            .energy(&carbon_dimer(3.0), DispersionModel::SixUndamped)
            .unwrap();
        // C6 加倍，能量加倍
        assert!((e - 2.0 * (-9.143206731113317e-4)).abs() < 1e-14);
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        let engine = DispersionEngine::default();
        let geom = water_dimer();
        let s6 = 1.05;
        let grad = engine
            .gradient(&geom, DispersionModel::SixDamped, s6)
            .unwrap();

        let h = 1e-5;
        for atom in [0, 3, 5] {
            for k in 0..3 {
                let mut plus = geom.clone();
                plus.atoms[atom].position[k] += h;
                let mut minus = geom.clone();
                minus.atoms[atom].position[k] -= h;

                let ep = engine.energy(&plus, DispersionModel::SixDamped).unwrap();
                let em = engine.energy(&minus, DispersionModel::SixDamped).unwrap();
                let numeric = s6 * (ep - em) / (2.0 * h) * BOHR_TO_ANGSTROM;

                assert!(
                    (grad[atom][k] - numeric).abs() < 1e-9,
                    "atom {atom} k {k}: {} vs {}",
                    grad[atom][k],
                    numeric
                );
            }
        }

        // 平移不变性：总梯度为零
        for k in 0..3 {
            let total: f64 = grad.iter().map(|g| g[k]).sum();
            assert!(total.abs() < 1e-14);
        }
    }

    #[test]
    fn test_gradient_unsupported_for_twelve_order() {
        let engine = DispersionEngine::default();
        let err = engine
            .gradient(&carbon_dimer(3.0), DispersionModel::TwelveDamped, 1.0)
            .unwrap_err();
        assert!(matches!(err, XdhError::Unsupported(_)));
    }
}
