//! # 输出文件报告
//!
//! 生成 `<name>.xdh` 输出文件中的各个段落：程序信息与文献、能量行、
//! 色散原子对表格以及作业结束标志。
//!
//! ## 依赖关系
//! - 被 `commands/run.rs` 使用
//! - 使用 `dispersion/engine.rs`, `models/energy.rs`

use crate::dispersion::{DispersionResult, PairTerm};
use crate::models::geometry::element_symbol;
use crate::methods::COMPONENT_NAMES;
use crate::models::{EnergyComponents, HybridEnergy};
use std::io::{self, Write};
use tabled::settings::Style;
use tabled::{Table, Tabled};

const BANNER_RULE_WIDTH: usize = 78;
const FOOTER_WIDTH: usize = 80;
/// 能量行中方法名的对齐宽度
const LABEL_WIDTH: usize = 9;

/// 程序信息与文献
pub fn banner(version: &str) -> Vec<String> {
    vec![
        "#Filename:  xdh".to_string(),
        format!("#Version :  {}", version),
        "#Purpose :  1) Perform XYG3-type doubly hybrid (xDH) calculations using the".to_string(),
        "               Gaussian package (available for Gaussian 03, 09, and 16).".to_string(),
        "            2) Evaluate empirical pairwise dispersion corrections.".to_string(),
        "            3) Share the same input/output format of the Gaussian package".to_string(),
        "#Refs :     If you publish the xDH results, please cite the references properly".to_string(),
        "            1) For the original XYG3 method, please cite:".to_string(),
        "               Zhang, Y.; Xu, X.; Goddard, W. A. Doubly Hybrid Density".to_string(),
        "               Functional for Accurate Descriptions of Nonbond Interactions,".to_string(),
        "               Thermochemistry, and Thermochemical Kinetics.".to_string(),
        "               Proc. Natl. Acad. Sci. USA 2009, 106 (13), 4963-4968.".to_string(),
        "            2) For the lower-scaling XYGJ-OS method, please cite:".to_string(),
        "               Zhang, I. Y.; Xu, X.; Jung, Y.; Goddard, W. A. A Fast Doubly".to_string(),
        "               Hybrid Density Functional Method Close to Chemical Accuracy".to_string(),
        "               Using a Local Opposite Spin Ansatz.".to_string(),
        "               Proc. Natl. Acad. Sci. USA 2011, 108 (50), 19896-19900.".to_string(),
        "            3) For the family of xDH@B3LYP methods, please cite:".to_string(),
        "               Zhang, I. Y.; Xu, X. Exploring the Limits of the XYG3-Type".to_string(),
        "               Doubly Hybrid Approximations for the Main-Group Chemistry:".to_string(),
        "               The XDH@B3LYP Model.".to_string(),
        "               J. Phys. Chem. Lett. 2021, 12, 2638-2644.".to_string(),
    ]
}

/// 写入程序信息（仅在新建输出文件时调用）
pub fn write_banner<W: Write>(w: &mut W, version: &str) -> io::Result<()> {
    for line in banner(version) {
        writeln!(w, "{}", line)?;
    }
    writeln!(w, "{}==", "-".repeat(BANNER_RULE_WIDTH - 2))?;
    writeln!(w)
}

/// 写入一条带缩进的说明
pub fn write_note<W: Write>(w: &mut W, text: &str) -> io::Result<()> {
    writeln!(w, " {}", text)
}

/// 格式化能量行 `E(method)   =   -76.12345678 A.U.`
pub fn format_energy(label: &str, energy: f64) -> String {
    let pad = LABEL_WIDTH.saturating_sub(label.len());
    format!("E({}){}= {:16.8} A.U.", label, " ".repeat(pad), energy)
}

/// 写入 SCF 能量与主方法能量
pub fn write_energy_pair<W: Write>(
    w: &mut W,
    first: (&str, f64),
    second: (&str, f64),
) -> io::Result<()> {
    writeln!(
        w,
        " {}    {}",
        format_energy(first.0, first.1),
        format_energy(second.0, second.1)
    )
}

/// 写入单行能量
pub fn write_energy<W: Write>(w: &mut W, label: &str, energy: f64) -> io::Result<()> {
    writeln!(w, " {}", format_energy(label, energy))
}

/// 写入 xDH 能量：SCF 与主方法一行，其余同家族方法各占一行
pub fn write_hybrid_energies<W: Write>(
    w: &mut W,
    scf: (&str, f64),
    energies: &[HybridEnergy],
) -> io::Result<()> {
    let Some((primary, siblings)) = energies.split_first() else {
        return Ok(());
    };

    write_energy_pair(w, scf, (primary.method.as_str(), primary.energy))?;
    if !siblings.is_empty() {
        write_note(
            w,
            &format!("{} belongs to the family of {}", primary.method, primary.family),
        )?;
    }
    for other in siblings {
        write_energy(w, &other.method, other.energy)?;
    }
    Ok(())
}

/// 写入 xDH 能量分量（参考能量与七个线性组合分量）
pub fn write_components<W: Write>(w: &mut W, components: &EnergyComponents) -> io::Result<()> {
    writeln!(w, " {:<12}{:18.10}", "E[noXC]", components.reference_energy())?;
    for (name, value) in COMPONENT_NAMES.iter().zip(components.ordered()) {
        writeln!(w, " {:<12}{:18.10}", name, value)?;
    }
    Ok(())
}

/// 原子对表格行
#[derive(Debug, Clone, Tabled)]
struct PairRow {
    #[tabled(rename = "Atom1")]
    atom1: String,
    #[tabled(rename = "Atom2")]
    atom2: String,
    #[tabled(rename = "Rij (Å)")]
    rij: String,
    #[tabled(rename = "Rr (Å)")]
    rr: String,
    #[tabled(rename = "Cij")]
    cij: String,
    #[tabled(rename = "Damp")]
    damp: String,
    #[tabled(rename = "E (A.U.)")]
    energy: String,
}

fn optional(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_else(|| "-".to_string())
}

impl From<&PairTerm> for PairRow {
    fn from(p: &PairTerm) -> Self {
        PairRow {
            atom1: format!("{}{}", element_symbol(p.zi), p.i + 1),
            atom2: format!("{}{}", element_symbol(p.zj), p.j + 1),
            rij: format!("{:.6}", p.rij),
            rr: optional(p.rr, 4),
            cij: optional(p.c6.or(p.c12), 6),
            damp: optional(p.damp, 6),
            energy: format!("{:.10}", p.energy),
        }
    }
}

/// 生成原子对贡献表格
pub fn pair_table(result: &DispersionResult) -> String {
    let rows: Vec<PairRow> = result.pairs.iter().map(PairRow::from).collect();
    Table::new(rows).with(Style::psql()).to_string()
}

/// 写入色散能量，输出级别不低于 2 时附带原子对表格
pub fn write_dispersion<W: Write>(
    w: &mut W,
    result: &DispersionResult,
    print_level: u8,
) -> io::Result<()> {
    if print_level >= 2 && !result.pairs.is_empty() {
        writeln!(w, "{}", pair_table(result))?;
    }
    write_energy(w, result.model.label(), result.energy)
}

/// 写入作业结束标志
pub fn write_footer<W: Write>(w: &mut W, name: &str) -> io::Result<()> {
    let inner = FOOTER_WIDTH - 4;
    let message = format!(" THE JOB OF \"{}\" IS DONE", name);
    let pad = inner.saturating_sub(message.len());

    writeln!(w, "{}", "=".repeat(FOOTER_WIDTH))?;
    writeln!(w, "**{}**", " ".repeat(inner))?;
    writeln!(w, "**{}{}**", message, " ".repeat(pad))?;
    writeln!(w, "**{}**", " ".repeat(inner))?;
    writeln!(w, "{}", "=".repeat(FOOTER_WIDTH))
}
