//! # Gaussian 日志能量分量提取器
//!
//! 从完成的 Gaussian 日志中提取 xDH 所需的全部能量分量。
//!
//! ## 日志格式说明
//! ```text
//!  SCF Done:  E(RB3LYP) =  -76.4089533411     A.U. after   10 cycles
//!  ENTVJ=   -67.50000 Ex=    -8.90000 Ec=     0.00000 ETotM2e=   -76.40000   (HF)
//!  ENTVJ=   -67.50000 Ex=    -8.10000 Ec=    -0.90000 ETotM2e=   -76.50000   (LDA)
//!  ENTVJ=   -67.50000 Ex=    -8.95000 Ec=    -0.33000 ETotM2e=   -76.78000   (GGA)
//!  alpha-alpha T2 =       0.1234567D-01 E2=    -0.3500000D-01
//!  alpha-beta  T2 =       0.5678901D-01 E2=    -0.2000000D+00
//!  beta-beta   T2 =       0.1234567D-01 E2=    -0.3500000D-01
//! ```
//!
//! 缺少任一必需字段即报错，不做默认填充。
//!
//! ## 依赖关系
//! - 被 `commands/run.rs` 使用
//! - 使用 `models/energy.rs`

use crate::error::{Result, XdhError};
use crate::models::{EnergyComponents, XcPass};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static SCF_DONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"SCF Done:\s+E\([RU](?P<scf>\S*)\)\s*=\s*(?P<engy>-?\d+\.\d+)\s*A\.U\. after\s*(?P<snum>\d+) cycles",
    )
    .expect("valid SCF regex")
});

static ENTVJ_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"ENTVJ=\s*(?P<enoxc>-?\d*\.\d*)\s*Ex=\s*(?P<ex>-?\d*\.\d*)\s*Ec=\s*(?P<ec>-?\d*\.\d*)\s*ETotM2e=\s*(?P<etot>-?\d*\.\d*)",
    )
    .expect("valid ENTVJ regex")
});

static OS_PT2_RE: LazyLock<Regex> = LazyLock::new(|| pt2_regex("alpha-beta"));
static AA_PT2_RE: LazyLock<Regex> = LazyLock::new(|| pt2_regex("alpha-alpha"));
static BB_PT2_RE: LazyLock<Regex> = LazyLock::new(|| pt2_regex("beta-beta"));

static SOLVATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Erf\(P\)=\s*(?P<scrf>-?\d*\.\d*)").expect("valid Erf(P) regex"));

fn pt2_regex(spin: &str) -> Regex {
    Regex::new(&format!(
        r"{spin}\s*T2 =\s*(?P<t2>-?\d*\.\d*D[-+]\d\d)\s*E2=\s*(?P<e2>-?\d*\.\d*D[-+]\d\d)"
    ))
    .expect("valid PT2 regex")
}

/// SCF 收敛信息
#[derive(Debug, Clone, PartialEq)]
pub struct ScfSummary {
    pub method: String,
    pub energy: f64,
    pub cycles: u32,
}

/// 读取日志文件并提取全部能量分量
pub fn parse_log_file(path: &Path, solvation_required: bool) -> Result<EnergyComponents> {
    let text = read_log(path)?;
    extract_components(&text, &path.display().to_string(), solvation_required)
}

/// 读取日志文件中的 SCF 能量（DFT+D 路径使用）
pub fn read_scf_energy(path: &Path) -> Result<ScfSummary> {
    let text = read_log(path)?;
    scf_energy(&text, &path.display().to_string())
}

fn read_log(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| XdhError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 提取第一条 `SCF Done` 记录
pub fn scf_energy(text: &str, source: &str) -> Result<ScfSummary> {
    let caps = SCF_DONE_RE
        .captures(text)
        .ok_or_else(|| not_found("SCF Done energy", source))?;

    let mut method = caps["scf"].to_string();
    if method == "B+HF-LYP" {
        method = "B3LYP".to_string();
    }

    Ok(ScfSummary {
        method,
        energy: parse_number(&caps["engy"], "SCF Done energy", source)?,
        cycles: caps["snum"]
            .parse()
            .map_err(|_| invalid_number(&caps["snum"], "SCF cycles", source))?,
    })
}

/// 从日志全文提取能量分量
///
/// `solvation_required` 为真时（路由中含 `scrf`）必须存在 `Erf(P)`，
/// 取最后一次出现的值。
pub fn extract_components(
    text: &str,
    source: &str,
    solvation_required: bool,
) -> Result<EnergyComponents> {
    let scf = scf_energy(text, source)?;

    let passes = ENTVJ_RE
        .captures_iter(text)
        .take(3)
        .map(|caps| {
            Ok(XcPass {
                e_no_xc: parse_number(&caps["enoxc"], "ENTVJ", source)?,
                exchange: parse_number(&caps["ex"], "Ex", source)?,
                correlation: parse_number(&caps["ec"], "Ec", source)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let [hf, lda, gga]: [XcPass; 3] = passes.try_into().map_err(|found: Vec<XcPass>| {
        not_found(
            &format!("ENTVJ records (3 required, {} found)", found.len()),
            source,
        )
    })?;

    let os_pt2 = pt2_energy(&OS_PT2_RE, "alpha-beta PT2 (os)", text, source)?;
    let ss_pt2 = pt2_energy(&AA_PT2_RE, "alpha-alpha PT2 (ss)", text, source)?
        + pt2_energy(&BB_PT2_RE, "beta-beta PT2 (ss)", text, source)?;

    let solvation = if solvation_required {
        let caps = SOLVATION_RE
            .captures_iter(text)
            .last()
            .ok_or_else(|| not_found("solvation energy Erf(P)", source))?;
        Some(parse_number(&caps["scrf"], "Erf(P)", source)?)
    } else {
        None
    };

    tracing::debug!(
        method = %scf.method,
        energy = scf.energy,
        os_pt2,
        ss_pt2,
        "extracted energy components from {}",
        source
    );

    Ok(EnergyComponents {
        scf_method: scf.method,
        scf_energy: scf.energy,
        scf_cycles: scf.cycles,
        hf,
        lda,
        gga,
        os_pt2,
        ss_pt2,
        solvation,
    })
}

fn pt2_energy(re: &Regex, field: &str, text: &str, source: &str) -> Result<f64> {
    let caps = re.captures(text).ok_or_else(|| not_found(field, source))?;
    parse_number(&caps["e2"], field, source)
}

/// 解析数值，接受 Fortran 的 `D` 指数
fn parse_number(raw: &str, field: &str, source: &str) -> Result<f64> {
    raw.replace(['D', 'd'], "E")
        .parse()
        .map_err(|_| invalid_number(raw, field, source))
}

fn not_found(field: &str, source: &str) -> XdhError {
    XdhError::ComponentNotFound {
        field: field.to_string(),
        path: source.to_string(),
    }
}

fn invalid_number(raw: &str, field: &str, source: &str) -> XdhError {
    XdhError::ParseError {
        format: "gaussian log".to_string(),
        path: source.to_string(),
        reason: format!("invalid number '{}' for {}", raw, field),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::XYG3_LOG;
    use super::*;

    #[test]
    fn test_extract_components() {
        let comps = extract_components(XYG3_LOG, "Job_h2o.log", false).unwrap();

        assert_eq!(comps.scf_method, "B3LYP");
        assert!((comps.scf_energy - -76.4089533411).abs() < 1e-12);
        assert_eq!(comps.scf_cycles, 10);

        assert!((comps.hf.e_no_xc - -67.5).abs() < 1e-12);
        assert!((comps.hf.exchange - -8.9).abs() < 1e-12);
        assert!((comps.lda.exchange - -8.1).abs() < 1e-12);
        assert!((comps.lda.correlation - -0.9).abs() < 1e-12);
        assert!((comps.gga.exchange - -8.95).abs() < 1e-12);
        assert!((comps.gga.correlation - -0.33).abs() < 1e-12);

        assert!((comps.os_pt2 - -0.2).abs() < 1e-12);
        assert!((comps.ss_pt2 - -0.07).abs() < 1e-12);
        assert_eq!(comps.solvation, None);
    }

    #[test]
    fn test_missing_fields_are_named() {
        let cases = [
            ("SCF Done", "SCF Done energy"),
            ("alpha-beta", "alpha-beta PT2 (os)"),
            ("alpha-alpha", "alpha-alpha PT2 (ss)"),
            ("beta-beta", "beta-beta PT2 (ss)"),
        ];

        for (marker, expected) in cases {
            let text: String = XYG3_LOG
                .lines()
                .filter(|line| !line.trim_start().starts_with(marker))
                .map(|line| format!("{}\n", line))
                .collect();

            match extract_components(&text, "Job_h2o.log", false) {
                Err(XdhError::ComponentNotFound { field, path }) => {
                    assert_eq!(field, expected);
                    assert_eq!(path, "Job_h2o.log");
                }
                other => panic!("expected missing {}, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_too_few_entvj_records() {
        let mut seen = 0;
        let text: String = XYG3_LOG
            .lines()
            .filter(|line| {
                if line.contains("ENTVJ=") {
                    seen += 1;
                    seen < 3
                } else {
                    true
                }
            })
            .map(|line| format!("{}\n", line))
            .collect();

        match extract_components(&text, "Job_h2o.log", false) {
            Err(XdhError::ComponentNotFound { field, .. }) => {
                assert!(field.contains("2 found"));
            }
            other => panic!("expected missing ENTVJ, got {:?}", other),
        }
    }

    #[test]
    fn test_solvation_uses_last_occurrence() {
        let text = format!(
            "{} Erf(P)=  -0.0100000\n Erf(P)=  -0.0123000\n",
            XYG3_LOG
        );
        let comps = extract_components(&text, "Job_h2o.log", true).unwrap();
        assert!((comps.solvation.unwrap() - -0.0123).abs() < 1e-12);

        let err = extract_components(XYG3_LOG, "Job_h2o.log", true).unwrap_err();
        assert!(matches!(err, XdhError::ComponentNotFound { .. }));
    }

    #[test]
    fn test_scf_energy_keeps_other_methods() {
        let text = " SCF Done:  E(UPBE1PBE) =  -150.123456789     A.U. after   23 cycles\n";
        let scf = scf_energy(text, "Job_o2.log").unwrap();
        assert_eq!(scf.method, "PBE1PBE");
        assert_eq!(scf.cycles, 23);
        assert!((scf.energy - -150.123456789).abs() < 1e-12);
    }

    #[test]
    fn test_fortran_exponent() {
        assert!((parse_number("-0.2500000D+01", "x", "log").unwrap() - -2.5).abs() < 1e-12);
        assert!((parse_number("0.1000000D-02", "x", "log").unwrap() - 1e-3).abs() < 1e-15);
        assert!(parse_number(".", "x", "log").is_err());
    }

    #[test]
    fn test_parse_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Job_h2o.log");
        std::fs::write(&path, XYG3_LOG).unwrap();

        let comps = parse_log_file(&path, false).unwrap();
        assert_eq!(comps.scf_method, "B3LYP");

        let missing = dir.path().join("Job_none.log");
        assert!(matches!(
            parse_log_file(&missing, false),
            Err(XdhError::FileReadError { .. })
        ));
    }
}
