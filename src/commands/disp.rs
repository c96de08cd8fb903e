//! # disp 子命令实现
//!
//! 对一个结构文件或一个目录中的全部结构并行计算色散能，不调用 Gaussian。
//!
//! ## 依赖关系
//! - 使用 `cli/disp.rs` 定义的参数
//! - 使用 `batch/`, `parsers/`, `dispersion/`
//! - 使用 `utils/output.rs`, `utils/report.rs`

use super::build_engine;
use crate::batch::{BatchRunner, FileCollector};
use crate::cli::disp::DispArgs;
use crate::dispersion::engine::HARTREE_TO_KCAL;
use crate::dispersion::{DispersionEngine, DispersionModel, DispersionResult};
use crate::error::{Result, XdhError};
use crate::parsers;
use crate::utils::{output, report};

use serde::Serialize;
use std::path::Path;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// 单个结构的计算结果
#[derive(Debug, Clone)]
pub struct StructureEnergies {
    pub name: String,
    pub formula: String,
    pub atoms: usize,
    pub results: Vec<DispersionResult>,
}

/// 终端表格行
#[derive(Debug, Clone, Tabled)]
struct EnergyRow {
    #[tabled(rename = "Structure")]
    structure: String,
    #[tabled(rename = "Formula")]
    formula: String,
    #[tabled(rename = "Atoms")]
    atoms: usize,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "E (A.U.)")]
    energy: String,
    #[tabled(rename = "E (kcal/mol)")]
    energy_kcal: String,
}

/// CSV 记录
#[derive(Debug, Serialize)]
struct EnergyRecord<'a> {
    structure: &'a str,
    formula: &'a str,
    atoms: usize,
    model: DispersionModel,
    energy_hartree: f64,
    energy_kcal_mol: f64,
}

/// 执行 disp 子命令
pub fn execute(args: DispArgs) -> Result<()> {
    output::print_header("Pairwise Dispersion Energies");

    let engine = build_engine(args.params.as_deref(), args.damping.as_deref())?;
    let models = args.model.models();

    let files = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive)
        .collect()?;
    output::print_info(&format!(
        "Evaluating {} structure(s) with {} (d = {})",
        files.len(),
        models
            .iter()
            .map(|m| m.keyword())
            .collect::<Vec<_>>()
            .join(", "),
        engine.damping()
    ));

    let runner = BatchRunner::new(args.jobs);
    tracing::debug!("running on {} threads", runner.jobs());
    let batch = runner.run(files, |path| evaluate_file(&engine, path, &models))?;

    for (path, err) in &batch.failures {
        output::print_warning(&format!("{}: {}", path.display(), err));
    }

    let structures: Vec<StructureEnergies> =
        batch.successes.into_iter().map(|(_, s)| s).collect();
    if structures.is_empty() {
        return Err(XdhError::InvalidArgument(format!(
            "None of the {} structure(s) could be evaluated",
            batch.failures.len()
        )));
    }

    println!("{}", Table::new(energy_rows(&structures)).with(Style::psql()));

    if args.pairs {
        match structures.as_slice() {
            [single] => {
                for result in &single.results {
                    output::print_header(&format!("{} pair contributions", result.model));
                    println!("{}", report::pair_table(result));
                }
            }
            _ => output::print_warning("--pairs is only shown for a single structure"),
        }
    }

    if let Some(csv_path) = &args.csv {
        save_energies_csv(&structures, csv_path)?;
        output::print_success(&format!("Energies saved to '{}'", csv_path.display()));
    }

    output::print_done(&format!(
        "Evaluated {} of {} structure(s)",
        structures.len(),
        structures.len() + batch.failures.len()
    ));
    Ok(())
}

/// 读取单个结构并计算所选模型
pub fn evaluate_file(
    engine: &DispersionEngine,
    path: &Path,
    models: &[DispersionModel],
) -> Result<StructureEnergies> {
    let geom = parsers::parse_geometry_file(path)?;
    let results = models
        .iter()
        .map(|&model| engine.evaluate(&geom, model))
        .collect::<Result<Vec<_>>>()?;

    Ok(StructureEnergies {
        formula: geom.formula(),
        atoms: geom.len(),
        name: geom.name,
        results,
    })
}

fn energy_rows(structures: &[StructureEnergies]) -> Vec<EnergyRow> {
    structures
        .iter()
        .flat_map(|s| {
            s.results.iter().map(move |r| EnergyRow {
                structure: s.name.clone(),
                formula: s.formula.clone(),
                atoms: s.atoms,
                model: r.model.keyword().to_string(),
                energy: format!("{:.10}", r.energy),
                energy_kcal: format!("{:.6}", r.energy * HARTREE_TO_KCAL),
            })
        })
        .collect()
}

/// 保存结果到 CSV
fn save_energies_csv(structures: &[StructureEnergies], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    for s in structures {
        for r in &s.results {
            wtr.serialize(EnergyRecord {
                structure: &s.name,
                formula: &s.formula,
                atoms: s.atoms,
                model: r.model,
                energy_hartree: r.energy,
                energy_kcal_mol: r.energy * HARTREE_TO_KCAL,
            })?;
        }
    }

    wtr.flush().map_err(|e| XdhError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;
    Ok(())
}
