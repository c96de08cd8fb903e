//! # run 子命令实现
//!
//! 处理一个 Gaussian 输入文件中的全部作业：
//!
//! 1. 按 `--Link1--` 拆分作业
//! 2. 解析路由关键字，确定纯色散 / DFT+D / xDH
//! 3. 在 Gaussian 运行前计算经典色散能
//! 4. 启动 Gaussian 并把过滤后的日志同步到 `<name>.xdh`
//! 5. 从日志提取能量分量，输出能量与作业结束标志
//!
//! ## 依赖关系
//! - 使用 `cli/run.rs` 定义的参数
//! - 使用 `methods/`, `dispersion/`, `job/`, `parsers/`
//! - 使用 `utils/output.rs`, `utils/progress.rs`, `utils/report.rs`

use super::build_engine;
use crate::cli::run::RunArgs;
use crate::dispersion::{DispersionEngine, DispersionModel};
use crate::error::{Result, XdhError};
use crate::job::{GaussianLauncher, GaussianVersion, JobOutcome, JobPaths, JobSynchronizer, SyncConfig};
use crate::methods::{resolve, Resolution};
use crate::parsers::gaussian_log;
use crate::parsers::gjf::{self, InputDeck};
use crate::utils::{output, progress, report};

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// 一次 run 调用的配置
pub struct RunConfig {
    pub workdir: PathBuf,
    pub print_level: u8,
    pub version: GaussianVersion,
    pub engine: DispersionEngine,
    pub synchronizer: JobSynchronizer<GaussianLauncher>,
}

/// 单个作业输出的能量（用于终端汇总）
#[derive(Debug, Clone, PartialEq)]
pub struct JobSummary {
    pub name: String,
    pub energies: Vec<(String, f64)>,
}

/// 执行 run 子命令
pub async fn execute(args: RunArgs) -> Result<()> {
    output::print_header("xDH / Dispersion Job");

    if !args.input.is_file() {
        return Err(XdhError::FileNotFound {
            path: args.input.display().to_string(),
        });
    }

    let input = fs::canonicalize(&args.input).map_err(|e| XdhError::FileReadError {
        path: args.input.display().to_string(),
        source: e,
    })?;
    let workdir = input
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("xdh")
        .to_string();

    let version = GaussianVersion::from_number(args.gaussian_version)?;
    let launcher = match &args.gaussian_exe {
        Some(exe) => GaussianLauncher::with_executable(exe.clone()),
        None => GaussianLauncher::new(version),
    };
    let config = RunConfig {
        workdir: workdir.clone(),
        print_level: args.print_level,
        version,
        engine: build_engine(args.params.as_deref(), args.damping.as_deref())?,
        synchronizer: JobSynchronizer::new(
            launcher,
            SyncConfig {
                interval: Duration::from_secs(args.sync_interval),
                print_level: args.print_level,
            },
        ),
    };

    let decks = gjf::parse_gjf_file(&input)?;
    output::print_info(&format!(
        "Found {} job(s) in '{}'",
        decks.len(),
        args.input.display()
    ));

    let output_path = workdir.join(format!("{}.xdh", stem));
    let mut sink = File::create(&output_path).map_err(|e| XdhError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;
    report::write_banner(&mut sink, env!("CARGO_PKG_VERSION"))
        .map_err(|e| sink_error(&output_path, e))?;

    for deck in decks {
        output::print_info(&format!("Running job '{}'", deck.name));
        let summary = run_job(&config, deck, &mut sink, &output_path).await?;
        for (label, energy) in &summary.energies {
            output::print_energy(&summary.name, label, *energy);
        }
        output::print_success(&format!("Job '{}' is done", summary.name));
    }

    output::print_done(&format!("Results written to '{}'", output_path.display()));
    Ok(())
}

/// 运行单个作业，所有输出写入 `sink`
pub async fn run_job<W: Write>(
    config: &RunConfig,
    mut deck: InputDeck,
    sink: &mut W,
    sink_path: &Path,
) -> Result<JobSummary> {
    let werr = |e| sink_error(sink_path, e);

    report::write_note(
        sink,
        &format!(
            "Start the job of \"{}\" using the {} package",
            deck.name, config.version
        ),
    )
    .map_err(werr)?;

    let resolution = resolve(&mut deck.options)?;
    debug!("resolved '{}' as {:?}", deck.name, resolution);

    let method = resolution.method_name();
    let scale = resolution.dispersion_scale();

    // 经典色散在 Gaussian 启动前完成
    let dispersion = match resolution.dispersion_model() {
        Some(model) => {
            let geom = deck.geometry()?;
            let result = config.engine.evaluate(&geom, model)?;
            info!(
                "{}: {} with scale {}, E(disp) = {:.8}",
                deck.name, method, scale, result.energy
            );
            Some((geom, result))
        }
        None => None,
    };

    let mut energies = Vec::new();

    match &resolution {
        Resolution::None => {
            return Err(XdhError::InvalidArgument(format!(
                "Normal Gaussian job '{}' doesn't need xdh",
                deck.name
            )));
        }

        Resolution::PureDispersion { .. } => {
            if let Some((geom, result)) = &dispersion {
                report::write_note(
                    sink,
                    &format!("Pure dispersion calculation with the {} model", method),
                )
                .map_err(werr)?;
                report::write_dispersion(sink, result, config.print_level).map_err(werr)?;

                if result.model == DispersionModel::SixDamped && config.print_level >= 2 {
                    let grad = config.engine.gradient(geom, result.model, scale)?;
                    report::write_note(sink, "Dispersion gradient (Hartree/Bohr):")
                        .map_err(werr)?;
                    for (atom, g) in geom.atoms.iter().zip(&grad) {
                        writeln!(
                            sink,
                            " {:>3} {:16.10} {:16.10} {:16.10}",
                            atom.symbol(),
                            g[0],
                            g[1],
                            g[2]
                        )
                        .map_err(werr)?;
                    }
                }
                energies.push((method.clone(), scale * result.energy));
            }
        }

        Resolution::DftD { functional, .. } => {
            report::write_note(
                sink,
                &format!("{} is computed as {} plus scaled dispersion", method, functional),
            )
            .map_err(werr)?;

            let outcome = run_gaussian(config, &deck, sink, sink_path).await?;
            let scf = gaussian_log::read_scf_energy(&outcome.log)?;

            let mut total = scf.energy;
            if let Some((_, result)) = &dispersion {
                report::write_dispersion(sink, result, config.print_level).map_err(werr)?;
                total += scale * result.energy;
            }
            report::write_energy_pair(
                sink,
                (scf.method.as_str(), scf.energy),
                (method.as_str(), total),
            )
            .map_err(werr)?;

            energies.push((scf.method.clone(), scf.energy));
            energies.push((method.clone(), total));
            finish_log(config, &outcome)?;
        }

        Resolution::Hybrid(request) => {
            deck.overlay_cards = request.overlay_cards.clone();
            deck.append_section(request.trailing_cards.clone());
            report::write_note(
                sink,
                &format!(
                    "\"{}\" is chosen for the question ({} core)",
                    method,
                    if request.frozen_core { "frozen" } else { "all-electron" }
                ),
            )
            .map_err(werr)?;

            let outcome = run_gaussian(config, &deck, sink, sink_path).await?;
            let solvation = deck.uses_solvation();
            let components = gaussian_log::parse_log_file(&outcome.log, solvation)?;
            let hybrids = components.family_energies(request.spec);

            if config.print_level >= 2 {
                report::write_components(sink, &components).map_err(werr)?;
            }

            if let Some(e_solv) = components.solvation {
                report::write_note(
                    sink,
                    &format!("Solvation energy is considered: Erf(P) = {:.8}", e_solv),
                )
                .map_err(werr)?;
            }
            report::write_hybrid_energies(
                sink,
                (components.scf_method.as_str(), components.scf_energy),
                &hybrids,
            )
            .map_err(werr)?;

            energies.push((components.scf_method.clone(), components.scf_energy));
            energies.extend(hybrids.into_iter().map(|h| (h.method, h.energy)));
            finish_log(config, &outcome)?;
        }
    }

    if config.print_level >= 1 {
        report::write_note(sink, "Job Type :: Single-Point Calculation").map_err(werr)?;
    }
    report::write_footer(sink, &deck.name).map_err(werr)?;
    sink.flush().map_err(werr)?;

    Ok(JobSummary {
        name: deck.name,
        energies,
    })
}

/// 写入输入文件、运行 Gaussian 并同步日志
async fn run_gaussian<W: Write>(
    config: &RunConfig,
    deck: &InputDeck,
    sink: &mut W,
    sink_path: &Path,
) -> Result<JobOutcome> {
    let paths = JobPaths::new(&config.workdir, &deck.name);
    fs::create_dir_all(&paths.scratch).map_err(|e| XdhError::FileWriteError {
        path: paths.scratch.display().to_string(),
        source: e,
    })?;
    deck.write_to(&paths.input)?;

    report::write_note(
        sink,
        "The following is the output for preparing KS orbitals and density ::",
    )
    .map_err(|e| sink_error(sink_path, e))?;

    let spinner = progress::create_spinner(&format!("Gaussian is running '{}'", deck.name));
    let outcome = config.synchronizer.run(&paths, sink).await;
    spinner.finish_and_clear();
    let outcome = outcome?;

    if !outcome.status.success() {
        return Err(XdhError::CommandFailed {
            command: format!("{} (exit status {})", config.version, outcome.status),
            stderr: format!("see {}", outcome.log.display()),
        });
    }
    Ok(outcome)
}

/// 输出级别为 0 时删除复制到工作目录的日志
fn finish_log(config: &RunConfig, outcome: &JobOutcome) -> Result<()> {
    if config.print_level == 0 {
        fs::remove_file(&outcome.log).map_err(|e| XdhError::FileWriteError {
            path: outcome.log.display().to_string(),
            source: e,
        })?;
    }
    Ok(())
}

fn sink_error(path: &Path, e: std::io::Error) -> XdhError {
    XdhError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(workdir: &Path, print_level: u8) -> RunConfig {
        RunConfig {
            workdir: workdir.to_path_buf(),
            print_level,
            version: GaussianVersion::G16,
            engine: DispersionEngine::default(),
            synchronizer: JobSynchronizer::new(
                GaussianLauncher::with_executable("xdh-no-such-gaussian-binary"),
                SyncConfig::default(),
            ),
        }
    }

    const C2_DISP: &str = "# disp_g/6-31G\n\ncarbon dimer\n\n0 1\nC 0.0 0.0 0.0\nC 0.0 0.0 3.0\n\n";

    #[tokio::test]
    async fn test_pure_dispersion_job() {
        let dir = tempfile::tempdir().unwrap();
        let deck = InputDeck::parse(C2_DISP, "c2").unwrap();

        let mut sink = Vec::new();
        let summary = run_job(&config(dir.path(), 1), deck, &mut sink, Path::new("c2.xdh"))
            .await
            .unwrap();

        assert_eq!(summary.energies.len(), 1);
        assert_eq!(summary.energies[0].0, "Disp_G");
        assert!((summary.energies[0].1 - -6.030129990097703e-4).abs() < 1e-12);

        let text = String::from_utf8(sink).unwrap();
        assert!(text.contains("E(Disp_G)"));
        assert!(text.contains("THE JOB OF \"c2\" IS DONE"));
        assert!(!text.contains("Hartree/Bohr"));
    }

    #[tokio::test]
    async fn test_pure_dispersion_gradient_at_high_print_level() {
        let dir = tempfile::tempdir().unwrap();
        let deck = InputDeck::parse(C2_DISP, "c2").unwrap();

        let mut sink = Vec::new();
        run_job(&config(dir.path(), 2), deck, &mut sink, Path::new("c2.xdh"))
            .await
            .unwrap();

        let text = String::from_utf8(sink).unwrap();
        assert!(text.contains("Dispersion gradient (Hartree/Bohr):"));
        assert!(text.contains("Atom1"));
    }

    #[tokio::test]
    async fn test_plain_job_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let deck = InputDeck::parse("# b3lyp/6-31G\n\nt\n\n0 1\nH 0 0 0\n", "plain").unwrap();

        let mut sink = Vec::new();
        let err = run_job(&config(dir.path(), 1), deck, &mut sink, Path::new("p.xdh"))
            .await
            .unwrap_err();
        assert!(matches!(err, XdhError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_optimization_rejected_before_launch() {
        let dir = tempfile::tempdir().unwrap();
        let deck = InputDeck::parse("# xyg3/6-31G opt\n\nt\n\n0 1\nH 0 0 0\n", "opt").unwrap();

        let mut sink = Vec::new();
        let err = run_job(&config(dir.path(), 1), deck, &mut sink, Path::new("o.xdh"))
            .await
            .unwrap_err();
        assert!(matches!(err, XdhError::Unsupported(_)));
        assert!(!dir.path().join(".xdh_opt").exists());
    }

    #[tokio::test]
    async fn test_missing_gaussian_reported() {
        let dir = tempfile::tempdir().unwrap();
        let deck = InputDeck::parse("# xyg3/6-31G\n\nt\n\n0 1\nH 0 0 0\nH 0 0 0.74\n", "h2")
            .unwrap();

        let mut sink = Vec::new();
        let err = run_job(&config(dir.path(), 1), deck, &mut sink, Path::new("h2.xdh"))
            .await
            .unwrap_err();
        assert!(matches!(err, XdhError::CommandNotFound { .. }));

        let input = std::fs::read_to_string(dir.path().join(".xdh_h2").join("Job_h2.com")).unwrap();
        assert!(input.contains("B3LYP/6-31G IOP(5/33=1) NoSymm ExtraOverlay"));
        assert!(input.contains("8/7=1,10=4/1;"));
        assert!(input.contains("\n100\n205\n402\n"));
    }
}
