//! Inspect AMG hierarchies and compare preconditioned CG runs
//!
//! Usage:
//!   cargo run --release --bin amg-info -- --poisson 64 --dim 2 --solve
//!   cargo run --release --bin amg-info -- --matrix system.mtx --config solver.toml --solve
//!   cargo run --release --bin amg-info -- --poisson 32 --dim 3 --tff --solve

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use math_amg::io::read_matrix_market;
use math_amg::{
    AmgConfig, AmgPreconditioner, CgSolution, CsrMatrix, Preconditioner, SolverConfig,
    TffPreconditioner, cg, gallery, load_config, pcg,
};
use ndarray::Array1;

#[derive(Parser, Debug)]
#[command(name = "amg-info")]
#[command(about = "Build an AMG hierarchy and report its levels, complexities and PCG convergence", long_about = None)]
struct Args {
    /// Matrix Market file with the system matrix
    #[arg(short, long, conflicts_with = "poisson")]
    matrix: Option<PathBuf>,

    /// Use the Poisson model problem with N points per direction
    #[arg(short, long)]
    poisson: Option<usize>,

    /// Spatial dimension of the model problem
    #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=3))]
    dim: u8,

    /// Coupling in y for the 2D model problem (1 is isotropic)
    #[arg(long, default_value_t = 1.0)]
    anisotropy: f64,

    /// Grid extents of a matrix file, needed for TFF (e.g. --grid 32,32)
    #[arg(long, value_delimiter = ',')]
    grid: Vec<usize>,

    /// JSON or TOML solver configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Built-in AMG preset, ignored when --config is given
    #[arg(long, value_enum, default_value_t = Preset::RugeStuben)]
    preset: Preset,

    /// Run CG, AMG-PCG (and TFF-PCG with --tff) on an oscillatory right-hand side
    #[arg(short, long)]
    solve: bool,

    /// Also build the TFF preconditioner
    #[arg(long)]
    tff: bool,

    /// Print the hierarchy diagnostics as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    /// Classical Ruge–Stüben coarsening and interpolation
    RugeStuben,
    /// Vanek aggregation with smoothed prolongation
    SmoothedAggregation,
    /// W-cycle with truncated interpolation and SGS smoothing
    Difficult,
}

impl Preset {
    fn config(self) -> AmgConfig {
        match self {
            Preset::RugeStuben => AmgConfig::for_ruge_stuben(),
            Preset::SmoothedAggregation => AmgConfig::for_smoothed_aggregation(),
            Preset::Difficult => AmgConfig::for_difficult_problems(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    log::info!(
        "parallel kernels: {}",
        if math_amg::parallel::is_parallel_available() { "rayon" } else { "sequential" }
    );

    let config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => SolverConfig {
            amg: args.preset.config(),
            ..SolverConfig::default()
        },
    };

    let (matrix, dims) = load_matrix(&args)?;
    println!(
        "System: {} unknowns, {} nonzeros",
        matrix.num_rows,
        matrix.nnz()
    );

    let amg = AmgPreconditioner::from_csr(&matrix, config.amg.clone())
        .context("building AMG hierarchy")?;
    let diagnostics = amg.diagnostics();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    } else {
        print_levels(&amg);
    }

    let tff = if args.tff {
        let Some(dims) = dims.as_deref() else {
            bail!("--tff needs a model problem or --grid extents");
        };
        let start = Instant::now();
        let tff = TffPreconditioner::new(&matrix, dims, &config.tff)
            .context("building TFF decomposition")?;
        println!(
            "\nTFF: {} blocks over grid {:?}, setup {:.1} ms",
            tff.decomposition().num_blocks(),
            dims,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Some(tff)
    } else {
        None
    };

    if args.solve {
        let b = test_rhs(matrix.num_rows);

        println!("\n=== Conjugate Gradients ===");
        report("CG", &timed(|| cg(&matrix, &b, &config.cg)));
        report("AMG-PCG", &timed(|| pcg(&matrix, &amg, &b, &config.cg)));
        if let Some(tff) = &tff {
            report("TFF-PCG", &timed(|| pcg(&matrix, tff, &b, &config.cg)));
        }

        let x = amg.apply(&b);
        let r = matrix.residual(&b, &x);
        println!(
            "\nOne {:?} cycle: |b - A M b| / |b| = {:.3e}",
            config.amg.cycle,
            norm(&r) / norm(&b)
        );
    }

    Ok(())
}

fn load_matrix(args: &Args) -> anyhow::Result<(CsrMatrix<f64>, Option<Vec<usize>>)> {
    if let Some(path) = &args.matrix {
        let matrix = read_matrix_market(path)
            .with_context(|| format!("reading Matrix Market file {}", path.display()))?;
        if !matrix.is_square() {
            bail!(
                "matrix must be square, got {}x{}",
                matrix.num_rows,
                matrix.num_cols
            );
        }
        let dims = (!args.grid.is_empty()).then(|| args.grid.clone());
        if let Some(dims) = &dims {
            let len: usize = dims.iter().product();
            if len != matrix.num_rows {
                bail!("grid {:?} has {} points, matrix has {} rows", dims, len, matrix.num_rows);
            }
        }
        return Ok((matrix, dims));
    }

    let n = args.poisson.unwrap_or(32);
    if n == 0 {
        bail!("--poisson needs at least one point per direction");
    }
    let (matrix, dims) = match args.dim {
        1 => (gallery::poisson_1d(n), vec![n]),
        2 if args.anisotropy != 1.0 => (gallery::anisotropic_2d(n, n, args.anisotropy), vec![n, n]),
        2 => (gallery::poisson_2d(n, n), vec![n, n]),
        _ => (gallery::poisson_3d(n, n, n), vec![n, n, n]),
    };
    Ok((matrix, Some(dims)))
}

fn print_levels(amg: &AmgPreconditioner<f64>) {
    let hierarchy = amg.hierarchy();

    println!("\n=== AMG Hierarchy ===");
    println!("{:>5} {:>10} {:>12} {:>10}", "level", "unknowns", "nonzeros", "nnz/row");
    for (i, level) in hierarchy.levels().iter().enumerate() {
        let dofs = level.num_dofs();
        let nnz = level.matrix.nnz();
        println!(
            "{:>5} {:>10} {:>12} {:>10.2}",
            i,
            dofs,
            nnz,
            nnz as f64 / dofs.max(1) as f64
        );
    }
    println!("Stopped: {}", hierarchy.stop_reason());
    println!("Grid complexity:     {:.3}", amg.grid_complexity());
    println!("Operator complexity: {:.3}", amg.operator_complexity());
    println!("Setup time:          {:.1} ms", amg.setup_time_ms());
}

fn timed(solve: impl FnOnce() -> CgSolution<f64>) -> (CgSolution<f64>, f64) {
    let start = Instant::now();
    let solution = solve();
    (solution, start.elapsed().as_secs_f64() * 1000.0)
}

fn report(name: &str, (solution, ms): &(CgSolution<f64>, f64)) {
    println!(
        "{:<8} {:>5} iterations, residual {:.3e}, {} in {:.1} ms",
        name,
        solution.iterations,
        solution.residual,
        if solution.converged { "converged" } else { "NOT converged" },
        ms
    );
}

/// Oscillatory right-hand side with components in every frequency band
fn test_rhs(n: usize) -> Array1<f64> {
    Array1::from_shape_fn(n, |i| {
        let x = i as f64 + 1.0;
        (0.37 * x).sin() + 0.5 * (2.9 * x).cos()
    })
}

fn norm(v: &Array1<f64>) -> f64 {
    v.dot(v).sqrt()
}
