//! Integration tests for the AMG hierarchy and AMG-preconditioned CG
//!
//! These tests check hierarchy invariants on model problems and verify that
//! multigrid preconditioning pays off against plain CG.

use approx::assert_relative_eq;
use math_amg::io::{parse_matrix_market, write_matrix_market};
use math_amg::{
    AmgConfig, AmgHierarchy, AmgPreconditioner, AmgTransferConfig, CgConfig, CsrMatrix,
    Preconditioner, StopReason, cg, gallery, pcg,
};
use ndarray::Array1;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn cg_config() -> CgConfig {
    CgConfig {
        max_iterations: 2000,
        tolerance: 1e-8,
        print_interval: 0,
    }
}

fn random_vector(n: usize, seed: u64) -> Array1<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array1::from_shape_fn(n, |_| rng.random_range(-1.0..1.0))
}

/// 2D grid Laplacian with random positive edge weights plus a small shift
fn random_weight_laplacian(nx: usize, ny: usize, seed: u64) -> CsrMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = nx * ny;
    let mut triplets = Vec::with_capacity(5 * n);
    let mut diag = vec![1e-3; n];

    for y in 0..ny {
        for x in 0..nx {
            let i = y * nx + x;
            let mut couple = |j: usize, w: f64| {
                triplets.push((i, j, -w));
                triplets.push((j, i, -w));
                diag[i] += w;
                diag[j] += w;
            };
            if x + 1 < nx {
                couple(i + 1, rng.random_range(0.1..10.0));
            }
            if y + 1 < ny {
                couple(i + nx, rng.random_range(0.1..10.0));
            }
        }
    }
    triplets.extend(diag.into_iter().enumerate().map(|(i, d)| (i, i, d)));
    CsrMatrix::from_triplets(n, n, triplets)
}

#[test]
fn test_amg_pcg_beats_cg_on_poisson_2d() {
    let a = gallery::poisson_2d::<f64>(32, 32);
    let b = random_vector(a.num_rows, 7);

    let plain = cg(&a, &b, &cg_config());
    let amg = AmgPreconditioner::from_csr(&a, AmgConfig::default()).unwrap();
    let preconditioned = pcg(&a, &amg, &b, &cg_config());

    assert!(plain.converged);
    assert!(preconditioned.converged);
    assert!(
        preconditioned.iterations * 2 < plain.iterations,
        "AMG-PCG {} vs CG {}",
        preconditioned.iterations,
        plain.iterations
    );

    let r = a.residual(&b, &preconditioned.x);
    assert!(r.dot(&r).sqrt() / b.dot(&b).sqrt() < 1e-7);
}

#[test]
fn test_iterations_grow_slowly_with_size() {
    let iterations = |n: usize| {
        let a = gallery::poisson_2d::<f64>(n, n);
        let b = random_vector(a.num_rows, 11);
        let amg = AmgPreconditioner::from_csr(&a, AmgConfig::default()).unwrap();
        let sol = pcg(&a, &amg, &b, &cg_config());
        assert!(sol.converged, "n = {n}");
        sol.iterations
    };

    let small = iterations(16);
    let large = iterations(48);
    assert!(large <= 2 * small + 5, "16x16: {small}, 48x48: {large}");
}

#[test]
fn test_all_presets_converge() {
    let a = gallery::poisson_2d::<f64>(24, 24);
    let b = random_vector(a.num_rows, 3);

    for config in [
        AmgConfig::for_ruge_stuben(),
        AmgConfig::for_smoothed_aggregation(),
        AmgConfig::for_difficult_problems(),
    ] {
        let amg = AmgPreconditioner::from_csr(&a, config.clone()).unwrap();
        assert!(amg.num_levels() > 1);
        let sol = pcg(&a, &amg, &b, &cg_config());
        assert!(sol.converged, "{config:?}");
    }
}

#[test]
fn test_random_coefficients() {
    let a = random_weight_laplacian(20, 20, 42);
    let b = random_vector(a.num_rows, 43);

    let plain = cg(&a, &b, &cg_config());
    let amg = AmgPreconditioner::from_csr(&a, AmgConfig::default()).unwrap();
    let sol = pcg(&a, &amg, &b, &cg_config());

    assert!(sol.converged);
    assert!(sol.iterations < plain.iterations);
}

#[test]
fn test_anisotropic_problem() {
    let a = gallery::anisotropic_2d::<f64>(24, 24, 1e-3);
    let b = random_vector(a.num_rows, 5);

    let amg = AmgPreconditioner::from_csr(&a, AmgConfig::default()).unwrap();
    let sol = pcg(&a, &amg, &b, &cg_config());
    let plain = cg(&a, &b, &cg_config());

    assert!(sol.converged);
    assert!(sol.iterations < plain.iterations);
}

#[test]
fn test_hierarchy_ignores_matrix_scaling() {
    let a = gallery::poisson_2d::<f64>(20, 20);
    let mut tiny = a.clone();
    tiny.scale(2f64.powi(-53));
    let b = random_vector(a.num_rows, 11);

    for config in [
        AmgConfig::for_ruge_stuben(),
        AmgConfig::for_smoothed_aggregation(),
    ] {
        let reference = AmgHierarchy::build(&a, &config.transfer).unwrap();
        let scaled = AmgHierarchy::build(&tiny, &config.transfer).unwrap();

        assert!(reference.num_levels() > 2);
        assert_eq!(scaled.level_sizes(), reference.level_sizes());
        assert_eq!(scaled.level_nnz(), reference.level_nnz());
        assert_eq!(scaled.stop_reason(), reference.stop_reason());
        for (fine, coarse) in reference.levels().iter().zip(scaled.levels()) {
            if let (Some(p), Some(q)) = (&fine.prolongation, &coarse.prolongation) {
                assert_eq!(p.nnz(), q.nnz());
            }
        }

        let amg = AmgPreconditioner::from_csr(&a, config.clone()).unwrap();
        let amg_tiny = AmgPreconditioner::from_csr(&tiny, config).unwrap();
        let expected = pcg(&a, &amg, &b, &cg_config());
        let solution = pcg(&tiny, &amg_tiny, &b, &cg_config());
        assert!(expected.converged);
        assert!(solution.converged);
        assert_eq!(solution.iterations, expected.iterations);
    }
}

#[test]
fn test_hierarchy_invariants() {
    let a = gallery::poisson_2d::<f64>(20, 20);
    let config = AmgTransferConfig {
        vect_limit: 10,
        ..AmgTransferConfig::default()
    };
    let hierarchy = AmgHierarchy::build(&a, &config).unwrap();

    let sizes = hierarchy.level_sizes();
    assert_eq!(sizes[0], 400);
    assert!(sizes.windows(2).all(|w| w[1] < w[0]), "{sizes:?}");
    assert!(hierarchy.operator_complexity() >= 1.0);
    assert!(hierarchy.grid_complexity() < 2.0);
    assert_ne!(hierarchy.stop_reason(), StopReason::LevelLimit);

    for (fine, coarse) in hierarchy.levels().iter().zip(hierarchy.levels().iter().skip(1)) {
        let p = fine.prolongation.as_ref().unwrap();
        let r = fine.restriction.as_ref().unwrap();
        assert_eq!((p.num_rows, p.num_cols), (fine.num_dofs(), coarse.num_dofs()));
        assert_eq!((r.num_rows, r.num_cols), (coarse.num_dofs(), fine.num_dofs()));

        // Galerkin operators of a symmetric matrix stay symmetric
        let dense = coarse.matrix.to_dense();
        for i in 0..dense.nrows() {
            for j in 0..i {
                assert_relative_eq!(dense[[i, j]], dense[[j, i]], epsilon = 1e-10);
            }
        }
    }
    assert!(!hierarchy.coarsest().has_coarser());
}

#[test]
fn test_complex_scalars() {
    let a = gallery::poisson_2d::<Complex64>(16, 16);
    let b = random_vector(a.num_rows, 9).mapv(|v| Complex64::new(v, -0.5 * v));

    let amg = AmgPreconditioner::from_csr(&a, AmgConfig::default()).unwrap();
    let sol = pcg(&a, &amg, &b, &cg_config());
    assert!(sol.converged);

    let r = a.residual(&b, &sol.x);
    let r_norm: f64 = r.iter().map(|v| v.norm_sqr()).sum::<f64>().sqrt();
    let b_norm: f64 = b.iter().map(|v| v.norm_sqr()).sum::<f64>().sqrt();
    assert!(r_norm / b_norm < 1e-7);
}

#[test]
fn test_matrix_market_file_feeds_amg() {
    let a = gallery::poisson_2d::<f64>(12, 12);
    let path = std::env::temp_dir().join(format!("math-amg-it-{}.mtx", std::process::id()));
    write_matrix_market(&path, &a).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let loaded = parse_matrix_market(&text).unwrap();
    let amg = AmgPreconditioner::from_csr(&loaded, AmgConfig::default()).unwrap();

    let b = random_vector(a.num_rows, 1);
    let z_file = amg.apply(&b);
    let z_direct = AmgPreconditioner::from_csr(&a, AmgConfig::default())
        .unwrap()
        .apply(&b);
    for (u, v) in z_file.iter().zip(z_direct.iter()) {
        assert_relative_eq!(*u, *v, epsilon = 1e-12);
    }
}
