//! Integration tests for the fairsvm library
//!
//! These tests verify end-to-end behaviour of the fair estimators across
//! the kernel, fairness, solver and projection modules.

use approx::assert_abs_diff_eq;
use fairsvm::metrics;
use fairsvm::model_selection::{GridSearch, ParamGrid};
use fairsvm::{
    Classifier, ConstraintType, CsvOptions, DualOptimizer, FairDataset, FairSvmError, Ferm,
    Kernel, KernelKind, LinearFerm, LinearKernel, LinearPferm, Pferm, SolverConfig,
};
use ndarray::{array, Array1, Array2};
use std::io::Write;
use tempfile::NamedTempFile;

/// Two groups whose positives share the same first coordinate. Group 0
/// negatives sit right under its high positive, group 1 negatives far
/// below, and the second coordinate encodes the group (0 or 10).
fn group_shifted() -> (Array2<f64>, Array1<f64>, Vec<f64>) {
    let rows = [
        // group 0
        (1.0, 0.0, 1.0),
        (3.0, 0.0, 1.0),
        (1.8, 0.0, -1.0),
        (2.0, 0.0, -1.0),
        (2.2, 0.0, -1.0),
        (2.4, 0.0, -1.0),
        // group 1
        (1.0, 10.0, 1.0),
        (3.0, 10.0, 1.0),
        (-3.0, 10.0, -1.0),
        (-2.5, 10.0, -1.0),
        (-2.0, 10.0, -1.0),
        (-1.5, 10.0, -1.0),
    ];
    let x = Array2::from_shape_fn((rows.len(), 2), |(i, j)| {
        if j == 0 {
            rows[i].0
        } else {
            rows[i].1
        }
    });
    let y = rows.iter().map(|r| r.2).collect::<Array1<f64>>();
    let sensitive = rows.iter().map(|r| r.1).collect();
    (x, y, sensitive)
}

/// Noisy two-feature sample with three sensitive values
fn three_group_sample() -> (Array2<f64>, Array1<f64>, Vec<f64>) {
    let x = array![
        [1.2, 0.8],
        [0.9, 1.5],
        [-0.4, -0.9],
        [-1.1, 0.2],
        [2.0, 0.1],
        [1.4, 1.9],
        [0.3, -1.6],
        [-0.8, -0.3],
        [0.6, 2.2],
        [1.7, -0.2],
        [-1.5, -1.2],
        [0.1, 0.4],
        [0.4, 0.9],
        [-0.2, -0.1]
    ];
    let y = array![1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, -1.0];
    let sensitive = vec![
        0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 1.0, 0.0,
    ];
    (x, y, sensitive)
}

/// Mean decision value over the positives of each group
fn positive_group_means(scores: &Array1<f64>, y: &Array1<f64>, sensitive: &[f64]) -> Vec<f64> {
    let mut values: Vec<f64> = sensitive.to_vec();
    values.sort_by(|a, b| a.total_cmp(b));
    values.dedup();
    values
        .iter()
        .map(|&v| {
            let members: Vec<f64> = (0..y.len())
                .filter(|&i| y[i] > 0.0 && sensitive[i] == v)
                .map(|i| scores[i])
                .collect();
            members.iter().sum::<f64>() / members.len() as f64
        })
        .collect()
}

#[test]
fn test_square_scenario() {
    let x = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
    let y = array![-1.0, -1.0, 1.0, 1.0];

    for sensitive in [None, Some(vec![0.0, 1.0, 0.0, 1.0])] {
        let mut svm = Ferm::new().with_kernel("linear").with_c(1.0);
        if let Some(sensitive) = sensitive {
            svm = svm.with_sensible_feature(sensitive);
        }
        svm.fit(x.view(), y.view()).expect("Training should succeed");

        assert_eq!(svm.score(x.view(), y.view()).unwrap(), 1.0);
        let w = svm.weights().unwrap().expect("Linear kernel has weights");
        // Orthogonal to the separating line x2 = 1/2
        assert_abs_diff_eq!(w[0], 0.0, epsilon = 1e-4);
        assert!(w[1] > 0.0);
    }
}

#[test]
fn test_unconstrained_hard_margin_optimality() {
    // Distinct points are always separable under the RBF kernel
    let (x, y, _) = three_group_sample();
    let mut svm = Pferm::new()
        .with_kernel("rbf")
        .with_gamma(0.5)
        .with_hard_margin();
    svm.fit(x.view(), y.view()).expect("Training should succeed");

    let model = svm.model().unwrap();
    let scores = svm.decision_function(x.view()).unwrap();
    let a = model.dual_coefficients();

    // yᵀa = 0
    assert_abs_diff_eq!(a.dot(&y), 0.0, epsilon = 1e-6);
    assert_eq!(svm.score(x.view(), y.view()).unwrap(), 1.0);

    // Support vectors sit on the margin, every other point outside it
    for i in 0..y.len() {
        let margin = y[i] * scores[i];
        if a[i] > 1e-5 {
            assert_abs_diff_eq!(margin, 1.0, epsilon = 1e-2);
        } else {
            assert!(margin >= 1.0 - 1e-2, "point {i} inside margin: {margin}");
        }
    }
}

#[test]
fn test_fairness_constraint_reduces_tpr_gap() {
    let (x, y, sensitive) = group_shifted();

    let mut plain = Ferm::new().with_kernel("linear").with_c(1.0);
    plain.fit(x.view(), y.view()).expect("Training should succeed");
    let plain_pred = plain.predict(x.view()).unwrap();
    let plain_gap = metrics::equalized_odds_gap(y.view(), plain_pred.view(), &sensitive).unwrap();

    let mut fair = Ferm::new()
        .with_kernel("linear")
        .with_c(1.0)
        .with_sensible_feature(sensitive.clone());
    fair.fit(x.view(), y.view()).expect("Training should succeed");
    let fair_pred = fair.predict(x.view()).unwrap();
    let fair_gap = metrics::equalized_odds_gap(y.view(), fair_pred.view(), &sensitive).unwrap();

    assert!(plain_gap > 0.0, "unconstrained model should be unfair");
    assert!(fair_gap < plain_gap, "fair gap {fair_gap} vs {plain_gap}");
    assert_eq!(fair_gap, 0.0);

    // The constraint forbids any weight on the group coordinate
    let w = fair.weights().unwrap().unwrap();
    assert_abs_diff_eq!(w[1], 0.0, epsilon = 1e-6);
}

#[test]
fn test_equalized_odds_balances_positive_scores() {
    let (x, y, sensitive) = three_group_sample();
    let mut svm = Pferm::new()
        .with_kernel("rbf")
        .with_gamma(0.5)
        .with_sensible_feature(sensitive.clone());
    svm.fit(x.view(), y.view()).expect("Training should succeed");

    let scores = svm.decision_function(x.view()).unwrap();
    let means = positive_group_means(&scores, &y, &sensitive);
    assert_eq!(means.len(), 3);
    assert_abs_diff_eq!(means[1], means[0], epsilon = 1e-5);
    assert_abs_diff_eq!(means[2], means[0], epsilon = 1e-5);
}

#[test]
fn test_prior_rescales_reference_scores() {
    let (x, y, sensitive) = three_group_sample();
    let (pi, lamda) = (2.0, 0.5);
    let mut svm = Ferm::new()
        .with_kernel("linear")
        .with_sensible_feature(sensitive.clone())
        .with_prior(pi)
        .with_lamda(lamda);
    svm.fit(x.view(), y.view()).expect("Training should succeed");

    // Margin parts (scores without intercept) satisfy g_max = weight * g_min
    let b = svm.bias().unwrap();
    let scores = svm.decision_function(x.view()).unwrap() - b;
    let means = positive_group_means(&scores, &y, &sensitive);
    let weight = (1.0 - lamda) * pi + lamda;
    assert_abs_diff_eq!(means[2], weight * means[0], epsilon = 1e-5);
}

#[test]
fn test_demographic_parity_balances_all_scores() {
    let (x, y, sensitive) = three_group_sample();
    let mut svm = Pferm::new()
        .with_kernel("rbf")
        .with_constraint(ConstraintType::DemographicParity)
        .with_sensible_feature(sensitive.clone());
    svm.fit(x.view(), y.view()).expect("Training should succeed");

    let scores = svm.decision_function(x.view()).unwrap();
    let group_mean = |value: f64| {
        let members: Vec<f64> = (0..y.len())
            .filter(|&i| sensitive[i] == value)
            .map(|i| scores[i])
            .collect();
        members.iter().sum::<f64>() / members.len() as f64
    };
    assert_abs_diff_eq!(group_mean(1.0), group_mean(0.0), epsilon = 1e-5);
    assert_abs_diff_eq!(group_mean(2.0), group_mean(0.0), epsilon = 1e-5);
}

#[test]
fn test_two_group_paths_agree() {
    let (x, y, sensitive) = group_shifted();
    let mut ferm = Ferm::new()
        .with_kernel("rbf")
        .with_gamma(0.1)
        .with_sensible_feature(sensitive.clone());
    let mut pferm = Pferm::new()
        .with_kernel("rbf")
        .with_gamma(0.1)
        .with_sensible_feature(sensitive);
    ferm.fit(x.view(), y.view()).unwrap();
    pferm.fit(x.view(), y.view()).unwrap();

    assert_eq!(
        ferm.model().unwrap().support_vector_indices(),
        pferm.model().unwrap().support_vector_indices()
    );
    let (a, b) = (ferm.alpha().unwrap(), pferm.alpha().unwrap());
    for i in 0..a.len() {
        assert_abs_diff_eq!(a[i], b[i], epsilon = 1e-6);
    }
    assert_abs_diff_eq!(ferm.bias().unwrap(), pferm.bias().unwrap(), epsilon = 1e-6);
}

#[test]
fn test_single_group_matches_unconstrained() {
    let (x, y, _) = three_group_sample();
    let mut plain = Pferm::new().with_gamma(0.5);
    let mut single = Pferm::new()
        .with_gamma(0.5)
        .with_sensible_feature(vec![4.0; y.len()]);
    plain.fit(x.view(), y.view()).unwrap();
    single.fit(x.view(), y.view()).unwrap();

    assert_eq!(
        plain.model().unwrap().dual_coefficients(),
        single.model().unwrap().dual_coefficients()
    );
    assert_eq!(plain.bias().unwrap(), single.bias().unwrap());
}

#[test]
fn test_hard_margin_on_overlapping_data_fails() {
    let x = array![[0.0], [1.0], [2.0], [3.0]];
    let y = array![1.0, -1.0, 1.0, -1.0];
    let mut svm = Ferm::new().with_kernel("linear").with_hard_margin();
    assert!(svm.fit(x.view(), y.view()).is_err());
    assert!(!svm.is_fitted());
}

#[test]
fn test_linear_ferm_with_grid_search_from_csv() {
    let mut temp_file = NamedTempFile::with_suffix(".csv").expect("Failed to create temp file");
    writeln!(temp_file, "score,group,label").expect("Failed to write");
    let (x, y, _) = group_shifted();
    for i in 0..y.len() {
        let label = if y[i] > 0.0 { 1 } else { 0 };
        writeln!(temp_file, "{},{},{}", x[[i, 0]], x[[i, 1]], label).expect("Failed to write");
    }
    temp_file.flush().expect("Failed to flush");

    let dataset = FairDataset::from_csv(temp_file.path(), &CsvOptions::new(1))
        .expect("Loading should succeed");
    assert_eq!(dataset.len(), 12);
    assert_eq!(dataset.y(), y.view());

    let grid = ParamGrid::new().with_kernels(["linear"]).with_c(vec![0.1, 1.0, 10.0]);
    let search = GridSearch::new(Pferm::new(), grid);
    let mut algorithm = LinearFerm::new(search, dataset.sensitive().to_vec());
    algorithm
        .fit(dataset.x(), dataset.y())
        .expect("Training should succeed");

    // The group coordinate is the one projected out
    assert_eq!(algorithm.step().unwrap().pivot(), 1);
    assert!(algorithm.model().best_params().is_some());

    let predictions = algorithm.predict(dataset.x()).unwrap();
    let gap =
        metrics::equalized_odds_gap(dataset.y(), predictions.view(), dataset.sensitive()).unwrap();
    assert_eq!(gap, 0.0);
}

#[test]
fn test_linear_pferm_three_groups() {
    let (x, y, _) = three_group_sample();
    // Third feature carries the group, shifted for the positives of group 2
    let sensitive = vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 1.0, 0.0];
    let extended = Array2::from_shape_fn((x.nrows(), 3), |(i, j)| {
        if j < 2 {
            x[[i, j]]
        } else {
            sensitive[i]
        }
    });

    let mut algorithm = LinearPferm::new(Pferm::new().with_kernel("linear"), sensitive);
    algorithm
        .fit(extended.view(), y.view())
        .expect("Training should succeed");

    assert_eq!(algorithm.steps().len(), 2);
    let projected = algorithm.new_representation(extended.view()).unwrap();
    assert_eq!(projected.ncols(), 1);
    assert_eq!(projected.view(), algorithm.training_representation().unwrap());
    assert_eq!(algorithm.predict(extended.view()).unwrap().len(), y.len());
}

#[test]
fn test_soft_margin_matches_analytic_solution() {
    // On a line with C = 2 the optimum is w = 1, b = 0:
    //   points 0 and 1 sit on the margin with a = 1.5 (free),
    //   points 2 and 3 lie on the wrong side with a = C (bounded),
    //   points 4 and 5 are well outside the margin with a = 0.
    let x = array![[-1.0], [1.0], [-0.5], [0.5], [3.0], [-3.0]];
    let y = array![-1.0, 1.0, 1.0, -1.0, 1.0, -1.0];

    let optimizer = DualOptimizer::new(
        KernelKind::Linear(LinearKernel::new()),
        Some(2.0),
        SolverConfig::default(),
    );
    let gram = optimizer.kernel().gram(x.view());
    let model = optimizer
        .train(x.view(), y.view(), gram.view(), &[])
        .unwrap();

    let expected = [1.5, 1.5, 2.0, 2.0, 0.0, 0.0];
    for (&a, &e) in model.dual_coefficients().iter().zip(expected.iter()) {
        assert_abs_diff_eq!(a, e, epsilon = 1e-5);
    }
    assert_eq!(model.support_vector_indices(), &[0, 1, 2, 3]);

    // Residuals of the bounded pair (+1.5, -1.5) cancel in the mean
    assert_abs_diff_eq!(model.bias(), 0.0, epsilon = 1e-5);
    let w = model.weights().unwrap();
    assert_abs_diff_eq!(w[0], 1.0, epsilon = 1e-5);

    let margins = model.project(x.view()).unwrap() * &y;
    assert_abs_diff_eq!(margins[0], 1.0, epsilon = 1e-5);
    assert_abs_diff_eq!(margins[1], 1.0, epsilon = 1e-5);
    assert_abs_diff_eq!(margins[2], -0.5, epsilon = 1e-5);
}

#[test]
fn test_error_handling() {
    let x = array![[1.0, 2.0], [2.0, 1.0]];
    let y = array![1.0, -1.0];

    let svm = Pferm::new();
    assert!(matches!(
        svm.predict(x.view()),
        Err(FairSvmError::ModelNotTrained)
    ));

    let mut svm = Pferm::new().with_sensible_feature(vec![0.0, 1.0, 2.0]);
    assert!(matches!(
        svm.fit(x.view(), y.view()),
        Err(FairSvmError::DimensionMismatch { .. })
    ));

    let mut svm = Pferm::new().with_gamma(0.0);
    assert!(matches!(
        svm.fit(x.view(), y.view()),
        Err(FairSvmError::InvalidParameter(_))
    ));

    let algorithm = LinearPferm::new(Pferm::new(), vec![0.0, 1.0]);
    assert!(matches!(
        algorithm.predict(x.view()),
        Err(FairSvmError::ModelNotTrained)
    ));
}
