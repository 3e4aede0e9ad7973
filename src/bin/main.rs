//! fairsvm Command Line Interface
//!
//! Trains fair classifiers on CSV data with a sensitive column and reports
//! accuracy together with the equalized-odds or demographic-parity gap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use fairsvm::core::{Classifier, ConstraintType, Hyperparams, Result};
use fairsvm::metrics::{self, EvaluationMetrics};
use fairsvm::model_selection::{GridSearch, ParamGrid, StratifiedKFold};
use fairsvm::{CsvOptions, FairDataset, Ferm, LinearFerm, LinearPferm, Pferm, Prior};
use log::{error, info};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "fairsvm")]
#[command(about = "Fairness-constrained support vector machines")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train one algorithm and report accuracy and fairness
    Evaluate(EvaluateArgs),
    /// Compare a standard SVM against FERM and PFERM
    Compare(CompareArgs),
}

#[derive(Args)]
struct DataArgs {
    /// Training data file (CSV, label in the last column)
    #[arg(long)]
    data: PathBuf,

    /// Test data file; without it the training file is split sequentially
    #[arg(long)]
    test: Option<PathBuf>,

    /// Feature column holding the sensitive value
    #[arg(short, long)]
    sensitive_column: usize,

    /// Remove the sensitive column from the features
    #[arg(long)]
    drop_sensitive: bool,

    /// Share of rows used for training when no test file is given
    #[arg(short, long, default_value = "0.8")]
    ratio: f64,
}

#[derive(Args)]
struct ModelArgs {
    /// Kernel: linear or rbf
    #[arg(short, long, default_value = "rbf")]
    kernel: String,

    /// Regularization parameter C
    #[arg(short = 'C', long, default_value = "1.0")]
    c: f64,

    /// Train a hard-margin SVM (ignores C)
    #[arg(long)]
    hard_margin: bool,

    /// RBF kernel bandwidth
    #[arg(short, long, default_value = "1.0")]
    gamma: f64,

    /// Fairness notion: EO or DP
    #[arg(long, default_value = "EO")]
    constraint: ConstraintType,

    /// Prior ratio(s) between each group and the reference group
    #[arg(long, num_args = 1..)]
    prior: Vec<f64>,

    /// Blend between the prior ratio and 1
    #[arg(long, default_value = "0.5")]
    lamda: f64,

    /// JSON parameter grid searched with stratified cross-validation
    #[arg(long)]
    grid: Option<PathBuf>,

    /// Number of cross-validation folds for the grid search
    #[arg(long, default_value = "3")]
    folds: usize,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Algorithm {
    /// Unconstrained kernel SVM
    #[value(name = "svm")]
    Svm,
    /// Kernel SVM with one fairness constraint
    #[value(name = "ferm")]
    Ferm,
    /// Kernel SVM with one fairness constraint per group
    #[value(name = "pferm")]
    Pferm,
    /// Linear SVM on features with the group direction projected out
    #[value(name = "linear-ferm")]
    LinearFerm,
    /// Linear SVM on features with every group direction projected out
    #[value(name = "linear-pferm")]
    LinearPferm,
}

#[derive(Args)]
struct EvaluateArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    model: ModelArgs,

    /// Algorithm to train
    #[arg(short, long, default_value = "ferm")]
    algorithm: Algorithm,

    /// Show detailed metrics
    #[arg(long)]
    detailed: bool,
}

#[derive(Args)]
struct CompareArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    model: ModelArgs,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Evaluate(args) => evaluate_command(args),
        Commands::Compare(args) => compare_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

/// Accuracy and fairness gap on both splits
struct Report {
    name: &'static str,
    accuracy_train: f64,
    accuracy_test: f64,
    gap_train: f64,
    gap_test: f64,
    test_metrics: EvaluationMetrics,
}

fn load_data(args: &DataArgs) -> Result<(FairDataset, FairDataset)> {
    let options = CsvOptions::new(args.sensitive_column).with_drop_sensitive(args.drop_sensitive);
    info!("Loading dataset from: {:?}", args.data);
    let dataset = FairDataset::from_csv(&args.data, &options)?;

    let (train, test) = match &args.test {
        Some(path) => {
            info!("Loading test data from: {path:?}");
            (dataset, FairDataset::from_csv(path, &options)?)
        }
        None => dataset.split(args.ratio)?,
    };
    info!(
        "{} training and {} test examples, {} features, sensitive values {:?}",
        train.len(),
        test.len(),
        train.n_features(),
        train.sensitive_values()
    );
    Ok((train, test))
}

fn hyperparams(args: &ModelArgs, sensitive: Option<&[f64]>) -> Hyperparams {
    let pi = match args.prior.as_slice() {
        [] => Prior::default(),
        [single] => Prior::Scalar(*single),
        many => Prior::PerGroup(many.to_vec()),
    };
    Hyperparams {
        kernel: args.kernel.clone(),
        c: if args.hard_margin { None } else { Some(args.c) },
        sensible_feature: sensitive.map(<[f64]>::to_vec),
        gamma: args.gamma,
        prior: !args.prior.is_empty(),
        pi,
        constraint: args.constraint,
        lamda: args.lamda,
    }
}

fn load_grid(args: &ModelArgs) -> Result<Option<(ParamGrid, StratifiedKFold)>> {
    match &args.grid {
        Some(path) => {
            let grid = ParamGrid::from_file(path)?;
            info!("Grid search over {} candidates", grid.len());
            Ok(Some((grid, StratifiedKFold::new(args.folds)?)))
        }
        None => Ok(None),
    }
}

/// Fit `model` on the training split and measure both splits
fn run<M: Classifier>(
    name: &'static str,
    mut model: M,
    train: &FairDataset,
    test: &FairDataset,
    constraint: ConstraintType,
) -> Result<Report> {
    info!("Training {name}...");
    model.fit(train.x(), train.y())?;

    let pred_train = model.predict(train.x())?;
    let pred_test = model.predict(test.x())?;
    let gap = |data: &FairDataset, pred: &ndarray::Array1<f64>| match constraint {
        ConstraintType::EqualizedOdds => {
            metrics::equalized_odds_gap(data.y(), pred.view(), data.sensitive())
        }
        ConstraintType::DemographicParity => {
            metrics::demographic_parity_gap(data.y(), pred.view(), data.sensitive())
        }
    };

    Ok(Report {
        name,
        accuracy_train: metrics::accuracy(train.y(), pred_train.view())?,
        accuracy_test: metrics::accuracy(test.y(), pred_test.view())?,
        gap_train: gap(train, &pred_train)?,
        gap_test: gap(test, &pred_test)?,
        test_metrics: EvaluationMetrics::from_predictions(test.y(), pred_test.view())?,
    })
}

/// Wrap in a grid search when a grid is configured
fn run_kernel<S>(
    name: &'static str,
    estimator: fairsvm::FairSvm<S>,
    grid: &Option<(ParamGrid, StratifiedKFold)>,
    train: &FairDataset,
    test: &FairDataset,
    constraint: ConstraintType,
) -> Result<Report>
where
    S: fairsvm::GroupingStrategy,
{
    match grid {
        Some((grid, cv)) => {
            let search = GridSearch::new(estimator, grid.clone()).with_cv(*cv);
            run(name, search, train, test, constraint)
        }
        None => run(name, estimator, train, test, constraint),
    }
}

fn train_algorithm(
    algorithm: Algorithm,
    args: &ModelArgs,
    train: &FairDataset,
    test: &FairDataset,
) -> Result<Report> {
    let grid = load_grid(args)?;
    let sensitive = Some(train.sensitive());
    let constraint = args.constraint;

    match algorithm {
        Algorithm::Svm => run_kernel(
            "SVM",
            Pferm::with_params(hyperparams(args, None)),
            &grid,
            train,
            test,
            constraint,
        ),
        Algorithm::Ferm => run_kernel(
            "FERM",
            Ferm::with_params(hyperparams(args, sensitive)),
            &grid,
            train,
            test,
            constraint,
        ),
        Algorithm::Pferm => run_kernel(
            "PFERM",
            Pferm::with_params(hyperparams(args, sensitive)),
            &grid,
            train,
            test,
            constraint,
        ),
        Algorithm::LinearFerm | Algorithm::LinearPferm => {
            let mut params = hyperparams(args, None);
            params.kernel = "linear".to_string();
            let inner = Pferm::with_params(params);
            let sensitive = train.sensitive().to_vec();

            if algorithm == Algorithm::LinearFerm {
                let pi = args.prior.first().copied();
                match &grid {
                    Some((grid, cv)) => {
                        let search = GridSearch::new(inner, grid.clone()).with_cv(*cv);
                        let model = with_scalar_prior(LinearFerm::new(search, sensitive), pi);
                        run("Linear FERM", model, train, test, constraint)
                    }
                    None => {
                        let model = with_scalar_prior(LinearFerm::new(inner, sensitive), pi);
                        run("Linear FERM", model, train, test, constraint)
                    }
                }
            } else {
                let prior_params = hyperparams(args, None);
                match &grid {
                    Some((grid, cv)) => {
                        let search = GridSearch::new(inner, grid.clone()).with_cv(*cv);
                        let model =
                            with_group_prior(LinearPferm::new(search, sensitive), &prior_params);
                        run("Linear PFERM", model, train, test, constraint)
                    }
                    None => {
                        let model =
                            with_group_prior(LinearPferm::new(inner, sensitive), &prior_params);
                        run("Linear PFERM", model, train, test, constraint)
                    }
                }
            }
        }
    }
}

fn with_scalar_prior<M: Classifier>(model: LinearFerm<M>, pi: Option<f64>) -> LinearFerm<M> {
    match pi {
        Some(pi) => model.with_prior(pi),
        None => model,
    }
}

fn with_group_prior<M: Classifier>(model: LinearPferm<M>, params: &Hyperparams) -> LinearPferm<M> {
    if params.prior {
        model.with_prior(params.pi.clone())
    } else {
        model
    }
}

fn print_report(report: &Report, constraint: ConstraintType) {
    let gap_name = match constraint {
        ConstraintType::EqualizedOdds => "DEO",
        ConstraintType::DemographicParity => "DDP",
    };
    println!("=== {} ===", report.name);
    println!("  Accuracy train: {:.4}", report.accuracy_train);
    println!("  Accuracy test:  {:.4}", report.accuracy_test);
    println!("  {gap_name} train:      {:.4}", report.gap_train);
    println!("  {gap_name} test:       {:.4}", report.gap_test);
}

fn evaluate_command(args: EvaluateArgs) -> Result<()> {
    let (train, test) = load_data(&args.data)?;
    let report = train_algorithm(args.algorithm, &args.model, &train, &test)?;

    print_report(&report, args.model.constraint);

    if args.detailed {
        let metrics = &report.test_metrics;
        println!("\nDetailed Metrics (test):");
        println!("  True Positives:  {}", metrics.true_positives);
        println!("  True Negatives:  {}", metrics.true_negatives);
        println!("  False Positives: {}", metrics.false_positives);
        println!("  False Negatives: {}", metrics.false_negatives);
        println!("  Precision:       {:.4}", metrics.precision());
        println!("  Recall:          {:.4}", metrics.recall());
        println!("  F1 Score:        {:.4}", metrics.f1_score());
        println!("  Specificity:     {:.4}", metrics.specificity());
    }

    Ok(())
}

fn compare_command(args: CompareArgs) -> Result<()> {
    let (train, test) = load_data(&args.data)?;

    for algorithm in [Algorithm::Svm, Algorithm::Ferm, Algorithm::Pferm] {
        let report = train_algorithm(algorithm, &args.model, &train, &test)?;
        print_report(&report, args.model.constraint);
    }

    Ok(())
}
