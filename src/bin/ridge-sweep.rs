use clap::{CommandFactory, Parser};
use log::{error, LevelFilter};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ridge_sweep::data::LabelPosition;
use ridge_sweep::model::eval::{Experiment, DEFAULT_ALPHAS};
use ridge_sweep::DataSet;
use simple_logger::SimpleLogger;
use std::path::{Path, PathBuf};
use std::process;

/// Evaluate a one-vs-all ridge regression classifier over a sweep of regularization strengths
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to training data file
    ///
    /// Each non-blank line holds comma-separated numeric features and one class label.
    train_path: Option<PathBuf>,

    /// Path to test data file, in the same format as the training data
    test_path: Option<PathBuf>,

    /// Read the class label from the first field of each line instead of the last
    #[arg(long)]
    head: bool,

    /// Scale each feature column to unit length before fitting
    #[arg(long)]
    normalize: bool,

    /// Seed for breaking ties between equally scored classes
    ///
    /// If not provided, the seed is drawn from the operating system.
    #[arg(long)]
    seed: Option<u64>,

    /// Regularization strengths to evaluate, in order
    #[arg(long, value_name = "ALPHA", value_delimiter = ',', default_values_t = DEFAULT_ALPHAS)]
    alphas: Vec<f64>,
}

/// Both data file paths, or None if either is missing.
fn input_paths(cli: &Cli) -> Option<(&Path, &Path)> {
    Some((cli.train_path.as_deref()?, cli.test_path.as_deref()?))
}

fn run(cli: &Cli, train_path: &Path, test_path: &Path) -> ridge_sweep::Result<()> {
    let label_position = if cli.head {
        LabelPosition::Head
    } else {
        LabelPosition::Tail
    };

    let train_dataset = DataSet::load_csv_file(train_path, label_position)?;
    let test_dataset = DataSet::load_csv_file(test_path, label_position)?;
    let experiment = Experiment::from_datasets(&train_dataset, &test_dataset)?;

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    experiment.sweep(&cli.alphas, cli.normalize, &mut rng, |accuracy| {
        println!("{}", accuracy)
    })?;
    Ok(())
}

fn main() {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .unwrap();
    let cli = Cli::parse();

    let (train_path, test_path) = match input_paths(&cli) {
        Some(paths) => paths,
        None => {
            println!("{}", Cli::command().render_usage());
            process::exit(1);
        }
    };

    if let Err(err) = run(&cli, train_path, test_path) {
        error!("{}", err);
        process::exit(1);
    }
}

#[test]
fn verify_cli() {
    Cli::command().debug_assert();
}

#[test]
fn parse_cli() {
    let cli = Cli::try_parse_from(["ridge-sweep", "train.csv", "test.csv", "--head"]).unwrap();
    assert!(cli.head);
    assert!(!cli.normalize);
    assert_eq!(Some(PathBuf::from("test.csv")), cli.test_path);
    assert_eq!(DEFAULT_ALPHAS.to_vec(), cli.alphas);

    let cli = Cli::try_parse_from(["ridge-sweep", "train.csv", "--alphas", "0.1,2", "--seed", "3"])
        .unwrap();
    assert_eq!(None, cli.test_path);
    assert_eq!(vec![0.1, 2.], cli.alphas);
    assert_eq!(Some(3), cli.seed);
}

#[test]
fn input_paths_require_both_files() {
    let cli = Cli::try_parse_from(["ridge-sweep", "train.csv", "test.csv"]).unwrap();
    assert_eq!(
        Some((Path::new("train.csv"), Path::new("test.csv"))),
        input_paths(&cli)
    );

    let cli = Cli::try_parse_from(["ridge-sweep", "train.csv", "--head"]).unwrap();
    assert_eq!(None, input_paths(&cli));

    let cli = Cli::try_parse_from(["ridge-sweep"]).unwrap();
    assert_eq!(None, input_paths(&cli));

    let usage = Cli::command().render_usage().to_string();
    assert!(usage.contains("ridge-sweep"));
}
