//! CLI wiring for QHyper.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use qhyper_core::{
    add_evaluation_to_results, sort_solver_results, weighted_avg_evaluation, Converter, Dummy,
    EvaluatedResult, EvaluationConfig, GibbsSampler, ProbabilityObjective, ProbabilitySource,
    Problem, SolverResults, Worker,
};
use serde::Serialize;
use tracing::info;

use crate::config::{load_problem, load_results, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "qhyper", about = "QUBO solver evaluation and hyperparameter tuning")]
pub struct Cli {
    /// Print reports as JSON
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score a solver's probability distribution against a problem.
    Evaluate {
        #[arg(long)]
        problem: PathBuf,
        #[arg(long)]
        results: PathBuf,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        penalty: f64,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value_t = false)]
        no_normalize: bool,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Search penalty weights for the Gibbs distribution of a problem.
    Tune {
        #[arg(long)]
        config: PathBuf,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Print the Gibbs distribution of a weighted cost polynomial.
    Sample {
        #[arg(long)]
        problem: PathBuf,
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        weights: Vec<f64>,
        #[arg(long, default_value_t = 1.0)]
        temperature: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        penalty: f64,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

/// Output of every subcommand
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Weighted average score
    pub value: f64,
    /// Weights chosen by the tuner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_weights: Option<Vec<f64>>,
    /// Most probable results with their scores
    pub results: Vec<EvaluatedResult>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(weights) = &self.best_weights {
            writeln!(f, "Best weights: {:?}", weights)?;
        }
        writeln!(f, "Evaluation: {}", self.value)?;
        writeln!(f)?;
        write!(f, "{}", format_table(&self.results))
    }
}

/// Ranked results as a `Result | Prob | Evaluation` table
pub fn format_table(rows: &[EvaluatedResult]) -> String {
    let width = rows
        .iter()
        .map(|r| r.bitstring.len())
        .max()
        .unwrap_or(0)
        .max("Result".len());

    let mut out = format!("{:<width$}  {:>10}  {:>10}\n", "Result", "Prob", "Evaluation");
    for row in rows {
        out.push_str(&format!(
            "{:<width$}  {:>10.6}  {:>10.4}\n",
            row.bitstring, row.probability, row.score
        ));
    }
    out
}

fn ranked(
    results: &SolverResults,
    problem: &dyn Problem,
    penalty: f64,
    top: usize,
) -> Vec<EvaluatedResult> {
    let top = sort_solver_results(results, Some(top));
    add_evaluation_to_results(&top, |x, p| problem.get_score(x, p), penalty)
}

pub fn evaluate(
    problem_path: &Path,
    results_path: &Path,
    config: &EvaluationConfig,
    top: usize,
) -> Result<Report> {
    let problem = load_problem(problem_path)?;
    let results = load_results(results_path)?;
    if let Some(n_bits) = results.n_bits() {
        if n_bits != problem.num_variables() {
            anyhow::bail!(
                "results have {} bits but {} has {} variables",
                n_bits,
                problem.name(),
                problem.num_variables()
            );
        }
    }

    let value = weighted_avg_evaluation(&results, |x, p| problem.get_score(x, p), config)?;
    info!(problem = problem.name(), value, "evaluated results");

    Ok(Report {
        value,
        best_weights: None,
        results: ranked(&results, problem.as_ref(), config.penalty, top),
    })
}

pub fn tune(config_path: &Path, top: usize) -> Result<Report> {
    let run = RunConfig::load(config_path)?;
    let problem: Arc<dyn Problem> = Arc::from(run.build_problem()?);

    let mut sampler = GibbsSampler::new();
    if let Some(limit) = run.max_variables {
        sampler = sampler.with_max_variables(limit);
    }
    let objective = ProbabilityObjective::new(
        Arc::clone(&problem),
        Arc::new(sampler),
        run.evaluation.clone(),
    );

    let hyperparams_init = if run.hyperparams_init.is_empty() {
        vec![1.0; objective.n_weights()]
    } else {
        run.hyperparams_init.clone()
    };
    if hyperparams_init.len() != objective.n_weights() {
        anyhow::bail!(
            "{} expects {} weights, hyperparams_init has {}",
            problem.name(),
            objective.n_weights(),
            hyperparams_init.len()
        );
    }

    let creator = |weights: &[f64]| {
        let objective = objective.clone();
        let weights = weights.to_vec();
        move |params: &[f64]| objective.evaluate(&weights, params)
    };
    let worker = Worker::new(creator, &Dummy, vec![run.temperature]);

    let optimizer = run.tuner.build();
    info!(
        optimizer = optimizer.name(),
        problem = problem.name(),
        dim = hyperparams_init.len(),
        "starting hyperparameter search"
    );
    let search = optimizer
        .minimize(&worker, &hyperparams_init)
        .context("hyperparameter search failed")?;

    let results = objective.results(&search.best_params, &[run.temperature])?;
    Ok(Report {
        value: search.best_value,
        results: ranked(&results, problem.as_ref(), run.evaluation.penalty, top),
        best_weights: Some(search.best_params),
    })
}

pub fn sample(
    problem_path: &Path,
    weights: &[f64],
    temperature: f64,
    penalty: f64,
    top: usize,
) -> Result<Report> {
    let problem = load_problem(problem_path)?;
    let cost = Converter::create_cost_polynomial(problem.as_ref(), weights)?;

    let n_vars = problem.num_variables();
    let probs = GibbsSampler::new().probabilities(&cost, n_vars, &[temperature])?;
    let results = SolverResults::from_probabilities(&probs, n_vars)?;

    let config = EvaluationConfig::default().with_penalty(penalty);
    let value = weighted_avg_evaluation(&results, |x, p| problem.get_score(x, p), &config)?;

    Ok(Report {
        value,
        best_weights: None,
        results: ranked(&results, problem.as_ref(), penalty, top),
    })
}

pub fn run_cli(cli: Cli) -> Result<()> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let Cli { json, command } = cli;
    let report = match command {
        Command::Evaluate {
            problem,
            results,
            penalty,
            limit,
            no_normalize,
            top,
        } => {
            let config = EvaluationConfig {
                penalty,
                limit_results: limit,
                normalize: !no_normalize,
            };
            evaluate(&problem, &results, &config, top)?
        }
        Command::Tune { config, top } => tune(&config, top)?,
        Command::Sample {
            problem,
            weights,
            temperature,
            penalty,
            top,
        } => sample(&problem, &weights, temperature, penalty, top)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn maxcut_file() -> NamedTempFile {
        write_temp(r#"{"type": "maxcut", "edges": [[0, 1], [1, 2], [2, 3], [3, 0]]}"#)
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sample_weights() {
        let cli = Cli::try_parse_from([
            "qhyper", "sample", "--problem", "p.json", "--weights", "1,-2.5", "--top", "3",
        ])
        .unwrap();
        match cli.command {
            Command::Sample { weights, top, .. } => {
                assert_eq!(weights, vec![1.0, -2.5]);
                assert_eq!(top, 3);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_format_table() {
        let rows = vec![
            EvaluatedResult {
                bitstring: "0101".into(),
                probability: 0.5,
                score: -4.0,
            },
            EvaluatedResult {
                bitstring: "1010".into(),
                probability: 0.25,
                score: -4.0,
            },
        ];
        let table = format_table(&rows);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Result"));
        assert!(lines[0].ends_with("Evaluation"));
        assert!(lines[1].starts_with("0101"));
        assert!(lines[1].contains("0.500000"));
        assert!(lines[2].contains("-4.0000"));
    }

    #[test]
    fn test_evaluate_command() {
        let problem = maxcut_file();
        let results = write_temp(r#"{"0101": 0.5, "1010": 0.25, "0000": 0.25}"#);

        let config = EvaluationConfig::default();
        let report = evaluate(problem.path(), results.path(), &config, 2).unwrap();

        // 0.75 * (-4) + 0.25 * 0
        assert!((report.value + 3.0).abs() < 1e-12);
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].bitstring, "0101");
        assert_eq!(report.results[0].score, -4.0);
    }

    #[test]
    fn test_evaluate_limit_keeps_first_of_tie() {
        let problem = write_temp(r#"{"type": "maxcut", "edges": [[0, 1]]}"#);
        let results = write_temp(r#"{"01": 0.5, "00": 0.5}"#);

        let config = EvaluationConfig::default().with_limit(1);
        let report = evaluate(problem.path(), results.path(), &config, 1).unwrap();

        assert_eq!(report.results[0].bitstring, "01");
        assert_eq!(report.value, -1.0);
    }

    #[test]
    fn test_evaluate_rejects_wrong_width() {
        let problem = maxcut_file();
        let results = write_temp(r#"{"01": 1.0}"#);
        let config = EvaluationConfig::default();
        assert!(evaluate(problem.path(), results.path(), &config, 5).is_err());
    }

    #[test]
    fn test_sample_command() {
        let problem = maxcut_file();
        let report = sample(problem.path(), &[], 0.05, 0.0, 2).unwrap();

        assert!((report.value + 4.0).abs() < 1e-6);
        let top: Vec<&str> = report.results.iter().map(|r| r.bitstring.as_str()).collect();
        assert_eq!(top, vec!["0101", "1010"]);
    }

    #[test]
    fn test_tune_command() {
        let run = write_temp(
            r#"{
                "problem": {"type": "knapsack", "items": [[1, 2], [1, 1]], "max_weight": 2},
                "tuner": {"type": "random", "number_of_samples": 12, "seed": 4, "processes": 2},
                "temperature": 0.5
            }"#,
        );
        let report = tune(run.path(), 4).unwrap();

        let weights = report.best_weights.as_ref().unwrap();
        assert_eq!(weights.len(), 3);
        assert!(report.value < 0.0);
        assert_eq!(report.results.len(), 4);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("best_weights").is_some());
    }

    #[test]
    fn test_tune_rejects_wrong_init() {
        let run = write_temp(
            r#"{
                "problem": {"type": "maxcut", "edges": [[0, 1]]},
                "hyperparams_init": [1, 1]
            }"#,
        );
        assert!(tune(run.path(), 4).is_err());
    }
}
