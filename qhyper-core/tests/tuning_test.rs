use std::sync::Arc;

use qhyper_core::{
    problem_from_config, Dummy, EvaluationConfig, GibbsSampler, HyperOptimizerConfig,
    HyperparametersOptimizer, Item, KnapsackProblem, ProbabilityObjective, Problem, ProblemConfig,
    RandomSearch, Worker,
};
use serde_json::json;

fn knapsack_objective() -> ProbabilityObjective {
    let problem = KnapsackProblem::new(vec![Item::new(1, 2.0), Item::new(1, 1.0)], 2).unwrap();
    ProbabilityObjective::new(
        Arc::new(problem),
        Arc::new(GibbsSampler::new()),
        EvaluationConfig::default(),
    )
}

#[test]
fn test_random_search_tunes_penalty_weights() {
    let objective = knapsack_objective();
    let creator = |weights: &[f64]| {
        let objective = objective.clone();
        let weights = weights.to_vec();
        move |params: &[f64]| objective.evaluate(&weights, params)
    };
    // Temperature is the only inner argument
    let worker = Worker::new(creator, &Dummy, vec![0.5]);

    let search = RandomSearch::new(40)
        .with_bounds(0.0, 5.0)
        .with_seed(11)
        .with_processes(2);
    let result = search.minimize(&worker, &[1.0, 1.0, 1.0]).unwrap();

    assert_eq!(result.evaluations.len(), 40);
    assert!(result.best_value < 0.0);
    for (_, value) in &result.evaluations {
        assert!(result.best_value <= *value);
    }

    // the reported value is reproducible
    let again = objective.evaluate(&result.best_params, &[0.5]).unwrap();
    assert_eq!(again, result.best_value);
}

#[test]
fn test_grid_search_from_json() {
    let objective = knapsack_objective();
    let creator = |weights: &[f64]| {
        let objective = objective.clone();
        let weights = weights.to_vec();
        move |params: &[f64]| objective.evaluate(&weights, params)
    };
    let worker = Worker::new(creator, &Dummy, vec![0.5]);

    let config: HyperOptimizerConfig = serde_json::from_value(json!({
        "type": "grid",
        "points_per_dim": 3,
        "bounds": [0.0, 4.0],
        "processes": 2
    }))
    .unwrap();
    let optimizer = config.build();
    let result = optimizer.minimize(&worker, &[1.0, 1.0, 1.0]).unwrap();

    assert_eq!(optimizer.name(), "grid");
    assert_eq!(result.evaluations.len(), 27);
    assert!(result.best_value < 0.0);
    // weights are drawn from {0, 2, 4}
    assert!(result
        .best_params
        .iter()
        .all(|w| [0.0, 2.0, 4.0].contains(w)));
}

#[test]
fn test_objective_from_problem_config() {
    let value = json!({"type": "maxcut", "edges": [[0, 1], [1, 2], [2, 3], [3, 0]]});
    let problem: Arc<dyn Problem> =
        Arc::from(problem_from_config(&ProblemConfig::from_json(&value).unwrap()).unwrap());

    let objective = ProbabilityObjective::new(
        problem,
        Arc::new(GibbsSampler::new()),
        EvaluationConfig::default().with_limit(2),
    );
    // the two optimal cuts are the two most probable states
    let value = objective.evaluate_args(&[1.0, 1.0]).unwrap();
    assert!((value + 4.0).abs() < 1e-9);
}
