//! Simulated annealing over class order.
//!
//! Every candidate order is scored by regenerating the full schedule, so
//! trials share no state beyond the current and best orders.
//!
//! # Algorithm
//!
//! 1. Start from the natural (import) order of schedulable classes.
//! 2. Propose a neighbor by swapping two distinct random positions.
//! 3. Accept improving neighbors; accept worsening ones with probability
//!    `exp(-delta / T)` (Metropolis criterion).
//! 4. Cool geometrically until frozen or the iteration cap is hit.
//!
//! The best order seen is kept apart from the current state and returned,
//! so the result never costs more than the initial order.
//!
//! # Reference
//! Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::models::{CompetitionData, SchedulerSettings};
use crate::scheduler::{schedulable_classes, ScheduleGenerator};
use crate::validation::validate_competition;

use super::cost::{evaluate, CostBreakdown};

/// Temperature control for the annealing loop.
pub trait CoolingSchedule: std::fmt::Debug {
    /// Resets to the initial temperature.
    fn on_start(&mut self);

    /// Advances one step.
    fn update(&mut self);

    /// Current temperature.
    fn current(&self) -> f64;

    /// Whether worsening moves are no longer considered.
    fn is_frozen(&self) -> bool;
}

/// Geometric cooling: `T(k+1) = T(k) * alpha`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometricCooling {
    initial: f64,
    current: f64,
    alpha: f64,
    min_temp: f64,
}

impl GeometricCooling {
    /// Creates a schedule; `alpha` should lie in `(0, 1)`.
    pub fn new(initial: f64, alpha: f64, min_temp: f64) -> Self {
        Self {
            initial,
            current: initial,
            alpha,
            min_temp,
        }
    }
}

impl CoolingSchedule for GeometricCooling {
    #[inline]
    fn on_start(&mut self) {
        self.current = self.initial;
    }

    #[inline]
    fn update(&mut self) {
        self.current *= self.alpha;
    }

    #[inline]
    fn current(&self) -> f64 {
        self.current
    }

    #[inline]
    fn is_frozen(&self) -> bool {
        self.current <= self.min_temp
    }
}

/// Annealing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnealingConfig {
    /// Starting temperature (cost units, ms).
    pub initial_temperature: f64,
    /// Multiplier per iteration, in `(0, 1)`.
    pub cooling_rate: f64,
    /// The search stops once the temperature is at or below this.
    pub min_temperature: f64,
    /// Iteration cap.
    pub max_iterations: usize,
    /// Progress callback cadence (iterations).
    pub progress_interval: usize,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 1000.0,
            cooling_rate: 0.995,
            min_temperature: 1.0,
            max_iterations: 1000,
            progress_interval: 50,
            seed: None,
        }
    }
}

impl AnnealingConfig {
    /// Sets the iteration cap.
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the cooling multiplier.
    pub fn with_cooling_rate(mut self, rate: f64) -> Self {
        self.cooling_rate = rate;
        self
    }

    /// Checks parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(ScheduleError::InvalidConfig(format!(
                "cooling rate {} must be in (0, 1)",
                self.cooling_rate
            )));
        }
        if !self.initial_temperature.is_finite() || self.initial_temperature <= 0.0 {
            return Err(ScheduleError::InvalidConfig(format!(
                "initial temperature {} must be positive",
                self.initial_temperature
            )));
        }
        if self.progress_interval == 0 {
            return Err(ScheduleError::InvalidConfig(
                "progress interval must be at least 1".into(),
            ));
        }
        Ok(())
    }

    fn cooling(&self) -> GeometricCooling {
        GeometricCooling::new(self.initial_temperature, self.cooling_rate, self.min_temperature)
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

/// Outcome of a class-order search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    /// Best class order found (class ids).
    pub class_order: Vec<String>,
    /// Cost of the natural order.
    pub initial_cost: f64,
    /// Cost of `class_order`.
    pub best_cost: f64,
    /// Makespan of the best schedule (s).
    pub makespan_secs: i64,
    /// Soft-rule violations in the best schedule.
    pub soft_violations: usize,
    /// Iterations run.
    pub iterations: usize,
    /// Whether the best order beats the natural order.
    pub improved: bool,
}

/// Scores class orders by full regeneration.
struct OrderEvaluator<'a> {
    generator: ScheduleGenerator,
    data: &'a CompetitionData,
}

impl OrderEvaluator<'_> {
    fn evaluate(&self, order: &[String]) -> CostBreakdown {
        let schedule = self.generator.generate_with_order(self.data, order);
        evaluate(&schedule, self.data, &self.generator.settings().soft_rules)
    }
}

/// Searches class orders for a cheaper schedule.
///
/// `on_progress` receives `iteration / max_iterations` every
/// `progress_interval` iterations. With zero or one schedulable class the
/// natural order is returned without searching.
pub fn optimize<F>(
    data: &CompetitionData,
    settings: &SchedulerSettings,
    config: &AnnealingConfig,
    mut on_progress: F,
) -> Result<OptimizationResult>
where
    F: FnMut(f64),
{
    config.validate()?;
    validate_competition(data).map_err(ScheduleError::InvalidCompetition)?;
    let evaluator = OrderEvaluator {
        generator: ScheduleGenerator::new(settings.clone())?,
        data,
    };

    let initial_order: Vec<String> = schedulable_classes(data, settings)
        .iter()
        .map(|c| c.id.clone())
        .collect();
    let initial_cost = evaluator.evaluate(&initial_order);

    let mut current = initial_order.clone();
    let mut current_cost = initial_cost;
    let mut best = initial_order;
    let mut best_cost = initial_cost;
    let mut iterations = 0;

    if best.len() > 1 {
        let mut rng = config.rng();
        let mut cooling = config.cooling();
        cooling.on_start();

        while !cooling.is_frozen() && iterations < config.max_iterations {
            let neighbor = swap_neighbor(&current, &mut rng);
            let neighbor_cost = evaluator.evaluate(&neighbor);
            let delta = neighbor_cost.total() - current_cost.total();

            if accept(delta, cooling.current(), &mut rng) {
                current = neighbor;
                current_cost = neighbor_cost;
                if current_cost.total() < best_cost.total() {
                    best = current.clone();
                    best_cost = current_cost;
                }
            }

            cooling.update();
            iterations += 1;

            if iterations % config.progress_interval == 0 {
                debug!(
                    "annealing iteration {iterations}: T={:.2}, current={:.0}, best={:.0}",
                    cooling.current(),
                    current_cost.total(),
                    best_cost.total()
                );
                on_progress(iterations as f64 / config.max_iterations as f64);
            }
        }
    }

    let improved = best_cost.total() < initial_cost.total();
    info!(
        "class order search: {iterations} iterations, cost {:.0} -> {:.0}{}",
        initial_cost.total(),
        best_cost.total(),
        if improved { "" } else { " (no improvement)" }
    );

    Ok(OptimizationResult {
        class_order: best,
        initial_cost: initial_cost.total(),
        best_cost: best_cost.total(),
        makespan_secs: (best_cost.makespan_ms / 1000.0) as i64,
        soft_violations: best_cost.soft_violations,
        iterations,
        improved,
    })
}

/// Swaps two distinct random positions. Needs at least two elements.
fn swap_neighbor<R: Rng>(order: &[String], rng: &mut R) -> Vec<String> {
    let mut neighbor = order.to_vec();
    let len = neighbor.len();
    if len < 2 {
        return neighbor;
    }
    let i = rng.random_range(0..len);
    let mut j = rng.random_range(0..len - 1);
    if j >= i {
        j += 1;
    }
    neighbor.swap(i, j);
    neighbor
}

/// Metropolis criterion.
fn accept<R: Rng>(delta: f64, temperature: f64, rng: &mut R) -> bool {
    if delta < 0.0 {
        return true;
    }
    if temperature <= 0.0 {
        return false;
    }
    let probability = (-delta / temperature).exp();
    probability.is_finite() && rng.random::<f64>() < probability
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AvailabilityBlock, Competition, Skater, SkatingClass};
    use chrono::{NaiveDate, NaiveTime};
    use proptest::prelude::*;

    fn skaters(prefix: &str, n: usize) -> Vec<Skater> {
        (0..n)
            .map(|i| {
                Skater::new(
                    format!("{prefix}{i}"),
                    "Skater",
                    format!("{prefix}{i}"),
                    NaiveDate::from_ymd_opt(2008, 4, 1).unwrap(),
                )
            })
            .collect()
    }

    fn data(classes: Vec<SkatingClass>) -> CompetitionData {
        let competition = classes
            .into_iter()
            .fold(Competition::new("C1", "Singel"), |c, class| c.with_class(class));
        CompetitionData::new("E1", "Event").with_competition(competition)
    }

    fn settings() -> SchedulerSettings {
        SchedulerSettings::default().with_availability(AvailabilityBlock::new(
            NaiveDate::from_ymd_opt(2025, 3, 8).unwrap(),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        ))
    }

    fn mixed_classes() -> CompetitionData {
        data(vec![
            SkatingClass::new("A", "Junior Damer", "Friåkning").with_skaters(skaters("A", 7)),
            SkatingClass::new("B", "Minior Flickor", "Friåkning").with_skaters(skaters("B", 9)),
            SkatingClass::new("C", "Senior Herrar", "Kortprogram").with_skaters(skaters("C", 4)),
            SkatingClass::new("D", "Ungdom Damer", "Friåkning").with_skaters(skaters("D", 5)),
        ])
    }

    #[test]
    fn test_geometric_cooling() {
        let mut cooling = GeometricCooling::new(1000.0, 0.5, 200.0);
        cooling.update();
        assert_eq!(cooling.current(), 500.0);
        cooling.update();
        cooling.update();
        assert!(cooling.is_frozen());
        cooling.on_start();
        assert_eq!(cooling.current(), 1000.0);
        assert!(!cooling.is_frozen());
    }

    #[test]
    fn test_swap_neighbor_distinct_positions() {
        let order: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let neighbor = swap_neighbor(&order, &mut rng);
            let moved = order.iter().zip(&neighbor).filter(|(a, b)| a != b).count();
            assert_eq!(moved, 2);
        }
    }

    #[test]
    fn test_accept_rules() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(accept(-1.0, 0.0, &mut rng));
        assert!(!accept(1.0, 0.0, &mut rng));
        assert!(!accept(86_400_000.0, 1000.0, &mut rng));
    }

    #[test]
    fn test_single_class_is_trivial() {
        let data = data(vec![
            SkatingClass::new("A", "Junior Damer", "Friåkning").with_skaters(skaters("A", 4))
        ]);
        let result = optimize(&data, &settings(), &AnnealingConfig::default(), |_| {}).unwrap();
        assert_eq!(result.class_order, vec!["A".to_string()]);
        assert_eq!(result.iterations, 0);
        assert!(!result.improved);
        assert_eq!(result.best_cost, result.initial_cost);
    }

    #[test]
    fn test_fixes_free_before_short() {
        let shared = skaters("X", 3);
        let data = data(vec![
            SkatingClass::new("F", "Junior", "Friåkning").with_skaters(shared.clone()),
            SkatingClass::new("S", "Junior", "Kortprogram").with_skaters(shared),
        ]);
        let config = AnnealingConfig::default().with_max_iterations(20).with_seed(3);
        let result = optimize(&data, &settings(), &config, |_| {}).unwrap();

        assert!(result.improved);
        assert_eq!(result.class_order, vec!["S".to_string(), "F".to_string()]);
        assert!(result.best_cost < result.initial_cost);
        assert_eq!(result.iterations, 20);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let data = mixed_classes();
        let config = AnnealingConfig::default().with_max_iterations(30).with_seed(42);
        let a = optimize(&data, &settings(), &config, |_| {}).unwrap();
        let b = optimize(&data, &settings(), &config, |_| {}).unwrap();
        assert_eq!(a.class_order, b.class_order);
        assert_eq!(a.best_cost, b.best_cost);
    }

    #[test]
    fn test_progress_cadence() {
        let config = AnnealingConfig::default().with_max_iterations(100).with_seed(5);
        let mut ticks = Vec::new();
        optimize(&mixed_classes(), &settings(), &config, |p| ticks.push(p)).unwrap();
        assert_eq!(ticks, vec![0.5, 1.0]);
    }

    #[test]
    fn test_invalid_config() {
        let config = AnnealingConfig::default().with_cooling_rate(1.0);
        let err = optimize(&mixed_classes(), &settings(), &config, |_| {}).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidConfig(_)));
    }

    #[test]
    fn test_frozen_stops_early() {
        let mut config = AnnealingConfig::default().with_seed(9).with_cooling_rate(0.5);
        config.initial_temperature = 8.0;
        let result = optimize(&mixed_classes(), &settings(), &config, |_| {}).unwrap();
        // 8 -> 4 -> 2 -> 1
        assert_eq!(result.iterations, 3);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_best_never_worse_than_initial(seed in any::<u64>()) {
            let config = AnnealingConfig::default().with_max_iterations(15).with_seed(seed);
            let result = optimize(&mixed_classes(), &settings(), &config, |_| {}).unwrap();
            prop_assert!(result.best_cost <= result.initial_cost);
            prop_assert_eq!(result.improved, result.best_cost < result.initial_cost);
            let mut sorted = result.class_order.clone();
            sorted.sort();
            prop_assert_eq!(sorted, vec!["A", "B", "C", "D"]);
        }
    }
}
