//! Reliability and fragility schedules, and the distributions that drive
//! them (§4.5).
//!
//! A component's final availability schedule is the logical AND of every
//! failure-mode schedule and every fragility-mode schedule that applies
//! to it, with cause sets unioned at each transition. Building it is a
//! merge of sorted `(time, up/down)` streams rather than the source's
//! special-cased combination, so empty schedules on either side fall out
//! of the same code path as the general case.

use crate::units::Seconds;
use rand::Rng;
use rand_distr::{Distribution as _, Normal, Uniform, Weibull};
use std::collections::BTreeSet;

/// Up/down state of a component at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpDown {
    Up,
    Down,
}

/// One transition point in a reliability or fragility schedule.
#[derive(Debug, Clone)]
pub struct TimeState {
    pub time_s: Seconds,
    pub state: UpDown,
    pub failure_mode_causes: BTreeSet<usize>,
    pub fragility_mode_causes: BTreeSet<usize>,
}

impl TimeState {
    fn up(time_s: Seconds) -> Self {
        Self {
            time_s,
            state: UpDown::Up,
            failure_mode_causes: BTreeSet::new(),
            fragility_mode_causes: BTreeSet::new(),
        }
    }
}

/// A sorted sequence of up/down transitions for one component, starting
/// implicitly "up" at t=0 unless the first entry says otherwise.
#[derive(Debug, Clone, Default)]
pub struct ReliabilitySchedule {
    pub transitions: Vec<TimeState>,
}

impl ReliabilitySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn always_up() -> Self {
        Self { transitions: vec![] }
    }

    /// The state in effect at `t_s`, scanning forward from the start.
    pub fn state_at(&self, t_s: Seconds) -> UpDown {
        let mut state = UpDown::Up;
        for ts in &self.transitions {
            if ts.time_s > t_s {
                break;
            }
            state = ts.state;
        }
        state
    }

    /// The next transition time strictly after `t_s`, or infinity if none.
    pub fn next_transition_after(&self, t_s: Seconds) -> Seconds {
        self.transitions
            .iter()
            .find(|ts| ts.time_s > t_s)
            .map(|ts| ts.time_s)
            .unwrap_or(f64::INFINITY)
    }

    /// Builds an alternating break/repair schedule up to `horizon_s`
    /// (§4.5), optionally consuming `initial_age_s` of break-distribution
    /// draws before the first transition so aging carries across
    /// sequential occurrences.
    pub fn from_break_repair(
        break_dist: &Distribution,
        repair_dist: &Distribution,
        horizon_s: Seconds,
        initial_age_s: Seconds,
        failure_mode_id: usize,
        rng: &mut impl Rng,
    ) -> Self {
        let mut transitions = Vec::new();
        let mut t = 0.0;
        let mut remaining_age = initial_age_s;
        let mut up_duration = break_dist.sample(rng);
        while remaining_age > 0.0 && up_duration <= remaining_age {
            remaining_age -= up_duration;
            up_duration = break_dist.sample(rng);
        }
        up_duration -= remaining_age;

        loop {
            t += up_duration.max(0.0);
            if t >= horizon_s {
                break;
            }
            let mut down = TimeState::up(t);
            down.state = UpDown::Down;
            down.failure_mode_causes.insert(failure_mode_id);
            transitions.push(down);

            let down_duration = repair_dist.sample(rng);
            t += down_duration.max(0.0);
            if t >= horizon_s {
                break;
            }
            transitions.push(TimeState::up(t));

            up_duration = break_dist.sample(rng);
        }

        Self { transitions }
    }

    /// Merges two sorted schedules by logical AND of state (down wins)
    /// and union of cause sets — O(n+m), correct when either input is
    /// empty.
    pub fn merge(a: &ReliabilitySchedule, b: &ReliabilitySchedule) -> ReliabilitySchedule {
        let mut times: Vec<Seconds> = a
            .transitions
            .iter()
            .chain(b.transitions.iter())
            .map(|ts| ts.time_s)
            .collect();
        times.sort_by(|x, y| x.partial_cmp(y).unwrap());
        times.dedup();

        let mut merged = Vec::with_capacity(times.len());
        for t in times {
            let state_a = a.state_at(t);
            let state_b = b.state_at(t);
            let state = if state_a == UpDown::Down || state_b == UpDown::Down {
                UpDown::Down
            } else {
                UpDown::Up
            };
            let mut failure_mode_causes = BTreeSet::new();
            let mut fragility_mode_causes = BTreeSet::new();
            for schedule in [a, b] {
                if let Some(ts) = schedule.transitions.iter().rev().find(|ts| ts.time_s <= t) {
                    if ts.state == UpDown::Down {
                        failure_mode_causes.extend(&ts.failure_mode_causes);
                        fragility_mode_causes.extend(&ts.fragility_mode_causes);
                    }
                }
            }
            merged.push(TimeState {
                time_s: t,
                state,
                failure_mode_causes,
                fragility_mode_causes,
            });
        }
        ReliabilitySchedule { transitions: merged }
    }
}

/// A mapping from hazard intensity to failure probability (§3).
#[derive(Debug, Clone)]
pub enum FragilityCurve {
    Linear { lower_bound: f64, upper_bound: f64 },
    Tabular(Vec<(f64, f64)>),
}

impl FragilityCurve {
    /// Evaluates the failure fraction at `intensity`, clamped to `[0, 1]`.
    pub fn failure_fraction(&self, intensity: f64) -> f64 {
        let raw = match self {
            FragilityCurve::Linear { lower_bound, upper_bound } => {
                if (upper_bound - lower_bound).abs() < f64::EPSILON {
                    if intensity >= *upper_bound {
                        1.0
                    } else {
                        0.0
                    }
                } else {
                    (intensity - lower_bound) / (upper_bound - lower_bound)
                }
            }
            FragilityCurve::Tabular(points) => {
                if points.is_empty() {
                    0.0
                } else if intensity <= points[0].0 {
                    points[0].1
                } else if intensity >= points[points.len() - 1].0 {
                    points[points.len() - 1].1
                } else {
                    let mut result = points[points.len() - 1].1;
                    for w in points.windows(2) {
                        let (lo, hi) = (w[0], w[1]);
                        if intensity >= lo.0 && intensity <= hi.0 {
                            let span = hi.0 - lo.0;
                            let t = if span.abs() < f64::EPSILON { 0.0 } else { (intensity - lo.0) / span };
                            result = lo.1 + t * (hi.1 - lo.1);
                            break;
                        }
                    }
                    result
                }
            }
        };
        raw.clamp(0.0, 1.0)
    }
}

/// A statistical distribution for drawing break/repair durations or
/// scenario occurrence intervals, matching the families named in the
/// original engine's `DistType` enum (Fixed, Uniform, Normal, Weibull,
/// QuantileTable).
#[derive(Debug, Clone)]
pub enum Distribution {
    Fixed(f64),
    Uniform { low: f64, high: f64 },
    Normal { mean: f64, std_dev: f64 },
    Weibull { shape: f64, scale: f64 },
    /// Inverse-CDF table: sorted `(cumulative_probability, value)` pairs,
    /// sampled by drawing a uniform variate in `[0, 1)` and
    /// linearly-interpolating the corresponding value.
    QuantileTable(Vec<(f64, f64)>),
}

impl Distribution {
    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        match self {
            Distribution::Fixed(value) => *value,
            Distribution::Uniform { low, high } => {
                if (high - low).abs() < f64::EPSILON {
                    *low
                } else {
                    Uniform::new(*low, *high).sample(rng)
                }
            }
            Distribution::Normal { mean, std_dev } => {
                if *std_dev <= 0.0 {
                    *mean
                } else {
                    Normal::new(*mean, *std_dev).unwrap().sample(rng).max(0.0)
                }
            }
            Distribution::Weibull { shape, scale } => Weibull::new(*scale, *shape).unwrap().sample(rng),
            Distribution::QuantileTable(points) => {
                let u: f64 = rng.gen_range(0.0..1.0);
                sample_quantile_table(points, u)
            }
        }
    }
}

fn sample_quantile_table(points: &[(f64, f64)], u: f64) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    if u <= points[0].0 {
        return points[0].1;
    }
    let last = points.len() - 1;
    if u >= points[last].0 {
        return points[last].1;
    }
    for w in points.windows(2) {
        let (lo, hi) = (w[0], w[1]);
        if u >= lo.0 && u <= hi.0 {
            let span = hi.0 - lo.0;
            let t = if span.abs() < f64::EPSILON { 0.0 } else { (u - lo.0) / span };
            return lo.1 + t * (hi.1 - lo.1);
        }
    }
    points[last].1
}

/// Samples whether a component is failed from t=0 for a fragility mode,
/// given the current hazard intensity (§4.5).
pub fn sample_fragility_failure(curve: &FragilityCurve, intensity: f64, rng: &mut impl Rng) -> bool {
    let p = curve.failure_fraction(intensity);
    let u: f64 = rng.gen_range(0.0..1.0);
    u < p
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn fixed_distribution_always_returns_same_value() {
        let dist = Distribution::Fixed(10.0);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(dist.sample(&mut rng), 10.0);
        assert_eq!(dist.sample(&mut rng), 10.0);
    }

    #[test]
    fn linear_fragility_curve_interpolates_and_clamps() {
        let curve = FragilityCurve::Linear { lower_bound: 0.0, upper_bound: 10.0 };
        assert_eq!(curve.failure_fraction(-5.0), 0.0);
        assert_eq!(curve.failure_fraction(5.0), 0.5);
        assert_eq!(curve.failure_fraction(20.0), 1.0);
    }

    #[test]
    fn merge_of_two_empty_schedules_is_empty() {
        let a = ReliabilitySchedule::always_up();
        let b = ReliabilitySchedule::always_up();
        let merged = ReliabilitySchedule::merge(&a, &b);
        assert!(merged.transitions.is_empty());
        assert_eq!(merged.state_at(100.0), UpDown::Up);
    }

    #[test]
    fn merge_takes_down_when_either_is_down() {
        let mut a = ReliabilitySchedule::always_up();
        a.transitions.push(TimeState {
            time_s: 10.0,
            state: UpDown::Down,
            failure_mode_causes: BTreeSet::from([1]),
            fragility_mode_causes: BTreeSet::new(),
        });
        let b = ReliabilitySchedule::always_up();
        let merged = ReliabilitySchedule::merge(&a, &b);
        assert_eq!(merged.state_at(15.0), UpDown::Down);
        assert_eq!(merged.state_at(5.0), UpDown::Up);
    }

    #[test]
    fn fixed_break_repair_schedule_alternates_every_ten_seconds() {
        let break_dist = Distribution::Fixed(10.0);
        let repair_dist = Distribution::Fixed(10.0);
        let mut rng = StdRng::seed_from_u64(42);
        let schedule = ReliabilitySchedule::from_break_repair(&break_dist, &repair_dist, 50.0, 0.0, 0, &mut rng);
        assert_eq!(schedule.state_at(5.0), UpDown::Up);
        assert_eq!(schedule.state_at(15.0), UpDown::Down);
        assert_eq!(schedule.state_at(25.0), UpDown::Up);
    }
}
