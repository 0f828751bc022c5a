// Monte-Carlo harness. Splits N tournament runs over K worker threads, each
// with its own bracket engine and its own RNG stream seeded from the shared
// master stream. Seeds are drawn in worker order before any thread starts, so
// a given (master seed, n, k) always produces identical aggregates no matter
// how the threads are scheduled.

use std::sync::Mutex;
use std::thread;

use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ingest::{Team, TournamentData};
use crate::predictions::Prediction;
use crate::prob::ProbMatrix;
use crate::swiss::{Record, SwissSystem, TEAM_COUNT};

/// Category masks of one finished tournament, bit `index` per team. Teams
/// that finished 1-3 or 2-3 appear in no mask.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutcomeMasks {
    pub three_zero: u32,
    pub advance: u32,
    pub zero_three: u32,
}

/// Classify final records into pick'em categories.
pub fn outcome_masks(records: &[Record]) -> OutcomeMasks {
    let mut masks = OutcomeMasks::default();
    for (index, rec) in records.iter().enumerate() {
        let bit = 1 << index;
        if rec.wins == 3 && rec.losses == 0 {
            masks.three_zero |= bit;
        } else if rec.wins == 3 {
            masks.advance |= bit;
        } else if rec.wins == 0 && rec.losses == 3 {
            masks.zero_three |= bit;
        }
    }
    masks
}

/// Aggregated counts over a set of runs.
#[derive(Debug, Clone)]
pub struct RunResults {
    pub runs: u64,
    /// Per team index: runs in which the team finished in that category.
    pub three_zero: [u64; TEAM_COUNT],
    pub advance: [u64; TEAM_COUNT],
    pub zero_three: [u64; TEAM_COUNT],
    /// Per prediction: runs in which it reached the success threshold.
    pub prediction_successes: Vec<u64>,
}

impl RunResults {
    pub fn new(prediction_count: usize) -> RunResults {
        RunResults {
            runs: 0,
            three_zero: [0; TEAM_COUNT],
            advance: [0; TEAM_COUNT],
            zero_three: [0; TEAM_COUNT],
            prediction_successes: vec![0; prediction_count],
        }
    }

    fn record_run(&mut self, masks: &OutcomeMasks, predictions: &[Prediction], threshold: u32) {
        self.runs += 1;
        for index in 0..TEAM_COUNT {
            let bit = 1 << index;
            if masks.three_zero & bit != 0 {
                self.three_zero[index] += 1;
            } else if masks.advance & bit != 0 {
                self.advance[index] += 1;
            } else if masks.zero_three & bit != 0 {
                self.zero_three[index] += 1;
            }
        }
        for (i, prediction) in predictions.iter().enumerate() {
            let correct =
                prediction.correct_picks(masks.three_zero, masks.advance, masks.zero_three);
            if correct >= threshold {
                self.prediction_successes[i] += 1;
            }
        }
    }

    fn merge(&mut self, other: &RunResults) {
        self.runs += other.runs;
        for i in 0..TEAM_COUNT {
            self.three_zero[i] += other.three_zero[i];
            self.advance[i] += other.advance[i];
            self.zero_three[i] += other.zero_three[i];
        }
        for (total, local) in self
            .prediction_successes
            .iter_mut()
            .zip(&other.prediction_successes)
        {
            *total += local;
        }
    }

    /// Success percentage of prediction `i`, 0.0 for an empty run.
    pub fn success_rate(&self, i: usize) -> f64 {
        self.percentage(self.prediction_successes[i])
    }

    pub fn percentage(&self, count: u64) -> f64 {
        if self.runs == 0 {
            0.0
        } else {
            count as f64 / self.runs as f64 * 100.0
        }
    }
}

/// Split `n` runs into `k` batch sizes, largest first; the first `n % k`
/// batches get one extra run.
fn split_batches(n: u64, k: usize) -> Vec<u64> {
    let k = k.max(1);
    let base = n / k as u64;
    let remainder = (n % k as u64) as usize;
    (0..k)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// A configured tournament: the team list and the precomputed probability
/// matrix. One Simulation serves any number of runs.
pub struct Simulation {
    teams: Vec<Team>,
    prob: ProbMatrix,
}

impl Simulation {
    pub fn new(data: TournamentData) -> Simulation {
        let prob = ProbMatrix::new(&data.teams, &data.sigma);
        Simulation {
            teams: data.teams,
            prob,
        }
    }

    /// Build a simulation with a caller-supplied probability matrix instead
    /// of one derived from ratings. Used to replay known brackets.
    pub fn with_probabilities(teams: Vec<Team>, prob: ProbMatrix) -> Simulation {
        Simulation { teams, prob }
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Run `n` simulated tournaments across `workers` threads, scoring every
    /// prediction against each outcome. A worker panic propagates out of the
    /// scope and aborts the whole run.
    pub fn run(
        &self,
        n: u64,
        workers: usize,
        predictions: &[Prediction],
        threshold: u32,
        master: &Mutex<StdRng>,
        progress: Option<&ProgressBar>,
    ) -> RunResults {
        let batches = split_batches(n, workers);
        // One seed per worker, drawn in worker order up front so scheduling
        // cannot reorder the master stream.
        let seeds: Vec<u64> = {
            let mut master = master.lock().unwrap();
            batches.iter().map(|_| master.gen()).collect()
        };

        let totals = Mutex::new(RunResults::new(predictions.len()));
        let totals_ref = &totals;
        thread::scope(|scope| {
            for (batch, seed) in batches.into_iter().zip(seeds) {
                scope.spawn(move || {
                    let mut rng = StdRng::seed_from_u64(seed);
                    let mut engine = SwissSystem::new(&self.teams, &self.prob);
                    let mut local = RunResults::new(predictions.len());
                    for _ in 0..batch {
                        engine.reset();
                        engine.simulate_tournament(&mut rng);
                        let masks = outcome_masks(engine.records());
                        local.record_run(&masks, predictions, threshold);
                        if let Some(pb) = progress {
                            pb.inc(1);
                        }
                    }
                    totals_ref.lock().unwrap().merge(&local);
                });
            }
        });
        totals.into_inner().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_teams() -> Vec<Team> {
        (0..TEAM_COUNT)
            .map(|i| Team::new(format!("Seed {}", i + 1), i as u32 + 1, vec![1500.0], i))
            .collect()
    }

    /// Matrix in which the lower team index always wins. Makes every
    /// tournament fully deterministic.
    fn lower_index_wins() -> ProbMatrix {
        let mut prob = ProbMatrix::even();
        for i in 0..TEAM_COUNT {
            for j in (i + 1)..TEAM_COUNT {
                prob.set(i, j, 1.0);
            }
        }
        prob
    }

    #[test]
    fn test_outcome_masks_classification() {
        let mut records = vec![Record::default(); TEAM_COUNT];
        records[0] = Record { wins: 3, losses: 0 };
        records[1] = Record { wins: 3, losses: 2 };
        records[2] = Record { wins: 0, losses: 3 };
        records[3] = Record { wins: 1, losses: 3 };
        records[4] = Record { wins: 2, losses: 3 };
        let masks = outcome_masks(&records);
        assert_eq!(masks.three_zero, 1 << 0);
        assert_eq!(masks.advance, 1 << 1);
        assert_eq!(masks.zero_three, 1 << 2);
        // 1-3 and 2-3 teams land in no category.
        let all = masks.three_zero | masks.advance | masks.zero_three;
        assert_eq!(all & (1 << 3), 0);
        assert_eq!(all & (1 << 4), 0);
    }

    #[test]
    fn test_split_batches() {
        assert_eq!(split_batches(10, 3), vec![4, 3, 3]);
        assert_eq!(split_batches(6, 3), vec![2, 2, 2]);
        assert_eq!(split_batches(2, 5), vec![1, 1, 0, 0, 0]);
        assert_eq!(split_batches(7, 1), vec![7]);
        assert_eq!(split_batches(0, 4), vec![0, 0, 0, 0]);
        assert_eq!(split_batches(5, 0), vec![5]);
        assert_eq!(split_batches(10, 3).iter().sum::<u64>(), 10);
    }

    #[test]
    fn test_threshold_boundary_on_deterministic_bracket() {
        let sim = Simulation::with_probabilities(numbered_teams(), lower_index_wins());

        // Find the one outcome this bracket can produce.
        let mut engine = SwissSystem::new(sim.teams(), &sim.prob);
        let mut rng = StdRng::seed_from_u64(0);
        engine.simulate_tournament(&mut rng);
        let masks = outcome_masks(engine.records());
        let actual_three_zero: Vec<u32> = (1..=16)
            .filter(|s| masks.three_zero & (1 << (s - 1)) != 0)
            .collect();
        let actual_advance: Vec<u32> = (1..=16)
            .filter(|s| masks.advance & (1 << (s - 1)) != 0)
            .collect();
        let unpicked: Vec<u32> = (1..=16)
            .filter(|s| {
                (masks.three_zero | masks.advance | masks.zero_three) & (1 << (s - 1)) == 0
            })
            .collect();
        assert_eq!(actual_three_zero.len(), 2);
        assert_eq!(actual_advance.len(), 6);
        assert_eq!(unpicked.len(), 6);

        let perfect = Prediction::new(
            &actual_three_zero,
            &actual_advance,
            &(1..=16)
                .filter(|s| masks.zero_three & (1 << (s - 1)) != 0)
                .collect::<Vec<u32>>(),
        )
        .unwrap();
        // 1 + 4 + 0 correct: exactly at the default threshold.
        let five_correct = Prediction::new(
            &[actual_three_zero[0], unpicked[0]],
            &[
                actual_advance[0],
                actual_advance[1],
                actual_advance[2],
                actual_advance[3],
                unpicked[1],
                unpicked[2],
            ],
            &[unpicked[3], unpicked[4]],
        )
        .unwrap();
        // 1 + 3 + 0 correct: one below.
        let four_correct = Prediction::new(
            &[actual_three_zero[0], unpicked[0]],
            &[
                actual_advance[0],
                actual_advance[1],
                actual_advance[2],
                unpicked[1],
                unpicked[2],
                unpicked[3],
            ],
            &[unpicked[4], unpicked[5]],
        )
        .unwrap();

        let predictions = [perfect, five_correct, four_correct];
        let master = Mutex::new(StdRng::seed_from_u64(17));
        let results = sim.run(9, 2, &predictions, 5, &master, None);

        assert_eq!(results.runs, 9);
        assert_eq!(results.prediction_successes, vec![9, 9, 0]);
        assert!((results.success_rate(0) - 100.0).abs() < 1e-12);
        assert!((results.success_rate(1) - 100.0).abs() < 1e-12);
        assert_eq!(results.success_rate(2), 0.0);

        // Category counts match the single possible outcome on every run.
        for seed in &actual_three_zero {
            assert_eq!(results.three_zero[(*seed - 1) as usize], 9);
        }
        for seed in &actual_advance {
            assert_eq!(results.advance[(*seed - 1) as usize], 9);
        }
        for seed in &unpicked {
            let i = (*seed - 1) as usize;
            assert_eq!(
                results.three_zero[i] + results.advance[i] + results.zero_three[i],
                0
            );
        }
    }

    #[test]
    fn test_identical_master_seed_gives_identical_aggregates() {
        let sim = Simulation::with_probabilities(numbered_teams(), ProbMatrix::even());
        let mut rng = StdRng::seed_from_u64(3);
        let predictions = crate::predictions::random_predictions(20, &mut rng);

        let run = |seed: u64, workers: usize| {
            let master = Mutex::new(StdRng::seed_from_u64(seed));
            sim.run(400, workers, &predictions, 5, &master, None)
        };

        let a = run(99, 4);
        let b = run(99, 4);
        assert_eq!(a.runs, b.runs);
        assert_eq!(a.three_zero, b.three_zero);
        assert_eq!(a.advance, b.advance);
        assert_eq!(a.zero_three, b.zero_three);
        assert_eq!(a.prediction_successes, b.prediction_successes);

        // Every run contributes exactly 2 + 6 + 2 category entries.
        let total: u64 = a.three_zero.iter().sum::<u64>()
            + a.advance.iter().sum::<u64>()
            + a.zero_three.iter().sum::<u64>();
        assert_eq!(total, 400 * 10);
        assert_eq!(a.three_zero.iter().sum::<u64>(), 400 * 2);
        assert_eq!(a.zero_three.iter().sum::<u64>(), 400 * 2);
    }
}
