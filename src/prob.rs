// Win-probability model. Each rating system contributes a logistic win
// probability; the per-match probability is the median across systems, which
// damps a single outlier rating system instead of averaging it in linearly.
// All pairwise probabilities are precomputed once into a dense matrix so the
// simulation hot loop never calls powf().

use crate::ingest::Team;
use crate::swiss::TEAM_COUNT;

/// Probability that team `a` beats team `b` in a single game.
/// Per system i: 1 / (1 + 10^((rating_b[i] - rating_a[i]) / (2 * sigma[i]))),
/// then the median over all systems (mean of the middle two for even counts).
pub fn win_probability(a: &Team, b: &Team, sigma: &[f64]) -> f64 {
    let mut probs: Vec<f64> = sigma
        .iter()
        .enumerate()
        .map(|(i, s)| 1.0 / (1.0 + 10.0f64.powf((b.rating[i] - a.rating[i]) / (2.0 * s))))
        .collect();
    probs.sort_by(|x, y| x.partial_cmp(y).unwrap());
    let mid = probs.len() / 2;
    if probs.len() % 2 == 0 {
        (probs[mid - 1] + probs[mid]) / 2.0
    } else {
        probs[mid]
    }
}

/// Pre-computed win probabilities for all team pairs, indexed by team index.
/// Symmetric: probs[a][b] + probs[b][a] == 1.
#[derive(Debug, Clone)]
pub struct ProbMatrix {
    probs: [[f64; TEAM_COUNT]; TEAM_COUNT],
}

impl ProbMatrix {
    /// Build the matrix from team ratings.
    pub fn new(teams: &[Team], sigma: &[f64]) -> ProbMatrix {
        let mut matrix = ProbMatrix::even();
        for i in 0..teams.len() {
            for j in (i + 1)..teams.len() {
                let p = win_probability(&teams[i], &teams[j], sigma);
                matrix.set(teams[i].index, teams[j].index, p);
            }
        }
        matrix
    }

    /// A matrix where every matchup is a coin flip. Starting point for
    /// deterministic fixtures that force specific results via `set`.
    pub fn even() -> ProbMatrix {
        ProbMatrix {
            probs: [[0.5; TEAM_COUNT]; TEAM_COUNT],
        }
    }

    /// Set the probability that team `a` beats team `b`, keeping the matrix
    /// symmetric.
    pub fn set(&mut self, a: usize, b: usize, p: f64) {
        self.probs[a][b] = p;
        self.probs[b][a] = 1.0 - p;
    }

    /// Win probability for team `a` over team `b` (by team index).
    #[inline(always)]
    pub fn get(&self, a: usize, b: usize) -> f64 {
        self.probs[a][b]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(index: usize, rating: Vec<f64>) -> Team {
        Team::new(format!("Team {}", index + 1), index as u32 + 1, rating, index)
    }

    #[test]
    fn test_equal_ratings_are_even() {
        let a = team(0, vec![1500.0, 1500.0, 1500.0]);
        let b = team(1, vec![1500.0, 1500.0, 1500.0]);
        let p = win_probability(&a, &b, &[200.0, 200.0, 200.0]);
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_median_ignores_outlier_system() {
        // Systems 1 and 2 agree, system 3 wildly disagrees; the median must
        // side with the two agreeing systems.
        let a = team(0, vec![1600.0, 1600.0, 1000.0]);
        let b = team(1, vec![1500.0, 1500.0, 1900.0]);
        let sigma = [200.0, 200.0, 200.0];
        let p = win_probability(&a, &b, &sigma);
        let expected = 1.0 / (1.0 + 10.0f64.powf(-100.0 / 400.0));
        assert!((p - expected).abs() < 1e-12);
    }

    #[test]
    fn test_even_count_averages_middle_two() {
        let a = team(0, vec![1600.0, 1500.0]);
        let b = team(1, vec![1500.0, 1500.0]);
        let sigma = [200.0, 200.0];
        let p1 = 1.0 / (1.0 + 10.0f64.powf(-100.0 / 400.0));
        let expected = (p1 + 0.5) / 2.0;
        assert!((win_probability(&a, &b, &sigma) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_matrix_is_symmetric() {
        let teams: Vec<Team> = (0..TEAM_COUNT)
            .map(|i| team(i, vec![1400.0 + 20.0 * i as f64]))
            .collect();
        let matrix = ProbMatrix::new(&teams, &[250.0]);
        for i in 0..TEAM_COUNT {
            for j in 0..TEAM_COUNT {
                if i != j {
                    assert!((matrix.get(i, j) + matrix.get(j, i) - 1.0).abs() < 1e-12);
                    assert!(matrix.get(i, j) > 0.0 && matrix.get(i, j) < 1.0);
                }
            }
        }
        // Higher rating means better than even odds.
        assert!(matrix.get(15, 0) > 0.5);
    }
}
