// Swiss bracket engine for a 16-team stage: 5 possible rounds, advancement at
// 3 wins, elimination at 3 losses. One SwissSystem instance owns all mutable
// per-tournament state in dense arrays indexed by team index and is reset
// between simulated tournaments without reallocating team identity data.

use rand::Rng;

use crate::ingest::Team;
use crate::prob::ProbMatrix;

/// Fixed Swiss format: 16 teams, first to 3 wins advances, 3 losses is out.
pub const TEAM_COUNT: usize = 16;
pub const WINS_TO_QUALIFY: u32 = 3;
pub const LOSSES_TO_ELIMINATE: u32 = 3;

/// Win/loss counters for the current simulated tournament.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Record {
    pub wins: u32,
    pub losses: u32,
}

impl Record {
    #[inline]
    pub fn diff(&self) -> i32 {
        self.wins as i32 - self.losses as i32
    }
}

// Candidate 3-pair layouts for a sorted group of 6 teams (0 = best rank,
// 5 = worst), covering all 15 ways to pair 6 items. Rows are ordered by
// proximity to the ideal 1v6 2v5 3v4 seeding; the first rematch-free row is
// taken in full. Rounds 4 and 5 need this exhaustive table because a greedy
// search over only 6 teams can dead-end without backtracking.
const SIX_TEAM_LAYOUTS: [[(usize, usize); 3]; 15] = [
    [(0, 5), (1, 4), (2, 3)], // 1v6 2v5 3v4
    [(0, 5), (1, 3), (2, 4)], // 1v6 2v4 3v5
    [(0, 4), (1, 5), (2, 3)], // 1v5 2v6 3v4
    [(0, 4), (1, 3), (2, 5)], // 1v5 2v4 3v6
    [(0, 3), (1, 5), (2, 4)], // 1v4 2v6 3v5
    [(0, 3), (1, 4), (2, 5)], // 1v4 2v5 3v6
    [(0, 5), (1, 2), (3, 4)], // 1v6 2v3 4v5
    [(0, 4), (1, 2), (3, 5)], // 1v5 2v3 4v6
    [(0, 2), (1, 5), (3, 4)], // 1v3 2v6 4v5
    [(0, 2), (1, 4), (3, 5)], // 1v3 2v5 4v6
    [(0, 3), (1, 2), (4, 5)], // 1v4 2v3 5v6
    [(0, 2), (1, 3), (4, 5)], // 1v3 2v4 5v6
    [(0, 1), (2, 5), (3, 4)], // 1v2 3v6 4v5
    [(0, 1), (2, 4), (3, 5)], // 1v2 3v5 4v6
    [(0, 1), (2, 3), (4, 5)], // 1v2 3v4 5v6
];

/// Stateful Swiss bracket for one simulated tournament at a time.
pub struct SwissSystem<'a> {
    teams: &'a [Team],
    prob: &'a ProbMatrix,
    records: Vec<Record>,
    /// Opponent indices met so far, in match order; len == wins + losses.
    faced: Vec<Vec<usize>>,
    remaining: Vec<bool>,
    finished: Vec<bool>,
    round: u32,
    /// Per-team Buchholz snapshot taken at the top of the current round,
    /// before any of the round's pairings or matches. None outside a round.
    current_buchholz: Option<Vec<i32>>,
    forced_rematches: u32,
}

impl<'a> SwissSystem<'a> {
    pub fn new(teams: &'a [Team], prob: &'a ProbMatrix) -> SwissSystem<'a> {
        let n = teams.len();
        debug_assert!(teams.iter().enumerate().all(|(i, t)| t.index == i));
        SwissSystem {
            teams,
            prob,
            records: vec![Record::default(); n],
            faced: (0..n).map(|_| Vec::with_capacity(5)).collect(),
            remaining: vec![true; n],
            finished: vec![false; n],
            round: 0,
            current_buchholz: None,
            forced_rematches: 0,
        }
    }

    /// Return every team to 0-0 Active state for the next simulated
    /// tournament. Idempotent; keeps all allocations.
    pub fn reset(&mut self) {
        for i in 0..self.teams.len() {
            self.records[i] = Record::default();
            self.faced[i].clear();
            self.remaining[i] = true;
            self.finished[i] = false;
        }
        self.round = 0;
        self.current_buchholz = None;
        self.forced_rematches = 0;
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn faced(&self, index: usize) -> &[usize] {
        &self.faced[index]
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Forced rematches paired so far in the current tournament. Only the
    /// greedy fallback can produce these; the count stays 0 whenever a
    /// rematch-free pairing existed in every round.
    pub fn forced_rematches(&self) -> u32 {
        self.forced_rematches
    }

    pub fn active_count(&self) -> usize {
        self.remaining.iter().filter(|r| **r).count()
    }

    pub fn is_finished(&self, index: usize) -> bool {
        self.finished[index]
    }

    /// Buchholz score: the sum of the current differentials of every opponent
    /// this team has faced. During pairing the per-round snapshot is used
    /// instead, so mid-round results never shift the ordering.
    pub fn buchholz(&self, index: usize) -> i32 {
        self.faced[index]
            .iter()
            .map(|&opp| self.records[opp].diff())
            .sum()
    }

    fn have_faced(&self, a: usize, b: usize) -> bool {
        self.faced[a].contains(&b)
    }

    /// Simulate one match between the teams at indices `a` and `b`. Best-of-
    /// three iff either team is playing for advancement or elimination (has
    /// exactly 2 wins or 2 losses); the match still counts as exactly one win
    /// and one loss.
    pub fn simulate_match(&mut self, a: usize, b: usize, rng: &mut impl Rng) {
        debug_assert_ne!(a, b, "a team cannot be paired against itself");
        let (rec_a, rec_b) = (self.records[a], self.records[b]);
        let best_of_three = rec_a.wins == 2
            || rec_a.losses == 2
            || rec_b.wins == 2
            || rec_b.losses == 2;

        let p = self.prob.get(a, b);
        let a_wins_match = if best_of_three {
            // First to 2 game-wins, every game at the same fixed probability.
            let (mut games_a, mut games_b) = (0, 0);
            while games_a < 2 && games_b < 2 {
                if rng.gen::<f64>() < p {
                    games_a += 1;
                } else {
                    games_b += 1;
                }
            }
            games_a > games_b
        } else {
            rng.gen::<f64>() < p
        };

        if a_wins_match {
            self.records[a].wins += 1;
            self.records[b].losses += 1;
        } else {
            self.records[a].losses += 1;
            self.records[b].wins += 1;
        }

        self.faced[a].push(b);
        self.faced[b].push(a);

        for index in [a, b] {
            let rec = self.records[index];
            if rec.wins == WINS_TO_QUALIFY || rec.losses == LOSSES_TO_ELIMINATE {
                self.remaining[index] = false;
                self.finished[index] = true;
            }
        }
    }

    /// Pair one score group. The group is sorted by snapshot Buchholz
    /// (descending), tie-broken by initial seed (ascending); that ordering is
    /// fixed for the round regardless of the round's own results.
    fn pair_group(&mut self, mut group: Vec<usize>) -> Vec<(usize, usize)> {
        let mut pairs = Vec::with_capacity(group.len() / 2);
        if group.is_empty() {
            return pairs;
        }

        {
            let buchholz = self
                .current_buchholz
                .as_ref()
                .expect("Buchholz snapshot must be taken before pairing");
            group.sort_by(|&a, &b| {
                buchholz[b]
                    .cmp(&buchholz[a])
                    .then(self.teams[a].seed.cmp(&self.teams[b].seed))
            });
        }

        // Round 1: fixed bracket seeding, rank i vs rank i + N/2
        // (1v9, 2v10, ...), not high-vs-low.
        if self.round == 1 {
            let half = group.len() / 2;
            for i in 0..half {
                pairs.push((group[i], group[i + half]));
            }
            return pairs;
        }

        // Rounds 4 and 5 with exactly 6 teams: take the first priority-table
        // layout in which no pair is a rematch.
        if (self.round == 4 || self.round == 5) && group.len() == 6 {
            for layout in &SIX_TEAM_LAYOUTS {
                let rematch_free = layout
                    .iter()
                    .all(|&(i, j)| !self.have_faced(group[i], group[j]));
                if rematch_free {
                    for &(i, j) in layout {
                        pairs.push((group[i], group[j]));
                    }
                    return pairs;
                }
            }
            // No rematch-free layout exists; fall through to greedy, which
            // will force rematches rather than leave anyone unpaired.
        }

        // Rounds 2, 3, and fallback: best-ranked unpaired team vs the
        // worst-ranked available opponent it has not yet faced.
        let mut used = vec![false; group.len()];
        for i in 0..group.len() {
            if used[i] {
                continue;
            }
            let mut found = false;
            for j in (i + 1..group.len()).rev() {
                if used[j] || self.have_faced(group[i], group[j]) {
                    continue;
                }
                used[i] = true;
                used[j] = true;
                pairs.push((group[i], group[j]));
                found = true;
                break;
            }
            if !found {
                // Every candidate is a rematch; pair with the worst-ranked
                // available team anyway.
                for j in (i + 1..group.len()).rev() {
                    if used[j] {
                        continue;
                    }
                    used[i] = true;
                    used[j] = true;
                    pairs.push((group[i], group[j]));
                    self.forced_rematches += 1;
                    break;
                }
            }
        }
        pairs
    }

    /// Advance the bracket by one round: group the still-active teams by
    /// differential sign, snapshot Buchholz scores, pair every group, and
    /// only then simulate the matches, so no result of this round can
    /// influence its own pairings.
    pub fn simulate_round(&mut self, rng: &mut impl Rng) {
        self.round += 1;

        let mut positive = Vec::new();
        let mut even = Vec::new();
        let mut negative = Vec::new();
        for (index, team) in self.teams.iter().enumerate() {
            if !self.remaining[index] {
                continue;
            }
            debug_assert_eq!(team.index, index);
            match self.records[index].diff() {
                d if d > 0 => positive.push(index),
                d if d < 0 => negative.push(index),
                _ => even.push(index),
            }
        }

        let snapshot: Vec<i32> = (0..self.teams.len()).map(|i| self.buchholz(i)).collect();
        self.current_buchholz = Some(snapshot);

        let mut all_pairs = Vec::with_capacity(self.teams.len() / 2);
        for group in [positive, even, negative] {
            all_pairs.extend(self.pair_group(group));
        }

        for (a, b) in all_pairs {
            self.simulate_match(a, b, rng);
        }
    }

    /// Run rounds until every team has either qualified or been eliminated.
    pub fn simulate_tournament(&mut self, rng: &mut impl Rng) {
        while self.active_count() > 0 {
            self.simulate_round(rng);
        }
    }
}
