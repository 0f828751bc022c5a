// Pick'em predictions: two teams to go 3-0, six teams to advance with at
// least one loss, two teams to go 0-3. Stored as three 16-bit seed masks so
// scoring a prediction against a simulated outcome is three ANDs and three
// popcounts in the hot loop.

use fnv::FnvHashSet;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::swiss::TEAM_COUNT;

pub const THREE_ZERO_PICKS: usize = 2;
pub const ADVANCE_PICKS: usize = 6;
pub const ZERO_THREE_PICKS: usize = 2;

/// One pick'em entry. Each mask has bit `seed - 1` set for every picked seed.
/// Instances only exist via `new` or the random generator, so the three masks
/// are always disjoint and cover exactly 10 seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Prediction {
    three_zero: u32,
    advance: u32,
    zero_three: u32,
}

fn seed_mask(seeds: &[u32]) -> Result<u32, String> {
    let mut mask = 0u32;
    for &seed in seeds {
        if seed < 1 || seed > TEAM_COUNT as u32 {
            return Err(format!(
                "Seed {} is out of range (must be 1..={})",
                seed, TEAM_COUNT
            ));
        }
        let bit = 1 << (seed - 1);
        if mask & bit != 0 {
            return Err(format!("Seed {} is picked twice", seed));
        }
        mask |= bit;
    }
    Ok(mask)
}

impl Prediction {
    /// Build a prediction from seed lists, validating sizes, seed range, and
    /// disjointness of the three groups.
    pub fn new(
        three_zero: &[u32],
        advance: &[u32],
        zero_three: &[u32],
    ) -> Result<Prediction, String> {
        if three_zero.len() != THREE_ZERO_PICKS {
            return Err(format!(
                "Expected {} 3-0 picks, got {}",
                THREE_ZERO_PICKS,
                three_zero.len()
            ));
        }
        if advance.len() != ADVANCE_PICKS {
            return Err(format!(
                "Expected {} advancing picks, got {}",
                ADVANCE_PICKS,
                advance.len()
            ));
        }
        if zero_three.len() != ZERO_THREE_PICKS {
            return Err(format!(
                "Expected {} 0-3 picks, got {}",
                ZERO_THREE_PICKS,
                zero_three.len()
            ));
        }
        let prediction = Prediction {
            three_zero: seed_mask(three_zero)?,
            advance: seed_mask(advance)?,
            zero_three: seed_mask(zero_three)?,
        };
        let total = prediction.three_zero | prediction.advance | prediction.zero_three;
        if total.count_ones() as usize != THREE_ZERO_PICKS + ADVANCE_PICKS + ZERO_THREE_PICKS {
            return Err("Prediction groups must not overlap".to_string());
        }
        Ok(prediction)
    }

    /// Number of picks this prediction got right against a simulated outcome,
    /// given as the three category masks of that outcome.
    #[inline]
    pub fn correct_picks(&self, three_zero: u32, advance: u32, zero_three: u32) -> u32 {
        (self.three_zero & three_zero).count_ones()
            + (self.advance & advance).count_ones()
            + (self.zero_three & zero_three).count_ones()
    }

    /// Mask of picked 3-0 seeds, bit `seed - 1`.
    pub fn three_zero_mask(&self) -> u32 {
        self.three_zero
    }

    /// Mask of picked advancing seeds.
    pub fn advance_mask(&self) -> u32 {
        self.advance
    }

    /// Mask of picked 0-3 seeds.
    pub fn zero_three_mask(&self) -> u32 {
        self.zero_three
    }

    fn mask_seeds(mask: u32) -> Vec<u32> {
        (1..=TEAM_COUNT as u32)
            .filter(|seed| mask & (1 << (seed - 1)) != 0)
            .collect()
    }

    /// Picked 3-0 seeds, ascending.
    pub fn three_zero_seeds(&self) -> Vec<u32> {
        Self::mask_seeds(self.three_zero)
    }

    /// Picked advancing seeds, ascending.
    pub fn advance_seeds(&self) -> Vec<u32> {
        Self::mask_seeds(self.advance)
    }

    /// Picked 0-3 seeds, ascending.
    pub fn zero_three_seeds(&self) -> Vec<u32> {
        Self::mask_seeds(self.zero_three)
    }
}

/// Generate `count` distinct random predictions by shuffling the 16 seeds and
/// slicing the first 2 / next 6 / next 2. Duplicates (by mask triple) are
/// discarded and redrawn.
pub fn random_predictions(count: usize, rng: &mut impl Rng) -> Vec<Prediction> {
    let mut seeds: Vec<u32> = (1..=TEAM_COUNT as u32).collect();
    let mut seen = FnvHashSet::default();
    let mut predictions = Vec::with_capacity(count);
    while predictions.len() < count {
        seeds.shuffle(rng);
        let prediction = Prediction {
            three_zero: seed_mask(&seeds[..2]).unwrap(),
            advance: seed_mask(&seeds[2..8]).unwrap(),
            zero_three: seed_mask(&seeds[8..10]).unwrap(),
        };
        if seen.insert(prediction) {
            predictions.push(prediction);
        }
    }
    predictions
}
