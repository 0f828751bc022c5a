// This file is used to ingest the team data and rating-system sigmas from the
// input .json file and store them in a struct used by the rest of the program.
// The loader is the only place that validates team data; everything downstream
// assumes a dense, seed-ordered team list.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::swiss::TEAM_COUNT;

/// One team of the Swiss stage. `index` is the position in the dense team
/// list (`seed - 1`); all per-tournament state is kept in arrays indexed by
/// it, never in maps keyed by name.
#[derive(Debug, Clone)]
pub struct Team {
    pub name: String,
    pub seed: u32,
    /// One rating per rating system, aligned with the sigma vector.
    pub rating: Vec<f64>,
    pub index: usize,
}

impl Team {
    pub fn new(name: String, seed: u32, rating: Vec<f64>, index: usize) -> Team {
        Team {
            name,
            seed,
            rating,
            index,
        }
    }
}

// Raw shape of the input file:
// { "sigma": { "hltv": 165, ... }, "teams": { "FaZe": { "seed": 16, "hltv": 680, ... }, ... } }
// BTreeMap keeps rating-system keys sorted, so rating vectors line up with
// the sigma vector no matter the order in the file.
#[derive(Debug, Deserialize)]
struct RawData {
    sigma: BTreeMap<String, f64>,
    teams: BTreeMap<String, RawTeam>,
}

#[derive(Debug, Deserialize)]
struct RawTeam {
    seed: u32,
    #[serde(flatten)]
    ratings: BTreeMap<String, f64>,
}

/// Validated tournament input: rating-system names, their sigmas, and the 16
/// teams sorted by seed.
#[derive(Debug, Clone)]
pub struct TournamentData {
    pub systems: Vec<String>,
    pub sigma: Vec<f64>,
    pub teams: Vec<Team>,
}

impl TournamentData {
    /// Load and validate the input data file.
    pub fn from_file(path: &Path) -> Result<TournamentData, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read data file {}: {}", path.display(), e))?;
        Self::from_json(&content)
    }

    /// Parse and validate team data from a JSON string. Rejects anything that
    /// would leave the bracket engine with undefined pairings: wrong team
    /// count, duplicate or out-of-range seeds, missing ratings.
    pub fn from_json(content: &str) -> Result<TournamentData, String> {
        let raw: RawData = serde_json::from_str(content)
            .map_err(|e| format!("Failed to parse data file: {}", e))?;

        if raw.sigma.is_empty() {
            return Err("At least one rating system is required".to_string());
        }
        let systems: Vec<String> = raw.sigma.keys().cloned().collect();
        let sigma: Vec<f64> = raw.sigma.values().copied().collect();
        for (name, s) in systems.iter().zip(&sigma) {
            if !s.is_finite() || *s <= 0.0 {
                return Err(format!("Sigma for rating system '{}' must be positive", name));
            }
        }

        if raw.teams.len() != TEAM_COUNT {
            return Err(format!(
                "Expected exactly {} teams, got {}",
                TEAM_COUNT,
                raw.teams.len()
            ));
        }

        let mut slots: Vec<Option<Team>> = (0..TEAM_COUNT).map(|_| None).collect();
        for (name, raw_team) in &raw.teams {
            if raw_team.seed < 1 || raw_team.seed > TEAM_COUNT as u32 {
                return Err(format!(
                    "Team '{}' has out-of-range seed {} (must be 1..={})",
                    name, raw_team.seed, TEAM_COUNT
                ));
            }
            let index = (raw_team.seed - 1) as usize;
            if let Some(other) = &slots[index] {
                return Err(format!(
                    "Duplicate seed {}: '{}' and '{}'",
                    raw_team.seed, other.name, name
                ));
            }
            let mut rating = Vec::with_capacity(systems.len());
            for system in &systems {
                match raw_team.ratings.get(system) {
                    Some(r) => rating.push(*r),
                    None => {
                        return Err(format!("Team '{}' is missing a '{}' rating", name, system))
                    }
                }
            }
            slots[index] = Some(Team::new(name.clone(), raw_team.seed, rating, index));
        }

        let teams: Vec<Team> = slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| slot.ok_or_else(|| format!("No team with seed {}", i + 1)))
            .collect::<Result<_, _>>()?;

        Ok(TournamentData {
            systems,
            sigma,
            teams,
        })
    }
}
