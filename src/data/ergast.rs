//! Parser for cached Jolpica/Ergast `driverstandings` responses
//!
//! Responses are read from disk; fetching them is left to the user, e.g.
//! `curl https://api.jolpi.ca/ergast/f1/2025/5/driverstandings/ > 05.json`.

use std::path::Path;

use serde::Deserialize;

use crate::{DriverNumber, F1Error, Result, StandingRecord};

/// Number a driver races under when holding the title
const CHAMPION_NUMBER: u32 = 1;
/// Permanent number swapped for [`CHAMPION_NUMBER`]
const CHAMPION_PERMANENT_NUMBER: u32 = 33;

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(rename = "MRData")]
    mr_data: MrData,
}

#[derive(Debug, Deserialize)]
struct MrData {
    #[serde(rename = "StandingsTable")]
    standings_table: StandingsTable,
}

#[derive(Debug, Deserialize)]
struct StandingsTable {
    #[serde(rename = "StandingsLists", default)]
    standings_lists: Vec<StandingsList>,
}

#[derive(Debug, Deserialize)]
struct StandingsList {
    season: String,
    round: String,
    #[serde(rename = "DriverStandings", default)]
    driver_standings: Vec<DriverStanding>,
}

#[derive(Debug, Deserialize)]
struct DriverStanding {
    position: Option<String>,
    points: Option<String>,
    wins: Option<String>,
    #[serde(rename = "Driver")]
    driver: Driver,
}

#[derive(Debug, Deserialize)]
struct Driver {
    #[serde(rename = "permanentNumber")]
    permanent_number: Option<String>,
    #[serde(rename = "driverId", default)]
    driver_id: String,
}

/// Parse one response body into standings.
///
/// Entries with missing or non-numeric fields are skipped with a warning.
/// A response without standings (round not yet raced) yields no records.
pub fn parse_standings(json: &str) -> Result<Vec<StandingRecord>> {
    let response: Response = serde_json::from_str(json)?;

    let Some(list) = response.mr_data.standings_table.standings_lists.into_iter().next() else {
        return Ok(Vec::new());
    };

    let round: u32 = list
        .round
        .trim()
        .parse()
        .map_err(|_| F1Error::Parse(format!("invalid round number '{}'", list.round)))?;

    let mut records = Vec::with_capacity(list.driver_standings.len());
    for standing in list.driver_standings {
        match to_record(&standing, &list.season, round) {
            Some(record) => records.push(record),
            None => log::warn!(
                "Missing required data for {} in round {}",
                standing.driver.driver_id,
                round
            ),
        }
    }

    log::debug!("Parsed {} standings for {} round {}", records.len(), list.season, round);
    Ok(records)
}

fn to_record(standing: &DriverStanding, season: &str, round: u32) -> Option<StandingRecord> {
    let position = parse_field::<u32>(standing.position.as_deref())?;
    let points = parse_field::<f64>(standing.points.as_deref()).filter(|v| v.is_finite())?;
    let wins = parse_field::<u32>(standing.wins.as_deref())?;
    let number = parse_field::<u32>(standing.driver.permanent_number.as_deref())?;

    Some(StandingRecord {
        season: season.to_string(),
        round,
        driver_number: normalize_number(number),
        position,
        points,
        wins,
    })
}

fn parse_field<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}

fn normalize_number(number: u32) -> DriverNumber {
    if number == CHAMPION_PERMANENT_NUMBER {
        DriverNumber(CHAMPION_NUMBER)
    } else {
        DriverNumber(number)
    }
}

/// Parse a single cached response file
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<StandingRecord>> {
    let json = std::fs::read_to_string(path)?;
    parse_standings(&json)
}

/// Parse every `*.json` file in a cache directory.
///
/// Unreadable files are logged and skipped.
pub fn parse_cache_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<StandingRecord>> {
    let mut paths: Vec<_> = std::fs::read_dir(dir.as_ref())?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut records = Vec::new();
    for path in paths {
        match parse_file(&path) {
            Ok(mut parsed) => {
                log::info!("  {}: {} standings", path.display(), parsed.len());
                records.append(&mut parsed);
            }
            Err(e) => log::error!("Error parsing {}: {}", path.display(), e),
        }
    }

    Ok(records)
}
