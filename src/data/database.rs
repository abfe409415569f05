//! SQLite storage for championship standings and predictions

use crate::{DriverNumber, Prediction, Result, StandingRecord};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS standings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                season TEXT NOT NULL,
                round INTEGER NOT NULL,
                driver_number INTEGER NOT NULL,
                position INTEGER NOT NULL,
                points REAL NOT NULL,
                wins INTEGER NOT NULL,
                UNIQUE(season, round, driver_number)
            );

            CREATE TABLE IF NOT EXISTS predictions (
                driver_number INTEGER PRIMARY KEY,
                predicted_position REAL NOT NULL CHECK (predicted_position >= 1),
                predicted_points_gain REAL NOT NULL CHECK (predicted_points_gain >= 0),
                predicted_total_points REAL NOT NULL,
                current_position INTEGER NOT NULL,
                current_points REAL NOT NULL,
                confidence REAL NOT NULL CHECK (confidence BETWEEN 0 AND 1),
                generated_at TEXT NOT NULL,
                model_type TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_standings_season_round ON standings(season, round);
            "#,
        )?;
        Ok(())
    }

    // ==================== Standing Operations ====================

    /// Insert or update standings in one transaction, keyed by (season, round, driver)
    pub fn upsert_standings(&mut self, records: &[StandingRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO standings (season, round, driver_number, position, points, wins)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(season, round, driver_number) DO UPDATE SET
                    position = excluded.position,
                    points = excluded.points,
                    wins = excluded.wins
                "#,
            )?;
            for record in records {
                stmt.execute(params![
                    record.season,
                    record.round,
                    record.driver_number.0,
                    record.position,
                    record.points,
                    record.wins,
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Standings of a single season
    pub fn get_season_standings(&self, season: &str) -> Result<Vec<StandingRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT season, round, driver_number, position, points, wins
             FROM standings
             WHERE season = ?1
             ORDER BY round, driver_number",
        )?;
        let standings = stmt
            .query_map(params![season], Self::row_to_standing)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(standings)
    }

    /// Most recent season present in the store
    pub fn latest_season(&self) -> Result<Option<String>> {
        let season = self
            .conn
            .query_row("SELECT MAX(season) FROM standings", [], |row| row.get(0))
            .optional()?
            .flatten();
        Ok(season)
    }

    /// Distinct driver numbers of a season, ascending
    pub fn driver_numbers(&self, season: &str) -> Result<Vec<DriverNumber>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT driver_number FROM standings WHERE season = ?1 ORDER BY driver_number",
        )?;
        let drivers = stmt
            .query_map(params![season], |row| Ok(DriverNumber(row.get(0)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(drivers)
    }

    fn row_to_standing(row: &rusqlite::Row) -> rusqlite::Result<StandingRecord> {
        Ok(StandingRecord {
            season: row.get(0)?,
            round: row.get(1)?,
            driver_number: DriverNumber(row.get(2)?),
            position: row.get(3)?,
            points: row.get(4)?,
            wins: row.get(5)?,
        })
    }

    // ==================== Prediction Operations ====================

    /// Replace the stored prediction for the driver
    pub fn upsert_prediction(&self, prediction: &Prediction) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO predictions (driver_number, predicted_position, predicted_points_gain,
                                     predicted_total_points, current_position, current_points,
                                     confidence, generated_at, model_type)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(driver_number) DO UPDATE SET
                predicted_position = excluded.predicted_position,
                predicted_points_gain = excluded.predicted_points_gain,
                predicted_total_points = excluded.predicted_total_points,
                current_position = excluded.current_position,
                current_points = excluded.current_points,
                confidence = excluded.confidence,
                generated_at = excluded.generated_at,
                model_type = excluded.model_type
            "#,
            params![
                prediction.driver_number.0,
                prediction.predicted_position,
                prediction.predicted_points_gain,
                prediction.predicted_total_points,
                prediction.current_position,
                prediction.current_points,
                prediction.confidence,
                prediction.generated_at,
                prediction.model_type,
            ],
        )?;
        Ok(())
    }

    /// Upsert each prediction independently, returning how many were stored.
    ///
    /// A failed write is logged and does not stop the remaining drivers.
    pub fn store_predictions(&self, predictions: &[Prediction]) -> usize {
        let mut stored = 0;
        for prediction in predictions {
            match self.upsert_prediction(prediction) {
                Ok(()) => stored += 1,
                Err(e) => log::error!(
                    "Failed to store prediction for driver {}: {}",
                    prediction.driver_number,
                    e
                ),
            }
        }
        stored
    }

    /// Stored predictions, best predicted position first
    pub fn get_predictions(&self) -> Result<Vec<Prediction>> {
        let mut stmt = self.conn.prepare(
            "SELECT driver_number, predicted_position, predicted_points_gain,
                    predicted_total_points, current_position, current_points,
                    confidence, generated_at, model_type
             FROM predictions
             ORDER BY predicted_position, driver_number",
        )?;
        let predictions = stmt
            .query_map([], |row| {
                Ok(Prediction {
                    driver_number: DriverNumber(row.get(0)?),
                    predicted_position: row.get(1)?,
                    predicted_points_gain: row.get(2)?,
                    predicted_total_points: row.get(3)?,
                    current_position: row.get(4)?,
                    current_points: row.get(5)?,
                    confidence: row.get(6)?,
                    generated_at: row.get(7)?,
                    model_type: row.get(8)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(predictions)
    }

    // ==================== Statistics ====================

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let standing_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM standings", [], |row| row.get(0))?;

        let driver_count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT driver_number) FROM standings",
            [],
            |row| row.get(0),
        )?;

        let prediction_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0))?;

        let latest_season = self.latest_season()?;
        let latest_round: Option<u32> = match &latest_season {
            Some(season) => self
                .conn
                .query_row(
                    "SELECT MAX(round) FROM standings WHERE season = ?1",
                    params![season],
                    |row| row.get(0),
                )
                .optional()?
                .flatten(),
            None => None,
        };

        Ok(DatabaseStats {
            standing_count: standing_count as usize,
            driver_count: driver_count as usize,
            prediction_count: prediction_count as usize,
            latest_season,
            latest_round,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub standing_count: usize,
    pub driver_count: usize,
    pub prediction_count: usize,
    pub latest_season: Option<String>,
    pub latest_round: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_standing(season: &str, round: u32, driver: u32, position: u32, points: f64) -> StandingRecord {
        StandingRecord {
            season: season.to_string(),
            round,
            driver_number: DriverNumber(driver),
            position,
            points,
            wins: 0,
        }
    }

    fn make_prediction(driver: u32, position: f64) -> Prediction {
        Prediction {
            driver_number: DriverNumber(driver),
            predicted_position: position,
            predicted_points_gain: 12.5,
            predicted_total_points: 112.5,
            current_position: 4,
            current_points: 100.0,
            confidence: 0.8,
            generated_at: "2025-06-01T12:00:00+00:00".to_string(),
            model_type: "gradient_boosted".to_string(),
        }
    }

    #[test]
    fn test_create_database() {
        let db = Database::in_memory().unwrap();
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.standing_count, 0);
        assert_eq!(stats.prediction_count, 0);
        assert!(stats.latest_season.is_none());
        assert!(stats.latest_round.is_none());
    }

    #[test]
    fn test_upsert_standing_replaces_same_key() {
        let mut db = Database::in_memory().unwrap();
        db.upsert_standings(&[make_standing("2025", 3, 4, 2, 50.0)]).unwrap();
        db.upsert_standings(&[make_standing("2025", 3, 4, 1, 62.0)]).unwrap();

        let standings = db.get_season_standings("2025").unwrap();
        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].position, 1);
        assert_eq!(standings[0].points, 62.0);
    }

    #[test]
    fn test_season_queries() {
        let mut db = Database::in_memory().unwrap();
        let records = vec![
            make_standing("2024", 1, 1, 1, 25.0),
            make_standing("2025", 2, 44, 3, 30.0),
            make_standing("2025", 1, 44, 2, 18.0),
            make_standing("2025", 1, 16, 1, 25.0),
        ];
        assert_eq!(db.upsert_standings(&records).unwrap(), 4);

        assert_eq!(db.latest_season().unwrap().as_deref(), Some("2025"));
        assert_eq!(
            db.driver_numbers("2025").unwrap(),
            vec![DriverNumber(16), DriverNumber(44)]
        );

        let season = db.get_season_standings("2025").unwrap();
        assert_eq!(season.len(), 3);
        assert_eq!(season[0].round, 1);
        assert_eq!(season[2].round, 2);

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.standing_count, 4);
        assert_eq!(stats.driver_count, 3);
        assert_eq!(stats.latest_round, Some(2));
    }

    #[test]
    fn test_prediction_upsert_is_keyed_by_driver() {
        let db = Database::in_memory().unwrap();
        db.upsert_prediction(&make_prediction(81, 3.0)).unwrap();
        db.upsert_prediction(&make_prediction(4, 1.0)).unwrap();

        let mut updated = make_prediction(81, 2.0);
        updated.model_type = "linear_ensemble".to_string();
        db.upsert_prediction(&updated).unwrap();

        let predictions = db.get_predictions().unwrap();
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].driver_number, DriverNumber(4));
        assert_eq!(predictions[1], updated);
    }

    #[test]
    fn test_store_predictions_continues_past_failed_write() {
        let db = Database::in_memory().unwrap();
        let mut invalid = make_prediction(16, 5.0);
        invalid.confidence = 1.5;
        let batch = vec![make_prediction(81, 3.0), invalid, make_prediction(4, 1.0)];

        assert_eq!(db.store_predictions(&batch), 2);

        let drivers: Vec<DriverNumber> = db
            .get_predictions()
            .unwrap()
            .iter()
            .map(|p| p.driver_number)
            .collect();
        assert_eq!(drivers, vec![DriverNumber(4), DriverNumber(81)]);
    }
}
