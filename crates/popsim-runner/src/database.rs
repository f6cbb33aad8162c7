//! Database layer for loading and saving populations.

use popsim_core::{Error, GenderTag, IndividualRecord, Result, RunId};
use popsim_world::SimulationResult;
use sqlx::{
    sqlite::{SqlitePool, SqliteRow},
    Row,
};
use std::path::Path;
use tracing::{debug, info};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(path: &str) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Database(format!("Failed to create database directory: {}", e))
            })?;
        }

        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", path))
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {}", e)))?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations");

        // Rows with a NULL run_id form the seed population
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS individuals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id TEXT,
                age INTEGER NOT NULL,
                relation_age INTEGER NOT NULL,
                lifetime INTEGER NOT NULL,
                gender TEXT NOT NULL,
                pregnancy_age REAL,
                children_count REAL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Migration failed: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS runs (
                run_id TEXT PRIMARY KEY,
                seed INTEGER,
                duration INTEGER NOT NULL,
                final_clock INTEGER NOT NULL,
                passes INTEGER NOT NULL,
                population INTEGER NOT NULL,
                births INTEGER NOT NULL,
                deaths INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Migration failed: {}", e)))?;

        info!("Database migrations complete");
        Ok(())
    }

    /// Load the seed population in insertion order.
    ///
    /// Any malformed row fails the whole load.
    pub async fn load_population(&self) -> Result<Vec<IndividualRecord>> {
        let rows = sqlx::query(
            "SELECT age, relation_age, lifetime, gender, pregnancy_age, children_count
             FROM individuals WHERE run_id IS NULL ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to load population: {}", e)))?;

        rows.iter().map(decode_record).collect()
    }

    /// Load the survivors saved by a previous run, to start a new run from them.
    pub async fn load_run(&self, run_id: RunId) -> Result<Vec<IndividualRecord>> {
        let exists = sqlx::query("SELECT 1 FROM runs WHERE run_id = ?1")
            .bind(run_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to look up run: {}", e)))?;
        if exists.is_none() {
            return Err(Error::NotFound(format!("Run {}", run_id)));
        }

        let rows = sqlx::query(
            "SELECT age, relation_age, lifetime, gender, pregnancy_age, children_count
             FROM individuals WHERE run_id = ?1 ORDER BY id",
        )
        .bind(run_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to load run {}: {}", run_id, e)))?;

        rows.iter().map(decode_record).collect()
    }

    /// Persist one individual. `None` adds it to the seed population.
    pub async fn save_individual(
        &self,
        run_id: Option<RunId>,
        record: &IndividualRecord,
    ) -> Result<()> {
        insert_record(&self.pool, run_id, record)
            .await
            .map_err(|e| Error::Database(format!("Failed to save individual: {}", e)))
    }

    /// Persist a whole population in one transaction.
    pub async fn save_population(&self, run_id: RunId, records: &[IndividualRecord]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Database(format!("Failed to begin transaction: {}", e)))?;

        for record in records {
            insert_record(&mut *tx, Some(run_id), record)
                .await
                .map_err(|e| Error::Database(format!("Failed to save individual: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| Error::Database(format!("Failed to commit population: {}", e)))?;

        debug!(run_id = %run_id, count = records.len(), "Saved population");
        Ok(())
    }

    pub async fn record_run(
        &self,
        run_id: RunId,
        duration: u64,
        result: &SimulationResult,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        // SQLite integers are signed; seeds are stored bit-for-bit
        sqlx::query(
            r#"
            INSERT INTO runs (run_id, seed, duration, final_clock, passes, population, births, deaths, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(run_id.to_string())
        .bind(result.seed.map(|s| s as i64))
        .bind(duration as i64)
        .bind(result.final_clock as i64)
        .bind(result.passes as i64)
        .bind(result.survivors.len() as i64)
        .bind(result.totals.births as i64)
        .bind(result.totals.deaths as i64)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to record run: {}", e)))?;

        Ok(())
    }

    pub async fn count_individuals(&self) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM individuals")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to count individuals: {}", e)))?;

        let count: i64 = row
            .try_get("count")
            .map_err(|e| Error::Database(format!("Failed to read count: {}", e)))?;
        Ok(count as usize)
    }
}

async fn insert_record<'e, E>(
    executor: E,
    run_id: Option<RunId>,
    record: &IndividualRecord,
) -> std::result::Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO individuals (run_id, age, relation_age, lifetime, gender, pregnancy_age, children_count)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(run_id.map(|id| id.to_string()))
    .bind(record.age as i64)
    .bind(record.relation_age as i64)
    .bind(record.lifetime as i64)
    .bind(record.gender.as_str())
    // Fertility columns stay NULL for males
    .bind(match record.gender {
        GenderTag::Female => record.pregnancy_age,
        GenderTag::Male => None,
    })
    .bind(match record.gender {
        GenderTag::Female => record.children_count,
        GenderTag::Male => None,
    })
    .execute(executor)
    .await?;

    Ok(())
}

fn decode_record(row: &SqliteRow) -> Result<IndividualRecord> {
    let column = |name: &str| -> Result<u32> {
        let value: i64 = row
            .try_get(name)
            .map_err(|e| Error::Database(format!("Failed to read {}: {}", name, e)))?;
        u32::try_from(value)
            .map_err(|_| Error::Validation(format!("Column {} out of range: {}", name, value)))
    };
    let optional = |name: &str| -> Result<Option<f64>> {
        row.try_get(name)
            .map_err(|e| Error::Database(format!("Failed to read {}: {}", name, e)))
    };

    let gender: String = row
        .try_get("gender")
        .map_err(|e| Error::Database(format!("Failed to read gender: {}", e)))?;

    let record = IndividualRecord {
        age: column("age")?,
        relation_age: column("relation_age")?,
        lifetime: column("lifetime")?,
        gender: gender.parse()?,
        pregnancy_age: optional("pregnancy_age")?,
        children_count: optional("children_count")?,
    };

    if record.gender == GenderTag::Female {
        record.fertility_fields()?;
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use popsim_world::RunTotals;

    async fn create_test_db() -> Database {
        let db = Database::new(":memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn seed_records() -> Vec<IndividualRecord> {
        vec![
            IndividualRecord::male(20, 16, 25),
            IndividualRecord::female(19, 16, 25, 18.0, 2.0),
            IndividualRecord::male(40, 17, 71),
        ]
    }

    #[tokio::test]
    async fn test_empty_population() {
        let db = create_test_db().await;
        assert!(db.load_population().await.unwrap().is_empty());
        assert_eq!(db.count_individuals().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_save_and_load_in_order() {
        let db = create_test_db().await;
        for record in seed_records() {
            db.save_individual(None, &record).await.unwrap();
        }

        let loaded = db.load_population().await.unwrap();
        assert_eq!(loaded, seed_records());
        assert!(loaded[0].pregnancy_age.is_none());
        assert_eq!(loaded[1].children_count, Some(2.0));
    }

    #[tokio::test]
    async fn test_male_fertility_columns_stored_null() {
        let db = create_test_db().await;
        let mut male = IndividualRecord::male(20, 16, 25);
        male.pregnancy_age = Some(30.0);
        db.save_individual(None, &male).await.unwrap();

        let loaded = db.load_population().await.unwrap();
        assert!(loaded[0].pregnancy_age.is_none());
        assert!(loaded[0].children_count.is_none());
    }

    #[tokio::test]
    async fn test_unknown_gender_fails_load() {
        let db = create_test_db().await;
        db.save_individual(None, &IndividualRecord::male(20, 16, 25)).await.unwrap();
        sqlx::query(
            "INSERT INTO individuals (age, relation_age, lifetime, gender) VALUES (1, 16, 70, 'Other')",
        )
        .execute(&db.pool)
        .await
        .unwrap();

        assert!(matches!(db.load_population().await, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_female_without_fertility_fails_load() {
        let db = create_test_db().await;
        sqlx::query(
            "INSERT INTO individuals (age, relation_age, lifetime, gender) VALUES (1, 16, 70, 'Female')",
        )
        .execute(&db.pool)
        .await
        .unwrap();

        assert!(matches!(db.load_population().await, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_negative_age_fails_load() {
        let db = create_test_db().await;
        sqlx::query(
            "INSERT INTO individuals (age, relation_age, lifetime, gender) VALUES (-1, 16, 70, 'Male')",
        )
        .execute(&db.pool)
        .await
        .unwrap();

        assert!(matches!(db.load_population().await, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_run_round_trip() {
        let db = create_test_db().await;
        for record in seed_records() {
            db.save_individual(None, &record).await.unwrap();
        }

        let run_id = RunId::new();
        let survivors = vec![
            IndividualRecord::male(21, 16, 25),
            IndividualRecord::female(20, 16, 25, 18.0, 1.0),
        ];
        let result = SimulationResult {
            seed: Some(u64::MAX),
            final_clock: 12,
            passes: 6,
            totals: RunTotals::default(),
            survivors: survivors.clone(),
        };
        db.record_run(run_id, 10, &result).await.unwrap();
        db.save_population(run_id, &survivors).await.unwrap();

        assert_eq!(db.load_run(run_id).await.unwrap(), survivors);
        // Saved runs never leak into the seed population
        assert_eq!(db.load_population().await.unwrap(), seed_records());
        assert_eq!(db.count_individuals().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_unknown_run() {
        let db = create_test_db().await;
        assert!(matches!(
            db.load_run(RunId::new()).await,
            Err(Error::NotFound(_))
        ));
    }
}
