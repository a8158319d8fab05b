//! Feedback model
//!
//! Every prediction the user confirmed or corrected, kept for retraining.
//! Rows are only ever inserted.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{FromRow, Row, SqlitePool};

use crate::{AppError, AppResult};

/// Row as stored; `features` is the JSON text
#[derive(Debug, Clone, FromRow)]
struct FeedbackRow {
    id: i64,
    timestamp: String,
    features: String,
    model_prediction: i64,
    prediction_label: String,
    user_provided_label: String,
    verified: Option<i64>,
}

/// Feedback record with features parsed back out
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Feedback {
    pub id: i64,
    pub timestamp: String,
    pub features: Map<String, Value>,
    pub model_prediction: i64,
    pub prediction_label: String,
    pub user_provided_label: String,
    pub verified: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct FeedbackStats {
    pub total_feedback: i64,
    pub label_distribution: BTreeMap<String, i64>,
    pub model_accuracy_on_feedback: f64,
    pub correct_predictions: i64,
}

#[derive(Debug, Serialize)]
pub struct FeedbackExport {
    pub count: usize,
    pub data: Vec<Feedback>,
}

impl TryFrom<FeedbackRow> for Feedback {
    type Error = AppError;

    fn try_from(row: FeedbackRow) -> AppResult<Self> {
        let features = serde_json::from_str(&row.features).map_err(|e| {
            AppError::DatabaseError(format!("feedback {} has unreadable features: {}", row.id, e))
        })?;

        Ok(Self {
            id: row.id,
            timestamp: row.timestamp,
            features,
            model_prediction: row.model_prediction,
            prediction_label: row.prediction_label,
            user_provided_label: row.user_provided_label,
            verified: row.verified.unwrap_or(1),
        })
    }
}

impl Feedback {
    /// Insert one record. The user label is uppercased before storing.
    pub async fn insert(
        pool: &SqlitePool,
        features: &Map<String, Value>,
        prediction: i64,
        prediction_label: &str,
        user_label: &str,
    ) -> AppResult<i64> {
        let features_json = serde_json::to_string(features)
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let result = sqlx::query(
            r#"
            INSERT INTO feedback
                (timestamp, features, model_prediction, prediction_label, user_provided_label, verified)
            VALUES (?, ?, ?, ?, ?, 1)
            "#
        )
        .bind(&timestamp)
        .bind(&features_json)
        .bind(prediction)
        .bind(prediction_label)
        .bind(user_label.to_uppercase())
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Insert one record, logging instead of failing
    pub async fn store(
        pool: &SqlitePool,
        features: &Map<String, Value>,
        prediction: i64,
        prediction_label: &str,
        user_label: &str,
    ) -> bool {
        match Self::insert(pool, features, prediction, prediction_label, user_label).await {
            Ok(id) => {
                tracing::info!(
                    "Feedback {} stored: model predicted '{}', user confirmed '{}'",
                    id, prediction_label, user_label
                );
                true
            }
            Err(e) => {
                tracing::error!("Error storing feedback: {:?}", e);
                false
            }
        }
    }

    pub async fn stats(pool: &SqlitePool) -> AppResult<FeedbackStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN UPPER(prediction_label) = UPPER(user_provided_label) THEN 1 ELSE 0 END), 0) AS correct
            FROM feedback
            "#
        )
        .fetch_one(pool)
        .await?;

        let total: i64 = row.get("total");
        let correct: i64 = row.get("correct");

        let label_rows = sqlx::query(
            "SELECT user_provided_label, COUNT(*) AS count FROM feedback GROUP BY user_provided_label"
        )
        .fetch_all(pool)
        .await?;

        let label_distribution = label_rows
            .into_iter()
            .map(|r| (r.get::<String, _>("user_provided_label"), r.get::<i64, _>("count")))
            .collect();

        Ok(FeedbackStats {
            total_feedback: total,
            label_distribution,
            model_accuracy_on_feedback: accuracy_percent(correct, total),
            correct_predictions: correct,
        })
    }

    pub async fn list_all(pool: &SqlitePool) -> AppResult<Vec<Self>> {
        let rows = sqlx::query_as::<_, FeedbackRow>(
            r#"
            SELECT id, timestamp, features, model_prediction, prediction_label, user_provided_label, verified
            FROM feedback
            ORDER BY id
            "#
        )
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(Feedback::try_from).collect()
    }

    pub async fn export(pool: &SqlitePool) -> AppResult<FeedbackExport> {
        let data = Self::list_all(pool).await?;
        Ok(FeedbackExport {
            count: data.len(),
            data,
        })
    }
}

/// `correct / total` as a percentage with two decimals, 0 when empty
fn accuracy_percent(correct: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let percent = correct as f64 / total as f64 * 100.0;
    (percent * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use serde_json::json;
    use tempfile::TempDir;

    async fn test_pool(dir: &TempDir) -> SqlitePool {
        let url = format!("sqlite://{}", dir.path().join("feedback.db").display());
        let pool = db::create_pool(&url).await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        pool
    }

    fn features(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_accuracy_rounding() {
        assert_eq!(accuracy_percent(0, 0), 0.0);
        assert_eq!(accuracy_percent(1, 3), 33.33);
        assert_eq!(accuracy_percent(2, 3), 66.67);
        assert_eq!(accuracy_percent(4, 4), 100.0);
    }

    #[tokio::test]
    async fn test_empty_stats() {
        let dir = TempDir::new().unwrap();
        let pool = test_pool(&dir).await;

        let stats = Feedback::stats(&pool).await.unwrap();
        assert_eq!(stats, FeedbackStats {
            total_feedback: 0,
            label_distribution: BTreeMap::new(),
            model_accuracy_on_feedback: 0.0,
            correct_predictions: 0,
        });
    }

    #[tokio::test]
    async fn test_store_and_export_round_trip() {
        let dir = TempDir::new().unwrap();
        let pool = test_pool(&dir).await;

        let original = features(json!({
            "period": 10.123456789,
            "duration": "2.5",
            "depth": 500,
            "planet_radius": 0,
            "stellar_temperature": null,
            "magnitude": -1.25e-7
        }));

        assert!(Feedback::store(&pool, &original, 1, "exoplanet", "Exoplanet").await);

        let export = Feedback::export(&pool).await.unwrap();
        assert_eq!(export.count, 1);

        let record = &export.data[0];
        assert_eq!(record.features, original);
        assert_eq!(
            record.features.keys().collect::<Vec<_>>(),
            original.keys().collect::<Vec<_>>()
        );
        assert_eq!(record.model_prediction, 1);
        assert_eq!(record.prediction_label, "exoplanet");
        assert_eq!(record.user_provided_label, "EXOPLANET");
        assert_eq!(record.verified, 1);
        assert!(chrono::DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_extreme_floats_survive_export() {
        let dir = TempDir::new().unwrap();
        let pool = test_pool(&dir).await;

        let body = r#"{"period": 1.0715660391465826e-75, "depth": 2.2250738585072014e-308, "snr": 1.7976931348623157e308}"#;
        let original: Map<String, Value> = serde_json::from_str(body).unwrap();
        assert_eq!(original["period"].as_f64(), Some(1.0715660391465826e-75));

        assert!(Feedback::store(&pool, &original, 0, "not an exoplanet", "x").await);

        let export = Feedback::export(&pool).await.unwrap();
        let stored = &export.data[0].features;
        assert_eq!(stored, &original);
        assert_eq!(stored["period"].as_f64(), Some(1.0715660391465826e-75));
        assert_eq!(stored["depth"].as_f64(), Some(2.2250738585072014e-308));
        assert_eq!(stored["snr"].as_f64(), Some(f64::MAX));
    }

    #[tokio::test]
    async fn test_stats_counts_labels_and_accuracy() {
        let dir = TempDir::new().unwrap();
        let pool = test_pool(&dir).await;
        let f = features(json!({"period": 1}));

        Feedback::insert(&pool, &f, 1, "exoplanet", "exoplanet").await.unwrap();
        Feedback::insert(&pool, &f, 0, "not an exoplanet", "exoplanet").await.unwrap();
        Feedback::insert(&pool, &f, 2, "candidate of exoplanet", "Candidate of Exoplanet").await.unwrap();

        let stats = Feedback::stats(&pool).await.unwrap();
        assert_eq!(stats.total_feedback, 3);
        assert_eq!(stats.correct_predictions, 2);
        assert_eq!(stats.model_accuracy_on_feedback, 66.67);
        assert_eq!(stats.label_distribution.get("EXOPLANET"), Some(&2));
        assert_eq!(stats.label_distribution.get("CANDIDATE OF EXOPLANET"), Some(&1));
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let pool = test_pool(&dir).await;
        sqlx::query("DROP TABLE feedback").execute(&pool).await.unwrap();

        assert!(!Feedback::store(&pool, &Map::new(), 1, "exoplanet", "X").await);
    }

    #[tokio::test]
    async fn test_export_orders_by_id() {
        let dir = TempDir::new().unwrap();
        let pool = test_pool(&dir).await;

        for label in ["a", "b", "c"] {
            Feedback::insert(&pool, &Map::new(), 0, "not an exoplanet", label).await.unwrap();
        }

        let export = Feedback::export(&pool).await.unwrap();
        let labels: Vec<&str> = export.data.iter().map(|f| f.user_provided_label.as_str()).collect();
        assert_eq!(labels, ["A", "B", "C"]);
        assert!(export.data.windows(2).all(|w| w[0].id < w[1].id));
    }
}
