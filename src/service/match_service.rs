use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::api::health::HealthState;
use crate::config::{MATCHES_COLLECTION, STATS_COLLECTION};
use crate::db::{to_document, Document, DocumentStore, Filter, StoredDocument};
use crate::error::{AppError, Result};
use crate::service::timings::{RecomputeReport, RecomputeTimings};
use crate::stats::{aggregate, find_duplicate};
use crate::types::{MatchInput, MatchRecord, PlayerStats};

const SUBJECT_FIELD: &str = "subjectId";

/// Match records and the career snapshot of one subject.
///
/// Every successful add/update/delete re-reads all matches, rebuilds the
/// snapshot and persists it before returning, so a read that follows a
/// completed write always sees fresh stats. Writes are serialized.
pub struct MatchService {
    store: Arc<dyn DocumentStore>,
    subject_id: String,
    write_lock: Mutex<()>,
    health: Arc<HealthState>,
    timings: Arc<RecomputeTimings>,
}

impl MatchService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        subject_id: impl Into<String>,
        health: Arc<HealthState>,
        timings: Arc<RecomputeTimings>,
    ) -> Self {
        Self {
            store,
            subject_id: subject_id.into(),
            write_lock: Mutex::new(()),
            health,
            timings,
        }
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Durations of the recomputes this service has finished.
    pub fn recompute_report(&self) -> RecomputeReport {
        self.timings.report()
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Persist a new match and return its store-assigned id.
    pub async fn add_match(&self, input: MatchInput) -> Result<String> {
        let _guard = self.write_lock.lock().await;

        let records = self.load_records().await?;
        self.ensure_unique(&records, &input, None)?;

        let stored = self
            .store
            .create(MATCHES_COLLECTION, self.match_document(&input)?)
            .await?;
        self.health.inc_writes();
        info!(
            match_id = %stored.id,
            opponent = %input.opponent,
            match_date = %input.match_date,
            "Match added"
        );

        self.refresh_after_write(&stored.id).await?;
        Ok(stored.id)
    }

    /// Replace the figures of an existing match. Id and creation time are kept.
    pub async fn update_match(&self, id: &str, input: MatchInput) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let existing = self
            .fetch_match(id)
            .await?
            .ok_or_else(|| AppError::NotFound { id: id.to_string() })?;

        if existing.match_date() != input.match_date || existing.opponent() != input.opponent {
            let records = self.load_records().await?;
            self.ensure_unique(&records, &input, Some(id))?;
        }

        self.store
            .update(MATCHES_COLLECTION, id, self.match_document(&input)?)
            .await?;
        self.health.inc_writes();
        info!(match_id = %id, opponent = %input.opponent, "Match updated");

        self.refresh_after_write(id).await
    }

    pub async fn delete_match(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        if self.fetch_match(id).await?.is_none() {
            return Err(AppError::NotFound { id: id.to_string() });
        }
        if !self.store.delete(MATCHES_COLLECTION, id).await? {
            return Err(AppError::NotFound { id: id.to_string() });
        }
        self.health.inc_writes();
        info!(match_id = %id, "Match deleted");

        self.refresh_after_write(id).await
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// All matches, newest match date first; same-day matches newest entry first.
    pub async fn get_all_matches(&self) -> Result<Vec<MatchRecord>> {
        let mut records = self.load_records().await?;
        records.sort_by(|a, b| {
            b.match_date()
                .cmp(&a.match_date())
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(records)
    }

    pub async fn recent_matches(&self, limit: usize) -> Result<Vec<MatchRecord>> {
        let mut records = self.get_all_matches().await?;
        records.truncate(limit);
        Ok(records)
    }

    pub async fn get_match(&self, id: &str) -> Result<Option<MatchRecord>> {
        self.fetch_match(id).await
    }

    /// The persisted snapshot. Built and stored on first read if it does not exist yet.
    pub async fn get_player_stats(&self) -> Result<PlayerStats> {
        if let Some(doc) = self.store.get(STATS_COLLECTION, &self.subject_id).await? {
            return Ok(serde_json::from_value(Value::Object(doc.data))?);
        }

        let _guard = self.write_lock.lock().await;
        // A write may have landed while we waited for the lock.
        if let Some(doc) = self.store.get(STATS_COLLECTION, &self.subject_id).await? {
            return Ok(serde_json::from_value(Value::Object(doc.data))?);
        }
        debug!(subject_id = %self.subject_id, "No stats snapshot yet, computing");
        self.recompute().await
    }

    /// Rebuild and persist the snapshot from scratch.
    pub async fn recompute_stats(&self) -> Result<PlayerStats> {
        let _guard = self.write_lock.lock().await;
        self.recompute().await
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn recompute(&self) -> Result<PlayerStats> {
        let started = Instant::now();

        let records = self.load_records().await?;
        let stats = aggregate(&records);

        let mut doc = to_document(&stats)?;
        doc.insert(SUBJECT_FIELD.to_string(), Value::String(self.subject_id.clone()));
        self.store.set(STATS_COLLECTION, &self.subject_id, doc).await?;

        let cycle = self.timings.observe(started.elapsed(), stats.total_matches);
        self.health.set_last_recompute_at_ms(now_ms());
        debug!(
            total_matches = stats.total_matches,
            duration_us = cycle.duration_us,
            batting_average = stats.batting_average,
            economy_rate = stats.economy_rate,
            "Stats recomputed"
        );
        Ok(stats)
    }

    /// The record write is not rolled back if this fails; the caller still gets the error.
    async fn refresh_after_write(&self, record_id: &str) -> Result<()> {
        if let Err(e) = self.recompute().await {
            self.health.inc_recompute_failures();
            error!(match_id = %record_id, "Stats recompute failed after write: {e}");
            return Err(AppError::StatsRecompute {
                record_id: record_id.to_string(),
                source: Box::new(e),
            });
        }
        Ok(())
    }

    fn ensure_unique(
        &self,
        records: &[MatchRecord],
        input: &MatchInput,
        exclude_id: Option<&str>,
    ) -> Result<()> {
        if let Some(existing) =
            find_duplicate(records, input.match_date, &input.opponent, exclude_id)
        {
            warn!(
                existing_id = %existing.id,
                opponent = %input.opponent,
                match_date = %input.match_date,
                "Duplicate match rejected"
            );
            return Err(AppError::Duplicate { opponent: input.opponent.clone() });
        }
        Ok(())
    }

    fn match_document(&self, input: &MatchInput) -> Result<Document> {
        let mut doc = to_document(input)?;
        doc.insert(SUBJECT_FIELD.to_string(), Value::String(self.subject_id.clone()));
        Ok(doc)
    }

    fn owns(&self, doc: &StoredDocument) -> bool {
        doc.data.get(SUBJECT_FIELD).and_then(Value::as_str) == Some(self.subject_id.as_str())
    }

    async fn fetch_match(&self, id: &str) -> Result<Option<MatchRecord>> {
        match self.store.get(MATCHES_COLLECTION, id).await? {
            Some(doc) if self.owns(&doc) => Ok(Some(decode_record(doc)?)),
            _ => Ok(None),
        }
    }

    async fn load_records(&self) -> Result<Vec<MatchRecord>> {
        let filter = Filter::all().eq(SUBJECT_FIELD, self.subject_id.as_str());
        self.store
            .find(MATCHES_COLLECTION, &filter)
            .await?
            .into_iter()
            .map(decode_record)
            .collect()
    }
}

fn decode_record(doc: StoredDocument) -> Result<MatchRecord> {
    Ok(serde_json::from_value(doc.into_value())?)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
