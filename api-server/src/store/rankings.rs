use std::collections::BTreeMap;

use reflex_core::{DeviceFilter, DeviceType, RankingEntry, ScoreSubmission};
use rusqlite::{params, Connection, OptionalExtension};

use super::db::{device_from_str, RawRankingRow, RANKING_COLUMNS};
use super::SessionStore;

/// Aggregates over valid ranking entries.
#[derive(Debug, Default)]
pub(crate) struct RankingCounts {
    pub(crate) total_entries: u64,
    /// `(entries, average best time)` per device.
    pub(crate) by_device: BTreeMap<DeviceType, (u64, Option<f64>)>,
    pub(crate) best_overall_time: Option<RankingEntry>,
    pub(crate) most_attempts: Option<RankingEntry>,
    pub(crate) highest_level: Option<RankingEntry>,
}

impl SessionStore {
    /// Insert or overwrite the entry for `(username, device_type)`.
    ///
    /// Best fields are replaced unconditionally and `total_games` is bumped in
    /// the same statement, then the stored row is read back under the lock.
    pub(crate) fn upsert_score(
        &self,
        submission: &ScoreSubmission,
        now: u64,
    ) -> Result<RankingEntry, String> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO rankings (
                username, device_type, best_time, best_attempts, max_level,
                session_id, total_games, is_valid, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8, ?8)
             ON CONFLICT (username, device_type) DO UPDATE SET
                best_time = excluded.best_time,
                best_attempts = excluded.best_attempts,
                max_level = excluded.max_level,
                session_id = excluded.session_id,
                is_valid = excluded.is_valid,
                total_games = rankings.total_games + 1,
                updated_at = excluded.updated_at",
            params![
                submission.username,
                submission.device_type.as_str(),
                submission.time_taken_seconds,
                submission.attempts,
                submission.max_level,
                submission.session_id,
                submission.is_valid,
                now as i64,
            ],
        )
        .map_err(|e| format!("upsert score failed: {e}"))?;

        Self::select_entry(&conn, &submission.username, submission.device_type)?
            .ok_or_else(|| format!("ranking entry for {} missing after upsert", submission.username))
    }

    fn select_entry(
        conn: &Connection,
        username: &str,
        device_type: DeviceType,
    ) -> Result<Option<RankingEntry>, String> {
        conn.query_row(
            &format!(
                "SELECT {RANKING_COLUMNS} FROM rankings WHERE username = ?1 AND device_type = ?2"
            ),
            params![username, device_type.as_str()],
            RawRankingRow::from_row,
        )
        .optional()
        .map_err(|e| format!("get ranking entry failed: {e}"))?
        .map(RawRankingRow::into_entry)
        .transpose()
    }

    /// Valid entries, fastest first, ties broken by fewer attempts.
    pub(crate) fn top_scores(
        &self,
        limit: u32,
        filter: DeviceFilter,
    ) -> Result<Vec<RankingEntry>, String> {
        let conn = self.conn()?;
        let device = filter.device().map(DeviceType::as_str);
        Self::query_entries(
            &conn,
            &format!(
                "SELECT {RANKING_COLUMNS} FROM rankings
                 WHERE is_valid = 1 AND (?1 IS NULL OR device_type = ?1)
                 ORDER BY best_time ASC, best_attempts ASC
                 LIMIT ?2"
            ),
            params![device, limit],
        )
    }

    pub(crate) fn user_scores(&self, username: &str) -> Result<Vec<RankingEntry>, String> {
        let conn = self.conn()?;
        Self::query_entries(
            &conn,
            &format!(
                "SELECT {RANKING_COLUMNS} FROM rankings
                 WHERE username = ?1 AND is_valid = 1
                 ORDER BY best_time ASC, best_attempts ASC"
            ),
            params![username],
        )
    }

    pub(crate) fn ranking_counts(&self) -> Result<RankingCounts, String> {
        let conn = self.conn()?;
        let total_entries = conn
            .query_row("SELECT COUNT(*) FROM rankings WHERE is_valid = 1", [], |row| {
                row.get::<_, i64>(0)
            })
            .map_err(|e| format!("ranking count failed: {e}"))? as u64;

        let mut by_device = BTreeMap::new();
        {
            let mut stmt = conn
                .prepare(
                    "SELECT device_type, COUNT(*), AVG(best_time) FROM rankings
                     WHERE is_valid = 1 GROUP BY device_type",
                )
                .map_err(|e| format!("ranking device stats prepare failed: {e}"))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                    ))
                })
                .map_err(|e| format!("ranking device stats query failed: {e}"))?;
            for row in rows {
                let (device, count, average) =
                    row.map_err(|e| format!("ranking device stats row failed: {e}"))?;
                by_device.insert(device_from_str(&device)?, (count as u64, average));
            }
        }

        let first = |order_by: &str| -> Result<Option<RankingEntry>, String> {
            let sql = format!(
                "SELECT {RANKING_COLUMNS} FROM rankings WHERE is_valid = 1
                 ORDER BY {order_by} LIMIT 1"
            );
            Ok(Self::query_entries(&conn, &sql, params![])?.into_iter().next())
        };

        Ok(RankingCounts {
            total_entries,
            by_device,
            best_overall_time: first("best_time ASC, best_attempts ASC")?,
            most_attempts: first("best_attempts DESC")?,
            highest_level: first("max_level DESC, best_time ASC")?,
        })
    }

    fn query_entries<P: rusqlite::Params>(
        conn: &Connection,
        sql: &str,
        params: P,
    ) -> Result<Vec<RankingEntry>, String> {
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| format!("ranking query prepare failed: {e}"))?;
        let rows = stmt
            .query_map(params, RawRankingRow::from_row)
            .map_err(|e| format!("ranking query failed: {e}"))?;

        let mut entries = Vec::new();
        for row in rows {
            let raw = row.map_err(|e| format!("ranking row decode failed: {e}"))?;
            entries.push(raw.into_entry()?);
        }
        Ok(entries)
    }
}
