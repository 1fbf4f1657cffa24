use super::{AnalysisRow, CaseBatch, CaseDetail, CaseRow, CaseStore, CountRow};
use crate::error::ChromoResult;
use chrono::{DateTime, FixedOffset};
use rusqlite::{params, OptionalExtension, Row};
use std::collections::BTreeSet;

impl CaseStore {
    // ── Reconciliation reads/writes ───────────────────────────────

    pub fn known_case_ids(&self) -> ChromoResult<BTreeSet<String>> {
        let mut stmt = self.conn.prepare("SELECT case_id FROM case_record")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(ids)
    }

    /// Write every case, analysis and count row of the batch in one
    /// transaction. Any failure rolls the whole batch back.
    pub fn insert_case_batch(&self, batch: &CaseBatch) -> ChromoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut case_stmt = tx.prepare(
                "INSERT INTO case_record (id, case_id, finished, create_time, update_time)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for c in &batch.cases {
                case_stmt.execute(params![
                    c.id,
                    c.case_id,
                    if c.finished { 1 } else { 0 },
                    c.create_time,
                    c.update_time,
                ])?;
            }

            let mut analysis_stmt = tx.prepare(
                "INSERT INTO analysis_record
                 (id, case_id, user_id, user_name, is_main, analysis, karyotype,
                  create_time, update_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for a in &batch.analyses {
                analysis_stmt.execute(params![
                    a.id,
                    a.case_id,
                    a.user_id,
                    a.user_name,
                    if a.is_main { 1 } else { 0 },
                    serde_json::to_string(&a.analysis)?,
                    a.karyotype,
                    a.create_time,
                    a.update_time,
                ])?;
            }

            let mut count_stmt = tx.prepare(
                "INSERT INTO count_record
                 (id, case_id, user_id, user_name, count, extra, remark,
                  create_time, update_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for c in &batch.counts {
                count_stmt.execute(params![
                    c.id,
                    c.case_id,
                    c.user_id,
                    c.user_name,
                    serde_json::to_string(&c.count)?,
                    serde_json::to_string(&c.extra)?,
                    c.remark,
                    c.create_time,
                    c.update_time,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ── Review-side queries ───────────────────────────────────────

    pub fn case_count(&self) -> ChromoResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM case_record", [], |row| row.get(0))?)
    }

    pub fn analysis_count(&self) -> ChromoResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM analysis_record", [], |row| row.get(0))?)
    }

    pub fn count_record_count(&self) -> ChromoResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM count_record", [], |row| row.get(0))?)
    }

    pub fn case_detail(&self, case_id: &str) -> ChromoResult<Option<CaseDetail>> {
        let case = self
            .conn
            .query_row(
                "SELECT id, case_id, finished, create_time, update_time
                 FROM case_record WHERE case_id = ?1",
                params![case_id],
                |row| {
                    Ok(CaseRow {
                        id: row.get(0)?,
                        case_id: row.get(1)?,
                        finished: row.get::<_, i32>(2)? != 0,
                        create_time: row.get(3)?,
                        update_time: row.get(4)?,
                    })
                },
            )
            .optional()?;
        let Some(case) = case else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT id, case_id, user_id, user_name, is_main, analysis, karyotype,
                    create_time, update_time
             FROM analysis_record WHERE case_id = ?1
             ORDER BY is_main DESC",
        )?;
        let raw = stmt
            .query_map(params![case_id], raw_analysis)?
            .collect::<Result<Vec<_>, _>>()?;
        let analyses = raw
            .into_iter()
            .map(|(mut row, json)| -> ChromoResult<AnalysisRow> {
                row.analysis = serde_json::from_str(&json)?;
                Ok(row)
            })
            .collect::<ChromoResult<Vec<AnalysisRow>>>()?;

        let count = self
            .conn
            .query_row(
                "SELECT id, case_id, user_id, user_name, count, extra, remark,
                        create_time, update_time
                 FROM count_record WHERE case_id = ?1",
                params![case_id],
                raw_count,
            )
            .optional()?
            .map(|(mut row, count_json, extra_json)| -> ChromoResult<CountRow> {
                row.count = serde_json::from_str(&count_json)?;
                row.extra = serde_json::from_str(&extra_json)?;
                Ok(row)
            })
            .transpose()?;

        Ok(Some(CaseDetail {
            case,
            analyses,
            count,
        }))
    }

    /// Unfinished cases where the user is the counter or one of the analysts.
    pub fn cases_for_user(&self, user_id: &str) -> ChromoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.case_id FROM case_record c
             WHERE c.finished = 0
               AND (EXISTS (SELECT 1 FROM analysis_record a
                            WHERE a.case_id = c.case_id AND a.user_id = ?1)
                 OR EXISTS (SELECT 1 FROM count_record n
                            WHERE n.case_id = c.case_id AND n.user_id = ?1))
             ORDER BY c.case_id ASC",
        )?;
        let ids = stmt
            .query_map(params![user_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Fill in an analyst's result. Returns false if the user holds no
    /// analysis record for the case.
    pub fn record_analysis(
        &self,
        case_id: &str,
        user_id: &str,
        analysis: &[String],
        karyotype: Option<&str>,
        now: DateTime<FixedOffset>,
    ) -> ChromoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE analysis_record SET analysis = ?1, karyotype = ?2, update_time = ?3
             WHERE case_id = ?4 AND user_id = ?5",
            params![
                serde_json::to_string(analysis)?,
                karyotype,
                now.to_rfc3339(),
                case_id,
                user_id,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Fill in the counter's result. Returns false if the user is not the
    /// case's counter.
    pub fn record_count(
        &self,
        case_id: &str,
        user_id: &str,
        count: &[String],
        extra: &[String],
        remark: Option<&str>,
        now: DateTime<FixedOffset>,
    ) -> ChromoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE count_record SET count = ?1, extra = ?2, remark = ?3, update_time = ?4
             WHERE case_id = ?5 AND user_id = ?6",
            params![
                serde_json::to_string(count)?,
                serde_json::to_string(extra)?,
                remark,
                now.to_rfc3339(),
                case_id,
                user_id,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Flip the terminal `finished` flag. Returns how many cases changed.
    pub fn mark_finished(&self, case_ids: &[String], now: DateTime<FixedOffset>) -> ChromoResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut changed = 0;
        {
            let mut stmt = tx.prepare(
                "UPDATE case_record SET finished = 1, update_time = ?1
                 WHERE case_id = ?2 AND finished = 0",
            )?;
            let ts = now.to_rfc3339();
            for id in case_ids {
                changed += stmt.execute(params![ts, id])?;
            }
        }
        tx.commit()?;
        Ok(changed)
    }
}

fn raw_analysis(row: &Row<'_>) -> rusqlite::Result<(AnalysisRow, String)> {
    Ok((
        AnalysisRow {
            id: row.get(0)?,
            case_id: row.get(1)?,
            user_id: row.get(2)?,
            user_name: row.get(3)?,
            is_main: row.get::<_, i32>(4)? != 0,
            analysis: Vec::new(),
            karyotype: row.get(6)?,
            create_time: row.get(7)?,
            update_time: row.get(8)?,
        },
        row.get(5)?,
    ))
}

fn raw_count(row: &Row<'_>) -> rusqlite::Result<(CountRow, String, String)> {
    Ok((
        CountRow {
            id: row.get(0)?,
            case_id: row.get(1)?,
            user_id: row.get(2)?,
            user_name: row.get(3)?,
            count: Vec::new(),
            extra: Vec::new(),
            remark: row.get(6)?,
            create_time: row.get(7)?,
            update_time: row.get(8)?,
        },
        row.get(4)?,
        row.get(5)?,
    ))
}
