use super::{parse_work_type, CaseStore, GroupRow, Roster, UserRow};
use crate::{
    error::{ChromoError, ChromoResult},
    quota::{Division, Group},
    types::CaseType,
};
use chrono::{DateTime, FixedOffset};
use rusqlite::{params, Connection};

impl CaseStore {
    // ── Users ─────────────────────────────────────────────────────

    pub fn insert_user(&self, user: &UserRow, now: DateTime<FixedOffset>) -> ChromoResult<()> {
        insert_user(&self.conn, user, now)
    }

    // ── Groups and divisions ──────────────────────────────────────

    pub fn insert_group(&self, group: &GroupRow) -> ChromoResult<()> {
        insert_group(&self.conn, group)
    }

    pub fn insert_division(&self, division: &Division) -> ChromoResult<()> {
        insert_division(&self.conn, division)
    }

    /// Change a division's quota. Returns false if the division is unknown.
    /// Takes effect on the next pass, since the quota table is rebuilt each time.
    pub fn set_division_quantities(&self, division_id: &str, quantities: u32) -> ChromoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE division SET quantities = ?1 WHERE id = ?2",
            params![i64::from(quantities), division_id],
        )?;
        Ok(changed > 0)
    }

    /// Remove one division. Returns false if it did not exist.
    pub fn delete_division(&self, division_id: &str) -> ChromoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM division WHERE id = ?1", params![division_id])?;
        Ok(changed > 0)
    }

    /// Remove a group together with its divisions. Returns false if the
    /// group did not exist.
    pub fn delete_group(&self, group_id: &str) -> ChromoResult<bool> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM division WHERE group_id = ?1", params![group_id])?;
        let changed = tx.execute("DELETE FROM work_group WHERE id = ?1", params![group_id])?;
        tx.commit()?;
        Ok(changed > 0)
    }

    /// Import a whole roster in one transaction.
    pub fn import_roster(&self, roster: &Roster, now: DateTime<FixedOffset>) -> ChromoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for user in &roster.users {
            insert_user(&tx, user, now)?;
        }
        for group in &roster.groups {
            insert_group(&tx, group)?;
        }
        for division in &roster.divisions {
            insert_division(&tx, division)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Every group that has at least one division, with its divisions
    /// joined to the user's real name. Divisions whose user no longer
    /// exists are left out. Order follows insertion order.
    pub fn groups_with_divisions(&self) -> ChromoResult<Vec<Group>> {
        let mut stmt = self.conn.prepare(
            "SELECT g.id, g.group_name, g.group_type,
                    d.id, d.user_id, u.realname, d.quantities, d.case_type
             FROM division d
             JOIN work_group g ON g.id = d.group_id
             JOIN app_user u ON u.id = d.user_id
             ORDER BY g.rowid ASC, d.rowid ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, String>(7)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut groups: Vec<Group> = Vec::new();
        for (group_id, group_name, group_type, div_id, user_id, user_name, qty, case_type) in rows {
            let quantities = u32::try_from(qty).map_err(|_| ChromoError::CorruptRow {
                table: "division",
                column: "quantities",
                value: qty.to_string(),
            })?;
            let case_type = case_type
                .chars()
                .next()
                .filter(|_| case_type.len() == 1)
                .and_then(CaseType::from_prefix)
                .ok_or_else(|| ChromoError::CorruptRow {
                    table: "division",
                    column: "case_type",
                    value: case_type.clone(),
                })?;
            let division = Division {
                id: div_id,
                group_id: group_id.clone(),
                user_id,
                user_name,
                quantities,
                case_type,
            };
            match groups.last_mut() {
                Some(g) if g.group_id == group_id => g.divisions.push(division),
                _ => groups.push(Group {
                    group_id,
                    group_name,
                    work_type: parse_work_type(group_type)?,
                    divisions: vec![division],
                }),
            }
        }
        Ok(groups)
    }
}

fn insert_user(conn: &Connection, user: &UserRow, now: DateTime<FixedOffset>) -> ChromoResult<()> {
    let ts = now.to_rfc3339();
    conn.execute(
        "INSERT INTO app_user (id, username, realname, is_admin, create_time, update_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.id,
            user.username,
            user.realname,
            if user.is_admin { 1 } else { 0 },
            ts,
            ts,
        ],
    )?;
    Ok(())
}

fn insert_group(conn: &Connection, group: &GroupRow) -> ChromoResult<()> {
    conn.execute(
        "INSERT INTO work_group (id, group_name, group_type) VALUES (?1, ?2, ?3)",
        params![group.id, group.group_name, group.group_type.as_str()],
    )?;
    Ok(())
}

fn insert_division(conn: &Connection, d: &Division) -> ChromoResult<()> {
    conn.execute(
        "INSERT INTO division (id, group_id, user_id, quantities, case_type)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            d.id,
            d.group_id,
            d.user_id,
            i64::from(d.quantities),
            d.case_type.as_str(),
        ],
    )?;
    Ok(())
}
