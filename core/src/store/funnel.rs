use super::{from_sql_dt, to_sql_dt, SimStore};
use crate::{
    catalog::{Activity, Application, ApplicationStatus},
    error::SimResult,
};
use rusqlite::{params, Connection};

pub(super) fn insert_activities(conn: &Connection, rows: &[Activity]) -> SimResult<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO activities (
            activity_id, visitor_id, clicked_dt, clicked_campaign, clicked_channel
        ) VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for a in rows {
        stmt.execute(params![
            &a.activity_id,
            &a.visitor_id,
            to_sql_dt(&a.clicked_dt),
            &a.clicked_campaign,
            &a.clicked_channel,
        ])?;
    }
    Ok(rows.len())
}

pub(super) fn insert_applications(conn: &Connection, rows: &[Application]) -> SimResult<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO applications (
            application_id, status_dt, status, story_id, visitor_id,
            campaign_id, channel_id, conversion_flag
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for a in rows {
        stmt.execute(params![
            &a.application_id,
            to_sql_dt(&a.status_dt),
            a.status.as_str(),
            &a.story_id,
            &a.visitor_id,
            &a.campaign_id,
            &a.channel_id,
            if a.conversion_flag { 1i64 } else { 0i64 },
        ])?;
    }
    Ok(rows.len())
}

fn parse_status(idx: usize, raw: &str) -> rusqlite::Result<ApplicationStatus> {
    ApplicationStatus::parse(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unknown application status '{raw}'").into(),
        )
    })
}

impl SimStore {
    /// Status rows of one story, oldest first.
    pub fn story_statuses(&self, story_id: &str) -> SimResult<Vec<ApplicationStatus>> {
        let mut stmt = self.conn.prepare(
            "SELECT status FROM applications WHERE story_id = ?1 ORDER BY status_dt ASC",
        )?;
        let rows = stmt.query_map(params![story_id], |row| {
            parse_status(0, &row.get::<_, String>(0)?)
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn story_ids(&self) -> SimResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT story_id FROM applications ORDER BY story_id")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn activities_for_visitor(&self, visitor_id: &str) -> SimResult<Vec<Activity>> {
        let mut stmt = self.conn.prepare(
            "SELECT activity_id, visitor_id, clicked_dt, clicked_campaign, clicked_channel
             FROM activities WHERE visitor_id = ?1 ORDER BY activity_id",
        )?;
        let rows = stmt.query_map(params![visitor_id], |row| {
            Ok(Activity {
                activity_id: row.get(0)?,
                visitor_id: row.get(1)?,
                clicked_dt: from_sql_dt(2, &row.get::<_, String>(2)?)?,
                clicked_campaign: row.get(3)?,
                clicked_channel: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn converted_count(&self) -> SimResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM applications WHERE conversion_flag = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
