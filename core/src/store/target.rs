use super::{to_sql_dt, SimStore};
use crate::{catalog::TargetPopulation, error::SimResult};
use rusqlite::{params, Connection};

pub(super) fn insert_target_population(
    conn: &Connection,
    rows: &[TargetPopulation],
) -> SimResult<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO target_population (
            campaign_id, visitor_id, offer_id, resp_prob, conv_prob, cus_value,
            eligibility_flag, expected_approval_rate, valid_from, valid_to
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;
    for t in rows {
        stmt.execute(params![
            &t.campaign_id,
            &t.visitor_id,
            &t.offer_id,
            t.resp_prob,
            t.conv_prob,
            t.cus_value,
            if t.eligibility_flag { 1i64 } else { 0i64 },
            t.expected_approval_rate,
            t.valid_from.as_ref().map(to_sql_dt),
            t.valid_to.as_ref().map(to_sql_dt),
        ])?;
    }
    Ok(rows.len())
}

impl SimStore {
    /// Rows per campaign, keyed by campaign_id.
    pub fn target_counts_by_campaign(&self) -> SimResult<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT campaign_id, COUNT(*) FROM target_population
             GROUP BY campaign_id ORDER BY campaign_id",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Rows with no personalised offer.
    pub fn target_rows_without_offer(&self) -> SimResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM target_population WHERE offer_id IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
