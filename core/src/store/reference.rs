use super::{from_sql_dt, to_sql_dt, SimStore};
use crate::{
    catalog::{Campaign, Channel, Customer, MarketingSpend, Product, Visitor},
    error::SimResult,
};
use rusqlite::{params, Connection};

// ── Inserts ────────────────────────────────────────────────────────

pub(super) fn insert_products(conn: &Connection, rows: &[Product]) -> SimResult<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO products (product_id, product_name, headline_rate_lb, headline_rate_ub)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for p in rows {
        stmt.execute(params![
            &p.product_id,
            &p.product_name,
            p.headline_rate_lb,
            p.headline_rate_ub
        ])?;
    }
    Ok(rows.len())
}

pub(super) fn insert_visitors(conn: &Connection, rows: &[Visitor]) -> SimResult<usize> {
    let mut stmt =
        conn.prepare_cached("INSERT INTO visitors (visitor_id, customer_id) VALUES (?1, ?2)")?;
    for v in rows {
        stmt.execute(params![&v.visitor_id, &v.customer_id])?;
    }
    Ok(rows.len())
}

pub(super) fn insert_customers(conn: &Connection, rows: &[Customer]) -> SimResult<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO customers (customer_id, card_member_ind, dpl_ind) VALUES (?1, ?2, ?3)",
    )?;
    for c in rows {
        stmt.execute(params![
            &c.customer_id,
            if c.card_member_ind { 1i64 } else { 0i64 },
            if c.dpl_ind { 1i64 } else { 0i64 },
        ])?;
    }
    Ok(rows.len())
}

pub(super) fn insert_channels(conn: &Connection, rows: &[Channel]) -> SimResult<usize> {
    let mut stmt =
        conn.prepare_cached("INSERT INTO channels (channel_id, channel_name) VALUES (?1, ?2)")?;
    for c in rows {
        stmt.execute(params![&c.channel_id, &c.channel_name])?;
    }
    Ok(rows.len())
}

pub(super) fn insert_campaigns(conn: &Connection, rows: &[Campaign]) -> SimResult<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO campaigns (campaign_id, campaign_name, channel_id, product_id)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for c in rows {
        stmt.execute(params![
            &c.campaign_id,
            &c.campaign_name,
            &c.channel_id,
            &c.product_id
        ])?;
    }
    Ok(rows.len())
}

pub(super) fn insert_marketing_spend(conn: &Connection, rows: &[MarketingSpend]) -> SimResult<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO marketing_spend (campaign_id, start_dt, end_dt, channel_spend, campaign_spend)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for s in rows {
        stmt.execute(params![
            &s.campaign_id,
            to_sql_dt(&s.start_dt),
            to_sql_dt(&s.end_dt),
            s.channel_spend,
            s.campaign_spend,
        ])?;
    }
    Ok(rows.len())
}

// ── Queries ────────────────────────────────────────────────────────

impl SimStore {
    pub fn visitors(&self) -> SimResult<Vec<Visitor>> {
        let mut stmt = self
            .conn
            .prepare("SELECT visitor_id, customer_id FROM visitors ORDER BY visitor_id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Visitor {
                visitor_id: row.get(0)?,
                customer_id: row.get(1)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn customers(&self) -> SimResult<Vec<Customer>> {
        let mut stmt = self.conn.prepare(
            "SELECT customer_id, card_member_ind, dpl_ind FROM customers ORDER BY customer_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Customer {
                customer_id: row.get(0)?,
                card_member_ind: row.get::<_, i64>(1)? != 0,
                dpl_ind: row.get::<_, i64>(2)? != 0,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn campaigns(&self) -> SimResult<Vec<Campaign>> {
        let mut stmt = self.conn.prepare(
            "SELECT campaign_id, campaign_name, channel_id, product_id
             FROM campaigns ORDER BY campaign_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Campaign {
                campaign_id: row.get(0)?,
                campaign_name: row.get(1)?,
                channel_id: row.get(2)?,
                product_id: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn marketing_spend(&self) -> SimResult<Vec<MarketingSpend>> {
        let mut stmt = self.conn.prepare(
            "SELECT campaign_id, start_dt, end_dt, channel_spend, campaign_spend
             FROM marketing_spend ORDER BY campaign_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(MarketingSpend {
                campaign_id: row.get(0)?,
                start_dt: from_sql_dt(1, &row.get::<_, String>(1)?)?,
                end_dt: from_sql_dt(2, &row.get::<_, String>(2)?)?,
                channel_spend: row.get(3)?,
                campaign_spend: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
