//! Reference generator — the base population every later stage points at.
//!
//! Draw order (fixed):
//!   1. products      (lower rate, upper rate per product)
//!   2. visitors      (no draws)
//!   3. customers     (card-member coin per customer)
//!   4. linkage       (one visitor index per customer)
//!   5. channels      (no draws)
//!   6. campaigns     (product-major, channel-minor; no draws)
//!   7. marketing spend (campaign spend, channel spend per campaign)

use crate::{
    catalog::{Campaign, Channel, Customer, MarketingSpend, Product, Visitor},
    config::GeneratorConfig,
    error::SimResult,
    ids::{self, IdSequence},
    rng::{round_to, SimRng},
};

/// Headline rate lower bound, whole percent, both ends included.
pub const HEADLINE_RATE_LB_RANGE: (u64, u64) = (10, 15);
/// Headline rate upper bound, whole percent, both ends included.
pub const HEADLINE_RATE_UB_RANGE: (u64, u64) = (16, 24);
pub const CARD_MEMBER_PROBABILITY: f64 = 0.5;
pub const SPEND_RANGE: (f64, f64) = (10.0, 100.0);

/// Base entities for one run, each in creation order.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    pub products: Vec<Product>,
    pub visitors: Vec<Visitor>,
    pub customers: Vec<Customer>,
    pub channels: Vec<Channel>,
    pub campaigns: Vec<Campaign>,
    pub marketing_spend: Vec<MarketingSpend>,
}

pub struct ReferenceGenerator<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> ReferenceGenerator<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn generate(&self, rng: &mut SimRng) -> SimResult<ReferenceSet> {
        let products = self.generate_products(rng)?;
        let mut visitors = self.generate_visitors()?;
        let customers = self.generate_customers(rng)?;
        link_customers(&mut visitors, &customers, rng);
        let channels = self.generate_channels()?;
        let campaigns = generate_campaigns(&products, &channels)?;
        let marketing_spend = self.generate_spend(&campaigns, rng);

        log::info!(
            "reference: {} products, {} visitors, {} customers, {} channels, {} campaigns",
            products.len(),
            visitors.len(),
            customers.len(),
            channels.len(),
            campaigns.len()
        );

        Ok(ReferenceSet {
            products,
            visitors,
            customers,
            channels,
            campaigns,
            marketing_spend,
        })
    }

    fn generate_products(&self, rng: &mut SimRng) -> SimResult<Vec<Product>> {
        let mut ids = IdSequence::new(ids::PRODUCT_IDS);
        let mut products = Vec::with_capacity(self.config.product_count);
        for i in 0..self.config.product_count {
            let (lb_lo, lb_hi) = HEADLINE_RATE_LB_RANGE;
            let (ub_lo, ub_hi) = HEADLINE_RATE_UB_RANGE;
            products.push(Product {
                product_id: ids.next_id()?,
                product_name: format!("DPL{}", i + 1),
                headline_rate_lb: rng.range_inclusive(lb_lo, lb_hi) as f64,
                headline_rate_ub: rng.range_inclusive(ub_lo, ub_hi) as f64,
            });
        }
        Ok(products)
    }

    fn generate_visitors(&self) -> SimResult<Vec<Visitor>> {
        let mut ids = IdSequence::new(ids::VISITOR_IDS);
        (0..self.config.visitor_count)
            .map(|_| {
                Ok(Visitor {
                    visitor_id: ids.next_id()?,
                    customer_id: None,
                })
            })
            .collect()
    }

    fn generate_customers(&self, rng: &mut SimRng) -> SimResult<Vec<Customer>> {
        let mut ids = IdSequence::new(ids::CUSTOMER_IDS);
        (0..self.config.customer_count)
            .map(|_| {
                let customer_id = ids.next_id()?;
                Ok(Customer::new(customer_id, rng.chance(CARD_MEMBER_PROBABILITY)))
            })
            .collect()
    }

    fn generate_channels(&self) -> SimResult<Vec<Channel>> {
        let mut ids = IdSequence::new(ids::CHANNEL_IDS);
        self.config
            .channel_list
            .iter()
            .map(|name| {
                Ok(Channel {
                    channel_id: ids.next_id()?,
                    channel_name: name.clone(),
                })
            })
            .collect()
    }

    /// One spend row per campaign covering the whole campaign window.
    fn generate_spend(&self, campaigns: &[Campaign], rng: &mut SimRng) -> Vec<MarketingSpend> {
        let precision = self.config.decimal_precision;
        let (lo, hi) = SPEND_RANGE;
        campaigns
            .iter()
            .map(|c| {
                let campaign_spend = round_to(rng.uniform(lo, hi), precision);
                let channel_spend = round_to(rng.uniform(lo, hi), precision);
                MarketingSpend {
                    campaign_id: c.campaign_id.clone(),
                    start_dt: self.config.campaign_window_start,
                    end_dt: self.config.campaign_window_end,
                    channel_spend,
                    campaign_spend,
                }
            })
            .collect()
    }
}

/// Sample one visitor per customer, with replacement.
/// A visitor drawn twice keeps the later customer.
fn link_customers(visitors: &mut [Visitor], customers: &[Customer], rng: &mut SimRng) {
    if visitors.is_empty() {
        return;
    }
    for customer in customers {
        let idx = rng.next_u64_below(visitors.len() as u64) as usize;
        let visitor = &mut visitors[idx];
        if let Some(previous) = visitor.customer_id.replace(customer.customer_id.clone()) {
            log::warn!(
                "reference: {visitor} relinked from customer {previous} to {}",
                customer.customer_id
            );
        }
    }
}

/// Cross product of products × channels, product-major.
fn generate_campaigns(products: &[Product], channels: &[Channel]) -> SimResult<Vec<Campaign>> {
    let mut ids = IdSequence::new(ids::CAMPAIGN_IDS);
    let mut campaigns = Vec::with_capacity(products.len() * channels.len());
    for product in products {
        for channel in channels {
            campaigns.push(Campaign {
                campaign_id: ids.next_id()?,
                campaign_name: format!("{}_{}", product.product_name, channel.channel_name),
                channel_id: channel.channel_id.clone(),
                product_id: product.product_id.clone(),
            });
        }
    }
    Ok(campaigns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn campaign_ids_are_unique_across_products() {
        let config = GeneratorConfig::default();
        let refs = ReferenceGenerator::new(&config)
            .generate(&mut SimRng::new(0))
            .unwrap();
        let ids: HashSet<_> = refs.campaigns.iter().map(|c| &c.campaign_id).collect();
        assert_eq!(ids.len(), 9);
        assert_eq!(refs.campaigns[0].campaign_id, "CA00000");
        assert_eq!(refs.campaigns[8].campaign_id, "CA00008");
        assert_eq!(refs.campaigns[4].campaign_name, "DPL2_web");
    }

    #[test]
    fn linkage_collision_keeps_last_customer() {
        let mut visitors = vec![Visitor {
            visitor_id: "V00000000".into(),
            customer_id: None,
        }];
        let customers = vec![
            Customer::new("C00000000".into(), true),
            Customer::new("C00000001".into(), false),
        ];
        link_customers(&mut visitors, &customers, &mut SimRng::new(1));
        assert_eq!(visitors[0].customer_id.as_deref(), Some("C00000001"));
    }

    #[test]
    fn headline_rates_are_ordered() {
        let config = GeneratorConfig {
            product_count: 25,
            ..GeneratorConfig::default()
        };
        let refs = ReferenceGenerator::new(&config)
            .generate(&mut SimRng::new(5))
            .unwrap();
        for p in &refs.products {
            assert!(p.headline_rate_lb < p.headline_rate_ub, "{p} has inverted rates");
            assert!((10.0..=15.0).contains(&p.headline_rate_lb));
            assert!((16.0..=24.0).contains(&p.headline_rate_ub));
        }
    }
}
