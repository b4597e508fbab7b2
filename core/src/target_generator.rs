//! Eligibility/target generator — one scored row per (campaign, visitor).
//!
//! Rows are emitted campaign-major, visitor-minor, in creation order.
//! Per row draw order: offer coin, response, conversion, customer value,
//! expected approval rate.

use crate::{
    catalog::TargetPopulation,
    config::GeneratorConfig,
    error::SimResult,
    ids::{self, IdSequence},
    reference_generator::ReferenceSet,
    rng::{round_to, SimRng},
};

/// Chance that a row carries a personalised offer.
pub const OFFER_PROBABILITY: f64 = 0.5;
pub const RESPONSE_PROB_RANGE: (f64, f64) = (0.0, 0.2);
pub const CONVERSION_PROB_RANGE: (f64, f64) = (0.0, 0.05);
pub const CUSTOMER_VALUE_RANGE: (f64, f64) = (100.0, 1000.0);
pub const APPROVAL_RATE_RANGE: (f64, f64) = (0.3, 0.7);

pub struct TargetGenerator<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> TargetGenerator<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn generate(
        &self,
        refs: &ReferenceSet,
        rng: &mut SimRng,
    ) -> SimResult<Vec<TargetPopulation>> {
        let mut offers = IdSequence::new(ids::OFFER_IDS);
        let mut rows = Vec::with_capacity(refs.campaigns.len() * refs.visitors.len());

        for campaign in &refs.campaigns {
            for visitor in &refs.visitors {
                // Every row consumes an offer id so ids stay stable per row.
                let offer_id = offers.next_id()?;
                let offer_id = rng.chance(OFFER_PROBABILITY).then_some(offer_id);
                rows.push(TargetPopulation {
                    campaign_id: campaign.campaign_id.clone(),
                    visitor_id: visitor.visitor_id.clone(),
                    offer_id,
                    resp_prob: self.draw(RESPONSE_PROB_RANGE, rng),
                    conv_prob: self.draw(CONVERSION_PROB_RANGE, rng),
                    cus_value: self.draw(CUSTOMER_VALUE_RANGE, rng),
                    eligibility_flag: true,
                    expected_approval_rate: self.draw(APPROVAL_RATE_RANGE, rng),
                    valid_from: Some(self.config.campaign_window_start),
                    valid_to: Some(self.config.campaign_window_end),
                });
            }
        }

        let with_offer = rows.iter().filter(|r| r.offer_id.is_some()).count();
        log::info!(
            "target: {} rows ({} campaigns × {} visitors), {with_offer} with offers",
            rows.len(),
            refs.campaigns.len(),
            refs.visitors.len()
        );
        Ok(rows)
    }

    fn draw(&self, (lo, hi): (f64, f64), rng: &mut SimRng) -> f64 {
        round_to(rng.uniform(lo, hi), self.config.decimal_precision)
    }
}
