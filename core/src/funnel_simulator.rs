//! Funnel simulator — clicks and application stories per target row.
//!
//! Per pairing:
//!   1. draw a click count in [0, MAX_CLICKS]
//!   2. each click lands 1..=5 days after the previous event
//!   3. after each click, with `submission_probability`, walk one story
//!      through the FunnelStage machine, one Application row per stage
//!   4. a converted story ends the pairing's clicks
//!
//! Every pairing starts its clock at `campaign_window_start`.

use crate::{
    catalog::{Activity, Application, ApplicationStatus, Campaign, TargetPopulation},
    config::GeneratorConfig,
    error::{SimError, SimResult},
    funnel::{FunnelStage, StageRoll},
    ids::{self, IdSequence},
    reference_generator::ReferenceSet,
    rng::SimRng,
    types::Timestamp,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const MAX_CLICKS: u64 = 5;
pub const CLICK_GAP_DAYS: (u64, u64) = (1, 5);
pub const STATUS_GAP_DAYS: (u64, u64) = (1, 3);

/// Outcome counts across all stories of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelTally {
    pub stories: usize,
    pub converted: usize,
    pub rejected: usize,
    pub cancelled: usize,
}

impl FunnelTally {
    fn record(&mut self, last: ApplicationStatus) {
        self.stories += 1;
        match last {
            ApplicationStatus::Converted => self.converted += 1,
            ApplicationStatus::Rejected => self.rejected += 1,
            ApplicationStatus::Cancelled => self.cancelled += 1,
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FunnelOutput {
    pub activities: Vec<Activity>,
    pub applications: Vec<Application>,
    pub tally: FunnelTally,
}

/// Ids a pairing writes onto its events.
struct Pairing<'r> {
    visitor_id: &'r str,
    campaign_id: &'r str,
    channel_id: &'r str,
}

pub struct FunnelSimulator<'a> {
    config: &'a GeneratorConfig,
    activity_ids: IdSequence,
    application_ids: IdSequence,
    story_ids: IdSequence,
    output: FunnelOutput,
}

impl<'a> FunnelSimulator<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self {
            config,
            activity_ids: IdSequence::new(ids::ACTIVITY_IDS),
            application_ids: IdSequence::new(ids::APPLICATION_IDS),
            story_ids: IdSequence::new(ids::STORY_IDS),
            output: FunnelOutput::default(),
        }
    }

    /// Simulate every target row in order.
    pub fn simulate(
        mut self,
        refs: &ReferenceSet,
        targets: &[TargetPopulation],
        rng: &mut SimRng,
    ) -> SimResult<FunnelOutput> {
        let campaigns: HashMap<&str, &Campaign> = refs
            .campaigns
            .iter()
            .map(|c| (c.campaign_id.as_str(), c))
            .collect();

        for target in targets {
            let campaign = campaigns.get(target.campaign_id.as_str()).ok_or_else(|| {
                SimError::DanglingReference {
                    entity: "target_population",
                    key: target.to_string(),
                    target: "campaign",
                }
            })?;
            let pairing = Pairing {
                visitor_id: &target.visitor_id,
                campaign_id: &campaign.campaign_id,
                channel_id: &campaign.channel_id,
            };
            let clicks = rng.range_inclusive(0, MAX_CLICKS);
            self.run_clicks(&pairing, clicks, rng)?;
        }

        let out = self.output;
        log::info!(
            "funnel: {} activities, {} application rows, {} stories ({} converted, {} rejected, {} cancelled)",
            out.activities.len(),
            out.applications.len(),
            out.tally.stories,
            out.tally.converted,
            out.tally.rejected,
            out.tally.cancelled
        );
        Ok(out)
    }

    fn run_clicks(&mut self, pairing: &Pairing<'_>, clicks: u64, rng: &mut SimRng) -> SimResult<()> {
        let mut last_dt = self.config.campaign_window_start;
        for _ in 0..clicks {
            last_dt = after(last_dt, rng, CLICK_GAP_DAYS);
            self.output.activities.push(Activity {
                activity_id: self.activity_ids.next_id()?,
                visitor_id: pairing.visitor_id.to_string(),
                clicked_dt: last_dt,
                clicked_campaign: pairing.campaign_id.to_string(),
                clicked_channel: pairing.channel_id.to_string(),
            });

            if !rng.chance(self.config.submission_probability) {
                continue;
            }
            let last = self.run_story(pairing, &mut last_dt, rng)?;
            if last == ApplicationStatus::Converted {
                break;
            }
        }
        Ok(())
    }

    /// Walk one story, emitting a row per stage reached.
    /// Returns the final status.
    fn run_story(
        &mut self,
        pairing: &Pairing<'_>,
        last_dt: &mut Timestamp,
        rng: &mut SimRng,
    ) -> SimResult<ApplicationStatus> {
        let story_id = self.story_ids.next_id()?;
        let mut stage = Some(FunnelStage::FIRST);
        let mut last = ApplicationStatus::Applied;

        while let Some(current) = stage {
            let roll = StageRoll {
                approved: current.needs_decision_roll()
                    && rng.chance(self.config.approve_reject_probability),
                cancelled: current.can_cancel() && rng.chance(self.config.cancel_probability),
            };
            let status = current.resolve(roll);
            *last_dt = after(*last_dt, rng, STATUS_GAP_DAYS);
            self.output.applications.push(Application {
                application_id: self.application_ids.next_id()?,
                status_dt: *last_dt,
                status,
                story_id: story_id.clone(),
                visitor_id: pairing.visitor_id.to_string(),
                campaign_id: pairing.campaign_id.to_string(),
                channel_id: pairing.channel_id.to_string(),
                conversion_flag: status == ApplicationStatus::Converted,
            });
            last = status;
            stage = current.advance(status);
        }

        log::debug!(
            "funnel: story {story_id} for visitor {} on {} ended {last}",
            pairing.visitor_id,
            pairing.campaign_id
        );
        self.output.tally.record(last);
        Ok(last)
    }
}

/// Strictly later timestamp: `from` plus a whole number of days in `gap`.
fn after(from: Timestamp, rng: &mut SimRng, (lo, hi): (u64, u64)) -> Timestamp {
    from + Duration::days(rng.range_inclusive(lo, hi) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funnel::is_legal_story;

    fn pairing() -> Pairing<'static> {
        Pairing {
            visitor_id: "V00000000",
            campaign_id: "CA00000",
            channel_id: "CH000",
        }
    }

    #[test]
    fn zero_clicks_produce_nothing() {
        let config = GeneratorConfig::default();
        let mut sim = FunnelSimulator::new(&config);
        sim.run_clicks(&pairing(), 0, &mut SimRng::new(1)).unwrap();
        assert!(sim.output.activities.is_empty());
        assert!(sim.output.applications.is_empty());
        assert_eq!(sim.output.tally, FunnelTally::default());
    }

    #[test]
    fn no_submissions_means_clicks_only() {
        let config = GeneratorConfig {
            submission_probability: 0.0,
            ..GeneratorConfig::default()
        };
        let mut sim = FunnelSimulator::new(&config);
        sim.run_clicks(&pairing(), 5, &mut SimRng::new(1)).unwrap();
        assert_eq!(sim.output.activities.len(), 5);
        assert!(sim.output.applications.is_empty());
    }

    #[test]
    fn certain_cancel_yields_applied_then_cancelled() {
        let config = GeneratorConfig {
            submission_probability: 1.0,
            cancel_probability: 1.0,
            ..GeneratorConfig::default()
        };
        let mut sim = FunnelSimulator::new(&config);
        let mut last_dt = config.campaign_window_start;
        let last = sim
            .run_story(&pairing(), &mut last_dt, &mut SimRng::new(9))
            .unwrap();
        assert_eq!(last, ApplicationStatus::Cancelled);
        let statuses: Vec<_> = sim.output.applications.iter().map(|a| a.status).collect();
        assert_eq!(statuses, vec![ApplicationStatus::Applied, ApplicationStatus::Cancelled]);
        assert_eq!(sim.output.tally.cancelled, 1);
    }

    #[test]
    fn conversion_stops_the_click_loop() {
        let config = GeneratorConfig {
            submission_probability: 1.0,
            cancel_probability: 0.0,
            approve_reject_probability: 1.0,
            ..GeneratorConfig::default()
        };
        let mut sim = FunnelSimulator::new(&config);
        sim.run_clicks(&pairing(), 5, &mut SimRng::new(2)).unwrap();
        assert_eq!(sim.output.activities.len(), 1, "clicks after conversion must not happen");
        assert_eq!(sim.output.applications.len(), 6);
        let last = sim.output.applications.last().unwrap();
        assert_eq!(last.status, ApplicationStatus::Converted);
        assert!(last.conversion_flag);
        assert_eq!(
            sim.output.applications.iter().filter(|a| a.conversion_flag).count(),
            1
        );
    }

    #[test]
    fn events_are_strictly_increasing_within_a_pairing() {
        // Every click spawns an applied → cancelled story, so creation
        // order is click, app, app, click, app, app, ...
        let config = GeneratorConfig {
            submission_probability: 1.0,
            cancel_probability: 1.0,
            ..GeneratorConfig::default()
        };
        let mut sim = FunnelSimulator::new(&config);
        sim.run_clicks(&pairing(), 5, &mut SimRng::new(11)).unwrap();
        assert_eq!(sim.output.activities.len(), 5);
        assert_eq!(sim.output.applications.len(), 10);

        let mut stamps: Vec<Timestamp> = vec![config.campaign_window_start];
        for (i, click) in sim.output.activities.iter().enumerate() {
            stamps.push(click.clicked_dt);
            stamps.push(sim.output.applications[2 * i].status_dt);
            stamps.push(sim.output.applications[2 * i + 1].status_dt);
        }
        assert!(
            stamps.windows(2).all(|w| w[0] < w[1]),
            "timestamps not increasing: {stamps:?}"
        );
    }

    #[test]
    fn every_story_is_legal() {
        let config = GeneratorConfig {
            submission_probability: 1.0,
            cancel_probability: 0.2,
            ..GeneratorConfig::default()
        };
        let mut sim = FunnelSimulator::new(&config);
        let mut rng = SimRng::new(4);
        for _ in 0..50 {
            sim.run_clicks(&pairing(), 5, &mut rng).unwrap();
        }
        let mut stories: HashMap<&str, Vec<ApplicationStatus>> = HashMap::new();
        for app in &sim.output.applications {
            stories.entry(app.story_id.as_str()).or_default().push(app.status);
        }
        assert_eq!(stories.len(), sim.output.tally.stories);
        for (id, statuses) in stories {
            assert!(is_legal_story(&statuses), "story {id} is illegal: {statuses:?}");
        }
    }
}
