//! The generation engine.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Reference generator   products, visitors, customers, channels,
//!                            campaigns, marketing spend
//!   2. Target generator      campaign × visitor
//!   3. Funnel simulator      one pass over the target rows
//!   4. Persistence           one batch per entity type, then finalize
//!
//! RULES:
//!   - One SimRng, seeded once, threaded through stages 1–3 in order.
//!   - A stage only reads the output of earlier stages.
//!   - Any error aborts the run. Batches already persisted stay persisted.

use crate::{
    catalog::{
        Activity, Application, Campaign, Channel, Customer, MarketingSpend, Product,
        TargetPopulation, Visitor,
    },
    config::GeneratorConfig,
    error::{SimError, SimResult},
    funnel_simulator::{FunnelSimulator, FunnelTally},
    reference_generator::ReferenceGenerator,
    rng::SimRng,
    sink::{EntityBatch, EntitySink},
    target_generator::TargetGenerator,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Everything one run generates, each list in creation order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub products: Vec<Product>,
    pub visitors: Vec<Visitor>,
    pub customers: Vec<Customer>,
    pub channels: Vec<Channel>,
    pub campaigns: Vec<Campaign>,
    pub marketing_spend: Vec<MarketingSpend>,
    pub target_population: Vec<TargetPopulation>,
    pub activities: Vec<Activity>,
    pub applications: Vec<Application>,
    #[serde(skip)]
    pub tally: FunnelTally,
}

fn require(
    set: &HashSet<&str>,
    id: &str,
    entity: &'static str,
    key: &dyn fmt::Display,
    target: &'static str,
) -> SimResult<()> {
    if set.contains(id) {
        Ok(())
    } else {
        Err(SimError::DanglingReference {
            entity,
            key: key.to_string(),
            target,
        })
    }
}

impl Dataset {
    /// Batches in persistence order. Referenced entities come first.
    pub fn batches(&self) -> [EntityBatch<'_>; 9] {
        [
            EntityBatch::Products(&self.products),
            EntityBatch::Visitors(&self.visitors),
            EntityBatch::Customers(&self.customers),
            EntityBatch::Channels(&self.channels),
            EntityBatch::Campaigns(&self.campaigns),
            EntityBatch::MarketingSpend(&self.marketing_spend),
            EntityBatch::TargetPopulation(&self.target_population),
            EntityBatch::Activities(&self.activities),
            EntityBatch::Applications(&self.applications),
        ]
    }

    /// Verify every foreign key resolves within this dataset.
    pub fn check_references(&self) -> SimResult<()> {
        let products: HashSet<&str> = self.products.iter().map(|p| p.product_id.as_str()).collect();
        let visitors: HashSet<&str> = self.visitors.iter().map(|v| v.visitor_id.as_str()).collect();
        let customers: HashSet<&str> =
            self.customers.iter().map(|c| c.customer_id.as_str()).collect();
        let channels: HashSet<&str> = self.channels.iter().map(|c| c.channel_id.as_str()).collect();
        let campaigns: HashSet<&str> =
            self.campaigns.iter().map(|c| c.campaign_id.as_str()).collect();

        for v in &self.visitors {
            if let Some(customer_id) = &v.customer_id {
                require(&customers, customer_id, "visitor", v, "customer")?;
            }
        }
        for c in &self.campaigns {
            require(&products, &c.product_id, "campaign", c, "product")?;
            require(&channels, &c.channel_id, "campaign", c, "channel")?;
        }
        for s in &self.marketing_spend {
            require(&campaigns, &s.campaign_id, "marketing_spend", s, "campaign")?;
        }
        for t in &self.target_population {
            require(&campaigns, &t.campaign_id, "target_population", t, "campaign")?;
            require(&visitors, &t.visitor_id, "target_population", t, "visitor")?;
        }
        for a in &self.activities {
            require(&visitors, &a.visitor_id, "activity", a, "visitor")?;
            require(&campaigns, &a.clicked_campaign, "activity", a, "campaign")?;
            require(&channels, &a.clicked_channel, "activity", a, "channel")?;
        }
        for a in &self.applications {
            require(&visitors, &a.visitor_id, "application", a, "visitor")?;
            require(&campaigns, &a.campaign_id, "application", a, "campaign")?;
            require(&channels, &a.channel_id, "application", a, "channel")?;
        }
        Ok(())
    }
}

/// Row counts per table plus funnel outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: u64,
    pub rows: Vec<(String, usize)>,
    pub funnel: FunnelTally,
}

impl RunSummary {
    pub fn rows_for(&self, table: &str) -> Option<usize> {
        self.rows.iter().find(|(t, _)| t == table).map(|(_, n)| *n)
    }

    pub fn total_rows(&self) -> usize {
        self.rows.iter().map(|(_, n)| n).sum()
    }
}

pub struct SimEngine {
    config: GeneratorConfig,
}

impl SimEngine {
    /// Validates the config up front; nothing runs on a bad config.
    pub fn new(config: GeneratorConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Run stages 1–3 in memory.
    pub fn generate(&self) -> SimResult<Dataset> {
        let seed = self.config.random_seed;
        let mut rng = SimRng::new(seed).with_name("generator");
        log::info!("engine: {} stream seeded with {seed}", rng.name);

        let refs = ReferenceGenerator::new(&self.config).generate(&mut rng)?;
        let target_population = TargetGenerator::new(&self.config).generate(&refs, &mut rng)?;
        let funnel = FunnelSimulator::new(&self.config).simulate(&refs, &target_population, &mut rng)?;

        Ok(Dataset {
            products: refs.products,
            visitors: refs.visitors,
            customers: refs.customers,
            channels: refs.channels,
            campaigns: refs.campaigns,
            marketing_spend: refs.marketing_spend,
            target_population,
            activities: funnel.activities,
            applications: funnel.applications,
            tally: funnel.tally,
        })
    }

    /// Stage 4: hand each batch to `sink`, then finalize it.
    /// Dangling references abort before anything is written.
    /// A failing batch aborts; earlier batches are not rolled back.
    pub fn persist(&self, dataset: &Dataset, sink: &mut dyn EntitySink) -> SimResult<RunSummary> {
        dataset.check_references()?;
        let mut rows = Vec::with_capacity(9);
        for batch in dataset.batches() {
            let table = batch.table();
            log::debug!("engine: persisting {} rows to {table}", batch.len());
            let written = sink.persist(batch).map_err(|e| {
                log::error!("engine: persisting {table} failed: {e}");
                e
            })?;
            rows.push((table.to_string(), written));
        }
        sink.finalize()?;

        Ok(RunSummary {
            seed: self.config.random_seed,
            rows,
            funnel: dataset.tally.clone(),
        })
    }

    /// Generate and persist in one call.
    pub fn run(&self, sink: &mut dyn EntitySink) -> SimResult<RunSummary> {
        let dataset = self.generate()?;
        let summary = self.persist(&dataset, sink)?;
        log::info!(
            "engine: run complete, {} rows across {} tables",
            summary.total_rows(),
            summary.rows.len()
        );
        Ok(summary)
    }
}
