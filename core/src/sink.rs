//! Persistence boundary.
//!
//! RULE: The generators never talk to storage. The engine hands each
//! finished, homogeneous batch to an EntitySink, in dependency order,
//! then calls finalize() once.

use crate::{
    catalog::{
        Activity, Application, Campaign, Channel, Customer, Entity, MarketingSpend, Product,
        TargetPopulation, Visitor,
    },
    error::SimResult,
};

/// One entity type's complete output.
#[derive(Debug, Clone, Copy)]
pub enum EntityBatch<'a> {
    Products(&'a [Product]),
    Visitors(&'a [Visitor]),
    Customers(&'a [Customer]),
    Channels(&'a [Channel]),
    Campaigns(&'a [Campaign]),
    MarketingSpend(&'a [MarketingSpend]),
    TargetPopulation(&'a [TargetPopulation]),
    Activities(&'a [Activity]),
    Applications(&'a [Application]),
}

impl EntityBatch<'_> {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Products(_) => Product::TABLE,
            Self::Visitors(_) => Visitor::TABLE,
            Self::Customers(_) => Customer::TABLE,
            Self::Channels(_) => Channel::TABLE,
            Self::Campaigns(_) => Campaign::TABLE,
            Self::MarketingSpend(_) => MarketingSpend::TABLE,
            Self::TargetPopulation(_) => TargetPopulation::TABLE,
            Self::Activities(_) => Activity::TABLE,
            Self::Applications(_) => Application::TABLE,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Products(b) => b.len(),
            Self::Visitors(b) => b.len(),
            Self::Customers(b) => b.len(),
            Self::Channels(b) => b.len(),
            Self::Campaigns(b) => b.len(),
            Self::MarketingSpend(b) => b.len(),
            Self::TargetPopulation(b) => b.len(),
            Self::Activities(b) => b.len(),
            Self::Applications(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Durable destination for generated entities.
pub trait EntitySink {
    /// Store one batch durably. Returns the number of rows written.
    fn persist(&mut self, batch: EntityBatch<'_>) -> SimResult<usize>;

    /// End of run. Called once, after every batch persisted.
    fn finalize(&mut self) -> SimResult<()>;
}
