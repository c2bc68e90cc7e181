// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Ad selection engine.
//!
//! The [`AdEngine`] is the central component that owns the line item store
//! and runs auctions against it.
//!
//! # Auction Pipeline
//!
//! 1. **Eligibility**: active line items for the placement, narrowed by the
//!    optional category and keyword.
//! 2. **Ranking**: candidates ordered by relevance-weighted bid.
//! 3. **Settlement**: candidates walked in rank order, each winner paying its
//!    bid through a compare-and-swap on its budget, until the limit is met.
//!
//! # Thread Safety
//!
//! The engine is `Sync` and meant to be shared behind an [`Arc`](std::sync::Arc).
//! Concurrent auctions never overspend a budget: at most one of them can
//! settle against a given line item snapshot, the others skip it.

use crate::base::LineItemId;
use crate::config::EngineConfig;
use crate::eligibility::find_matching;
use crate::error::AdError;
use crate::line_item::{Ad, LineItem, LineItemCreate, LineItemStatus};
use crate::query::AdQuery;
use crate::ranking::rank;
use crate::settlement::{Settlement, settle};
use crate::store::{LineItemStore, ListFilter, MemoryStore};
use crate::tracking::{TrackingEvent, TrackingLog};
use crate::validation::Validator;
use chrono::Utc;
use tracing::info;

/// Auction engine over a line item store.
///
/// # Invariants
///
/// - A line item never wins while its remaining budget is below its bid.
/// - Budgets only change through [`LineItemStore::update_budget`].
/// - An auction returns at most `query.limit` ads, in rank order.
pub struct AdEngine<S = MemoryStore> {
    store: S,
    tracking: TrackingLog,
    config: EngineConfig,
    validator: Validator,
}

impl AdEngine<MemoryStore> {
    /// Creates an engine with an empty in-memory store and default config.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_store(MemoryStore::new(), config)
    }
}

impl Default for AdEngine<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: LineItemStore> AdEngine<S> {
    pub fn with_store(store: S, config: EngineConfig) -> Self {
        AdEngine {
            store,
            tracking: TrackingLog::new(),
            validator: Validator::new(config.limits),
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn tracking(&self) -> &TrackingLog {
        &self.tracking
    }

    /// Validates and stores a new `active` line item.
    ///
    /// # Errors
    ///
    /// - [`AdError::Validation`] - Missing names or placement, non-positive bid, negative budget.
    /// - [`AdError::DuplicateId`] - Generated ID collided with an existing one.
    pub fn create_line_item(&self, create: LineItemCreate) -> Result<LineItem, AdError> {
        self.validator.validate_line_item(&create)?;

        let line_item = LineItem::new(LineItemId::generate(), create, Utc::now());
        self.store.create(line_item.clone())?;

        info!(
            id = %line_item.id(),
            name = line_item.name(),
            advertiser_id = %line_item.advertiser_id(),
            placement = line_item.placement(),
            "line item created"
        );
        Ok(line_item)
    }

    pub fn get_line_item(&self, id: &LineItemId) -> Result<LineItem, AdError> {
        self.store.get_by_id(id)
    }

    pub fn list_line_items(&self, filter: &ListFilter) -> Result<Vec<LineItem>, AdError> {
        self.store.list(filter)
    }

    /// Moves a line item into or out of auction eligibility.
    pub fn set_line_item_status(
        &self,
        id: &LineItemId,
        status: LineItemStatus,
    ) -> Result<LineItem, AdError> {
        let line_item = self.store.set_status(id, status)?;
        info!(id = %id, status = status.as_str(), "line item status changed");
        Ok(line_item)
    }

    /// Runs one auction and returns the winning ads.
    ///
    /// # Errors
    ///
    /// Only failures while reading candidates abort the auction. Failures on
    /// individual candidates during settlement are skipped.
    pub fn winning_ads(&self, query: &AdQuery) -> Result<Vec<Ad>, AdError> {
        self.run_auction(query).map(|settlement| settlement.winners)
    }

    /// Runs one auction and returns the full settlement record.
    pub fn run_auction(&self, query: &AdQuery) -> Result<Settlement, AdError> {
        if query.limit == 0 {
            return Ok(Settlement::default());
        }

        let targeting = query.targeting();
        let candidates = find_matching(
            &self.store,
            &query.placement,
            targeting.category,
            targeting.keyword,
        )?;
        let candidate_count = candidates.len();

        let ranked = rank(candidates, &targeting, &self.config.scoring);
        let settlement = settle(&self.store, &ranked, query.limit);

        let ad_ids: Vec<&str> = settlement
            .winners
            .iter()
            .map(|ad| ad.id.as_str())
            .collect();
        info!(
            placement = %query.placement,
            category = query.category.as_deref().unwrap_or_default(),
            keyword = query.keyword.as_deref().unwrap_or_default(),
            limit = query.limit,
            candidates = candidate_count,
            returned = settlement.winners.len(),
            stale = settlement.stale_count(),
            ad_ids = ?ad_ids,
            "winning ads selected"
        );
        Ok(settlement)
    }

    /// Records a tracking event, stamping the receive time if none was given.
    pub fn track(&self, mut event: TrackingEvent) -> Result<TrackingEvent, AdError> {
        self.validator.validate_event(&event)?;
        event.timestamp.get_or_insert_with(Utc::now);

        info!(
            event_type = ?event.event_type,
            line_item = %event.line_item_id,
            placement = event.placement.as_deref().unwrap_or_default(),
            "tracking event stored"
        );
        self.tracking.append(event.clone());
        Ok(event)
    }
}
