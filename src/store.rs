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

//! Line item storage.
//!
//! The store is the single owner of line item state. Readers always receive
//! detached copies; the only way to change a budget is
//! [`LineItemStore::update_budget`], a compare-and-swap on the
//! `(budget, updated_at)` pair of the caller's snapshot.
//!
//! # Concurrency
//!
//! [`MemoryStore`] keeps one [`RwLock`] per line item inside a [`DashMap`].
//! Snapshot reads share the lock and never wait on each other. The write
//! lock is held only for the compare-and-swap itself, so two auctions racing
//! on the same line item can both read it but only one of them can apply its
//! decrement. The loser gets [`AdError::StaleVersion`] immediately; retrying
//! is the caller's business.

use crate::base::{AdvertiserId, LineItemId};
use crate::error::AdError;
use crate::line_item::{LineItem, LineItemStatus};
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use rust_decimal::Decimal;

/// Conjunctive filter for [`LineItemStore::list`]. Absent fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub status: Option<LineItemStatus>,
    pub advertiser_id: Option<AdvertiserId>,
    pub placement: Option<String>,
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: LineItemStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn advertiser_id(mut self, advertiser_id: impl Into<AdvertiserId>) -> Self {
        self.advertiser_id = Some(advertiser_id.into());
        self
    }

    pub fn placement(mut self, placement: impl Into<String>) -> Self {
        self.placement = Some(placement.into());
        self
    }

    pub fn matches(&self, item: &LineItem) -> bool {
        self.status.is_none_or(|status| item.status() == status)
            && self
                .advertiser_id
                .as_ref()
                .is_none_or(|advertiser| item.advertiser_id() == advertiser)
            && self
                .placement
                .as_deref()
                .is_none_or(|placement| item.placement() == placement)
    }
}

/// Authoritative set of line items and their remaining budgets.
pub trait LineItemStore: Send + Sync {
    /// Inserts a new line item.
    ///
    /// # Errors
    ///
    /// [`AdError::DuplicateId`] if the ID is already present.
    fn create(&self, item: LineItem) -> Result<(), AdError>;

    /// Returns the current snapshot of a line item.
    ///
    /// # Errors
    ///
    /// [`AdError::NotFound`] if no line item has this ID.
    fn get_by_id(&self, id: &LineItemId) -> Result<LineItem, AdError>;

    /// Returns snapshots of every line item matching `filter`.
    fn list(&self, filter: &ListFilter) -> Result<Vec<LineItem>, AdError>;

    /// Atomically replaces the budget if the stored item still matches `expected`.
    ///
    /// # Errors
    ///
    /// - [`AdError::InvalidAmount`] - `new_budget` is negative.
    /// - [`AdError::NotFound`] - the line item no longer exists.
    /// - [`AdError::StaleVersion`] - budget or `updated_at` moved since `expected` was read.
    fn update_budget(&self, expected: &LineItem, new_budget: Decimal)
    -> Result<LineItem, AdError>;

    /// Changes the status and advances the version stamp.
    ///
    /// # Errors
    ///
    /// [`AdError::NotFound`] if no line item has this ID.
    fn set_status(&self, id: &LineItemId, status: LineItemStatus) -> Result<LineItem, AdError>;
}

/// In-process line item store.
///
/// # Invariants
///
/// - IDs are unique; an ID is never overwritten.
/// - `budget >= 0` for every stored line item.
/// - `updated_at` strictly increases on every successful mutation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: DashMap<LineItemId, RwLock<LineItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl LineItemStore for MemoryStore {
    fn create(&self, item: LineItem) -> Result<(), AdError> {
        // Entry API keeps check-and-insert atomic.
        match self.items.entry(item.id().clone()) {
            Entry::Occupied(_) => Err(AdError::DuplicateId),
            Entry::Vacant(entry) => {
                entry.insert(RwLock::new(item));
                Ok(())
            }
        }
    }

    fn get_by_id(&self, id: &LineItemId) -> Result<LineItem, AdError> {
        self.items
            .get(id)
            .map(|entry| entry.read().clone())
            .ok_or(AdError::NotFound)
    }

    fn list(&self, filter: &ListFilter) -> Result<Vec<LineItem>, AdError> {
        let mut result: Vec<LineItem> = self
            .items
            .iter()
            .filter_map(|entry| {
                let item = entry.read();
                filter.matches(&item).then(|| item.clone())
            })
            .collect();

        // DashMap iteration order depends on shard layout.
        result.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(result)
    }

    fn update_budget(
        &self,
        expected: &LineItem,
        new_budget: Decimal,
    ) -> Result<LineItem, AdError> {
        if new_budget < Decimal::ZERO {
            return Err(AdError::InvalidAmount);
        }
        let now = Utc::now();
        let entry = self.items.get(expected.id()).ok_or(AdError::NotFound)?;

        let mut item = entry.write();
        if !item.same_version(expected) {
            return Err(AdError::StaleVersion);
        }
        item.set_budget(new_budget, now);
        Ok(item.clone())
    }

    fn set_status(&self, id: &LineItemId, status: LineItemStatus) -> Result<LineItem, AdError> {
        let now = Utc::now();
        let entry = self.items.get(id).ok_or(AdError::NotFound)?;

        let mut item = entry.write();
        item.set_status(status, now);
        Ok(item.clone())
    }
}
