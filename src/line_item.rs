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

//! Line items and the ads projected from them.
//!
//! A [`LineItem`] is a campaign bid configuration. Its `budget` and
//! `updated_at` fields are only ever changed by the store; everything a
//! caller holds is a detached snapshot. Only `active` line items take part in
//! auctions.
//!
//! # Example
//!
//! ```
//! use adserver_demo_rs::{AdvertiserId, LineItem, LineItemCreate, LineItemId, LineItemStatus};
//! use rust_decimal_macros::dec;
//!
//! let create = LineItemCreate::new("Summer Sale", "adv_1", dec!(2.50), dec!(100), "homepage_top");
//! let item = LineItem::new(LineItemId::from("li_1"), create, chrono::Utc::now());
//! assert_eq!(item.status(), LineItemStatus::Active);
//! assert_eq!(item.advertiser_id(), &AdvertiserId::from("adv_1"));
//! assert_eq!(item.budget(), dec!(100));
//! ```

use crate::base::{AdvertiserId, LineItemId};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineItemStatus {
    Active,
    Paused,
    Completed,
}

impl LineItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }
}

/// Data needed to create a new line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemCreate {
    pub name: String,
    pub advertiser_id: AdvertiserId,
    pub bid: Decimal,
    pub budget: Decimal,
    pub placement: String,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub keywords: BTreeSet<String>,
}

impl LineItemCreate {
    pub fn new(
        name: impl Into<String>,
        advertiser_id: &str,
        bid: Decimal,
        budget: Decimal,
        placement: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            advertiser_id: AdvertiserId::from(advertiser_id),
            bid,
            budget,
            placement: placement.into(),
            categories: BTreeSet::new(),
            keywords: BTreeSet::new(),
        }
    }

    pub fn with_categories<I, T>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_keywords<I, T>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }
}

/// Snapshot of a campaign bid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    id: LineItemId,
    name: String,
    advertiser_id: AdvertiserId,
    bid: Decimal,
    budget: Decimal,
    placement: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    categories: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    keywords: BTreeSet<String>,
    status: LineItemStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LineItem {
    /// Builds an `active` line item whose budget starts at `create.budget`.
    pub fn new(id: LineItemId, create: LineItemCreate, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: create.name,
            advertiser_id: create.advertiser_id,
            bid: create.bid,
            budget: create.budget,
            placement: create.placement,
            categories: create.categories,
            keywords: create.keywords,
            status: LineItemStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &LineItemId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn advertiser_id(&self) -> &AdvertiserId {
        &self.advertiser_id
    }

    pub fn bid(&self) -> Decimal {
        self.bid
    }

    pub fn budget(&self) -> Decimal {
        self.budget
    }

    pub fn placement(&self) -> &str {
        &self.placement
    }

    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    pub fn keywords(&self) -> &BTreeSet<String> {
        &self.keywords
    }

    pub fn status(&self) -> LineItemStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Version stamp used for optimistic concurrency control.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` if the remaining budget covers one more winning bid.
    pub fn can_afford_bid(&self) -> bool {
        self.budget >= self.bid
    }

    /// Two-field version witness compared by the store's compare-and-swap.
    pub(crate) fn same_version(&self, other: &LineItem) -> bool {
        self.budget == other.budget && self.updated_at == other.updated_at
    }

    pub(crate) fn set_budget(&mut self, budget: Decimal, now: DateTime<Utc>) {
        self.budget = budget;
        self.touch(now);
        debug_assert!(
            self.budget >= Decimal::ZERO,
            "Invariant violated: budget went negative: {}",
            self.budget
        );
    }

    pub(crate) fn set_status(&mut self, status: LineItemStatus, now: DateTime<Utc>) {
        self.status = status;
        self.touch(now);
    }

    /// Advances `updated_at`, by at least one nanosecond if the clock stalled.
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::nanoseconds(1)
        };
    }
}

/// An advertisement ready to be served.
///
/// Built from the post-settlement snapshot of a winning line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ad {
    pub id: LineItemId,
    pub name: String,
    pub advertiser_id: AdvertiserId,
    pub bid: Decimal,
    pub placement: String,
    pub serve_url: String,
}

impl From<&LineItem> for Ad {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            advertiser_id: item.advertiser_id.clone(),
            bid: item.bid,
            placement: item.placement.clone(),
            serve_url: serve_url(&item.id),
        }
    }
}

/// Serving endpoint for a line item.
pub fn serve_url(id: &LineItemId) -> String {
    format!("/ad/serve/{}", id)
}
