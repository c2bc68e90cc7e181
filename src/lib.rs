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

//! # Ad Server Demo
//!
//! This library provides an ad-selection engine: given a placement and optional
//! targeting signals, it ranks eligible campaign line items and returns a
//! bounded list of winning ads, charging each winner's bid against its
//! remaining budget.
//!
//! ## Core Components
//!
//! - [`AdEngine`]: Central auction runner owning the line item store
//! - [`MemoryStore`]: Line item store with a compare-and-swap budget update
//! - [`rank`]: Relevance-weighted bid ranking
//! - [`settle`]: Walks ranked candidates and spends their budgets
//! - [`AdError`]: Error types for storage and auction failures
//!
//! ## Example
//!
//! ```
//! use adserver_demo_rs::{AdEngine, AdQuery, LineItemCreate};
//! use rust_decimal_macros::dec;
//!
//! let engine = AdEngine::new();
//!
//! let low = engine
//!     .create_line_item(LineItemCreate::new("Low", "adv_1", dec!(10), dec!(100), "homepage"))
//!     .unwrap();
//! let high = engine
//!     .create_line_item(LineItemCreate::new("High", "adv_2", dec!(20), dec!(100), "homepage"))
//!     .unwrap();
//!
//! let ads = engine.winning_ads(&AdQuery::new("homepage").limit(2)).unwrap();
//! assert_eq!(ads[0].id, *high.id());
//! assert_eq!(ads[1].id, *low.id());
//!
//! // Each winner paid its bid
//! assert_eq!(engine.get_line_item(high.id()).unwrap().budget(), dec!(80));
//! assert_eq!(engine.get_line_item(low.id()).unwrap().budget(), dec!(90));
//! ```
//!
//! ## Thread Safety
//!
//! Budgets are protected by optimistic concurrency control: auctions read
//! snapshots without locking and a winner's decrement only applies if the
//! line item is unchanged since it was read. Concurrent auctions can never
//! overspend a budget.

mod base;
pub mod config;
pub mod eligibility;
mod engine;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
mod line_item;
mod query;
pub mod ranking;
pub mod settlement;
pub mod store;
pub mod tracking;
pub mod validation;

pub use base::{AdvertiserId, LineItemId};
pub use config::{ConfigError, EngineConfig, QueryLimits};
pub use eligibility::find_matching;
pub use engine::AdEngine;
pub use error::{AdError, ValidationError};
pub use line_item::{Ad, LineItem, LineItemCreate, LineItemStatus, serve_url};
pub use query::{AdQuery, AdQueryParams};
pub use ranking::{ScoringWeights, Targeting, rank, score};
pub use settlement::{Settlement, SkipReason, settle};
pub use store::{LineItemStore, ListFilter, MemoryStore};
pub use tracking::{TrackingEvent, TrackingEventType, TrackingLog};
pub use validation::Validator;
