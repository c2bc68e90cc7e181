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

//! Settlement of ranked candidates against the budget ledger.
//!
//! Candidates are visited strictly in rank order, each at most once. A
//! candidate that cannot cover its bid is skipped without touching the store.
//! Otherwise its budget is decremented through
//! [`LineItemStore::update_budget`]:
//!
//! | Outcome | Action |
//! |---------|--------|
//! | Success | Emit an [`Ad`] from the updated snapshot |
//! | [`AdError::StaleVersion`] | Lost a race to another auction, skip (debug log) |
//! | Any other error | Skip and log a warning |
//!
//! A stale candidate is never retried: under contention the auction degrades
//! to the next-best candidate instead of failing or spinning.

use crate::base::LineItemId;
use crate::error::AdError;
use crate::line_item::{Ad, LineItem};
use crate::store::LineItemStore;
use tracing::{debug, warn};

/// Why a candidate did not become a winner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Last known budget was below the bid
    InsufficientBudget,
    /// Another writer changed the line item after it was read
    StaleVersion,
    /// Any other store failure
    Failed(AdError),
}

/// Result of one settlement pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settlement {
    /// Winning ads in rank order.
    pub winners: Vec<Ad>,
    /// Visited candidates that did not win, in visiting order.
    pub skipped: Vec<(LineItemId, SkipReason)>,
}

impl Settlement {
    pub fn stale_count(&self) -> usize {
        self.skipped
            .iter()
            .filter(|(_, reason)| *reason == SkipReason::StaleVersion)
            .count()
    }
}

/// Walks `ranked` and settles up to `limit` winners.
pub fn settle<S>(store: &S, ranked: &[LineItem], limit: usize) -> Settlement
where
    S: LineItemStore + ?Sized,
{
    let mut settlement = Settlement::default();
    if limit == 0 {
        return settlement;
    }

    for candidate in ranked {
        if !candidate.can_afford_bid() {
            debug!(
                id = %candidate.id(),
                bid = %candidate.bid(),
                budget = %candidate.budget(),
                "skipping line item with insufficient budget"
            );
            settlement
                .skipped
                .push((candidate.id().clone(), SkipReason::InsufficientBudget));
            continue;
        }

        let new_budget = candidate.budget() - candidate.bid();
        match store.update_budget(candidate, new_budget) {
            Ok(updated) => {
                settlement.winners.push(Ad::from(&updated));
                if settlement.winners.len() >= limit {
                    break;
                }
            }
            Err(AdError::StaleVersion) => {
                debug!(
                    id = %candidate.id(),
                    "line item already updated before budget spending"
                );
                settlement
                    .skipped
                    .push((candidate.id().clone(), SkipReason::StaleVersion));
            }
            Err(err) => {
                warn!(
                    id = %candidate.id(),
                    error = %err,
                    "failed to spend line item budget"
                );
                settlement
                    .skipped
                    .push((candidate.id().clone(), SkipReason::Failed(err)));
            }
        }
    }

    settlement
}
