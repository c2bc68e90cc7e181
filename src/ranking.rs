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

//! Auction ranking.
//!
//! Candidates are scored with an additive relevance multiplier on top of the
//! bid:
//!
//! ```text
//! score = bid × (1 + category_weight·[category matches] + keyword_weight·[keyword matches])
//! ```
//!
//! With no targeting signal every candidate's multiplier is `1`, so the
//! ranking degenerates to "highest bid first". Scores are exact decimals and
//! the sort is stable: equal scores keep their input order.

use crate::line_item::LineItem;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Relevance boosts applied to the bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub category: Decimal,
    pub keyword: Decimal,
}

impl ScoringWeights {
    pub const DEFAULT_CATEGORY: Decimal = dec!(0.3);
    pub const DEFAULT_KEYWORD: Decimal = dec!(0.2);
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            category: Self::DEFAULT_CATEGORY,
            keyword: Self::DEFAULT_KEYWORD,
        }
    }
}

/// Optional targeting signals of a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Targeting<'a> {
    pub category: Option<&'a str>,
    pub keyword: Option<&'a str>,
}

impl<'a> Targeting<'a> {
    pub fn new(category: Option<&'a str>, keyword: Option<&'a str>) -> Self {
        Self {
            category: category.filter(|c| !c.is_empty()),
            keyword: keyword.filter(|k| !k.is_empty()),
        }
    }
}

pub fn score(item: &LineItem, targeting: &Targeting<'_>, weights: &ScoringWeights) -> Decimal {
    let mut relevance = Decimal::ONE;
    if targeting
        .category
        .is_some_and(|c| item.categories().contains(c))
    {
        relevance = relevance.saturating_add(weights.category);
    }
    if targeting
        .keyword
        .is_some_and(|k| item.keywords().contains(k))
    {
        relevance = relevance.saturating_add(weights.keyword);
    }
    // Saturates so an extreme bid still ranks first instead of overflowing
    item.bid().saturating_mul(relevance)
}

/// Orders candidates by descending score.
pub fn rank(
    candidates: Vec<LineItem>,
    targeting: &Targeting<'_>,
    weights: &ScoringWeights,
) -> Vec<LineItem> {
    let mut scored: Vec<(Decimal, LineItem)> = candidates
        .into_iter()
        .map(|item| (score(&item, targeting, weights), item))
        .collect();

    scored.sort_by_key(|(score, _)| Reverse(*score));
    scored.into_iter().map(|(_, item)| item).collect()
}
