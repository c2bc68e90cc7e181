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

//! Intake validation.
//!
//! A [`Validator`] is an ordinary value built from [`QueryLimits`] and owned
//! by whoever needs it; there is no process-wide instance.

use crate::config::QueryLimits;
use crate::error::ValidationError;
use crate::line_item::LineItemCreate;
use crate::query::{AdQuery, AdQueryParams};
use crate::tracking::TrackingEvent;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Validator {
    limits: QueryLimits,
}

fn non_blank(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

impl Validator {
    pub fn new(limits: QueryLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> QueryLimits {
        self.limits
    }

    /// Checks a creation request: names and placement present, `bid > 0`, `budget >= 0`.
    pub fn validate_line_item(&self, create: &LineItemCreate) -> Result<(), ValidationError> {
        non_blank(&create.name, "name")?;
        non_blank(create.advertiser_id.as_str(), "advertiser_id")?;
        non_blank(&create.placement, "placement")?;
        if create.bid <= Decimal::ZERO {
            return Err(ValidationError::InvalidAmount {
                field: "bid",
                requirement: "greater than zero",
            });
        }
        if create.budget < Decimal::ZERO {
            return Err(ValidationError::InvalidAmount {
                field: "budget",
                requirement: "zero or greater",
            });
        }
        Ok(())
    }

    /// Turns raw query parameters into an [`AdQuery`].
    ///
    /// A missing limit falls back to the configured default; blank targeting
    /// values are dropped.
    pub fn validate_query(&self, params: AdQueryParams) -> Result<AdQuery, ValidationError> {
        let placement = params
            .placement
            .filter(|p| !p.trim().is_empty())
            .ok_or(ValidationError::MissingField("placement"))?;

        let limit = match params.limit {
            None => self.limits.default_limit,
            Some(limit) if (1..=self.limits.max_limit as i64).contains(&limit) => limit as usize,
            Some(got) => {
                return Err(ValidationError::LimitOutOfRange {
                    min: 1,
                    max: self.limits.max_limit,
                    got,
                });
            }
        };

        Ok(AdQuery {
            placement,
            category: params.category.filter(|c| !c.is_empty()),
            keyword: params.keyword.filter(|k| !k.is_empty()),
            limit,
        })
    }

    pub fn validate_event(&self, event: &TrackingEvent) -> Result<(), ValidationError> {
        non_blank(event.line_item_id.as_str(), "line_item_id")
    }
}
