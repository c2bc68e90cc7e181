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

//! Auction queries.

use crate::ranking::Targeting;
use serde::{Deserialize, Serialize};

/// Raw query as received from a client, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdQueryParams {
    pub placement: Option<String>,
    pub category: Option<String>,
    pub keyword: Option<String>,
    pub limit: Option<i64>,
}

/// Validated request for winning ads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdQuery {
    pub placement: String,
    pub category: Option<String>,
    pub keyword: Option<String>,
    pub limit: usize,
}

impl AdQuery {
    /// Query for a single winner with no targeting.
    pub fn new(placement: impl Into<String>) -> Self {
        Self {
            placement: placement.into(),
            category: None,
            keyword: None,
            limit: 1,
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn targeting(&self) -> Targeting<'_> {
        Targeting::new(self.category.as_deref(), self.keyword.as_deref())
    }
}
