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

//! Error types for line item storage, auctions and the intake boundary.

use thiserror::Error;

/// Domain errors raised by the store and the auction engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdError {
    /// Referenced line item does not exist
    #[error("line item not found")]
    NotFound,

    /// The line item changed since the caller's snapshot was taken
    #[error("line item already updated")]
    StaleVersion,

    /// A line item with the same ID already exists
    #[error("duplicate line item ID")]
    DuplicateId,

    /// Budget update would leave a negative budget
    #[error("invalid amount (budget must not be negative)")]
    InvalidAmount,

    /// Malformed input rejected at the intake boundary
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Backing storage could not serve the request
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

/// Input rejected by the [`Validator`](crate::validation::Validator).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required string field is missing or blank
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Monetary field is outside its allowed range
    #[error("{field} must be {requirement}")]
    InvalidAmount {
        field: &'static str,
        requirement: &'static str,
    },

    /// Result limit outside the configured bounds
    #[error("limit should be an integer between {min} and {max}, got {got}")]
    LimitOutOfRange { min: usize, max: usize, got: i64 },
}
