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

//! Eligibility filtering of line items for a placement.

use crate::error::AdError;
use crate::line_item::{LineItem, LineItemStatus};
use crate::store::{LineItemStore, ListFilter};

/// Returns the active line items for `placement` that carry the requested
/// category and keyword. Empty or absent targeting values do not restrict.
///
/// # Errors
///
/// Propagates store failures from the underlying [`LineItemStore::list`].
pub fn find_matching<S>(
    store: &S,
    placement: &str,
    category: Option<&str>,
    keyword: Option<&str>,
) -> Result<Vec<LineItem>, AdError>
where
    S: LineItemStore + ?Sized,
{
    let category = category.filter(|c| !c.is_empty());
    let keyword = keyword.filter(|k| !k.is_empty());

    let candidates = store.list(
        &ListFilter::new()
            .status(LineItemStatus::Active)
            .placement(placement),
    )?;

    Ok(candidates
        .into_iter()
        .filter(|item| category.is_none_or(|c| item.categories().contains(c)))
        .filter(|item| keyword.is_none_or(|k| item.keywords().contains(k)))
        .collect())
}
