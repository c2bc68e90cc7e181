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

//! Append-only tracking event sink.
//!
//! Impressions, clicks and conversions reported by ad clients are appended to
//! a lock-free queue in arrival order. Nothing in the auction reads them back.

use crate::base::LineItemId;
use chrono::{DateTime, Utc};
use crossbeam::queue::SegQueue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingEventType {
    Impression,
    Click,
    Conversion,
}

/// A user interaction with a served ad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub event_type: TrackingEventType,
    pub line_item_id: LineItemId,
    /// Stamped with the receive time when the reporter leaves it out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl TrackingEvent {
    pub fn new(event_type: TrackingEventType, line_item_id: LineItemId) -> Self {
        Self {
            event_type,
            line_item_id,
            timestamp: None,
            placement: None,
            user_id: None,
            metadata: BTreeMap::new(),
        }
    }
}

/// Lock-free, append-only event log.
#[derive(Debug, Default)]
pub struct TrackingLog {
    events: SegQueue<TrackingEvent>,
}

impl TrackingLog {
    pub fn new() -> Self {
        Self {
            events: SegQueue::new(),
        }
    }

    pub fn append(&self, event: TrackingEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Removes and returns every event in arrival order.
    pub fn drain(&self) -> Vec<TrackingEvent> {
        std::iter::from_fn(|| self.events.pop()).collect()
    }
}
