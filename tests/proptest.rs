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

//! Property-based tests for ranking and settlement.
//!
//! These tests verify invariants that should hold for any set of line items
//! and any sequence of auctions.

use adserver_demo_rs::{
    AdEngine, AdQuery, LineItem, LineItemCreate, LineItemId, LineItemStore, ListFilter,
    MemoryStore, ScoringWeights, Targeting, rank, score, settle,
};
use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Generate a positive amount (0.0001 to 1000 with 4 decimal places).
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..=10_000_000i64).prop_map(|units| Decimal::new(units, 4))
}

/// Generate a (bid, budget) pair plus optional tags drawn from a small pool.
fn arb_line_item() -> impl Strategy<Value = (Decimal, Decimal, Vec<&'static str>, Vec<&'static str>)>
{
    let pool = prop::sample::subsequence(vec!["a", "b", "c"], 0..=3);
    (arb_amount(), arb_amount(), pool.clone(), pool)
}

fn build(index: usize, bid: Decimal, budget: Decimal, cats: &[&str], kws: &[&str]) -> LineItem {
    let create = LineItemCreate::new(format!("item{index}"), "adv", bid, budget, "top")
        .with_categories(cats.iter().copied())
        .with_keywords(kws.iter().copied());
    LineItem::new(LineItemId(format!("li_{index:04}")), create, Utc::now())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// A line item whose budget is below its bid never wins.
    #[test]
    fn underfunded_line_item_never_wins(
        bid in arb_amount(),
        shortfall in arb_amount(),
        limit in 1usize..=10,
    ) {
        let budget = (bid - shortfall).max(Decimal::ZERO);
        prop_assume!(budget < bid);

        let engine = AdEngine::new();
        let item = engine
            .create_line_item(LineItemCreate::new("poor", "adv", bid, budget, "top"))
            .unwrap();

        let ads = engine.winning_ads(&AdQuery::new("top").limit(limit)).unwrap();
        prop_assert!(ads.is_empty());
        prop_assert_eq!(engine.get_line_item(item.id()).unwrap().budget(), budget);
    }

    /// A created budget reads back unchanged while never auctioned.
    #[test]
    fn budget_round_trips(bid in arb_amount(), budget in arb_amount()) {
        let engine = AdEngine::new();
        let item = engine
            .create_line_item(LineItemCreate::new("x", "adv", bid, budget, "top"))
            .unwrap();
        prop_assert_eq!(engine.get_line_item(item.id()).unwrap().budget(), budget);
    }

    /// Settlement returns at most `limit` ads, and exactly the winners pay.
    #[test]
    fn settlement_respects_limit_and_charges_winners(
        items in prop::collection::vec(arb_line_item(), 0..15),
        limit in 0usize..12,
    ) {
        let store = MemoryStore::new();
        let ranked: Vec<LineItem> = items
            .iter()
            .enumerate()
            .map(|(i, (bid, budget, cats, kws))| build(i, *bid, *budget, cats, kws))
            .collect();
        for item in &ranked {
            store.create(item.clone()).unwrap();
        }

        let settlement = settle(&store, &ranked, limit);
        prop_assert!(settlement.winners.len() <= limit);

        let winners: HashMap<&LineItemId, Decimal> =
            settlement.winners.iter().map(|ad| (&ad.id, ad.bid)).collect();
        prop_assert_eq!(winners.len(), settlement.winners.len());

        for before in &ranked {
            let after = store.get_by_id(before.id()).unwrap();
            prop_assert!(after.budget() >= Decimal::ZERO);
            match winners.get(before.id()) {
                Some(bid) => {
                    prop_assert!(before.budget() >= *bid);
                    prop_assert_eq!(after.budget(), before.budget() - *bid);
                }
                None => {
                    prop_assert_eq!(after.budget(), before.budget());
                }
            }
        }
    }

    /// Ranking is deterministic and scores are non-increasing.
    #[test]
    fn ranking_is_a_deterministic_total_order(
        items in prop::collection::vec(arb_line_item(), 0..20),
        category in prop::option::of(prop::sample::select(vec!["a", "b", "c"])),
        keyword in prop::option::of(prop::sample::select(vec!["a", "b", "c"])),
    ) {
        let candidates: Vec<LineItem> = items
            .iter()
            .enumerate()
            .map(|(i, (bid, budget, cats, kws))| build(i, *bid, *budget, cats, kws))
            .collect();
        let targeting = Targeting::new(category, keyword);
        let weights = ScoringWeights::default();

        let first = rank(candidates.clone(), &targeting, &weights);
        let second = rank(candidates.clone(), &targeting, &weights);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), candidates.len());

        for pair in first.windows(2) {
            let (a, b) = (score(&pair[0], &targeting, &weights), score(&pair[1], &targeting, &weights));
            prop_assert!(a >= b);
            // Equal scores keep their input order
            if a == b {
                prop_assert!(pair[0].id() < pair[1].id());
            }
        }
    }

    /// Repeated auctions never overspend: total spent equals the sum of winning bids.
    #[test]
    fn repeated_auctions_conserve_money(
        items in prop::collection::vec((arb_amount(), arb_amount()), 1..8),
        rounds in 1usize..20,
        limit in 1usize..4,
    ) {
        let engine = AdEngine::new();
        for (i, (bid, budget)) in items.iter().enumerate() {
            engine
                .create_line_item(LineItemCreate::new(format!("i{i}"), "adv", *bid, *budget, "top"))
                .unwrap();
        }
        let initial: Decimal = items.iter().map(|(_, budget)| *budget).sum();

        let mut spent = Decimal::ZERO;
        for _ in 0..rounds {
            for ad in engine.winning_ads(&AdQuery::new("top").limit(limit)).unwrap() {
                spent += ad.bid;
            }
        }

        let remaining: Decimal = engine
            .list_line_items(&ListFilter::new())
            .unwrap()
            .iter()
            .map(|item| item.budget())
            .sum();
        prop_assert_eq!(remaining + spent, initial);
    }
}
