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

use adserver_demo_rs::{AdEngine, AdQueryParams, EngineConfig, LineItemCreate};
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Ad Server - Replay auctions from CSV files
///
/// Loads line items from one CSV file, runs every query from a second CSV
/// file in order against them and writes the winning ads to stdout.
#[derive(Parser, Debug)]
#[command(name = "adserver-demo-rs")]
#[command(about = "Runs ad auctions over CSV line items and queries", long_about = None)]
struct Args {
    /// Path to CSV file with line items
    ///
    /// Expected format: name,advertiser_id,bid,budget,placement,categories,keywords
    /// Categories and keywords are `;`-separated and may be empty.
    #[arg(value_name = "LINE_ITEMS")]
    line_items: PathBuf,

    /// Path to CSV file with queries
    ///
    /// Expected format: placement,category,keyword,limit
    #[arg(value_name = "QUERIES")]
    queries: PathBuf,

    /// Optional TOML engine configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter directive, e.g. `info` or `adserver_demo_rs=debug`
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    // Logs go to stderr so stdout stays a clean CSV stream.
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };
    let engine = AdEngine::with_config(config);

    let line_items = match File::open(&args.line_items) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.line_items.display(), e);
            process::exit(1);
        }
    };
    if let Err(e) = load_line_items(&engine, BufReader::new(line_items)) {
        eprintln!("Error loading line items: {}", e);
        process::exit(1);
    }

    let queries = match File::open(&args.queries) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.queries.display(), e);
            process::exit(1);
        }
    };
    if let Err(e) = run_queries(&engine, BufReader::new(queries), std::io::stdout()) {
        eprintln!("Error running queries: {}", e);
        process::exit(1);
    }
}

/// Raw CSV line item record.
///
/// Fields: `name, advertiser_id, bid, budget, placement, categories, keywords`
#[derive(Debug, Deserialize)]
struct LineItemRecord {
    name: String,
    advertiser_id: String,
    bid: Decimal,
    budget: Decimal,
    placement: String,
    #[serde(default)]
    categories: Option<String>,
    #[serde(default)]
    keywords: Option<String>,
}

fn split_tags(tags: Option<String>) -> Vec<String> {
    tags.unwrap_or_default()
        .split(';')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

impl LineItemRecord {
    fn into_create(self) -> LineItemCreate {
        LineItemCreate::new(
            self.name,
            &self.advertiser_id,
            self.bid,
            self.budget,
            self.placement,
        )
        .with_categories(split_tags(self.categories))
        .with_keywords(split_tags(self.keywords))
    }
}

/// Raw CSV query record.
///
/// Fields: `placement, category, keyword, limit`
#[derive(Debug, Deserialize)]
struct QueryRecord {
    placement: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    keyword: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    limit: Option<i64>,
}

impl From<QueryRecord> for AdQueryParams {
    fn from(record: QueryRecord) -> Self {
        AdQueryParams {
            placement: Some(record.placement),
            category: record.category,
            keyword: record.keyword,
            limit: record.limit,
        }
    }
}

/// One output row per winning ad.
#[derive(Debug, Serialize)]
struct WinnerRecord<'a> {
    query: usize,
    rank: usize,
    id: &'a str,
    name: &'a str,
    advertiser_id: &'a str,
    bid: Decimal,
    placement: &'a str,
    serve_url: &'a str,
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader)
}

/// Creates a line item for every valid row. Returns how many were created.
///
/// Malformed rows and rows failing validation are skipped with a warning.
pub fn load_line_items<R: Read>(engine: &AdEngine, reader: R) -> Result<usize, csv::Error> {
    let mut created = 0;
    for (row, result) in csv_reader(reader).deserialize::<LineItemRecord>().enumerate() {
        match result {
            Ok(record) => match engine.create_line_item(record.into_create()) {
                Ok(line_item) => {
                    debug!(row, id = %line_item.id(), "loaded line item");
                    created += 1;
                }
                Err(e) => warn!(row, error = %e, "skipping invalid line item"),
            },
            Err(e) => warn!(row, error = %e, "skipping malformed line item row"),
        }
    }
    Ok(created)
}

/// Runs every query in order and writes the winners as CSV.
///
/// # CSV Format
///
/// Columns: `query, rank, id, name, advertiser_id, bid, placement, serve_url`
/// where `query` is the zero-based query row and `rank` the winner's position.
pub fn run_queries<R: Read, W: Write>(
    engine: &AdEngine,
    reader: R,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for (row, result) in csv_reader(reader).deserialize::<QueryRecord>().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(row, error = %e, "skipping malformed query row");
                continue;
            }
        };
        let query = match engine.validator().validate_query(record.into()) {
            Ok(query) => query,
            Err(e) => {
                warn!(row, error = %e, "skipping invalid query");
                continue;
            }
        };
        let ads = match engine.winning_ads(&query) {
            Ok(ads) => ads,
            Err(e) => {
                warn!(row, error = %e, "auction failed");
                continue;
            }
        };

        for (rank, ad) in ads.iter().enumerate() {
            wtr.serialize(WinnerRecord {
                query: row,
                rank,
                id: ad.id.as_str(),
                name: &ad.name,
                advertiser_id: ad.advertiser_id.as_str(),
                bid: ad.bid,
                placement: &ad.placement,
                serve_url: &ad.serve_url,
            })?;
        }
    }

    wtr.flush()?;
    Ok(())
}
