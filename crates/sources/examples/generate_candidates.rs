//! Example: Generate candidates for a user
//!
//! Run with: cargo run --package sources --example generate_candidates -- <artifacts-dir> <user-id>
//!
//! This example shows how to:
//! 1. Load an artifact bundle from a local directory
//! 2. Build user context
//! 3. Generate model candidates (known users)
//! 4. Generate trending candidates
//! 5. Display the results

use data_loader::{ArtifactBundle, ArtifactLocation, ArtifactNames};
use sources::{user_context::build_user_context, ModelSource, TrendingSource};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let mut args = std::env::args().skip(1);
    let data_dir = PathBuf::from(args.next().unwrap_or_else(|| "artifacts".to_string()));
    let user_id: i64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(1);

    println!("=== Candidate Generation Example ===\n");

    // Load bundle
    println!("Loading artifact bundle from {:?}...", data_dir);
    let start = Instant::now();
    let bundle = Arc::new(ArtifactBundle::load(
        &ArtifactLocation::Directory(data_dir),
        &ArtifactNames::default(),
    )?);
    println!("Loaded bundle in {:?}\n", start.elapsed());

    // Build user context
    let context = build_user_context(&bundle, user_id);
    println!("Target User: {}", user_id);
    println!("  Known to model: {}", context.is_known());
    println!("  Seen items: {}\n", context.seen_count());

    let k = bundle.top_k();

    if context.is_known() {
        let model = ModelSource::new(bundle.clone());
        let start = Instant::now();
        let candidates = model.get_candidates(&context, k)?;
        println!("Model candidates ({} in {:?}):", candidates.len(), start.elapsed());
        for (i, c) in candidates.iter().take(10).enumerate() {
            let seen = if context.has_seen(c.item_id) { " (seen)" } else { "" };
            println!("  {:2}. item {} score={:.4}{}", i + 1, c.item_id, c.base_score, seen);
        }
        println!();
    }

    let trending = TrendingSource::new(bundle.clone());
    let candidates = trending.get_candidates(&context, k);
    println!("Trending candidates ({}):", candidates.len());
    for c in &candidates {
        println!("  item {}", c.item_id);
    }

    Ok(())
}
