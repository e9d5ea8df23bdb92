use data_loader::{ArtifactBundle, ArtifactLocation, ArtifactNames};
use std::path::PathBuf;
use std::time::Instant;

fn main() {
    tracing_subscriber::fmt::init();

    let data_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("artifacts"));

    println!("Loading artifact bundle from {:?}...\n", data_dir);

    let start = Instant::now();
    let bundle = ArtifactBundle::load(
        &ArtifactLocation::Directory(data_dir),
        &ArtifactNames::default(),
    )
    .expect("Failed to load artifact bundle");
    let elapsed = start.elapsed();

    let counts = bundle.counts();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Users: {}", counts.users);
    println!("Items: {}", counts.items);
    println!("Item features: {}", counts.item_features);
    println!("Trending: {}", counts.trending);
    println!("\nPerformance: {:.0} items/second",
             counts.items as f64 / elapsed.as_secs_f64());
}
