use crate::db::{tech_stack::TechCategory, Database};
use anyhow::Context as _;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct SeedConfig {
    tech_stacks: Vec<SeedTechStack>,
}

#[derive(Debug, Deserialize)]
struct SeedTechStack {
    name: String,
    image: Option<String>,
    #[serde(default)]
    category: TechCategory,
}

/// Loads the tech stack catalog from a JSON file. Running it again refreshes
/// existing entries instead of duplicating them.
pub async fn seed(db: &Database, seed_path: &Path) -> anyhow::Result<usize> {
    let contents = std::fs::read_to_string(seed_path)
        .with_context(|| format!("failed to read seed file {}", seed_path.display()))?;
    let seed_config = parse_seed(&contents)?;

    let tech_stacks = seed_config
        .tech_stacks
        .into_iter()
        .map(|tech_stack| (tech_stack.name, tech_stack.image, tech_stack.category))
        .collect::<Vec<_>>();
    db.upsert_tech_stacks(&tech_stacks)
        .await
        .context("failed to seed tech stacks")?;

    log::info!("seeded {} tech stacks", tech_stacks.len());
    Ok(tech_stacks.len())
}

fn parse_seed(contents: &str) -> anyhow::Result<SeedConfig> {
    serde_json::from_str(contents).context("failed to parse seed file")
}
