use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use okrsnap::{snapshot, Config, Goal, HierarchyIndex};

#[derive(Parser, Debug)]
#[command(name = "tree")]
#[command(about = "Render the goal hierarchy from a stored snapshot")]
struct Args {
    /// Snapshot file to read (default: latest snapshot in the configured output dir)
    #[arg(short, long)]
    file: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "warn")
    ).init();

    let args = Args::parse();
    let config = Config::load()?;

    let path = match args.file {
        Some(path) => path,
        None => okrsnap::sink::latest_snapshot(&config.storage.output_dir)?,
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    let (created_at, goals) = snapshot::parse(&content)?;

    println!("Snapshot: {} (captured {})", path.display(), created_at);
    println!("Goals: {}\n", goals.len());

    let index = HierarchyIndex::build(&goals);

    for root in index.roots() {
        // Fresh visited set per tree; parent cycles would otherwise recurse forever.
        let mut visited = HashSet::new();
        print_subtree(&index, root, 0, &mut visited);
    }

    let table = config.category_table();
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for goal in &goals {
        *counts.entry(index.classify(&goal.key, &table)).or_insert(0) += 1;
    }

    println!("\nGoals per category:");
    for (category, count) in counts {
        println!("  {}: {}", category, count);
    }

    Ok(())
}

fn print_subtree(index: &HierarchyIndex, key: &str, level: usize, visited: &mut HashSet<String>) {
    if !visited.insert(key.to_string()) {
        return;
    }

    let indent = "  ".repeat(level);
    match index.get(key) {
        Some(goal) => println!("{}- {} {} ({})", indent, goal.key, goal.name, owner(goal)),
        None => println!("{}- {}", indent, key),
    }

    for child in index.children_of(key) {
        print_subtree(index, child, level + 1, visited);
    }
}

fn owner(goal: &Goal) -> &str {
    if goal.owner_name.is_empty() {
        "Unknown"
    } else {
        &goal.owner_name
    }
}
