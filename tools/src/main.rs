//! funnel-runner: headless generator for the marketing funnel dataset.
//!
//! Usage:
//!   funnel-runner --seed 0 --db demo.db
//!   funnel-runner --config funnel.json --visitors 1000 --db big.db
//!   funnel-runner --db demo.db --keep-db     (keep run history, replace entity rows)

use anyhow::{Context, Result};
use funnel_sim_core::{
    config::GeneratorConfig,
    engine::{RunSummary, SimEngine},
    store::SimStore,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = string_arg(&args, "--db").unwrap_or("demo.db");
    let keep_db = args.iter().any(|a| a == "--keep-db");
    let dump_config = args.iter().any(|a| a == "--dump-config");

    let mut config = match string_arg(&args, "--config") {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    config.random_seed = parse_arg(&args, "--seed", config.random_seed);
    config.visitor_count = parse_arg(&args, "--visitors", config.visitor_count);
    config.customer_count = parse_arg(&args, "--customers", config.customer_count);
    config.product_count = parse_arg(&args, "--products", config.product_count);

    if dump_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("funnel-runner");
    println!("  seed:      {}", config.random_seed);
    println!("  visitors:  {}", config.visitor_count);
    println!("  customers: {}", config.customer_count);
    println!("  products:  {}", config.product_count);
    println!("  channels:  {}", config.channel_list.join(", "));
    println!("  db:        {db}");
    println!();

    let engine = SimEngine::new(config).context("invalid generator config")?;

    let mut store = if keep_db || db == ":memory:" {
        SimStore::open(db)?
    } else {
        SimStore::open_fresh(db)?
    };
    store.migrate()?;
    if keep_db {
        store.clear_entities()?;
    }

    let seed = engine.config().random_seed;
    let run_id = format!("run-{seed}-{}", unix_seconds());
    store.insert_run(&run_id, seed, env!("CARGO_PKG_VERSION"))?;

    let summary = match engine.run(&mut store) {
        Ok(summary) => summary,
        Err(e) => {
            log::error!("run {run_id} aborted: {e}");
            return Err(e.into());
        }
    };
    store.complete_run(&run_id, &summary)?;
    print_summary(&run_id, &summary);
    store.close()?;

    Ok(())
}

fn print_summary(run_id: &str, summary: &RunSummary) {
    println!("=== RUN SUMMARY ===");
    println!("  run_id:     {run_id}");
    for (table, rows) in &summary.rows {
        println!("  {table:<18} {rows}");
    }
    println!();
    println!("=== FUNNEL ===");
    println!("  stories:    {}", summary.funnel.stories);
    println!("  converted:  {}", summary.funnel.converted);
    println!("  rejected:   {}", summary.funnel.rejected);
    println!("  cancelled:  {}", summary.funnel.cancelled);
    if summary.funnel.stories > 0 {
        let rate = summary.funnel.converted as f64 / summary.funnel.stories as f64;
        println!("  conv rate:  {:.1}%", rate * 100.0);
    }
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn unix_seconds() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
