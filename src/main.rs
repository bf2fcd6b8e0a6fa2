use anyhow::{Context, Result};
use rusqlite::Connection;
use std::env;
use std::fs;
use std::path::Path;

// Use library instead of local modules
use fiesta_voting::{
    compute_results, count_ballots, group_by_family, list_ballots, list_families, list_guests,
    list_voter_ids, seed_database, setup_database,
};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("seed") => run_seed(&args[2..])?,
        Some("results") => run_results(&args[2..])?,
        Some("status") => run_status()?,
        _ => print_usage(),
    }

    Ok(())
}

/// Database path, overridable for the party laptop vs. rehearsal runs.
fn db_path() -> String {
    env::var("FIESTA_DB").unwrap_or_else(|_| "fiesta.db".to_string())
}

fn open_existing(db_path: &str) -> Result<Connection> {
    if !Path::new(db_path).exists() {
        eprintln!("❌ Database not found at {}", db_path);
        eprintln!("   Run: fiesta-voting seed <roster.txt>");
        eprintln!("   to load the guest list first.");
        std::process::exit(1);
    }

    Ok(Connection::open(db_path)?)
}

fn run_seed(args: &[String]) -> Result<()> {
    let roster_path = args.first().map(String::as_str).unwrap_or("names.txt");
    let db_path = db_path();

    println!("🎉 Fiesta Voting - Roster Seed");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Read roster file
    println!("\n📂 Reading roster...");
    let content = fs::read_to_string(roster_path)
        .with_context(|| format!("Failed to read roster file {}", roster_path))?;
    println!("✓ Loaded {}", roster_path);

    // 2. Setup database
    println!("\n🔧 Setting up database...");
    let conn = Connection::open(&db_path)?;
    setup_database(&conn)?;
    println!("✓ Database initialized with WAL mode");

    // 3. Seed families and guests
    println!("\n💾 Seeding guests...");
    let summary = seed_database(&conn, &content)?;
    println!("✓ Families: {}", summary.families);
    println!("✓ Guests added: {}", summary.guests_added);
    println!("✓ Already present: {}", summary.guests_skipped);

    // 4. Verify
    println!("\n🔍 Verifying database...");
    let guests = list_guests(&conn)?;
    println!("✓ Database contains {} guests at {}", guests.len(), db_path);

    Ok(())
}

fn run_results(args: &[String]) -> Result<()> {
    let as_json = args.iter().any(|a| a == "--json");
    let conn = open_existing(&db_path())?;

    let guests = list_guests(&conn)?;
    let families = list_families(&conn)?;
    let ballots = list_ballots(&conn)?;

    let results = compute_results(&ballots, &guests, &families);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!("🏆 Resultados de la fiesta");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n🎭 Mejor disfraz:");
    if results.costume_winners.is_empty() {
        println!("   (sin votos)");
    }
    for winner in &results.costume_winners {
        println!("   {}. {} - {} votos", winner.rank, winner.name, winner.count);
    }

    println!("\n🎤 Mejor familia karaoke:");
    if results.karaoke_winners.is_empty() {
        println!("   (sin votos)");
    }
    for family in &results.karaoke_winners {
        println!("   {} - {} votos", family.name, family.count);
    }

    println!(
        "\n📊 Participación: {} de {} invitados",
        results.total_votes,
        guests.len()
    );

    Ok(())
}

fn run_status() -> Result<()> {
    let conn = open_existing(&db_path())?;

    let guests = list_guests(&conn)?;
    let families = list_families(&conn)?;
    let voted = list_voter_ids(&conn)?;

    println!("📋 Estado de votación");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for (family, members) in group_by_family(&guests, &families) {
        println!("\n{}", family);
        for guest in members {
            let mark = if voted.contains(&guest.id) { "✓" } else { "✗" };
            println!("  {} {}", mark, guest.name);
        }
    }

    println!(
        "\n{} de {} invitados han votado",
        count_ballots(&conn)?,
        guests.len()
    );

    Ok(())
}

fn print_usage() {
    println!("Fiesta Voting v{}", fiesta_voting::VERSION);
    println!();
    println!("Usage:");
    println!("  fiesta-voting seed [roster.txt]   Load families and guests");
    println!("  fiesta-voting results [--json]    Print winners and turnout");
    println!("  fiesta-voting status              Per-guest voting board");
    println!();
    println!("The database path comes from FIESTA_DB (default: fiesta.db).");
}
