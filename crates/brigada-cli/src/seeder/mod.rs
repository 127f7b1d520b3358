//! Development data: parks, brigades, firefighters with their initial
//! assignments, and a guard rotation.
//!
//! Seeded rows are recognisable so `clear-seed` can remove exactly them:
//! users get an `@seed.brigada.test` address and parks a `Parque Seed`
//! name prefix.

mod generate;
mod insert;

pub use generate::{
    BrigadeSeed, FirefighterSeed, ParkSeed, brigade_names, generate_firefighters, generate_parks,
};

use chrono::{Days, NaiveDate, Utc};
use sqlx::PgPool;
use std::time::Instant;

pub const SEED_EMAIL_DOMAIN: &str = "seed.brigada.test";
pub const SEED_PARK_PREFIX: &str = "Parque Seed";
/// Password of every seeded account.
pub const SEED_PASSWORD: &str = "bombero123";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedConfig {
    pub parks: usize,
    pub brigades_per_park: usize,
    pub firefighters_per_brigade: usize,
    /// Days of guard rotation to generate, starting today
    pub days: u64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            parks: 3,
            brigades_per_park: 5,
            firefighters_per_brigade: 8,
            days: 60,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub parks: usize,
    pub brigades: usize,
    pub firefighters: usize,
    pub guards: u64,
}

pub async fn seed_all(db: &PgPool, config: &SeedConfig) -> anyhow::Result<SeedSummary> {
    let start = Instant::now();
    let today = Utc::now().date_naive();
    let mut summary = SeedSummary::default();

    let parks = generate_parks(config.parks);
    let park_ids = insert::parks(db, &parks).await?;
    summary.parks = park_ids.len();
    println!("🚒 Inserted {} parks", summary.parks);

    let brigades: Vec<BrigadeSeed> = park_ids
        .iter()
        .flat_map(|&park_id| {
            brigade_names(config.brigades_per_park)
                .into_iter()
                .map(move |name| BrigadeSeed { name, park_id })
        })
        .collect();
    let brigade_ids = insert::brigades(db, &brigades).await?;
    summary.brigades = brigade_ids.len();
    println!("👥 Inserted {} brigades", summary.brigades);

    let hashing = Instant::now();
    let firefighters = generate_firefighters(&brigade_ids, config.firefighters_per_brigade)?;
    println!(
        "🔑 Hashed {} passwords in {:?}",
        firefighters.len(),
        hashing.elapsed()
    );

    let since = today.checked_sub_days(Days::new(365)).unwrap_or(today);
    summary.firefighters = insert::firefighters(db, &firefighters, since).await?;
    println!("🧑‍🚒 Inserted {} firefighters", summary.firefighters);

    let until = today
        .checked_add_days(Days::new(config.days.saturating_sub(1)))
        .unwrap_or(NaiveDate::MAX);
    for (park_index, _) in park_ids.iter().enumerate() {
        let from = park_index * config.brigades_per_park;
        let rotation = &brigade_ids[from..from + config.brigades_per_park];
        if config.days > 0 {
            summary.guards += insert::rotation(db, rotation, today, until).await?;
        }
    }
    println!("📅 Inserted {} guards", summary.guards);

    println!("✅ Seeding finished in {:?}", start.elapsed());
    Ok(summary)
}

/// Removes seeded users and parks with everything hanging off them.
/// Hand-created rows are left alone.
pub async fn clear_all(db: &PgPool) -> anyhow::Result<()> {
    let mut tx = db.begin().await?;
    let park_filter = format!("{} %", SEED_PARK_PREFIX);

    let users = sqlx::query("DELETE FROM users WHERE email LIKE $1")
        .bind(format!("%@{}", SEED_EMAIL_DOMAIN))
        .execute(&mut *tx)
        .await?
        .rows_affected();

    sqlx::query(
        "DELETE FROM vehicles WHERE park_id IN (SELECT id FROM parks WHERE name LIKE $1)",
    )
    .bind(&park_filter)
    .execute(&mut *tx)
    .await?;

    let brigades = sqlx::query(
        "DELETE FROM brigades WHERE park_id IN (SELECT id FROM parks WHERE name LIKE $1)",
    )
    .bind(&park_filter)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let parks = sqlx::query("DELETE FROM parks WHERE name LIKE $1")
        .bind(&park_filter)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;
    println!(
        "🗑️  Deleted {} users, {} brigades and {} parks",
        users, brigades, parks
    );
    Ok(())
}
