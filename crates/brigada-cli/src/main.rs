use anyhow::Context;
use brigada_cli::chief::{NewChief, create_chief};
use brigada_cli::seeder::{self, SeedConfig};
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;

#[derive(Parser)]
#[command(name = "brigada-cli")]
#[command(about = "Brigada CLI - administration and seeding tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a chief (jefe) account. Missing fields are prompted for.
    CreateChief {
        #[arg(short = 'f', long)]
        first_name: Option<String>,
        #[arg(short = 'l', long)]
        last_name: Option<String>,
        /// DNI or NIE, e.g. 12345678Z
        #[arg(short = 'd', long)]
        dni: Option<String>,
        #[arg(short = 'e', long)]
        email: Option<String>,
        /// Prompted securely when omitted
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Seed parks, brigades, firefighters and a guard rotation
    Seed {
        #[arg(long, default_value_t = 3)]
        parks: usize,
        /// Brigades per park
        #[arg(long, default_value_t = 5)]
        brigades: usize,
        /// Firefighters per brigade
        #[arg(long, default_value_t = 8)]
        firefighters: usize,
        /// Days of guards to generate from today
        #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(0..=366))]
        days: u64,
    },
    /// Delete seeded users, parks and everything attached to them
    ClearSeed,
}

fn prompt(value: Option<String>, label: &str) -> anyhow::Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Input::new()
            .with_prompt(label)
            .interact_text()
            .with_context(|| format!("failed to read {}", label.to_lowercase())),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    brigada_observability::init_basic_console_logging();

    let cli = Cli::parse();
    let pool = brigada_db::init_db_pool()
        .await
        .context("failed to connect to database")?;

    match cli.command {
        Commands::CreateChief {
            first_name,
            last_name,
            dni,
            email,
            password,
        } => {
            let first_name = prompt(first_name, "First name")?;
            let last_name = prompt(last_name, "Last name")?;
            let dni = prompt(dni, "DNI/NIE")?;
            let email = prompt(email, "Email address")?;
            let password = match password {
                Some(p) => p,
                None => Password::new()
                    .with_prompt("Password")
                    .with_confirmation("Confirm password", "Passwords don't match")
                    .interact()
                    .context("failed to read password")?,
            };

            let chief = NewChief::parse(&first_name, &last_name, &dni, &email, &password)?;
            create_chief(&pool, &chief).await?;
            println!("\n✅ Chief created: {} {} <{}>", chief.first_name, chief.last_name, chief.email);
        }
        Commands::Seed {
            parks,
            brigades,
            firefighters,
            days,
        } => {
            let config = SeedConfig {
                parks,
                brigades_per_park: brigades,
                firefighters_per_brigade: firefighters,
                days,
            };
            seeder::seed_all(&pool, &config)
                .await
                .context("seeding failed; run `clear-seed` before seeding again")?;
        }
        Commands::ClearSeed => seeder::clear_all(&pool).await?,
    }

    Ok(())
}
