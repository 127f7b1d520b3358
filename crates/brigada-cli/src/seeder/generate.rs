use brigada_models::{BrigadeId, Dni, ParkId};
use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, StreetName};
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use rayon::prelude::*;

use super::{SEED_EMAIL_DOMAIN, SEED_PARK_PREFIX, SEED_PASSWORD};

/// Cheap cost so seeding thousands of users stays fast.
const SEED_BCRYPT_COST: u32 = 4;

/// First DNI number used for seeded staff.
const SEED_DNI_BASE: u32 = 90_000_000;

pub struct ParkSeed {
    pub name: String,
    pub address: String,
    pub phone: String,
}

pub struct BrigadeSeed {
    pub name: String,
    pub park_id: ParkId,
}

pub struct FirefighterSeed {
    pub first_name: String,
    pub last_name: String,
    pub dni: Dni,
    pub email: String,
    pub password_hash: String,
    pub brigade_id: BrigadeId,
    pub offered_hours: i32,
}

pub fn generate_parks(count: usize) -> Vec<ParkSeed> {
    (0..count)
        .map(|i| {
            let city: String = CityName().fake();
            let street: String = StreetName().fake();
            let number: String = BuildingNumber().fake();
            ParkSeed {
                name: format!("{} {} {}", SEED_PARK_PREFIX, city, i + 1),
                address: format!("{} {}, {}", street, number, city),
                phone: PhoneNumber().fake::<String>().chars().take(20).collect(),
            }
        })
        .collect()
}

/// "Brigada A", "Brigada B", ... then "Brigada A2" once letters run out.
pub fn brigade_names(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let letter = (b'A' + (i % 26) as u8) as char;
            match i / 26 {
                0 => format!("Brigada {}", letter),
                round => format!("Brigada {}{}", letter, round + 1),
            }
        })
        .collect()
}

fn email_local_part(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_lowercase()
}

/// Builds the crew of every brigade, hashing passwords in parallel.
pub fn generate_firefighters(
    brigades: &[BrigadeId],
    per_brigade: usize,
) -> anyhow::Result<Vec<FirefighterSeed>> {
    let slots: Vec<(usize, BrigadeId)> = brigades
        .iter()
        .flat_map(|&b| std::iter::repeat_n(b, per_brigade))
        .enumerate()
        .collect();

    slots
        .into_par_iter()
        .map(|(index, brigade_id)| -> anyhow::Result<FirefighterSeed> {
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();
            let email = format!(
                "{}.{}.{}@{}",
                email_local_part(&first_name),
                email_local_part(&last_name),
                index,
                SEED_EMAIL_DOMAIN
            );
            let password_hash = bcrypt::hash(SEED_PASSWORD, SEED_BCRYPT_COST)?;
            // Roughly a third of the crew offers hours for requirements.
            let offered_hours = if index % 3 == 0 { (4..=24).fake() } else { 0 };

            Ok(FirefighterSeed {
                first_name,
                last_name,
                dni: Dni::from_number(SEED_DNI_BASE + index as u32),
                email,
                password_hash,
                brigade_id,
                offered_hours,
            })
        })
        .collect()
}
