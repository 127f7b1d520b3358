use brigada_models::guards::{GuardShift, rotation_plan};
use brigada_models::{BrigadeId, DateRange, ParkId, UserId};
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::generate::{BrigadeSeed, FirefighterSeed, ParkSeed};

/// Rows per multi-value INSERT, kept well under the 65535 bind limit.
const CHUNK: usize = 1000;

pub async fn parks(db: &PgPool, parks: &[ParkSeed]) -> anyhow::Result<Vec<ParkId>> {
    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(parks.len());

    for chunk in parks.chunks(CHUNK) {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO parks (name, address, phone) ");
        qb.push_values(chunk, |mut row, park| {
            row.push_bind(&park.name)
                .push_bind(&park.address)
                .push_bind(&park.phone);
        });
        qb.push(" RETURNING id");
        ids.extend(qb.build_query_scalar::<ParkId>().fetch_all(&mut *tx).await?);
    }

    tx.commit().await?;
    Ok(ids)
}

pub async fn brigades(db: &PgPool, brigades: &[BrigadeSeed]) -> anyhow::Result<Vec<BrigadeId>> {
    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(brigades.len());

    for chunk in brigades.chunks(CHUNK) {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO brigades (name, park_id) ");
        qb.push_values(chunk, |mut row, brigade| {
            row.push_bind(&brigade.name).push_bind(brigade.park_id);
        });
        qb.push(" RETURNING id");
        ids.extend(qb.build_query_scalar::<BrigadeId>().fetch_all(&mut *tx).await?);
    }

    tx.commit().await?;
    Ok(ids)
}

/// Inserts the users and an initial transfer into their brigade starting
/// on `since`.
pub async fn firefighters(
    db: &PgPool,
    crew: &[FirefighterSeed],
    since: NaiveDate,
) -> anyhow::Result<usize> {
    let mut tx = db.begin().await?;
    let mut inserted = 0;

    for chunk in crew.chunks(CHUNK) {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO users (first_name, last_name, dni, email, password, role, offered_hours, offered_at) ",
        );
        qb.push_values(chunk, |mut row, f| {
            row.push_bind(&f.first_name)
                .push_bind(&f.last_name)
                .push_bind(&f.dni)
                .push_bind(&f.email)
                .push_bind(&f.password_hash)
                .push("'bombero'")
                .push_bind(f.offered_hours)
                .push_bind((f.offered_hours > 0).then_some(since));
        });
        qb.push(" RETURNING id");
        let ids: Vec<UserId> = qb.build_query_scalar().fetch_all(&mut *tx).await?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO firefighter_assignments (user_id, brigade_destination_id, start_date, reason) ",
        );
        qb.push_values(ids.iter().zip(chunk), |mut row, (id, f)| {
            row.push_bind(*id)
                .push_bind(f.brigade_id)
                .push_bind(since)
                .push("'traslado'");
        });
        qb.build().execute(&mut *tx).await?;

        inserted += ids.len();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// Writes one full-day guard per day cycling through `brigades`. Existing
/// guards are kept.
pub async fn rotation(
    db: &PgPool,
    brigades: &[BrigadeId],
    from: NaiveDate,
    to: NaiveDate,
) -> anyhow::Result<u64> {
    let plan = rotation_plan(brigades, DateRange::new(from, to)?);
    if plan.is_empty() {
        return Ok(0);
    }

    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO guards (brigade_id, date, shift) ");
    qb.push_values(&plan, |mut row, guard| {
        row.push_bind(guard.brigade_id)
            .push_bind(guard.date)
            .push_bind(GuardShift::DiaCompleto);
    });
    qb.push(" ON CONFLICT (brigade_id, date, shift) DO NOTHING");

    Ok(qb.build().execute(db).await?.rows_affected())
}
