//! Demo federation seed script
//!
//! Seeds a development database with a small federation spanning two seasons:
//! - 5 clubs across BC, AB and QC, plus one club with no PTSO
//! - 5 levels
//! - coaches, parents (one with the legacy `guardian` role), skiers and club admins
//! - coach evaluations and drill shares attributed to each coach's club
//!
//! Missing tables are created. Rows in the demo id ranges are replaced on every run.
//!
//! Usage:
//!   DATABASE_URL=... ./seed-demo [--first-season 2023] [--seasons 2]

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use sqlx::{Postgres, Transaction};

use strive_dashboard::{config::Config, db};

const CLUB_BASE: i64 = 9000;
const LEVEL_BASE: i64 = 9100;
const USER_BASE: i64 = 90_000;
const USER_LAST: i64 = 99_999;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS clubs (
    id    BIGINT PRIMARY KEY,
    name  TEXT NOT NULL,
    ptso  TEXT
);
CREATE TABLE IF NOT EXISTS levels (
    id          BIGINT PRIMARY KEY,
    name        TEXT NOT NULL,
    sort_order  INT
);
CREATE TABLE IF NOT EXISTS users (
    id             BIGINT PRIMARY KEY,
    firstname      TEXT,
    lastname       TEXT,
    email          TEXT,
    role           TEXT NOT NULL,
    club_id        BIGINT REFERENCES clubs(id),
    created_at     TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    active         BOOLEAN NOT NULL DEFAULT TRUE,
    current_level  BIGINT
);
CREATE TABLE IF NOT EXISTS coach_rankings (
    id          BIGSERIAL PRIMARY KEY,
    coach_id    BIGINT REFERENCES users(id),
    skier_id    BIGINT REFERENCES users(id),
    level_id    BIGINT REFERENCES levels(id),
    passed      BOOLEAN NOT NULL DEFAULT FALSE,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE TABLE IF NOT EXISTS share_drills (
    id          BIGSERIAL PRIMARY KEY,
    coach_id    BIGINT REFERENCES users(id),
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;

struct DemoClub {
    name: &'static str,
    ptso: Option<&'static str>,
    coaches: usize,
    parents: usize,
    skiers: usize,
}

const CLUBS: [DemoClub; 5] = [
    DemoClub { name: "Whistler Mountain Ski Club", ptso: Some("BC"), coaches: 3, parents: 4, skiers: 8 },
    DemoClub { name: "Grouse Mountain Racers", ptso: Some("BC"), coaches: 2, parents: 2, skiers: 5 },
    DemoClub { name: "Nakiska Alpine", ptso: Some("AB"), coaches: 2, parents: 3, skiers: 6 },
    DemoClub { name: "Mont-Tremblant Ski Club", ptso: Some("QC"), coaches: 1, parents: 2, skiers: 3 },
    // Parents only: shows up as an inactive club.
    DemoClub { name: "Northern Lights Ski Club", ptso: None, coaches: 0, parents: 2, skiers: 0 },
];

const LEVELS: [&str; 5] = ["Snow Star 1", "Snow Star 2", "Snow Star 3", "Snow Star 4", "Racer"];

const FIRST_NAMES: [&str; 8] = ["Ana", "Liam", "Chloé", "Noah", "Maya", "Owen", "Zoé", "Ethan"];
const LAST_NAMES: [&str; 6] = ["Roy", "Tremblay", "Nguyen", "MacLeod", "Singh", "Gagnon"];

#[derive(Parser)]
#[command(name = "seed-demo", about = "Populate a development database with a demo federation")]
struct Args {
    /// Start year of the oldest seeded season
    #[arg(long, default_value_t = 2023)]
    first_season: i32,
    /// Number of consecutive seasons to seed
    #[arg(long, default_value_t = 2)]
    seasons: i32,
}

fn at(year: i32, month: u32, day: u32) -> Result<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .map(|dt| dt.and_utc())
        .with_context(|| format!("Invalid demo date {year}-{month}-{day}"))
}

struct Seeder<'a> {
    tx: Transaction<'a, Postgres>,
    next_user: i64,
    users: usize,
    rankings: usize,
    drills: usize,
}

impl Seeder<'_> {
    async fn user(
        &mut self,
        role: &str,
        club_id: i64,
        created_at: DateTime<Utc>,
        current_level: Option<i64>,
    ) -> Result<i64> {
        self.next_user += 1;
        let id = self.next_user;
        let n = id as usize;
        let first = FIRST_NAMES[n % FIRST_NAMES.len()];
        let last = LAST_NAMES[(n / FIRST_NAMES.len()) % LAST_NAMES.len()];

        sqlx::query(
            "INSERT INTO users (id, firstname, lastname, email, role, club_id, created_at, active, current_level)
             VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8)",
        )
        .bind(id)
        .bind(first)
        .bind(last)
        .bind(format!("{}.{}.{}@demo.strive.test", first.to_lowercase(), last.to_lowercase(), id))
        .bind(role)
        .bind(club_id)
        .bind(created_at)
        .bind(current_level)
        .execute(&mut *self.tx)
        .await
        .with_context(|| format!("Failed to insert {role} {id}"))?;

        self.users += 1;
        Ok(id)
    }

    async fn ranking(
        &mut self,
        coach_id: i64,
        skier_id: i64,
        level_id: i64,
        passed: bool,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO coach_rankings (coach_id, skier_id, level_id, passed, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(coach_id)
        .bind(skier_id)
        .bind(level_id)
        .bind(passed)
        .bind(created_at)
        .execute(&mut *self.tx)
        .await
        .context("Failed to insert coach ranking")?;
        self.rankings += 1;
        Ok(())
    }

    async fn drill(&mut self, coach_id: i64, created_at: DateTime<Utc>) -> Result<()> {
        sqlx::query("INSERT INTO share_drills (coach_id, created_at) VALUES ($1, $2)")
            .bind(coach_id)
            .bind(created_at)
            .execute(&mut *self.tx)
            .await
            .context("Failed to insert drill share")?;
        self.drills += 1;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    println!("=== Seed Demo Federation ===");

    let config = Config::database_from_env()?;
    let pool = db::create_pool(&config)
        .await
        .context("Failed to connect to database")?;

    // 1. Tables
    println!("Ensuring tables exist...");
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(&pool)
        .await
        .context("Failed to create demo tables")?;

    let tx = pool.begin().await?;
    let mut seeder = Seeder { tx, next_user: USER_BASE, users: 0, rankings: 0, drills: 0 };

    // 2. Clean previous demo rows
    println!("Cleaning previous demo data...");
    for table in ["share_drills", "coach_rankings"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE coach_id BETWEEN $1 AND $2"))
            .bind(USER_BASE)
            .bind(USER_LAST)
            .execute(&mut *seeder.tx)
            .await
            .with_context(|| format!("Failed to clean {table}"))?;
    }
    sqlx::query("DELETE FROM users WHERE id BETWEEN $1 AND $2")
        .bind(USER_BASE)
        .bind(USER_LAST)
        .execute(&mut *seeder.tx)
        .await
        .context("Failed to clean users")?;
    sqlx::query("DELETE FROM clubs WHERE id BETWEEN $1 AND $2")
        .bind(CLUB_BASE)
        .bind(CLUB_BASE + 99)
        .execute(&mut *seeder.tx)
        .await
        .context("Failed to clean clubs")?;

    // 3. Reference data
    println!("Creating clubs and levels...");
    for (i, club) in CLUBS.iter().enumerate() {
        sqlx::query("INSERT INTO clubs (id, name, ptso) VALUES ($1, $2, $3)")
            .bind(CLUB_BASE + 1 + i as i64)
            .bind(club.name)
            .bind(club.ptso)
            .execute(&mut *seeder.tx)
            .await
            .with_context(|| format!("Failed to insert club {}", club.name))?;
    }
    for (i, name) in LEVELS.iter().enumerate() {
        sqlx::query(
            "INSERT INTO levels (id, name, sort_order) VALUES ($1, $2, $3)
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, sort_order = EXCLUDED.sort_order",
        )
        .bind(LEVEL_BASE + 1 + i as i64)
        .bind(*name)
        .bind(i as i32 + 1)
        .execute(&mut *seeder.tx)
        .await
        .with_context(|| format!("Failed to upsert level {name}"))?;
    }

    // 4. Members and activity, one pass per season
    for offset in 0..args.seasons {
        let year = args.first_season + offset;
        println!("Seeding season {}/{}...", year, year + 1);

        for (ci, club) in CLUBS.iter().enumerate() {
            let club_id = CLUB_BASE + 1 + ci as i64;
            let day = 1 + ci as u32;

            if offset == 0 {
                seeder.user("club_admin", club_id, at(year, 7, day)?, None).await?;
            }

            let mut coaches = Vec::new();
            for k in 0..club.coaches {
                coaches.push(seeder.user("coach", club_id, at(year, 8, day + k as u32)?, None).await?);
            }

            for k in 0..club.parents {
                // Keep one legacy spelling in the data set.
                let role = if k == 0 && ci == 0 { "guardian" } else { "parent" };
                seeder.user(role, club_id, at(year, 10, day + k as u32)?, None).await?;
            }

            let mut skiers = Vec::new();
            for k in 0..club.skiers {
                // Half the skiers join after New Year; they still belong to this season.
                let joined = if k % 2 == 0 {
                    at(year, 11, day + k as u32)?
                } else {
                    at(year + 1, 1, day + k as u32)?
                };
                let level = LEVEL_BASE + 1 + ((k + ci) % LEVELS.len()) as i64;
                skiers.push((seeder.user("skier", club_id, joined, Some(level)).await?, level));
            }

            for (c, coach_id) in coaches.iter().enumerate() {
                for (s, (skier_id, level)) in skiers.iter().enumerate() {
                    let passed = (s + c + offset as usize) % 3 != 0;
                    let when = at(year + 1, 2, 1 + ((s + c) % 27) as u32)?;
                    seeder.ranking(*coach_id, *skier_id, *level, passed, when).await?;
                }
                for d in 0..=ci {
                    seeder.drill(*coach_id, at(year, 12, 1 + d as u32)?).await?;
                }
            }
        }
    }

    let Seeder { tx, users, rankings, drills, .. } = seeder;
    tx.commit().await.context("Failed to commit demo data")?;

    println!(
        "Done: {} clubs, {} users, {} evaluations, {} drill shares",
        CLUBS.len(),
        users,
        rankings,
        drills
    );
    println!("Run `strive-admin install-views` to refresh the reporting views.");

    Ok(())
}
