#![allow(dead_code)]

use std::sync::Once;

use chrono::NaiveDate;
use nimble_sql::prelude::*;

static INIT_LOGGER: Once = Once::new();

/// `NIMBLE_TEST_LOG=debug` shows the rewritten SQL of every statement.
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let level = match std::env::var("NIMBLE_TEST_LOG").as_deref() {
            Ok("trace") => tracing::Level::TRACE,
            Ok("debug") => tracing::Level::DEBUG,
            _ => tracing::Level::WARN,
        };
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .try_init();
    });
}

pub const PEOPLE_DDL: &str = "
    CREATE TABLE people (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        given_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        gender TEXT,
        birth_date TEXT
    );";

#[derive(Debug, Clone, Copy, PartialEq, Eq, SqlEnum)]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Default, PartialEq, Entity)]
#[nimble(table = "people")]
pub struct Person {
    #[nimble(id(generated))]
    pub id: Option<i64>,
    #[nimble(column = "given_name")]
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    #[nimble(ignore)]
    pub nickname: String,
}

impl Person {
    pub fn new(first_name: &str, gender: Gender, birth_date: Option<NaiveDate>) -> Self {
        Self {
            id: None,
            first_name: first_name.to_string(),
            last_name: "Lannister".to_string(),
            gender: Some(gender),
            birth_date,
            nickname: String::new(),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

/// In-memory database with the people table and the three Lannister siblings.
pub fn lannisters(nimble: &Nimble) -> Result<(NbConnection, Vec<Person>), NimbleError> {
    init_test_logging();
    let mut conn = nimble.open_sqlite_in_memory()?;
    conn.execute_batch(PEOPLE_DDL)?;

    let mut people = vec![
        Person::new("Tyrion", Gender::Male, Some(date(1955, 6, 7))),
        Person::new("Jaime", Gender::Male, Some(date(1950, 11, 20))),
        Person::new("Cercei", Gender::Female, None),
    ];
    for person in &mut people {
        conn.insert(person)?;
    }
    Ok((conn, people))
}
