mod common;

use common::{Gender, PEOPLE_DDL, Person, date, lannisters};
use nimble_sql::prelude::*;

#[test]
fn insert_assigns_generated_keys() -> Result<(), Box<dyn std::error::Error>> {
    let nimble = Nimble::new();
    let (_conn, people) = lannisters(&nimble)?;

    let ids: Vec<Option<i64>> = people.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
    Ok(())
}

#[test]
fn load_round_trips_every_column() -> Result<(), Box<dyn std::error::Error>> {
    let nimble = Nimble::new();
    let (mut conn, people) = lannisters(&nimble)?;

    let tyrion = conn.load::<Person>(1_i64)?.ok_or("Tyrion not found")?;
    assert_eq!(tyrion, people[0]);
    assert_eq!(tyrion.gender, Some(Gender::Male));
    assert_eq!(tyrion.birth_date, Some(date(1955, 6, 7)));

    let cercei = conn.load::<Person>(3_i64)?.ok_or("Cercei not found")?;
    assert_eq!(cercei.birth_date, None);
    assert_eq!(cercei.gender, Some(Gender::Female));

    assert!(conn.load::<Person>(99_i64)?.is_none());
    Ok(())
}

#[test]
fn ignored_fields_are_not_persisted() -> Result<(), Box<dyn std::error::Error>> {
    let nimble = Nimble::new();
    let mut conn = nimble.open_sqlite_in_memory()?;
    conn.execute_batch(PEOPLE_DDL)?;

    let mut imp = Person::new("Tyrion", Gender::Male, None);
    imp.nickname = "the Imp".to_string();
    conn.insert(&mut imp)?;

    let loaded = conn.load::<Person>(imp.id)?.ok_or("missing row")?;
    assert_eq!(loaded.nickname, "");
    assert_eq!(loaded.first_name, "Tyrion");
    Ok(())
}

#[test]
fn update_writes_columns_by_identifier() -> Result<(), Box<dyn std::error::Error>> {
    let nimble = Nimble::new();
    let (mut conn, mut people) = lannisters(&nimble)?;

    let jaime = &mut people[1];
    jaime.last_name = "of House Lannister".to_string();
    jaime.birth_date = None;
    let outcome = conn.update(jaime)?;
    assert_eq!(outcome.rows_affected, 1);

    let loaded = conn.load::<Person>(2_i64)?.ok_or("Jaime not found")?;
    assert_eq!(loaded.last_name, "of House Lannister");
    assert_eq!(loaded.birth_date, None);

    let untouched = conn.load::<Person>(1_i64)?.ok_or("Tyrion not found")?;
    assert_eq!(untouched.last_name, "Lannister");
    Ok(())
}

#[test]
fn update_without_identifier_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let nimble = Nimble::new();
    let mut conn = nimble.open_sqlite_in_memory()?;
    conn.execute_batch(PEOPLE_DDL)?;

    let unsaved = Person::new("Tywin", Gender::Male, None);
    let err = conn.update(&unsaved).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = conn.delete(&unsaved).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    Ok(())
}

#[test]
fn delete_removes_the_identified_row() -> Result<(), Box<dyn std::error::Error>> {
    let nimble = Nimble::new();
    let (mut conn, people) = lannisters(&nimble)?;

    assert_eq!(conn.delete(&people[2])?.rows_affected, 1);
    assert!(conn.load::<Person>(3_i64)?.is_none());

    assert_eq!(conn.delete_by_id::<Person>(1_i64)?.rows_affected, 1);
    assert_eq!(conn.delete_by_id::<Person>(1_i64)?.rows_affected, 0);

    let remaining: i64 = conn.query("select count(*) from people").fetch_value_as()?;
    assert_eq!(remaining, 1);
    Ok(())
}

#[test]
fn execute_for_binds_from_the_entity_and_applies_the_key() -> Result<(), Box<dyn std::error::Error>> {
    let nimble = Nimble::new();
    let mut conn = nimble.open_sqlite_in_memory()?;
    conn.execute_batch(PEOPLE_DDL)?;

    let mut tywin = Person::new("Tywin", Gender::Male, Some(date(1920, 1, 1)));
    let outcome = conn.execute_for(
        "insert into people (given_name, last_name, gender, birth_date) \
         values (:first_name, :last_name, :gender, :birth_date)",
        &mut tywin,
    )?;
    assert_eq!(outcome.generated_key, Some(Value::Long(1)));
    assert_eq!(tywin.id, Some(1));

    let loaded = conn.load::<Person>(1_i64)?.ok_or("Tywin not found")?;
    assert_eq!(loaded, tywin);
    Ok(())
}

#[test]
fn file_backed_database_survives_reopen() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("people.db");
    let nimble = Nimble::new();

    {
        let mut conn = nimble.open_sqlite(&path)?;
        conn.execute_batch(PEOPLE_DDL)?;
        let mut tyrion = Person::new("Tyrion", Gender::Male, Some(date(1955, 6, 7)));
        conn.insert(&mut tyrion)?;
    }

    let mut conn = nimble.open_sqlite(&path)?;
    let tyrion = conn.load::<Person>(1_i64)?.ok_or("Tyrion not found")?;
    assert_eq!(tyrion.first_name, "Tyrion");
    assert_eq!(tyrion.birth_date, Some(date(1955, 6, 7)));
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Entity)]
#[nimble(table = "houses")]
struct House {
    #[nimble(id)]
    code: String,
    name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Entity)]
#[nimble(table = "sigils")]
struct Sigil {
    id: Option<i64>,
    beast: String,
}

#[test]
fn supplied_keys_are_not_replaced_by_the_rowid() -> Result<(), Box<dyn std::error::Error>> {
    let nimble = Nimble::new();
    let mut conn = nimble.open_sqlite_in_memory()?;
    conn.execute_batch("create table houses (code text primary key, name text not null)")?;

    let mut lannister = House {
        code: "LAN".into(),
        name: "Lannister".into(),
    };
    let outcome = conn.insert(&mut lannister)?;
    assert_eq!(outcome.rows_affected, 1);
    assert_eq!(lannister.code, "LAN");

    let loaded = conn.load::<House>("LAN")?.ok_or("house not found")?;
    assert_eq!(loaded, lannister);

    let mut stark = House {
        code: "STA".into(),
        name: "Stark".into(),
    };
    conn.execute_for("insert into houses (code, name) values (:code, :name)", &mut stark)?;
    assert_eq!(stark.code, "STA");
    Ok(())
}

#[test]
fn untagged_id_takes_the_generated_key_only_while_null() -> Result<(), Box<dyn std::error::Error>> {
    let nimble = Nimble::new();
    let mut conn = nimble.open_sqlite_in_memory()?;
    conn.execute_batch("create table sigils (id integer primary key, beast text not null)")?;

    let mut lion = Sigil {
        id: None,
        beast: "lion".into(),
    };
    conn.insert(&mut lion)?;
    assert_eq!(lion.id, Some(1));

    let mut wolf = Sigil {
        id: Some(10),
        beast: "direwolf".into(),
    };
    conn.execute_for("insert into sigils (id, beast) values (:id, :beast)", &mut wolf)?;
    assert_eq!(wolf.id, Some(10));

    let loaded = conn.load::<Sigil>(10_i64)?.ok_or("sigil not found")?;
    assert_eq!(loaded, wolf);
    Ok(())
}
