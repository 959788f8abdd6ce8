mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::Person;
use nimble_sql::prelude::*;

#[derive(Debug, Default)]
struct Log {
    statements: Vec<String>,
    bound: Vec<Vec<Value>>,
}

/// Driver that answers every query with the same rows and records what it saw.
struct ScriptedConnection {
    rows: BufferedCursor,
    log: Rc<RefCell<Log>>,
}

struct ScriptedStatement {
    rows: BufferedCursor,
    log: Rc<RefCell<Log>>,
}

impl Connection for ScriptedConnection {
    fn prepare(
        &mut self,
        sql: &str,
        _return_generated_keys: bool,
    ) -> Result<Box<dyn Statement + '_>, NimbleError> {
        let mut log = self.log.borrow_mut();
        log.statements.push(sql.to_string());
        log.bound.push(Vec::new());
        Ok(Box::new(ScriptedStatement {
            rows: self.rows.clone(),
            log: Rc::clone(&self.log),
        }))
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), NimbleError> {
        self.log.borrow_mut().statements.push(sql.to_string());
        Ok(())
    }
}

impl Statement for ScriptedStatement {
    fn bind(&mut self, index: usize, value: &Value) -> Result<(), NimbleError> {
        let mut log = self.log.borrow_mut();
        let bound = log
            .bound
            .last_mut()
            .ok_or_else(|| NimbleError::DriverError("bind before prepare".into()))?;
        assert_eq!(index, bound.len() + 1, "markers are bound in order");
        bound.push(value.clone());
        Ok(())
    }

    fn execute_query(&mut self) -> Result<Box<dyn Cursor + '_>, NimbleError> {
        Ok(Box::new(self.rows.clone()))
    }

    fn execute_update(&mut self) -> Result<usize, NimbleError> {
        Ok(1)
    }

    fn generated_keys(&mut self) -> Result<Box<dyn Cursor + '_>, NimbleError> {
        Ok(Box::new(BufferedCursor::single("id", Value::Long(42))))
    }
}

fn scripted(nimble: &Nimble, rows: BufferedCursor) -> (NbConnection, Rc<RefCell<Log>>) {
    let log = Rc::new(RefCell::new(Log::default()));
    let conn = nimble.connect(ScriptedConnection {
        rows,
        log: Rc::clone(&log),
    });
    (conn, log)
}

fn two_tyrions() -> BufferedCursor {
    BufferedCursor::new(
        vec!["id".into(), "given_name".into()],
        vec![
            vec![Value::Long(1), Value::Text("Tyrion".into())],
            vec![Value::Long(1), Value::Text("Tyrion".into())],
        ],
    )
}

#[test]
fn load_with_duplicate_identifiers_is_a_cardinality_error() -> Result<(), Box<dyn std::error::Error>> {
    let nimble = Nimble::new();
    let (mut conn, log) = scripted(&nimble, two_tyrions());

    let err = conn.load::<Person>(1_i64).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cardinality);

    let log = log.borrow();
    assert_eq!(log.statements, vec!["SELECT * FROM people WHERE id=?"]);
    assert_eq!(log.bound, vec![vec![Value::Long(1)]]);
    Ok(())
}

#[test]
fn dollar_markers_number_expanded_lists() -> Result<(), Box<dyn std::error::Error>> {
    let nimble = Nimble::builder()
        .placeholder_style(PlaceholderStyle::Dollar)
        .build();
    let (mut conn, log) = scripted(&nimble, BufferedCursor::default());

    let rows = conn
        .query("select * from people where last_name = :last and id in (:ids) and last_name <> :last")
        .param("last", "Lannister")
        .param("ids", vec![3_i64, 5, 8])
        .fetch_rows()?;
    assert!(rows.is_empty());

    let log = log.borrow();
    assert_eq!(
        log.statements,
        vec!["select * from people where last_name = $1 and id in ($2,$3,$4) and last_name <> $5"]
    );
    assert_eq!(
        log.bound[0],
        vec![
            Value::Text("Lannister".into()),
            Value::Long(3),
            Value::Long(5),
            Value::Long(8),
            Value::Text("Lannister".into()),
        ]
    );
    Ok(())
}

#[test]
fn insert_applies_the_driver_key() -> Result<(), Box<dyn std::error::Error>> {
    let nimble = Nimble::new();
    let (mut conn, log) = scripted(&nimble, BufferedCursor::default());

    let mut tyrion = Person {
        first_name: "Tyrion".into(),
        last_name: "Lannister".into(),
        ..Person::default()
    };
    let outcome = conn.insert(&mut tyrion)?;
    assert_eq!(outcome.rows_affected, 1);
    assert_eq!(outcome.generated_key_as::<i64>(conn.registry())?, Some(42));
    assert_eq!(tyrion.id, Some(42));

    let log = log.borrow();
    assert_eq!(
        log.statements,
        vec!["INSERT INTO people (given_name, last_name, gender, birth_date) VALUES (?, ?, ?, ?)"]
    );
    assert_eq!(
        log.bound[0],
        vec![
            Value::Text("Tyrion".into()),
            Value::Text("Lannister".into()),
            Value::Null,
            Value::Null,
        ]
    );
    Ok(())
}
