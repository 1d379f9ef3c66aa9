use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use corm::{
    reflector, statement, Dialect, Entity, MappingError, MySql, PostgreSql, Row, Sqlite, StatementKind, Value,
};

#[derive(Entity, Debug, Clone, Default)]
#[corm(table = "travel", title = "Travels")]
struct Travel {
    #[corm(primary_key, auto_generated)]
    id: Option<i32>,
    #[corm(listed, label = "Name")]
    name: String,
    date_ini: Option<NaiveDate>,
}

#[derive(Entity, Debug, Clone, Default)]
#[corm(table = "enrollment")]
struct Enrollment {
    #[corm(primary_key, foreign_key = "student::id")]
    student_id: i64,
    #[corm(primary_key, foreign_key = "course::id")]
    course_id: i64,
    #[corm(sort = "desc")]
    grade: f64,
    #[corm(sort = "asc")]
    passed: bool,
}

#[derive(Entity, Debug, Clone, Default)]
#[corm(table = "audit_log")]
struct AuditLog {
    message: String,
}

#[derive(Entity, Debug, Clone, Default)]
#[corm(table = "user")]
struct Account {
    #[corm(primary_key)]
    id: i32,
    #[corm(column = "order")]
    position: i32,
    #[corm(read_only)]
    created: Option<NaiveDate>,
    #[corm(derived)]
    display: String,
}

#[derive(Entity, Debug, Clone, Default)]
#[corm(table = "photo")]
struct Photo {
    #[corm(primary_key)]
    id: i32,
    data: Vec<u8>,
}

#[derive(Entity, Debug, Clone, Default)]
#[corm(table = "counter")]
struct Counter {
    #[corm(primary_key, auto_generated)]
    id: Option<i64>,
}

#[derive(Entity, Debug, Clone, Default)]
#[corm(table = "odd")]
struct Odd {
    #[corm(primary_key)]
    id: i32,
    #[corm(kind = "integer")]
    code: String,
}

#[derive(Entity, Debug, Clone, Default, PartialEq)]
#[corm(table = "event")]
struct Event {
    #[corm(primary_key)]
    id: i32,
    at: DateTime<Utc>,
    ends: Option<DateTime<Utc>>,
}

fn trip() -> Travel {
    Travel { id: None, name: "Trip".to_string(), date_ini: NaiveDate::from_ymd_opt(2024, 5, 1) }
}

#[test]
fn insert_skips_generated_key_and_keeps_declaration_order() -> Result<(), Box<dyn std::error::Error>> {
    let mapping = reflector::resolve::<Travel>()?;
    let insert = statement::build_insert(&mapping, &trip(), &Sqlite)?;

    assert_eq!(insert.kind(), StatementKind::Insert);
    assert_eq!(insert.sql(), "INSERT INTO travel (name, date_ini) VALUES ('Trip', '2024/05/01')");
    assert_eq!(insert.parameterized_sql(), "INSERT INTO travel (name, date_ini) VALUES (?, ?)");
    assert_eq!(insert.params().len(), 2);
    Ok(())
}

#[test]
fn insert_renders_null_for_missing_values() -> Result<(), Box<dyn std::error::Error>> {
    let mapping = reflector::resolve::<Travel>()?;
    let travel = Travel { date_ini: None, ..trip() };
    let insert = statement::build_insert(&mapping, &travel, &PostgreSql)?;

    assert_eq!(insert.sql(), "INSERT INTO travel (name, date_ini) VALUES ('Trip', NULL)");
    assert_eq!(insert.parameterized_sql(), "INSERT INTO travel (name, date_ini) VALUES ($1, NULL)");
    assert_eq!(insert.params(), &[Value::Text("Trip".to_string())]);
    Ok(())
}

#[test]
fn postgres_casts_date_parameters() -> Result<(), Box<dyn std::error::Error>> {
    let mapping = reflector::resolve::<Travel>()?;
    let insert = statement::build_insert(&mapping, &trip(), &PostgreSql)?;

    assert_eq!(insert.sql(), "INSERT INTO travel (name, date_ini) VALUES ('Trip', '2024/05/01')");
    assert_eq!(insert.parameterized_sql(), "INSERT INTO travel (name, date_ini) VALUES ($1, CAST($2 AS DATE))");
    Ok(())
}

#[test]
fn update_doubles_quotes_and_filters_by_key() -> Result<(), Box<dyn std::error::Error>> {
    let mapping = reflector::resolve::<Travel>()?;
    let travel = Travel { id: Some(7), name: "O'Brien".to_string(), date_ini: None };
    let update = statement::build_update(&mapping, &travel, &Sqlite)?;

    assert_eq!(update.sql(), "UPDATE travel SET name = 'O''Brien' WHERE id = 7");
    assert_eq!(update.parameterized_sql(), "UPDATE travel SET name = ? WHERE id = ?");
    assert_eq!(update.params(), &[Value::Text("O'Brien".to_string()), Value::Integer(7)]);
    Ok(())
}

#[test]
fn keyed_statements_require_a_key_value() -> Result<(), Box<dyn std::error::Error>> {
    let mapping = reflector::resolve::<Travel>()?;

    let update = statement::build_update(&mapping, &trip(), &Sqlite);
    assert!(matches!(update, Err(MappingError::KeyNotSet { ref column, .. }) if column == "id"));

    let delete = statement::build_delete(&mapping, &trip(), &Sqlite);
    assert!(matches!(delete, Err(MappingError::KeyNotSet { .. })));
    Ok(())
}

#[test]
fn keyed_statements_require_a_primary_key() -> Result<(), Box<dyn std::error::Error>> {
    let mapping = reflector::resolve::<AuditLog>()?;
    let log = AuditLog { message: "started".to_string() };

    assert!(matches!(statement::build_update(&mapping, &log, &Sqlite), Err(MappingError::NoPrimaryKey { .. })));
    assert!(matches!(statement::build_delete(&mapping, &log, &Sqlite), Err(MappingError::NoPrimaryKey { .. })));
    assert!(matches!(
        statement::build_select_by_key(&mapping, &log, &Sqlite),
        Err(MappingError::NoPrimaryKey { .. })
    ));

    // Inserting and listing do not need a key.
    let insert = statement::build_insert(&mapping, &log, &Sqlite)?;
    assert_eq!(insert.sql(), "INSERT INTO audit_log (message) VALUES ('started')");
    assert_eq!(statement::build_select_all(&mapping, true, &Sqlite).sql(), "SELECT message FROM audit_log");
    Ok(())
}

#[test]
fn composite_keys_follow_declaration_order() -> Result<(), Box<dyn std::error::Error>> {
    let mapping = reflector::resolve::<Enrollment>()?;
    let enrollment = Enrollment { student_id: 1, course_id: 2, grade: 9.5, passed: true };

    let delete = statement::build_delete(&mapping, &enrollment, &Sqlite)?;
    assert_eq!(delete.sql(), "DELETE FROM enrollment WHERE student_id = 1 AND course_id = 2");

    let update = statement::build_update(&mapping, &enrollment, &Sqlite)?;
    assert_eq!(
        update.sql(),
        "UPDATE enrollment SET grade = 9.5, passed = '1' WHERE student_id = 1 AND course_id = 2"
    );

    let key: Vec<&str> = mapping.primary_key_columns().iter().map(|column| column.column_name).collect();
    assert_eq!(key, ["student_id", "course_id"]);
    assert_eq!(mapping.column("course_id").and_then(|column| column.foreign_key.as_ref()).map(|fk| fk.table), Some("course"));
    Ok(())
}

#[test]
fn select_lists_columns_and_sorts() -> Result<(), Box<dyn std::error::Error>> {
    let travel = reflector::resolve::<Travel>()?;
    assert_eq!(statement::build_select_all(&travel, true, &Sqlite).sql(), "SELECT id, name, date_ini FROM travel");
    // Listing keeps the key so rows stay identifiable.
    assert_eq!(statement::build_select_all(&travel, false, &Sqlite).sql(), "SELECT id, name FROM travel");

    let enrollment = reflector::resolve::<Enrollment>()?;
    let select = statement::build_select_all(&enrollment, true, &Sqlite);
    assert_eq!(select.kind(), StatementKind::Select);
    assert_eq!(
        select.sql(),
        "SELECT student_id, course_id, grade, passed FROM enrollment ORDER BY grade DESC, passed ASC"
    );
    Ok(())
}

#[test]
fn select_by_key_reads_every_column() -> Result<(), Box<dyn std::error::Error>> {
    let mapping = reflector::resolve::<Travel>()?;
    let template = Travel { id: Some(7), ..Travel::default() };

    let select = statement::build_select_by_key(&mapping, &template, &PostgreSql)?;
    assert_eq!(select.sql(), "SELECT id, name, date_ini FROM travel WHERE id = 7");
    assert_eq!(select.parameterized_sql(), "SELECT id, name, date_ini FROM travel WHERE id = $1");
    Ok(())
}

#[test]
fn reserved_identifiers_are_quoted_per_dialect() -> Result<(), Box<dyn std::error::Error>> {
    let mapping = reflector::resolve::<Account>()?;
    let account = Account { id: 3, position: 2, created: None, display: "x".to_string() };

    let postgres = statement::build_insert(&mapping, &account, &PostgreSql)?;
    assert_eq!(postgres.sql(), "INSERT INTO \"user\" (id, \"order\") VALUES (3, 2)");

    let mysql = statement::build_update(&mapping, &account, &MySql)?;
    assert_eq!(mysql.sql(), "UPDATE user SET `order` = 2 WHERE id = 3");
    Ok(())
}

#[test]
fn read_only_and_derived_columns_are_never_written() -> Result<(), Box<dyn std::error::Error>> {
    let mapping = reflector::resolve::<Account>()?;
    let columns: Vec<&str> = mapping.insertable_columns().map(|column| column.column_name).collect();
    assert_eq!(columns, ["id", "order"]);

    let columns: Vec<&str> = mapping.updatable_columns().map(|column| column.column_name).collect();
    assert_eq!(columns, ["order"]);

    let settable: Vec<&str> =
        mapping.columns().iter().filter(|column| mapping.is_settable(column)).map(|column| column.column_name).collect();
    assert_eq!(settable, ["id", "order", "created"]);

    // Still selected, so they can be shown.
    let select = statement::build_select_all(&mapping, true, &Sqlite);
    assert_eq!(select.sql(), "SELECT id, \"order\", created, display FROM user");
    Ok(())
}

#[test]
fn unsupported_type_names_the_column() -> Result<(), Box<dyn std::error::Error>> {
    let mapping = reflector::resolve::<Photo>()?;
    let photo = Photo { id: 1, data: vec![0xca, 0xfe] };

    let err = match statement::build_insert(&mapping, &photo, &Sqlite) {
        Err(err) => err,
        Ok(statement) => panic!("expected a mapping error, got {}", statement),
    };
    assert!(matches!(err, MappingError::UnsupportedType { ref column, .. } if column == "data"));
    assert!(err.to_string().contains("data"));

    let postgres = statement::build_insert(&mapping, &photo, &PostgreSql)?;
    assert_eq!(postgres.sql(), "INSERT INTO photo (id, data) VALUES (1, '\\xcafe')");
    Ok(())
}

#[test]
fn mismatched_values_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mapping = reflector::resolve::<Odd>()?;
    let odd = Odd { id: 1, code: "A1".to_string() };

    let err = statement::build_insert(&mapping, &odd, &Sqlite).unwrap_err();
    assert!(matches!(err, MappingError::TypeMismatch { ref column, found: "text", .. } if column == "code"));
    Ok(())
}

#[test]
fn empty_insert_uses_dialect_form() -> Result<(), Box<dyn std::error::Error>> {
    let mapping = reflector::resolve::<Counter>()?;
    let counter = Counter::default();

    assert_eq!(statement::build_insert(&mapping, &counter, &Sqlite)?.sql(), "INSERT INTO counter DEFAULT VALUES");
    assert_eq!(statement::build_insert(&mapping, &counter, &MySql)?.sql(), "INSERT INTO counter () VALUES ()");

    // Only the key is mapped, so there is nothing to assign.
    let counter = Counter { id: Some(1) };
    assert!(matches!(
        statement::build_update(&mapping, &counter, &Sqlite),
        Err(MappingError::NothingToUpdate { .. })
    ));
    Ok(())
}

#[test]
fn dialects_report_provider_names() {
    let providers: [&dyn Dialect; 3] = [&PostgreSql, &MySql, &Sqlite];
    let names: Vec<&str> = providers.iter().map(|dialect| dialect.provider_name()).collect();
    assert_eq!(names, ["PostgreSQL CORM Driver", "MySQL CORM Driver", "SQLite CORM Driver"]);
    assert_eq!(Travel::table_mapping().map(|table| table.title), Some("Travels"));
}

#[test]
fn timestamps_are_stored_as_dates() -> Result<(), Box<dyn std::error::Error>> {
    let mapping = reflector::resolve::<Event>()?;
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 18, 30, 0).single().ok_or("invalid timestamp")?;
    let event = Event { id: 1, at, ends: None };

    let insert = statement::build_insert(&mapping, &event, &PostgreSql)?;
    assert_eq!(insert.sql(), "INSERT INTO event (id, at, ends) VALUES (1, '2024/05/01', NULL)");

    let row = Row::new().with("id", 1_i32).with("at", "2024-05-01").with("ends", Value::Null);
    let mut loaded = Event::default();
    reflector::materialize(&mapping, &mut loaded, &row)?;
    let midnight = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).single();
    assert_eq!(Some(loaded.at), midnight);
    assert_eq!(loaded.ends, None);
    Ok(())
}

#[test]
fn non_finite_decimals_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mapping = reflector::resolve::<Enrollment>()?;
    let enrollment = Enrollment { student_id: 1, course_id: 2, grade: f64::NAN, passed: false };

    let err = statement::build_update(&mapping, &enrollment, &Sqlite).unwrap_err();
    assert!(matches!(err, MappingError::TypeMismatch { ref column, .. } if column == "grade"));
    Ok(())
}
