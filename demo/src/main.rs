use chrono::NaiveDate;
use corm::{DataSourceConfig, DialectKind, Entity, SqlxSource};
use log::{info, warn};

#[derive(Entity, Debug, Clone, Default)]
#[corm(table = "travel", title = "Travels", description = "Planned trips")]
struct Travel {
    #[corm(primary_key, auto_generated, label = "Code")]
    id: Option<i32>,
    #[corm(listed, label = "Destination", sort = "asc")]
    name: String,
    #[corm(label = "Departure")]
    date_ini: Option<NaiveDate>,
}

const SQLITE_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS travel (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    date_ini TEXT
)";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    // CORM_DIALECT, CORM_DATABASE, ... (a .env file works too)
    let config = DataSourceConfig::from_env("CORM").unwrap_or_else(|err| {
        warn!("{}; falling back to an in-memory SQLite database", err);
        DataSourceConfig {
            dialect: DialectKind::Sqlite,
            host: String::new(),
            port: None,
            database: ":memory:".to_string(),
            login: String::new(),
            password: String::new(),
            max_connections: Some(1),
        }
    });

    let source = SqlxSource::from_config(&config)?;
    if source.dialect_kind() == DialectKind::Sqlite {
        source.execute_raw(SQLITE_SCHEMA).await?;
    }
    let orm = source.orm();
    info!("using {}", orm.provider_name());

    let trip = Travel { id: None, name: "Trip".to_string(), date_ini: NaiveDate::from_ymd_opt(2024, 5, 1) };
    let executed = orm.insert(&trip).await?;
    println!("{} -> {} row(s)", executed.last_generated_statement(), executed.output());

    let mut cursor = orm.select::<Travel>(false).await?.into_output();
    let mut stored = Vec::new();
    while let Some(travel) = cursor.next().await? {
        println!("Listed: {:?}", travel);
        stored.push(travel);
    }

    for travel in stored {
        let Some(mut full) = orm.get(Travel { id: travel.id, ..Travel::default() }).await?.into_output() else {
            continue;
        };
        println!("Loaded: {:?}", full);

        full.name = "O'Brien".to_string();
        let executed = orm.update(&full).await?;
        println!("{}", executed.last_generated_statement());

        let executed = orm.delete(&full).await?;
        println!("{}", executed.last_generated_statement());
    }

    let table = Travel::table_mapping().map(|table| table.title).unwrap_or_default();
    println!("{} done", table);
    Ok(())
}
