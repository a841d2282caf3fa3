//! Seeds a database with demo users and items, then prints a bearer token
//! per user.
//!
//! ```text
//! RENTWELL_DATABASE_PATH=dev.db cargo run -p rentwell-api --bin seed
//! ```
//!
//! A database that already has users is left alone; tokens are still printed.

use tracing::info;
use tracing_subscriber::EnvFilter;

use rentwell_api::auth::JwtManager;
use rentwell_api::config::ApiConfig;
use rentwell_core::validation::validate_item_draft;
use rentwell_core::{ItemDraft, Money};
use rentwell_db::Database;

const USERS: [(&str, &str, &str); 3] = [
    ("user-olive", "Olive Owner", "olive@example.com"),
    ("user-bea", "Bea Renter", "bea@example.com"),
    ("user-cal", "Cal Renter", "cal@example.com"),
];

fn demo_items() -> Vec<ItemDraft> {
    let item = |title: &str, category: &str, daily: i64, deposit: i64| ItemDraft {
        title: title.to_string(),
        description: None,
        category: Some(category.to_string()),
        condition: Some("good".to_string()),
        location: Some("Lisbon".to_string()),
        photos: vec![],
        price_daily: Money::from_cents(daily),
        security_deposit: Money::from_cents(deposit),
    };

    vec![
        item("Mirrorless camera", "electronics", 2500, 20000),
        item("Camping tent (4p)", "outdoors", 1200, 5000),
        item("Cordless drill", "tools", 800, 0),
    ]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ApiConfig::load()?;
    let db = Database::new(config.db_config()).await?;
    let jwt = JwtManager::new(&config.auth.jwt_secret, config.auth.token_lifetime_secs);

    if db.users().count().await? == 0 {
        for (id, name, email) in USERS {
            db.users().insert(id, name, email).await?;
        }

        let (owner, _, _) = USERS[0];
        for draft in demo_items() {
            validate_item_draft(&draft)?;
            let item = db.items().create(owner, draft).await?;
            info!(item_id = %item.id, title = %item.title, "Seeded item");
        }
        info!(path = %config.database.path.display(), "Database seeded");
    } else {
        info!("Database already has users, skipping seed");
    }

    for (id, name, _) in USERS {
        println!("{name} ({id}): Bearer {}", jwt.mint(id)?);
    }

    db.close().await;
    Ok(())
}
