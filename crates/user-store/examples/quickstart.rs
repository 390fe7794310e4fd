//! # Quickstart: user records in a SQLite file
//!
//! Creates, updates, lists and deletes a few users through the record
//! adapter, then shows the raw field-mapping the store holds.
//!
//! Run: `cargo run -p user-store --features sqlite --example quickstart`

use user_store::{HashStore, SqliteStore, UserStore};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir().join("user-store-quickstart");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("users.db");

    let users = UserStore::new(SqliteStore::open(&path)?);
    println!("Database: {}", path.display());

    for (name, email) in [("Ada", "ada@example.com"), ("Linus", "linus@example.com")] {
        match users.create(name, email) {
            Ok(()) => println!("created {email}"),
            Err(e) if e.is_already_exists() => println!("{email} already there"),
            Err(e) => return Err(e.into()),
        }
    }

    users.update("Ada Lovelace", "ada@example.com")?;
    println!("updated ada@example.com -> {:?}", users.read("ada@example.com")?);

    println!("\nAll users:");
    for record in users.list_all()? {
        println!("  {record:?}");
    }

    let key = users.record_key("ada@example.com");
    let raw = users.store().hash_read(&key)?;
    println!("\nRaw mapping under {key}: {} fields", raw.len());

    users.delete("linus@example.com")?;
    println!("deleted linus@example.com; {} user(s) left", users.count()?);

    Ok(())
}
