use serde_json::json;
use user_store::validation::{normalize_email, validate_user};
use user_store::{FieldMap, HashStore, User, UserStore, EMAIL_FIELD, NAME_FIELD};

type Result = std::result::Result<(), Box<dyn std::error::Error>>;

/// `users create --name N --email E`: add a new record.
pub fn create<S: HashStore>(users: &UserStore<S>, name: &str, email: &str) -> Result {
    let user = validate_user(&User::new(name, email))?;
    users.create_user(&user)?;
    println!("Created {}", user.email);
    Ok(())
}

/// `users get EMAIL`: print one record.
pub fn get<S: HashStore>(users: &UserStore<S>, email: &str) -> Result {
    let record = users.read(&normalize_email(email))?;
    for (field, value) in &record {
        println!("{field}: {value}");
    }
    Ok(())
}

/// `users update --name N --email E`: overwrite an existing record.
pub fn update<S: HashStore>(users: &UserStore<S>, name: &str, email: &str) -> Result {
    let user = validate_user(&User::new(name, email))?;
    users.update_user(&user)?;
    println!("Updated {}", user.email);
    Ok(())
}

/// `users delete EMAIL`: remove a record.
pub fn delete<S: HashStore>(users: &UserStore<S>, email: &str) -> Result {
    users.delete(&normalize_email(email))?;
    println!("Deleted {email}");
    Ok(())
}

/// `users list [--json]`: print every record.
pub fn list<S: HashStore>(users: &UserStore<S>, as_json: bool) -> Result {
    let mut records = users.list_all()?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&json!({ "users": records }))?);
        return Ok(());
    }

    if records.is_empty() {
        println!("  (no users)");
        return Ok(());
    }

    records.sort_by(|a, b| field(a, EMAIL_FIELD).cmp(field(b, EMAIL_FIELD)));

    println!("  {:<32} {}", "Email", "Name");
    println!("  {}", "-".repeat(54));
    for record in &records {
        println!(
            "  {:<32} {}",
            field(record, EMAIL_FIELD),
            field(record, NAME_FIELD)
        );
    }
    println!("  {}", "-".repeat(54));
    println!("  {} user(s)", format_num(records.len() as u64));

    Ok(())
}

/// `users status`: describe the backend and count records.
pub fn status<S: HashStore>(users: &UserStore<S>, details: &[(&str, String)]) -> Result {
    for (label, value) in details {
        println!("{label}: {value}");
    }
    println!("Key prefix: {}", users.config().key_prefix);
    println!("Records: {}", format_num(users.count()? as u64));
    Ok(())
}

fn field<'a>(record: &'a FieldMap, name: &str) -> &'a str {
    record.get(name).map(String::as_str).unwrap_or("")
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn format_num(n: u64) -> String {
    if n < 1000 {
        return n.to_string();
    }
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}
