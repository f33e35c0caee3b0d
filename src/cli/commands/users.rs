use crate::config::Config;
use crate::db::Store;

pub async fn cmd_users(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let users = store.list_users().await?;

    if users.is_empty() {
        println!("No accounts.");
        return Ok(());
    }

    println!("Accounts ({} total)", users.len());
    println!("{:-<70}", "");

    for user in users {
        let marker = if user.is_anonymized {
            "🗑"
        } else if user.is_admin {
            "★"
        } else {
            "•"
        };

        println!("{} {} <{}>", marker, user.display_name, user.email);
        println!("  ID: {} | Username: {}", user.id, user.username);
    }

    println!();
    println!("Legend: ★ Admin | • Member | 🗑 Anonymized");

    Ok(())
}
