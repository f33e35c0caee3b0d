use crate::config::Config;
use crate::db::Store;

pub async fn cmd_search(config: &Config, email: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    match store.get_user_by_email(email.trim()).await? {
        Some(user) => {
            println!("User found");
            println!("{:-<60}", "");
            println!("ID:       {}", user.id);
            println!("Username: {}", user.username);
            println!("Email:    {}", user.email);
            println!("Name:     {}", user.display_name);
            if user.is_anonymized {
                println!("Status:   anonymized");
            }
            println!();
            println!("To anonymize: lethe anonymize {}", user.id);
        }
        None => {
            println!("No user found for '{email}'.");
        }
    }

    Ok(())
}
