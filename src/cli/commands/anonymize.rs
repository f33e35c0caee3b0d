use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    ANONYMIZE_ACTION, BOOTSTRAP_ADMIN_ID, InMemoryTokenService, PrivacyError, PrivacyService,
    SeaOrmPrivacyService, TokenService,
};

/// Direct anonymization from the operator shell. Runs the same service path
/// as the HTTP endpoint, acting as the bootstrap admin.
pub async fn cmd_anonymize(config: &Config, user_id: i32, yes: bool) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    let Some(user) = store.get_user_by_id(user_id).await? else {
        println!("User with ID {user_id} not found.");
        return Ok(());
    };

    if user.is_anonymized {
        println!("User {user_id} is already anonymized.");
        return Ok(());
    }

    if !yes {
        println!(
            "Anonymize '{}' <{}> (ID: {})? This cannot be undone.",
            user.display_name, user.email, user.id
        );
        println!("Enter 'y' to confirm, anything else to cancel:");

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let tokens: Arc<dyn TokenService> = Arc::new(InMemoryTokenService::new(Duration::from_secs(
        config.security.csrf_token_ttl_seconds,
    )));
    let service = SeaOrmPrivacyService::new(store, tokens.clone());

    let token = tokens.issue(BOOTSTRAP_ADMIN_ID, ANONYMIZE_ACTION).await;

    match service.anonymize(BOOTSTRAP_ADMIN_ID, user_id, &token).await {
        Ok(scrubbed) => {
            println!("✓ Anonymized user {}", scrubbed.id);
            println!("  Username: {}", scrubbed.username);
            println!("  Email:    {}", scrubbed.email);
            println!("  Name:     {}", scrubbed.display_name);
        }
        Err(PrivacyError::ProtectedAccount) => {
            println!("User {user_id} is protected and cannot be anonymized.");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
