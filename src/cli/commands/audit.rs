use crate::config::Config;
use crate::db::Store;

pub async fn cmd_audit(config: &Config, limit: u64) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let events = store.recent_audit_events(limit, None).await?;

    if events.is_empty() {
        println!("No audit events.");
        return Ok(());
    }

    println!("Audit events (last {}):", events.len());
    println!("{:-<70}", "");

    for event in events {
        println!("• [{}] {} - {}", event.level, event.event_type, event.message);
        if let Some(details) = event.details {
            println!("  {details}");
        }
        println!("  {}", event.created_at);
    }

    Ok(())
}
