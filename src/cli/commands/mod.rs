mod anonymize;
mod audit;
mod search;
mod users;

pub use anonymize::cmd_anonymize;
pub use audit::cmd_audit;
pub use search::cmd_search;
pub use users::cmd_users;
