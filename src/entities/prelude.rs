pub use super::audit_log::Entity as AuditLog;
pub use super::user_meta::Entity as UserMeta;
pub use super::users::Entity as Users;
