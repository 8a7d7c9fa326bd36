//! SQL DDL applied on every startup. Every statement must be safe to re-run.

use crate::db::migrate::Migration;

/// Users table:
/// - `id` UUID primary key, generated by the application
/// - `email` UNIQUE (creates an index implicitly)
/// - timestamps default to insert time
pub const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    first_name VARCHAR(255) NOT NULL,
    last_name VARCHAR(255) NOT NULL,
    email VARCHAR(255) UNIQUE NOT NULL,
    phone VARCHAR(50) NOT NULL,
    password_hash VARCHAR(255) NOT NULL,
    status VARCHAR(50) NOT NULL,
    created_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP
)
"#;

pub const MIGRATIONS: &[Migration] = &[Migration {
    name: "create users table",
    statement: CREATE_USERS_TABLE,
}];
