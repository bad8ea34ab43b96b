use anyhow::{Context, Result};
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

use crate::auth::password::hash_password;
use crate::config::Config;
use crate::model::role::Role;

pub async fn init_db(database_url: &str) -> Result<MySqlPool> {
    MySqlPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("Failed to connect to database")
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS departments (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(120) NOT NULL UNIQUE,
        description TEXT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(160) NOT NULL,
        email VARCHAR(190) NOT NULL UNIQUE,
        password VARCHAR(255) NOT NULL,
        role_id TINYINT UNSIGNED NOT NULL DEFAULT 3,
        department_id BIGINT UNSIGNED NULL,
        position VARCHAR(120) NULL,
        phone VARCHAR(40) NULL,
        hire_date DATE NULL,
        face_descriptor TEXT NULL,
        cv_path VARCHAR(255) NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        last_login_at DATETIME NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        CONSTRAINT fk_users_department FOREIGN KEY (department_id) REFERENCES departments(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS refresh_tokens (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        user_id BIGINT UNSIGNED NOT NULL,
        jti VARCHAR(64) NOT NULL UNIQUE,
        expires_at DATETIME NOT NULL,
        revoked BOOLEAN NOT NULL DEFAULT FALSE,
        CONSTRAINT fk_refresh_user FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendances (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        user_id BIGINT UNSIGNED NOT NULL,
        date DATE NOT NULL,
        morning_check_in DATETIME NULL,
        morning_check_out DATETIME NULL,
        afternoon_check_in DATETIME NULL,
        afternoon_check_out DATETIME NULL,
        is_late_morning BOOLEAN NOT NULL DEFAULT FALSE,
        is_late_afternoon BOOLEAN NOT NULL DEFAULT FALSE,
        is_early_morning BOOLEAN NOT NULL DEFAULT FALSE,
        is_early_afternoon BOOLEAN NOT NULL DEFAULT FALSE,
        status VARCHAR(16) NOT NULL DEFAULT 'PRESENT',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE KEY uq_attendance_user_day (user_id, date),
        CONSTRAINT fk_attendance_user FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS leave_types (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(80) NOT NULL UNIQUE,
        description TEXT NULL,
        max_days_per_year INT UNSIGNED NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS leave_requests (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        user_id BIGINT UNSIGNED NOT NULL,
        leave_type_id BIGINT UNSIGNED NOT NULL,
        start_date DATE NOT NULL,
        end_date DATE NOT NULL,
        reason TEXT NULL,
        status VARCHAR(16) NOT NULL DEFAULT 'PENDING',
        supervisor_status VARCHAR(16) NULL,
        supervisor_id BIGINT UNSIGNED NULL,
        approved_by BIGINT UNSIGNED NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        CONSTRAINT fk_leave_user FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
        CONSTRAINT fk_leave_type FOREIGN KEY (leave_type_id) REFERENCES leave_types(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS calendar_events (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        title VARCHAR(200) NOT NULL,
        description TEXT NULL,
        event_type VARCHAR(16) NOT NULL,
        start_date DATE NOT NULL,
        end_date DATE NULL,
        is_recurring BOOLEAN NOT NULL DEFAULT FALSE,
        recurrence_pattern VARCHAR(16) NULL,
        created_by BIGINT UNSIGNED NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS settings (
        `key` VARCHAR(120) NOT NULL PRIMARY KEY,
        value TEXT NOT NULL,
        value_type VARCHAR(16) NOT NULL,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
    )
    "#,
];

pub async fn init_schema(pool: &MySqlPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to create schema")?;
    }
    tracing::info!(tables = SCHEMA.len(), "Schema ready");
    Ok(())
}

/// Creates the first HR admin from the environment when no admin exists yet.
pub async fn bootstrap_admin(pool: &MySqlPool, config: &Config) -> Result<()> {
    let (Some(email), Some(password)) = (&config.bootstrap_admin_email, &config.bootstrap_admin_password)
    else {
        return Ok(());
    };

    let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role_id = ?")
        .bind(Role::Admin.id())
        .fetch_one(pool)
        .await?;
    if admins > 0 {
        return Ok(());
    }

    let hashed = hash_password(password).map_err(|e| anyhow::anyhow!("hashing failed: {e}"))?;
    sqlx::query("INSERT INTO users (name, email, password, role_id) VALUES (?, ?, ?, ?)")
        .bind("HR Admin")
        .bind(email.trim().to_lowercase())
        .bind(hashed)
        .bind(Role::Admin.id())
        .execute(pool)
        .await
        .context("Failed to create bootstrap admin")?;

    tracing::warn!(email = %email, "Bootstrap admin created");
    Ok(())
}
