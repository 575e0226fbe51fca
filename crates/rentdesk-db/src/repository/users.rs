//! User operations

use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite};
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{NewUser, UpdateUser, User, UserRole};
use crate::repository::Database;
use crate::utils::{format_timestamp, normalize_email};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

/// Translate a unique violation on `users` into a readable duplicate error
fn user_conflict(err: sqlx::Error) -> DbError {
    let admin_clash = matches!(
        &err,
        sqlx::Error::Database(db_err) if db_err.message().contains("users.role")
    );
    if admin_clash {
        DbError::from_insert(err, "Admin already exists")
    } else {
        DbError::from_insert(err, "User already exists with this email")
    }
}

impl Database {
    // ==================== User Operations ====================

    /// Insert a new user
    pub async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let now = Utc::now();
        let email = normalize_email(&user.email);
        let name = user.name.trim().to_string();

        // Check if user already exists
        if self.get_user_by_email(&email).await?.is_some() {
            return Err(DbError::Duplicate(
                "User already exists with this email".to_string(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&name)
        .bind(&email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(format_timestamp(now))
        .bind(format_timestamp(now))
        .execute(&self.pool)
        .await
        .map_err(user_conflict)?;

        Ok(User {
            id,
            name,
            email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a user by email (normalized before lookup)
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
        let result = sqlx::query(&sql)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, DbError> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let result = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List all users, oldest first
    pub async fn list_users(&self) -> Result<Vec<User>, DbError> {
        let sql = format!("SELECT {} FROM users ORDER BY created_at ASC", USER_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| User::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Apply a partial update, returning the updated user if it exists
    pub async fn update_user(&self, id: &str, update: UpdateUser) -> Result<Option<User>, DbError> {
        if let Some(email) = &update.email
            && let Some(existing) = self.get_user_by_email(email).await?
            && existing.id != id
        {
            return Err(DbError::Duplicate(
                "User already exists with this email".to_string(),
            ));
        }

        let UpdateUser {
            name,
            email,
            role,
            password_hash,
        } = update;

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET updated_at = ");
        query.push_bind(format_timestamp(Utc::now()));
        if let Some(name) = name {
            query.push(", name = ").push_bind(name.trim().to_string());
        }
        if let Some(email) = email {
            query.push(", email = ").push_bind(normalize_email(&email));
        }
        if let Some(role) = role {
            query.push(", role = ").push_bind(role.as_str());
        }
        if let Some(password_hash) = password_hash {
            query.push(", password_hash = ").push_bind(password_hash);
        }
        query.push(" WHERE id = ").push_bind(id.to_string());

        let result = query
            .build()
            .execute(&self.pool)
            .await
            .map_err(user_conflict)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_user_by_id(id).await
    }

    /// Delete a user
    pub async fn delete_user(&self, id: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count users holding a role
    pub async fn count_users_with_role(&self, role: UserRole) -> Result<i64, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM users WHERE role = ?")
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(result.get("count"))
    }

    /// Check if an admin account exists
    pub async fn has_admin(&self) -> Result<bool, DbError> {
        Ok(self.count_users_with_role(UserRole::Admin).await? > 0)
    }
}
