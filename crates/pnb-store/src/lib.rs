//! Postgres implementation of the core's store port.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

use pnb_core::{
    config::StoreConfig,
    domain::{Package, Role, User, UserId},
    ports::StorePort,
    Error, Result,
};

/// SQLSTATE for unique-constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and run pending migrations.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.connect_url())
            .await
            .map_err(store_err)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| Error::Store(format!("migration failed: {e}")))?;
        tracing::info!("store connected, migrations up to date");

        Ok(Self { pool })
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    name: String,
    role: String,
}

impl UserRow {
    fn into_user(self) -> Result<User> {
        let role = match self.role.as_str() {
            "member" => Role::Member,
            "admin" => Role::Admin,
            other => {
                return Err(Error::Store(format!(
                    "user {} has unknown role {other:?}",
                    self.id
                )))
            }
        };
        Ok(User {
            id: UserId(self.id),
            name: self.name,
            role,
        })
    }
}

#[derive(Debug, FromRow)]
struct PackageRow {
    id: i64,
    code: String,
    received_at: NaiveDate,
    collected: bool,
}

impl From<PackageRow> for Package {
    fn from(row: PackageRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            received: row.received_at,
            collected: row.collected,
        }
    }
}

#[async_trait]
impl StorePort for PgStore {
    async fn find_user(&self, id: &UserId) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, role
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        row.map(UserRow::into_user).transpose()
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, role
            FROM users
            WHERE lower(name) = lower($1)
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        row.map(UserRow::into_user).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, role
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn list_admins(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, role
            FROM users
            WHERE role = 'admin'
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn add_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, role)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&user.id.0)
        .bind(&user.name)
        .bind(user.role.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::DuplicateUser(user.id.0.clone())
            } else {
                store_err(e)
            }
        })?;
        Ok(())
    }

    async fn remove_user(&self, user: &User) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(&user.id.0)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        if result.rows_affected() == 0 {
            return Err(Error::UnknownUser(user.id.0.clone()));
        }
        Ok(())
    }

    async fn find_package(&self, id: i64) -> Result<Option<Package>> {
        let row = sqlx::query_as::<_, PackageRow>(
            r#"
            SELECT id, code, received_at, collected
            FROM packages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(row.map(Package::from))
    }

    async fn add_package(&self, package: &Package) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO packages (id, code, received_at, collected)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(package.id)
        .bind(&package.code)
        .bind(package.received)
        .bind(package.collected)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn list_uncollected_packages(&self) -> Result<Vec<Package>> {
        let rows = sqlx::query_as::<_, PackageRow>(
            r#"
            SELECT id, code, received_at, collected
            FROM packages
            WHERE NOT collected
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(rows.into_iter().map(Package::from).collect())
    }

    async fn mark_collected(&self, package: &Package) -> Result<()> {
        sqlx::query("UPDATE packages SET collected = TRUE WHERE id = $1")
            .bind(package.id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn max_package_id(&self) -> Result<i64> {
        let (max,): (i64,) = sqlx::query_as("SELECT COALESCE(MAX(id), 0) FROM packages")
            .fetch_one(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(max)
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

fn store_err(e: sqlx::Error) -> Error {
    Error::Store(e.to_string())
}
