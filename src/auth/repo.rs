use anyhow::Context;
use time::format_description::well_known::Rfc3339;

use crate::auth::repo_types::{NewUser, UserCredentials};
use crate::warehouse::{Statement, Warehouse};

impl NewUser {
    /// Insert the user row. Email uniqueness is left to the warehouse.
    pub async fn insert(&self, db: &dyn Warehouse, table: &str) -> anyhow::Result<()> {
        let created_at = self
            .created_at
            .format(&Rfc3339)
            .context("format created_at")?;
        let stmt = Statement::new(format!(
            "INSERT INTO {table} (user_id, name, email, password, created_at) \
             VALUES (:user_id, :name, :email, :password, :created_at)"
        ))
        .bind("user_id", self.user_id.to_string())
        .bind("name", self.name.as_str())
        .bind("email", self.email.as_str())
        .bind("password", self.password_hash.as_str())
        .bind_typed("created_at", created_at, "TIMESTAMP");

        db.execute(stmt).await.context("insert user")?;
        Ok(())
    }
}

impl UserCredentials {
    /// First user row with this email, in whatever order the warehouse returns.
    pub async fn find_by_email(
        db: &dyn Warehouse,
        table: &str,
        email: &str,
    ) -> anyhow::Result<Option<UserCredentials>> {
        let stmt = Statement::new(format!(
            "SELECT user_id, name, email, password FROM {table} WHERE email = :email LIMIT 1"
        ))
        .bind("email", email);

        let row = db
            .query(stmt)
            .await
            .context("look up user by email")?
            .into_iter()
            .next();
        row.map(|r| r.decode()).transpose()
    }
}
