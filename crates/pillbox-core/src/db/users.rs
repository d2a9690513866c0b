//! User database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult, UserRecord};

impl Database {
    /// Insert a new user.
    pub fn insert_user(&self, user: &UserRecord) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO users (id, email, full_name, phone, timezone, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                user.id,
                user.email,
                user.full_name,
                user.phone,
                user.timezone,
                user.created_at,
                user.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a user by ID.
    pub fn get_user(&self, user_id: &str) -> DbResult<Option<UserRecord>> {
        self.conn
            .query_row(
                r#"
                SELECT id, email, full_name, phone, timezone, created_at, updated_at
                FROM users
                WHERE id = ?
                "#,
                [user_id],
                UserRecord::from_row,
            )
            .optional()
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let db = Database::open_in_memory().unwrap();

        let mut user = UserRecord::new("grace@example.com".into(), "Grace Hopper".into());
        user.phone = Some("+1 555 0100".into());
        db.insert_user(&user).unwrap();

        let retrieved = db.get_user(&user.id).unwrap().unwrap();
        assert_eq!(retrieved, user);
    }

    #[test]
    fn test_get_missing() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_user("nobody").unwrap().is_none());
    }

    #[test]
    fn test_email_unique() {
        let db = Database::open_in_memory().unwrap();
        db.insert_user(&UserRecord::new("a@example.com".into(), "A".into()))
            .unwrap();
        let result = db.insert_user(&UserRecord::new("a@example.com".into(), "B".into()));
        assert!(result.is_err());
    }
}
