//! Profile database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{Profile, Role};

impl Database {
    /// Insert a new profile.
    pub fn insert_profile(&self, profile: &Profile) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO profiles (id, full_name, role, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                profile.id,
                profile.full_name,
                profile.role.as_str(),
                profile.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a profile by ID.
    pub fn get_profile(&self, id: &str) -> DbResult<Option<Profile>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, full_name, role, created_at FROM profiles WHERE id = ?",
                [id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, full_name, role, created_at)| {
            let role = Role::parse(&role)
                .ok_or_else(|| DbError::Constraint(format!("Unknown role: {}", role)))?;
            Ok(Profile {
                id,
                full_name,
                role,
                created_at,
            })
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let db = Database::open_in_memory().unwrap();
        let profile = Profile::new("Maya Chen".into(), Role::Doctor);
        db.insert_profile(&profile).unwrap();

        let retrieved = db.get_profile(&profile.id).unwrap().unwrap();
        assert_eq!(retrieved, profile);
        assert!(db.get_profile("missing").unwrap().is_none());
    }
}
