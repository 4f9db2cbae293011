//! SQLite-backed settings store

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::migrations::run_migrations;
use crate::store::PersistentStore;
use crate::Result;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL keeps readers from blocking the single writer
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let value = conn
                .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(value)
        })
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.with_connection(|conn| upsert(conn, key, value))
    }

    pub fn remove_setting(&self, key: &str) -> Result<()> {
        self.with_connection(|conn| delete(conn, key))
    }
}

fn upsert(conn: &Connection, key: &str, value: &str) -> Result<()> {
    let updated_at = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![key, value, updated_at],
    )?;
    Ok(())
}

fn delete(conn: &Connection, key: &str) -> Result<()> {
    let removed = conn.execute("DELETE FROM settings WHERE key = ?1", [key])?;
    tracing::debug!(key = %key, removed, "Removed setting");
    Ok(())
}

impl PersistentStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_setting(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_setting(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.remove_setting(key)
    }

    fn write_all(&self, entries: &[(&str, Option<&str>)]) -> Result<()> {
        self.transaction(|conn| {
            for (key, value) in entries {
                match value {
                    Some(value) => upsert(conn, key, value)?,
                    None => delete(conn, key)?,
                }
            }
            Ok(())
        })
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.with_connection(|conn| {
            let count: i32 =
                conn.query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_settings_overwrite_and_remove() {
        let db = Database::open_in_memory().unwrap();

        assert_eq!(db.get("@GoBarber:token").unwrap(), None);

        db.set("@GoBarber:token", "token-123").unwrap();
        db.set("@GoBarber:token", "token-456").unwrap();
        assert_eq!(
            db.get("@GoBarber:token").unwrap().as_deref(),
            Some("token-456")
        );

        db.remove("@GoBarber:token").unwrap();
        assert_eq!(db.get("@GoBarber:token").unwrap(), None);

        // Second remove is a no-op
        db.remove("@GoBarber:token").unwrap();
    }

    #[test]
    fn test_write_all_is_atomic() {
        let db = Database::open_in_memory().unwrap();
        db.write_all(&[
            ("@GoBarber:token", Some("token-123")),
            ("@GoBarber:user", Some(r#"{"id":"user-123"}"#)),
        ])
        .unwrap();
        assert_eq!(
            db.get("@GoBarber:token").unwrap().as_deref(),
            Some("token-123")
        );

        db.with_connection(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER reject_user BEFORE INSERT ON settings
                 WHEN NEW.key = '@GoBarber:user'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )?;
            Ok(())
        })
        .unwrap();

        let result = db.write_all(&[
            ("@GoBarber:token", Some("token-456")),
            ("@GoBarber:user", Some(r#"{"id":"user-456"}"#)),
        ]);

        assert!(result.is_err());
        assert_eq!(
            db.get("@GoBarber:token").unwrap().as_deref(),
            Some("token-123")
        );
        assert_eq!(
            db.get("@GoBarber:user").unwrap().as_deref(),
            Some(r#"{"id":"user-123"}"#)
        );

        db.write_all(&[("@GoBarber:token", None), ("@GoBarber:user", None)])
            .unwrap();
        assert_eq!(db.get("@GoBarber:token").unwrap(), None);
        assert_eq!(db.get("@GoBarber:user").unwrap(), None);
    }

    #[test]
    fn test_survives_reopen() {
        let path = std::env::temp_dir().join(format!(
            "gobarber-storage-{}-{}.db",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));

        {
            let db = Database::open(&path).unwrap();
            db.set("@GoBarber:user", r#"{"id":"user-123"}"#).unwrap();
        }

        let reopened = Database::open(&path).unwrap();
        assert_eq!(
            reopened.get("@GoBarber:user").unwrap().as_deref(),
            Some(r#"{"id":"user-123"}"#)
        );

        drop(reopened);
        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(path.with_extension("db-wal"));
        let _ = std::fs::remove_file(path.with_extension("db-shm"));
    }
}
