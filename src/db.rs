use rusqlite::{params, Connection, Result};
use std::sync::Mutex;

/// Durable per-user key-value store. Holds the single persisted
/// preference this application has (the theme), but is schema'd as a
/// generic settings table so future keys need no migration.
pub struct Preferences {
    conn: Mutex<Connection>,
}

impl Preferences {
    pub fn open(app_dir: &std::path::Path) -> Result<Self> {
        std::fs::create_dir_all(app_dir).ok();
        let db_path = app_dir.join("chat-box.db");
        Self::with_connection(Connection::open(db_path)?)
    }

    /// Backed by a throwaway in-memory database; used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let prefs = Self {
            conn: Mutex::new(conn),
        };
        prefs.migrate()?;
        Ok(prefs)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        );
        match result {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_reads_as_none() {
        let prefs = Preferences::open_in_memory().unwrap();
        assert_eq!(prefs.get("theme").unwrap(), None);
    }

    #[test]
    fn set_then_get_round_trips() {
        let prefs = Preferences::open_in_memory().unwrap();
        prefs.set("theme", "dark").unwrap();
        assert_eq!(prefs.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn set_overwrites_existing_value() {
        let prefs = Preferences::open_in_memory().unwrap();
        prefs.set("theme", "dark").unwrap();
        prefs.set("theme", "light").unwrap();
        assert_eq!(prefs.get("theme").unwrap().as_deref(), Some("light"));
    }
}
