//! Storage target naming.
//!
//! A locator is the opaque string a caller uses to name where a queue lives.
//! It resolves to either a database file or a transient in-memory database.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use sqlx::sqlite::SqliteConnectOptions;

use crate::error::DbResult;

/// Resolved storage target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// SQLite database file, created if missing.
    File(PathBuf),
    /// Named in-memory database. Every engine opened on the same name shares
    /// it, and it lives until the last of them closes.
    Memory(String),
}

impl Locator {
    /// Parse a raw locator string.
    ///
    /// Accepts `:memory:`, `memory:<name>`, SQLite URI forms carrying
    /// `mode=memory`, and plain or `sqlite:`/`file:` prefixed paths.
    ///
    /// An unnamed in-memory target (`:memory:`, `file::memory:`) gets a fresh
    /// name from [`TRANSIENT_LOCATORS`], so it is never shared.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        if let Some(name) = raw.strip_prefix("memory:") {
            return Self::Memory(name.to_string());
        }

        let stripped = raw
            .strip_prefix("sqlite://")
            .or_else(|| raw.strip_prefix("sqlite:"))
            .unwrap_or(raw);
        let stripped = stripped.strip_prefix("file:").unwrap_or(stripped);
        let (path, query) = stripped.split_once('?').unwrap_or((stripped, ""));

        if path == ":memory:" {
            return TRANSIENT_LOCATORS.next();
        }
        if query.split('&').any(|param| param == "mode=memory") {
            return Self::Memory(path.to_string());
        }

        Self::File(PathBuf::from(path))
    }

    /// Whether the target is transient (never persisted, never purged).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Memory(_))
    }

    /// Base connection options for this target.
    ///
    /// Memory targets open as shared-cache databases keyed by name.
    pub(crate) fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match self {
            Self::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true),
            Self::Memory(name) => SqliteConnectOptions::from_str(&format!(
                "sqlite:file:{name}?mode=memory&cache=shared"
            ))?,
        };
        Ok(options)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Memory(name) => write!(f, "memory:{name}"),
        }
    }
}

/// Hands out unique transient locators.
///
/// Owns its counter, so independent factories never collide with or observe
/// each other.
#[derive(Debug)]
pub struct LocatorFactory {
    prefix: &'static str,
    next: AtomicU64,
}

impl LocatorFactory {
    pub const fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            next: AtomicU64::new(1),
        }
    }

    /// Next unused transient locator.
    pub fn next(&self) -> Locator {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        Locator::Memory(format!("{}-{}", self.prefix, n))
    }
}

/// Process-wide source of default locators for anonymous transient queues.
pub static TRANSIENT_LOCATORS: LocatorFactory = LocatorFactory::new("litequeue");

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn test_parse_memory_forms() {
        assert_eq!(
            Locator::parse("memory:jobs"),
            Locator::Memory("jobs".into())
        );
        assert_eq!(
            Locator::parse("file:memdb1?mode=memory&cache=shared"),
            Locator::Memory("memdb1".into())
        );
        assert_eq!(
            Locator::parse("sqlite:file:memdb1?mode=memory"),
            Locator::Memory("memdb1".into())
        );
    }

    #[test]
    fn test_unnamed_memory_targets_are_never_shared() {
        let a = Locator::parse(":memory:");
        let b = Locator::parse(":memory:");
        let c = Locator::parse("file::memory:?cache=shared");

        assert!(a.is_transient() && b.is_transient() && c.is_transient());
        assert_ne!(a, b);
        assert_ne!(b, c);
    }

    #[test]
    fn test_parse_file_forms() {
        assert_eq!(
            Locator::parse("data/queue.db"),
            Locator::File(PathBuf::from("data/queue.db"))
        );
        assert_eq!(
            Locator::parse("sqlite://data/queue.db"),
            Locator::File(PathBuf::from("data/queue.db"))
        );
        assert_eq!(
            Locator::parse("file:/tmp/queue.db?cache=shared"),
            Locator::File(PathBuf::from("/tmp/queue.db"))
        );
        assert!(!Locator::parse("queue.db").is_transient());
    }

    #[test]
    fn test_display_round_trips_memory() {
        let locator = Locator::Memory("jobs".into());
        assert_eq!(Locator::parse(&locator.to_string()), locator);
    }

    #[test]
    fn test_factory_is_unique_and_isolated() {
        let a = LocatorFactory::new("t");
        let b = LocatorFactory::new("t");

        let from_a: HashSet<_> = (0..100).map(|_| a.next()).collect();
        assert_eq!(from_a.len(), 100);

        // A separate factory starts its own sequence.
        assert_eq!(b.next(), Locator::Memory("t-1".into()));
        assert!(from_a.iter().all(Locator::is_transient));
    }
}
