use std::ops::Deref;

pub mod definition;

mod dummy;
pub use dummy::DummyDb;

#[cfg(feature = "database-mongodb")]
mod mongo;
#[cfg(feature = "database-mongodb")]
pub use mongo::MongoDb;

use definition::AbstractDatabase;

/// Database migrations
#[derive(Debug)]
pub enum Migration {
    /// Drop the entire database
    #[cfg(debug_assertions)]
    WipeAll,
    /// Create collections and indexes
    M2026_04_02EnsureUpToSpec,
    /// Unique index over handoff reveal tokens
    M2026_06_18AddHandoffIndexes,
}

/// Database connection
#[derive(Clone)]
pub enum Database {
    /// In-memory, for tests and local development
    Dummy(DummyDb),
    /// MongoDB
    #[cfg(feature = "database-mongodb")]
    MongoDb(MongoDb),
}

impl Default for Database {
    fn default() -> Self {
        Self::Dummy(Default::default())
    }
}

impl Deref for Database {
    type Target = dyn AbstractDatabase;

    fn deref(&self) -> &Self::Target {
        match self {
            Database::Dummy(dummy) => dummy,
            #[cfg(feature = "database-mongodb")]
            Database::MongoDb(mongo) => mongo,
        }
    }
}
