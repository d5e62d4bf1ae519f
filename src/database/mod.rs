pub mod db;
pub mod memory;
pub mod repository;

pub use db::SqliteStore;
pub use memory::MemoryStore;
pub use repository::CardRepository;
