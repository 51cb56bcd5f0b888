pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::InMemoryMembershipStore;
pub use postgres::{create_pool, run_migrations, PgMembershipStore};
pub use store::MembershipStore;
