pub mod catalog;
pub mod lists;
pub mod session;

pub use catalog::{CatalogProvider, TmdbProvider};
pub use lists::ListService;
pub use session::{HeaderSessionProvider, RemoteSessionProvider, Session, SessionProvider};
