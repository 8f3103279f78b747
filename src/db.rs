pub mod store;
pub use store::{CustomerStore, InvoiceStore, UserStore};
pub mod invoice_repo;
pub use invoice_repo::InvoiceRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
pub mod memory;
pub use memory::InMemoryStore;
