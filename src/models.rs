pub mod auth;
pub mod customer;
pub mod invoice;
