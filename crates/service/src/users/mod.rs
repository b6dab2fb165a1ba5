pub mod domain;
pub mod repository;

pub use domain::{Listing, PartialRecord, UserId, UserRecord};
pub use repository::UserRepository;
