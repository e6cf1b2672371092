pub mod sled_user_repository;

pub use sled_user_repository::SledUserRepository;
