pub mod memory;
pub mod refresh_token;
pub mod user;

pub use memory::InMemoryRefreshTokenRepository;
pub use memory::InMemoryUserRepository;
pub use refresh_token::PostgresRefreshTokenRepository;
pub use user::PostgresUserRepository;
