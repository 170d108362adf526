pub mod app_config;
pub mod database;
pub mod budget_repo;
pub mod launch_window_repo;
pub mod redis_repo;

pub use app_config::Config;
pub use budget_repo::PostgresBudgetRepository;
pub use database::DbClient;
pub use launch_window_repo::PostgresLaunchWindowRepository;
pub use redis_repo::RedisClient;
