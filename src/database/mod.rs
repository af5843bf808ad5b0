pub mod models;
pub mod settings_repo;
pub mod table_repo;
