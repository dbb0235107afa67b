pub mod initdb;
pub mod run_drawdowns;
pub mod serve;

pub use initdb::init_database;
pub use run_drawdowns::run_drawdowns;
pub use serve::serve;
