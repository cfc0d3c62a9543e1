pub mod db;

pub use db::PgItemRepository;
