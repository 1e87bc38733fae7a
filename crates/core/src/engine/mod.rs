mod condition;
mod db;
mod table;
mod update;

pub use condition::{check_expected, evaluate};
pub use db::{Database, DEFAULT_LIST_TABLES_LIMIT};
pub use table::{ItemKey, KeyAttribute, Table};
pub use update::{apply_updates, reject_key_updates};
