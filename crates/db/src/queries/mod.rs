// crates/db/src/queries/mod.rs
// Job store operations for the dah SQLite database.

pub(crate) mod row_types;
mod jobs;
