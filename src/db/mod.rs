//! Database module

pub mod sqlite;
