pub mod sqlite_violation_store;
