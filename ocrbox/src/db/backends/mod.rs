pub mod libsql;
pub mod null;
