pub mod coding_time;
pub mod ddl;
