pub mod mausb_tables;
pub mod uas_tables;
pub mod vt_tables;
