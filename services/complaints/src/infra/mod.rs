pub mod classifier;
pub mod db;
pub mod mail;
pub mod storage;
