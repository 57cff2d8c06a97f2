pub mod logger;
pub mod translation_log;
