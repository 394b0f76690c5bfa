pub mod config;
pub mod inspect;
pub mod progress;
pub mod run;
pub mod validate;
