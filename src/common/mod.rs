pub mod config;
pub mod paths;
pub mod privileges;
pub mod shell;
