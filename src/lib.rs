pub mod autosave;
pub mod colors;
pub mod constants;
pub mod data_backend;
pub mod data_types;
pub mod diet_page;
pub mod diet_table;
pub mod errors;
pub mod food_catalog;
pub mod local_store;
pub mod references;
pub mod settings_store;
pub mod shared_main;
