//! File system utilities.
//!
//! - [`atomic`] - all-or-nothing writes of line streams
//! - [`dirs`] - directory creation
//! - [`formats`] - reading JSON, YAML and TOML data files

pub mod atomic;
pub mod dirs;
pub mod formats;

pub use atomic::atomic_write_lines;
pub use dirs::ensure_dir;
pub use formats::{read_data_file, read_json_file, read_text_file, read_toml_file, read_yaml_file};
