//! Folder domain entities.

pub mod model;

pub use model::{Folder, NewFolder, MAX_FOLDER_NAME_LEN, validate_folder_name};
