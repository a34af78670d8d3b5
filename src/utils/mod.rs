pub mod error;
pub mod password;
pub mod validation;

pub use error::ApiError;
pub use password::{hash_password, verify_password, PasswordError};
pub use validation::{
    normalize_email, validate_display_name, validate_note_content, validate_note_title,
    validate_password, validate_todo_content,
};
