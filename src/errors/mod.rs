pub mod id_errors;

pub use id_errors::{IdError, IdResult};
