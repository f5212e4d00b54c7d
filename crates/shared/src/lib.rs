mod error;
pub use error::{AppError, AxiomError};

mod env;
pub use env::{APP_ENV, AxiomEnv};

mod domain;
pub use domain::source_domain;
