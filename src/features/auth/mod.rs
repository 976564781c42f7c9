mod validator;

pub mod guards;
pub mod model;

pub use model::{AuthenticatedUser, ViewScope};
pub use validator::JwtValidator;
