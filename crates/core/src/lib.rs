pub mod error;
pub mod models;
pub mod resolver;
pub mod settings;
pub mod traits;

pub use error::*;
pub use models::*;
pub use resolver::*;
pub use settings::*;
pub use traits::*;
