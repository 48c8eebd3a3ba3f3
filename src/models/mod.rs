// Re-export all model types
pub use self::cart::*;
pub use self::enums::*;
pub use self::errors::*;
pub use self::order::*;
pub use self::product::*;
pub use self::user::*;
pub use self::validation::*;

mod cart;
mod enums;
mod errors;
mod order;
mod product;
mod user;
mod validation;
