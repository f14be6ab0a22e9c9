pub mod component;
pub mod intent;
pub mod outcome;
pub mod query;

pub use component::*;
pub use intent::*;
pub use outcome::*;
pub use query::*;
