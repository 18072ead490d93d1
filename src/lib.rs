pub mod coefficients;
pub mod constants;
pub mod conversion;
pub mod coord_system;
pub mod field;
pub mod geoid;
pub mod legendre;
pub mod loaders;
pub mod magmod_errors;
pub mod registry;
pub mod time;

pub use coord_system::CoordinateSystem;
pub use field::{eval_model, FieldElements, MagneticModel};
pub use legendre::legendre;
pub use magmod_errors::MagModError;
