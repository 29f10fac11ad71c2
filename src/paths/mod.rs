pub mod format;
pub mod normalize;
pub mod resources;
pub mod utils;
pub mod validate_params;
