pub mod orbits;
pub mod patch;
