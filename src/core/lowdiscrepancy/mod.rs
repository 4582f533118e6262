pub mod sobol;

pub use sobol::*;
