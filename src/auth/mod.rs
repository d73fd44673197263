pub mod policy;
pub mod principal;

pub use principal::Principal;
