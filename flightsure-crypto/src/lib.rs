pub mod keys;
pub mod signatures;
