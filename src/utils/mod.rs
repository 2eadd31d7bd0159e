pub mod bootstrap;
pub mod debounce;
pub mod exit;
pub mod random;
