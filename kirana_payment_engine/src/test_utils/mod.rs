#[cfg(feature = "sqlite")]
pub mod prepare_env;
#[cfg(feature = "sqlite")]
pub mod seed;
