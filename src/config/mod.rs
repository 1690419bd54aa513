pub mod decode;
pub mod run;

pub use self::decode::{DecodeConfig, GroupLayout};
pub use self::run::{load_config, RunConfig};
