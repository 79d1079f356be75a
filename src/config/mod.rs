pub mod paths;
pub mod rcparams;

pub use paths::{CONFIG_DIR_ENV_KEY, RC_ENV_KEY, RC_FILE_NAME, config_dir, config_file};
pub use rcparams::RcParams;
