mod credentials;
pub mod load;
mod run;
mod types;

pub use credentials::{child_env, Credentials, AUTH_TOKEN_VARS, BASE_URL_VARS};
pub use load::{env_snapshot, load_from_env};
pub use run::{parse_allowed_tools, Run};
pub use types::*;
