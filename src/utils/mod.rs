pub mod constants;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{domain_of, file_extension_of, host_of, is_http_url};
