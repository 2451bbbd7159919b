pub mod constants;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{
    is_data_uri, is_same_host, is_same_origin, path_extension, resolve_url,
};
