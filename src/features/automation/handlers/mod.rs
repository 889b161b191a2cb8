pub mod info_handler;

pub use info_handler::{
    __path_check_feature, __path_get_features, __path_get_package_info, __path_get_status,
    check_feature, get_features, get_package_info, get_status,
};
