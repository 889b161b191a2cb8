mod info_dto;

pub use info_dto::*;
