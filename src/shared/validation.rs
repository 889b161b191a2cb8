use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating file ids (hex-encoded SHA-256 content digests)
    /// - Valid: "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    /// - Invalid: uppercase hex, short digests, anything with a path separator
    pub static ref FILE_ID_REGEX: Regex = Regex::new(r"^[0-9a-f]{64}$").unwrap();

    /// Regex for MIME types supplied by callers ("type/subtype", optional parameters)
    /// - Valid: "image/png", "text/plain; charset=utf-8", "application/vnd.ms-excel"
    /// - Invalid: "png", "image/", "/png"
    pub static ref MIME_TYPE_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9!#$&^_.+-]*/[A-Za-z0-9][A-Za-z0-9!#$&^_.+-]*(\s*;.*)?$")
            .unwrap();
}
