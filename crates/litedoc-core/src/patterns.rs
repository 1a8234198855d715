//! Ready-made validation patterns for common field formats.
//!
//! Register one with `DocumentStore::set_regex("email", patterns::EMAIL)`.

pub const EMAIL: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";
/// Ten digits, no separators.
pub const PHONE_NUMBER: &str = r"^[0-9]{10}$";
/// Five-digit postal code.
pub const POSTAL_CODE: &str = r"^[0-9]{5}$";
pub const URL: &str = r"^(https?://)?([\da-z.-]+)\.([a-z.]{2,6})([/\w .-]*)*/?$";
/// `YYYY-MM-DD`
pub const DATE: &str = r"^\d{4}-\d{2}-\d{2}$";
/// 24-hour `H:MM` or `HH:MM`
pub const TIME: &str = r"^([01]?[0-9]|2[0-3]):[0-5][0-9]$";
pub const IPV4: &str =
    r"^((25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$";
/// `#rrggbb` or `#rgb`, the `#` optional.
pub const HEX_COLOR: &str = r"^#?([a-fA-F0-9]{6}|[a-fA-F0-9]{3})$";

/// Every preset as `(name, pattern)`.
pub fn all() -> [(&'static str, &'static str); 8] {
    [
        ("email", EMAIL),
        ("phoneNumber", PHONE_NUMBER),
        ("postalCode", POSTAL_CODE),
        ("url", URL),
        ("date", DATE),
        ("time", TIME),
        ("ipv4", IPV4),
        ("hexColor", HEX_COLOR),
    ]
}
