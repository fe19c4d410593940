/// Router Module Index
///
/// Routing split by access level. `create_router` attaches the matching layer
/// to each module, so a route's protection follows from the file it lives in.

/// Anonymous access: catalogue, blog, booking, contact, login.
/// Handlers restrict listings to published records.
pub mod public;

/// Requires a valid session (`AuthUser`), any role.
pub mod authenticated;

/// Requires a valid session with the `admin` role.
pub mod admin;
