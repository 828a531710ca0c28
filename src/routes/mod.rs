/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules,
/// enforcing a Defense-in-Depth strategy. Access control is applied explicitly at
/// the module level (via Axum layers), preventing accidental exposure of protected
/// endpoints.
///
/// The three modules map directly to the defined access roles.

/// Routes accessible to all users: account gateway endpoints plus anonymous-safe
/// reads. Data-retrieval handlers here must enforce the approved-public visibility
/// rule through the authorization policy.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a validated session cookie.
pub mod authenticated;

/// Routes restricted exclusively to users whose record carries the admin flag.
/// Implements mandatory authorization checks.
pub mod admin;
