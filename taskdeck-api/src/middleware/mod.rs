/// HTTP middleware
///
/// Authentication layers live in [`crate::app`] next to the router; this
/// module holds the response-shaping middleware.

pub mod security;
