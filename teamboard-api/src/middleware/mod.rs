/// Middleware modules for the API server
///
/// - `security`: Security headers on every response
///
/// JWT authentication is a `from_fn_with_state` layer in [`crate::app`].

pub mod security;
