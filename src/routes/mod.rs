/// Routing Module
///
/// The router is split by access level so the auth gate can be layered over
/// exactly the protected routes in `create_router`.
///
/// - public: sign-in, post creation, health, metadata, landing page.
/// - authenticated: post listings; every handler receives a verified `RequestIdentity`.
pub mod authenticated;
pub mod public;
