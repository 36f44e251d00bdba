// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const ACCOUNT_REGISTERED: &str = "auth.register";
pub const LOGIN_SUCCESS: &str = "auth.login.success";
pub const LOGIN_FAILURE: &str = "auth.login.failure";
pub const TOKEN_REFRESHED: &str = "auth.refresh";
pub const LOGOUT: &str = "auth.logout";
pub const TOKEN_ISSUED: &str = "token.issued";
pub const TOKEN_REJECTED: &str = "token.rejected";
pub const SESSIONS_ACTIVE: &str = "session.active";
