// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Security Level: valid JWT + existing, active account
// Route Prefix: /api/*
// Middleware: jwt_auth_middleware → validate_user_middleware → require_verified
//             (directory, users, batchmates, events only)
//
// Handlers receive the database-backed `CurrentUser` via `Extension`.

pub mod directory;     // directory, public profiles, batchmates
pub mod events;        // event listing and RSVP
pub mod notifications; // own notifications
pub mod profile;       // own profile and photo
pub mod session;       // whoami, token refresh, password change
pub mod submissions;   // verification requests
