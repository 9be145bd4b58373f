// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition, the field catalogue and stored media.
//
// Security Level: None
// Route Prefix: no /api prefix except the read-only field catalogue
// Middleware: none

pub mod auth;   // POST /auth/register, POST /auth/login
pub mod fields; // GET /api/fields
pub mod media;  // GET /media/*key
pub mod root;   // GET /, GET /health
