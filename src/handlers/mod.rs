// handlers/mod.rs - 3-tier handler layout
//
// Public (no auth) → Protected (JWT + active user) → Elevated (field admin / super admin)
//
pub mod public;    // Tier 1: no authentication (/, /health, /auth/*, /media/*)
pub mod protected; // Tier 2: JWT authentication and an active account (/api/*)
pub mod elevated;  // Tier 3: role-gated administration (/api/admin/*, /api/root/*)
