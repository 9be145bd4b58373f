// handlers/elevated/mod.rs - Elevated handlers
//
// Security Level: protected tier + role guard
// Route Prefix: /api/admin/* (field admin or super admin), /api/root/* (super admin)
//
// Field admins only act on their own field; each handler checks
// `CurrentUser::manages_field` against the resource it touches.

pub mod admin;
pub mod root;
