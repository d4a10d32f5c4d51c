// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition only. Everything else sits behind the bearer-token middleware.

pub mod auth;
