// handlers/protected/mod.rs - Handlers behind the bearer-token middleware
//
// Every handler here receives the requester `Identity` as a request
// extension and passes it to the role policy before touching the store.

pub mod auth;
pub mod enrollment;
pub mod resource;
pub mod schedule;
