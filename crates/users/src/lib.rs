//! `storefront-users` — registered users and their contact profile.
//!
//! Authentication and password changes live outside this crate; only the
//! profile data the storefront shows and stores is modelled here.

pub mod user;

pub use user::{ContactUpdate, ProfileError, User};
