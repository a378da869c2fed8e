#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]

pub mod api;
pub mod catalog;
pub mod constants;
pub mod error;

pub use crate::api::*;
pub use crate::catalog::*;
pub use crate::constants::*;
pub use crate::error::*;
