//! php-web - build and launch pipeline for PHP apps
//!
//! At build time an ordered set of features writes PHP, web server and
//! php-fpm config plus a process table into a layer. At launch time the
//! `procmgr` binary starts every process in that table and exits as soon as
//! any one of them does.

pub mod cli;
pub mod config;
pub mod contributor;
pub mod detect;
pub mod error;
pub mod features;
pub mod layer;
pub mod procs;
pub mod services;
pub mod supervisor;
pub mod templates;

pub use error::{PhpWebError, PhpWebResult};
