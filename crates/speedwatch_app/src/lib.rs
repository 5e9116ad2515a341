//! `speedwatch`: operator command line for the speed detection backend.

pub mod cli;
pub mod config;
pub mod media;
pub mod report;
