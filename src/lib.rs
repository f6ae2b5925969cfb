//! Remote control for the movie player of a Raspberry Pi: list the movies of
//! a directory, play one at a time, and drive the player over its stdin.

pub mod cli;
pub mod config;
pub mod disk;
pub mod download;
pub mod http;
pub mod player;
pub mod shutdown;
