// src/io/mod.rs
//
// Device I/O. Serial is the only transport.

pub mod serial;
