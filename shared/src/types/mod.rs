//! Domain types exchanged between the server and the client

pub mod vector;
