//! Wire protocol definitions
//!
//! Vectors travel over a persistent TCP connection as back-to-back
//! length-prefixed frames. There is no handshake: the vector length is agreed
//! out of band through configuration on both ends.

pub mod frame;
