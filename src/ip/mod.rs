//! IPv4 and IPv6 address, subnet and host-pool arithmetic.

mod mask;
pub use mask::*;

mod pool;
pub use pool::*;

mod subnet;
pub use subnet::*;

mod v4;
pub use v4::*;

mod v6;
pub use v6::*;
