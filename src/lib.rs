pub mod environment;
pub mod ql;
pub mod util;
