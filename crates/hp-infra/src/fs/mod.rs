mod atomic;

pub use atomic::{read_json, write_json_atomic};
