///! Profile data: downloading and numeric conversion
///!
///! A profile's sample data lives on the archive as an ASCII table. The
///! client fetches it (falling back to the B1950 alias path when the
///! J-name path 404s) and the parser turns it into `ndarray` matrices.

mod client;
pub use client::ProfileClient;

mod parser;
pub use parser::{parse_profile, parse_single};
