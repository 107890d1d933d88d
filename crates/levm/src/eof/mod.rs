//! EOF (EVM Object Format) container parsing and validation: C3 (header) and C4
//! (structural and stack-height validation).

pub mod container;
pub mod header;
pub mod validator;

pub use container::{build_deploy_container, Eof};
pub use header::{read_eof_header, EofHeader, TypeSignature, EOF_MAGIC, EOF_VERSION};
pub use validator::{validate_eof, validate_raw_eof, Mode};
