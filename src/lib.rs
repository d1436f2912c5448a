mod error;
mod evr;
mod header;
mod integrity;
mod lead;
mod package;
mod reader;
mod tag;

pub use error::{Error, Result};
pub use evr::{compare_version_string, rpmvercmp, Evr};
pub use header::Header;
pub use integrity::{
    gpg_check, gpg_check_with_limits, md5_check, md5_check_with_limits, Identity, KeyRing,
    Verification,
};
pub use lead::Lead;
pub use package::{Dependency, FileInfo, FileKind, Package, PortableMode};
pub use reader::ParseLimits;
pub use tag::{Tag, TagType, TagValue};
