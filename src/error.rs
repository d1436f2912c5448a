use thiserror::Error;

/// Errors produced while reading an RPM package file.
#[derive(Error, Debug)]
pub enum Error {
    #[error("not an RPM package (lead magic mismatch)")]
    NotRpmFile,
    #[error("unsupported RPM format version {0}.{1}")]
    UnsupportedVersion(u8, u8),
    #[error("header magic mismatch")]
    HeaderMagicWrong,
    #[error("header exceeds the configured size limit ({0} bytes)")]
    HeaderTooLarge(u32),
    #[error("tag {tag_id} value extends past the end of the store (offset {offset}, store size {store_size})")]
    OutOfRange {
        tag_id: u32,
        offset: u32,
        store_size: u32,
    },
    #[error("tag {tag_id} has unknown type code {type_code}")]
    UnknownTagType { tag_id: u32, type_code: u32 },
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("payload MD5 checksum mismatch")]
    Md5Mismatch,
    #[error("signature does not match any key in the supplied keyring")]
    GpgUnknownSigner,
    #[error("signature is present but invalid: {0}")]
    GpgInvalid(String),
    #[error("no OpenPGP signature tag present in the signature header")]
    SignatureMissing,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
