use std::io::Read;

use digest::Digest;
use md5::Md5;

use crate::error::{Error, Result};
use crate::header::Header;
use crate::lead::Lead;
use crate::reader::ParseLimits;
use crate::tag::{SIGTAG_GPG, SIGTAG_MD5, SIGTAG_PAYLOADSIZE, SIGTAG_PGP, SIGTAG_PGP5};

/// The signing identity returned by a successful [`KeyRing::verify`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
}

/// Outcome of a [`KeyRing::verify`] attempt. Distinguishes "this signature
/// doesn't correspond to any key we hold" from "this signature is malformed
/// or doesn't verify against the key it claims" — the caller's trust
/// decision differs in each case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verification {
    Valid(Identity),
    UnknownSigner,
    Invalid(String),
}

/// External collaborator performing detached OpenPGP signature verification.
///
/// This crate has no opinion on key formats or cryptographic primitives; it
/// hands the caller's `KeyRing` the signed data and the detached signature
/// bytes and trusts the result.
pub trait KeyRing {
    /// Verifies `signature` as a detached signature over `signed_data`.
    fn verify(&self, signed_data: &[u8], signature: &[u8]) -> Verification;
}

/// Reads lead + signature header, then streams the remainder of `reader`
/// (main header + payload) through an MD5 context and compares it against
/// the expected size and digest recorded in the signature header.
pub fn md5_check<R: Read>(reader: &mut R) -> Result<()> {
    md5_check_with_limits(reader, ParseLimits::default())
}

pub fn md5_check_with_limits<R: Read>(reader: &mut R, limits: ParseLimits) -> Result<()> {
    Lead::read(reader)?;
    let signature = Header::read(reader, true, limits)?;

    let payload_size = signature
        .tag(SIGTAG_PAYLOADSIZE)
        .map(|t| t.as_i64())
        .ok_or(Error::Md5Mismatch)?;
    let expected = signature.tag(SIGTAG_MD5).map(|t| t.as_bytes()).unwrap_or_default();
    if expected.is_empty() {
        return Err(Error::Md5Mismatch);
    }

    let mut hasher = Md5::new();
    let mut buffer = [0u8; 8192];
    let mut total: i64 = 0;
    loop {
        let count = reader.read(&mut buffer)?;
        if count == 0 {
            break;
        }
        hasher.update(&buffer[..count]);
        total += count as i64;
    }

    if total != payload_size {
        return Err(Error::Md5Mismatch);
    }
    let digest = hasher.finalize();
    if digest.as_slice() != expected.as_slice() {
        return Err(Error::Md5Mismatch);
    }
    Ok(())
}

/// Reads lead + signature header, then verifies the detached OpenPGP
/// signature over the remainder of `reader` (main header + payload) against
/// `keyring`. Signature tags are tried in precedence order: PGP, PGP5, GPG.
pub fn gpg_check<R: Read, K: KeyRing>(reader: &mut R, keyring: &K) -> Result<Identity> {
    gpg_check_with_limits(reader, keyring, ParseLimits::default())
}

pub fn gpg_check_with_limits<R: Read, K: KeyRing>(
    reader: &mut R,
    keyring: &K,
    limits: ParseLimits,
) -> Result<Identity> {
    Lead::read(reader)?;
    let signature = Header::read(reader, true, limits)?;

    let sig_bytes = [SIGTAG_PGP, SIGTAG_PGP5, SIGTAG_GPG]
        .iter()
        .find_map(|&tag_id| {
            signature.tag(tag_id).map(|t| t.as_bytes()).filter(|b| !b.is_empty())
        })
        .ok_or(Error::SignatureMissing)?;

    let mut signed_data = Vec::new();
    reader.read_to_end(&mut signed_data)?;

    match keyring.verify(&signed_data, &sig_bytes) {
        Verification::Valid(identity) => Ok(identity),
        Verification::UnknownSigner => Err(Error::GpgUnknownSigner),
        Verification::Invalid(reason) => Err(Error::GpgInvalid(reason)),
    }
}
