//! Request validation.
//!
//! Every request passes these checks before the key store or any engine is
//! touched. Checks run in a fixed order and stop at the first failure:
//!
//! 1. handle present                          → `InvalidInputParams`
//! 2. parameters present, every code known    → `InvalidInputParams`
//! 3. key name present and non-empty          → `InvalidKeyIndex`
//! 4. input buffer present and non-empty      → `InvalidInputParams`
//! 5. output destination present              → `InvalidInputParams`
//! 6. size limits and GCM tag length          → `InvalidInputParams`
//!
//! Nothing here depends on key contents, and nothing has side effects.
//! Whether a named key exists is the key store's concern.

use crate::error::{Result, SecurityError};
use crate::keystore::KeyStoreError;
use crate::params::{
    AesMode, AesParams, GCM_MIN_TAG_LEN, GCM_TAG_LEN, GcmMode, GcmParams, HashAlgorithm,
    RsaParams, RsaScheme, UnknownCode,
};
use crate::session::Session;

impl From<UnknownCode> for SecurityError {
    fn from(e: UnknownCode) -> Self {
        SecurityError::InvalidInputParams(e.to_string())
    }
}

/// Raw parameters as they arrive across the C boundary.
pub trait RawParams {
    type Checked: ParamLimits;

    /// Map every raw code to its typed variant.
    fn check(self) -> Result<Self::Checked>;
}

/// Parameters whose buffers could not even be read (e.g. a null pointer
/// with a non-zero length) fail at step 2 with the stored error.
impl<P: RawParams> RawParams for Result<P> {
    type Checked = P::Checked;

    fn check(self) -> Result<P::Checked> {
        self?.check()
    }
}

/// Structural limits on already-typed parameters (step 6).
pub trait ParamLimits {
    fn check_limits(&self) -> Result<()> {
        Ok(())
    }
}

impl ParamLimits for AesParams<'_> {}

impl ParamLimits for RsaParams {}

impl ParamLimits for GcmParams<'_> {
    fn check_limits(&self) -> Result<()> {
        if !(GCM_MIN_TAG_LEN..=GCM_TAG_LEN).contains(&self.tag_len) {
            return Err(SecurityError::invalid_input(format!(
                "GCM tag length must be {GCM_MIN_TAG_LEN}..={GCM_TAG_LEN} bytes, got {}",
                self.tag_len
            )));
        }
        match self.tag {
            Some(tag) if tag.len() != self.tag_len => Err(SecurityError::invalid_input(format!(
                "tag buffer holds {} bytes but tag length is {}",
                tag.len(),
                self.tag_len
            ))),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RawAesParams<'a> {
    pub mode: u32,
    pub iv: Option<&'a [u8]>,
}

impl<'a> RawParams for RawAesParams<'a> {
    type Checked = AesParams<'a>;

    fn check(self) -> Result<AesParams<'a>> {
        Ok(AesParams {
            mode: AesMode::try_from(self.mode)?,
            iv: self.iv,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RawRsaParams {
    pub scheme: u32,
    pub hash_a: u32,
    pub hash_b: u32,
    pub salt_len: u32,
}

impl RawParams for RawRsaParams {
    type Checked = RsaParams;

    fn check(self) -> Result<RsaParams> {
        Ok(RsaParams {
            scheme: RsaScheme::try_from(self.scheme)?,
            hash_a: HashAlgorithm::try_from(self.hash_a)?,
            hash_b: HashAlgorithm::try_from(self.hash_b)?,
            salt_len: self.salt_len,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RawGcmParams<'a> {
    pub mode: u32,
    pub iv: &'a [u8],
    pub aad: &'a [u8],
    pub tag_len: usize,
    pub tag: Option<&'a [u8]>,
}

impl<'a> RawParams for RawGcmParams<'a> {
    type Checked = GcmParams<'a>;

    fn check(self) -> Result<GcmParams<'a>> {
        Ok(GcmParams {
            mode: GcmMode::try_from(self.mode)?,
            iv: self.iv,
            aad: self.aad,
            tag_len: self.tag_len,
            tag: self.tag,
        })
    }
}

/// A request as seen at the boundary; `None` stands for a null pointer.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a, P> {
    pub params: Option<P>,
    pub key_name: Option<&'a str>,
    pub input: Option<&'a [u8]>,
    pub has_output: bool,
}

/// A request that passed every check.
pub struct Validated<'s, 'a, T> {
    pub session: &'s Session,
    pub params: T,
    pub key_name: &'a str,
    pub input: &'a [u8],
}

/// Run the ordered checks over a raw request.
pub fn validate_request<'s, 'a, P: RawParams>(
    session: Option<&'s Session>,
    request: Request<'a, P>,
) -> Result<Validated<'s, 'a, P::Checked>> {
    let session = session.ok_or_else(|| SecurityError::invalid_input("null or unknown handle"))?;
    let params = request
        .params
        .ok_or_else(|| SecurityError::invalid_input("null parameters"))?
        .check()?;
    let key_name = key_name(request.key_name)?;
    let input = input(request.input, session.config().max_input_len)?;
    if !request.has_output {
        return Err(SecurityError::invalid_input("null output"));
    }
    params.check_limits()?;

    Ok(Validated {
        session,
        params,
        key_name,
        input,
    })
}

/// Step 3: a key name must be present and non-empty.
pub fn key_name(name: Option<&str>) -> Result<&str> {
    match name {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(SecurityError::InvalidKeyIndex(KeyStoreError::EmptyName)),
    }
}

/// Step 4 plus the input size limit of step 6.
pub fn input(data: Option<&[u8]>, max_len: usize) -> Result<&[u8]> {
    let data = data.ok_or_else(|| SecurityError::invalid_input("null input"))?;
    if data.is_empty() {
        return Err(SecurityError::invalid_input("empty input"));
    }
    if data.len() > max_len {
        return Err(SecurityError::invalid_input(format!(
            "input of {} bytes exceeds limit of {max_len}",
            data.len()
        )));
    }
    Ok(data)
}
