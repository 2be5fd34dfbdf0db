//! Source text decoding for public-data CSV exports.
//!
//! Korean government datasets ship either as UTF-8 (often with a BOM) or as
//! CP949. CP949 is decoded with `encoding_rs::EUC_KR`, which is the
//! windows-949 superset.

use std::fmt;
use std::str::FromStr;

use encoding_rs::EUC_KR;

use fitquest_core::{Error, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Encoding of an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Cp949,
    /// UTF-8 when the bytes are valid UTF-8, CP949 otherwise.
    Auto,
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceEncoding::Utf8 => "utf8",
            SourceEncoding::Cp949 => "cp949",
            SourceEncoding::Auto => "auto",
        })
    }
}

impl FromStr for SourceEncoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" | "utf-8-sig" => Ok(SourceEncoding::Utf8),
            "cp949" | "euc-kr" | "euckr" => Ok(SourceEncoding::Cp949),
            "auto" => Ok(SourceEncoding::Auto),
            other => Err(format!(
                "unknown encoding '{}', expected utf8, cp949 or auto",
                other
            )),
        }
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| Error::InvalidInput(format!("input is not valid UTF-8: {}", e)))
}

fn decode_cp949(bytes: &[u8]) -> Result<String> {
    let (text, had_errors) = EUC_KR.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(Error::InvalidInput(
            "input is not valid CP949".to_string(),
        ));
    }
    Ok(text.into_owned())
}

/// Decode `bytes` as `encoding`. A UTF-8 byte-order mark always wins.
pub fn decode(bytes: &[u8], encoding: SourceEncoding) -> Result<String> {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return decode_utf8(rest);
    }
    match encoding {
        SourceEncoding::Utf8 => decode_utf8(bytes),
        SourceEncoding::Cp949 => decode_cp949(bytes),
        SourceEncoding::Auto => decode_utf8(bytes).or_else(|_| decode_cp949(bytes)),
    }
}
