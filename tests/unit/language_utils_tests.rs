/*!
 * Tests for language utility functions
 */

use anyhow::Result;
use vttspeak::language_utils::{
    get_language_name, language_codes_match, normalize_language_code, validate_language_code,
};

/// Test validation of voice language codes
#[test]
fn test_validate_language_code_withValidCodes_shouldSplitSubtags() -> Result<()> {
    let tag = validate_language_code("ja")?;
    assert_eq!(tag.primary, "ja");
    assert_eq!(tag.region, None);

    let tag = validate_language_code("en-US")?;
    assert_eq!(tag.primary, "en");
    assert_eq!(tag.region.as_deref(), Some("US"));

    // ISO 639-3 primary with a UN M.49 area code
    let tag = validate_language_code("spa-419")?;
    assert_eq!(tag.primary, "spa");
    assert_eq!(tag.region.as_deref(), Some("419"));

    let tag = validate_language_code(" cmn_cn ")?;
    assert_eq!(tag.to_string(), "cmn-CN");
    Ok(())
}

/// Test that malformed codes are rejected
#[test]
fn test_validate_language_code_withInvalidCodes_shouldFail() {
    assert!(validate_language_code("").is_err());
    assert!(validate_language_code("e").is_err());
    assert!(validate_language_code("zz").is_err());
    assert!(validate_language_code("1234").is_err());
    assert!(validate_language_code("en-USA").is_err());
    assert!(validate_language_code("en-US-extra").is_err());
}

/// Test normalization of separators and case
#[test]
fn test_normalize_language_code_withMixedCase_shouldNormalize() -> Result<()> {
    assert_eq!(normalize_language_code("EN_us")?, "en-US");
    assert_eq!(normalize_language_code("JA")?, "ja");
    assert!(normalize_language_code("not a code").is_err());
    Ok(())
}

/// Test matching across code systems and regions
#[test]
fn test_language_codes_match_withEquivalentCodes_shouldMatch() {
    assert!(language_codes_match("en", "eng"));
    assert!(language_codes_match("en-US", "en_GB"));
    assert!(language_codes_match("ja", "JA-jp"));
    assert!(!language_codes_match("en", "ja"));
    assert!(!language_codes_match("en", "invalid"));
}

/// Test language name lookup
#[test]
fn test_get_language_name_withValidCodes_shouldReturnEnglishName() -> Result<()> {
    assert_eq!(get_language_name("ja")?, "Japanese");
    assert_eq!(get_language_name("en-US")?, "English");
    assert!(get_language_name("zz").is_err());
    Ok(())
}
