use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for voice language codes
///
/// Speech providers select voices with BCP-47 style tags such as `ja`,
/// `en-US` or `cmn-CN`. This module validates those tags: the primary
/// subtag must be an ISO 639-1 (2-letter) or ISO 639-3 (3-letter) code,
/// the optional region a 2-letter country code or a 3-digit area code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageTag {
    /// Primary language subtag, lowercase
    pub primary: String,
    /// Region subtag, uppercase for letters
    pub region: Option<String>,
}

impl LanguageTag {
    /// ISO language behind the primary subtag
    pub fn language(&self) -> Option<Language> {
        match self.primary.len() {
            2 => Language::from_639_1(&self.primary),
            3 => Language::from_639_3(&self.primary),
            _ => None,
        }
    }
}

impl std::fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.region {
            Some(region) => write!(f, "{}-{}", self.primary, region),
            None => write!(f, "{}", self.primary),
        }
    }
}

/// Validate a voice language code and split it into subtags
pub fn validate_language_code(code: &str) -> Result<LanguageTag> {
    let trimmed = code.trim();
    let mut subtags = trimmed.split(&['-', '_'][..]);

    let primary = subtags.next().unwrap_or_default().to_lowercase();
    let valid_primary = match primary.len() {
        2 => Language::from_639_1(&primary).is_some(),
        3 => Language::from_639_3(&primary).is_some(),
        _ => false,
    };
    if !valid_primary {
        return Err(anyhow!("Invalid language code: {}", code));
    }

    let region = match subtags.next() {
        None => None,
        Some(region) if region.len() == 2 && region.chars().all(|c| c.is_ascii_alphabetic()) => {
            Some(region.to_uppercase())
        }
        Some(region) if region.len() == 3 && region.chars().all(|c| c.is_ascii_digit()) => {
            Some(region.to_string())
        }
        Some(region) => {
            return Err(anyhow!("Invalid region '{}' in language code: {}", region, code));
        }
    };

    if subtags.next().is_some() {
        return Err(anyhow!("Unsupported language code (too many subtags): {}", code));
    }

    Ok(LanguageTag { primary, region })
}

/// Normalize a voice language code (`en_us` becomes `en-US`)
pub fn normalize_language_code(code: &str) -> Result<String> {
    Ok(validate_language_code(code)?.to_string())
}

/// Check if two codes name the same primary language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    let language1 = match validate_language_code(code1).map(|tag| tag.language()) {
        Ok(Some(language)) => language,
        _ => return false,
    };

    let language2 = match validate_language_code(code2).map(|tag| tag.language()) {
        Ok(Some(language)) => language,
        _ => return false,
    };

    language1 == language2
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let tag = validate_language_code(code)?;
    let lang = tag
        .language()
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;

    Ok(lang.to_name().to_string())
}
