//! Maps provider failures onto the fixed, user-facing apology strings.

use crate::provider::ProviderError;

pub const USAGE_LIMIT_APOLOGY: &str =
    "I apologize, but I've reached my usage limit for today. Please try again later.";
pub const CONFIGURATION_APOLOGY: &str =
    "There was an issue with the API configuration. Please check the API key.";
pub const CONNECTION_APOLOGY: &str =
    "I'm having trouble connecting right now. Please try again in a moment.";

pub const APOLOGIES: [&str; 3] = [USAGE_LIMIT_APOLOGY, CONFIGURATION_APOLOGY, CONNECTION_APOLOGY];

const QUOTA_CODES: &[&str] = &["insufficient_quota", "rate_limit_error", "resource_exhausted"];
const CREDENTIAL_CODES: &[&str] = &["invalid_api_key", "authentication_error", "api_key_invalid"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    QuotaExceeded,
    InvalidCredentials,
    Unavailable,
}

pub fn classify(err: &ProviderError) -> FailureKind {
    let ProviderError::Api {
        status,
        code,
        message,
        ..
    } = err
    else {
        // A missing key never reached the provider; it reads as a connection problem.
        return FailureKind::Unavailable;
    };

    let code = code.as_deref().unwrap_or_default().to_ascii_lowercase();
    if QUOTA_CODES.contains(&code.as_str()) || *status == 429 {
        return FailureKind::QuotaExceeded;
    }
    if CREDENTIAL_CODES.contains(&code.as_str())
        || *status == 401
        || message.contains("API_KEY_INVALID")
        || message.contains("API key not valid")
    {
        return FailureKind::InvalidCredentials;
    }
    FailureKind::Unavailable
}

pub fn apology_for(err: &ProviderError) -> &'static str {
    match classify(err) {
        FailureKind::QuotaExceeded => USAGE_LIMIT_APOLOGY,
        FailureKind::InvalidCredentials => CONFIGURATION_APOLOGY,
        FailureKind::Unavailable => CONNECTION_APOLOGY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::ProviderKind;

    fn api(status: u16, code: Option<&str>, message: &str) -> ProviderError {
        ProviderError::Api {
            provider: ProviderKind::Openai,
            status,
            code: code.map(str::to_string),
            message: message.to_string(),
        }
    }

    #[test]
    fn quota_code_or_429_maps_to_usage_limit() {
        assert_eq!(
            apology_for(&api(400, Some("insufficient_quota"), "quota")),
            USAGE_LIMIT_APOLOGY
        );
        assert_eq!(apology_for(&api(429, None, "slow down")), USAGE_LIMIT_APOLOGY);
        assert_eq!(
            apology_for(&api(400, Some("RESOURCE_EXHAUSTED"), "quota")),
            USAGE_LIMIT_APOLOGY
        );
    }

    #[test]
    fn invalid_key_maps_to_configuration_apology() {
        assert_eq!(
            apology_for(&api(401, Some("invalid_api_key"), "bad key")),
            CONFIGURATION_APOLOGY
        );
        assert_eq!(
            apology_for(&api(400, Some("INVALID_ARGUMENT"), "API key not valid. Please pass a valid API key.")),
            CONFIGURATION_APOLOGY
        );
    }

    #[test]
    fn missing_credential_and_server_errors_map_to_connection_apology() {
        let missing = ProviderError::MissingCredential {
            provider: ProviderKind::Gemini,
            env_var: "GOOGLE_API_KEY",
        };
        assert_eq!(apology_for(&missing), CONNECTION_APOLOGY);
        assert_eq!(apology_for(&api(503, None, "overloaded")), CONNECTION_APOLOGY);
        assert_eq!(
            apology_for(&ProviderError::EmptyResponse {
                provider: ProviderKind::Anthropic
            }),
            CONNECTION_APOLOGY
        );
    }
}
