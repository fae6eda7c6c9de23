use base64::{URL_SAFE_NO_PAD, decode_config, encode_config};
use jwt_simple::prelude::ES256KeyPair;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::config;
use crate::types::push::VapidConfig;

#[derive(Debug, Clone)]
pub struct VapidCredentials {
    pub private_key: String,
    pub public_key: String,
}

#[derive(Debug, Clone)]
pub enum VapidConfigStatus {
    Missing,
    Incomplete,
    Invalid(&'static str),
    Ready(VapidConfig),
}

/// Resolves the delivery channel configuration from the app config. All
/// three values must be present and the private key must be a raw P-256
/// scalar in URL-safe base64.
pub fn load_vapid_config(config: &config::AppConfig) -> VapidConfigStatus {
    let private_key = non_empty(config.vapid_private_key.as_deref());
    let public_key = non_empty(config.vapid_public_key.as_deref());
    let subject = non_empty(config.vapid_subject.as_deref());
    let has_any = private_key.is_some() || public_key.is_some() || subject.is_some();

    match (private_key, public_key, subject) {
        (Some(private_key), Some(public_key), Some(subject)) => {
            match decode_config(private_key, URL_SAFE_NO_PAD) {
                Ok(bytes) if bytes.len() == 32 => {}
                _ => return VapidConfigStatus::Invalid("private key must be 32 bytes of url-safe base64"),
            }
            if !(subject.starts_with("mailto:") || subject.starts_with("https://")) {
                return VapidConfigStatus::Invalid("subject must be a mailto: or https:// URI");
            }
            VapidConfigStatus::Ready(VapidConfig {
                private_key: private_key.to_string(),
                public_key: public_key.to_string(),
                subject: subject.to_string(),
            })
        }
        _ if has_any => VapidConfigStatus::Incomplete,
        _ => VapidConfigStatus::Missing,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub fn generate_vapid_credentials() -> Result<VapidCredentials, web_push::WebPushError> {
    let mut rng = OsRng;
    generate_vapid_credentials_with_rng(&mut rng)
}

pub(crate) fn generate_vapid_credentials_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<VapidCredentials, web_push::WebPushError> {
    let key_pair = generate_es256_keypair_with_rng(rng);
    let private_key = encode_config(key_pair.to_bytes(), URL_SAFE_NO_PAD);
    let public_key =
        web_push::VapidSignatureBuilder::from_base64_no_sub(&private_key, URL_SAFE_NO_PAD)?
            .get_public_key();
    let public_key = encode_config(public_key, URL_SAFE_NO_PAD);

    Ok(VapidCredentials {
        private_key,
        public_key,
    })
}

fn generate_es256_keypair_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> ES256KeyPair {
    let mut key_bytes = [0u8; 32];
    loop {
        rng.fill_bytes(&mut key_bytes);
        if let Ok(key_pair) = ES256KeyPair::from_bytes(&key_bytes) {
            return key_pair;
        }
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config_with(
        private_key: Option<&str>,
        public_key: Option<&str>,
        subject: Option<&str>,
    ) -> config::AppConfig {
        config::AppConfig {
            vapid_private_key: private_key.map(str::to_string),
            vapid_public_key: public_key.map(str::to_string),
            vapid_subject: subject.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn generate_vapid_credentials_with_rng__should_be_deterministic_for_a_seed() {
        // Given
        let mut first_rng = StdRng::from_seed([7u8; 32]);
        let mut second_rng = StdRng::from_seed([7u8; 32]);

        // When
        let first = generate_vapid_credentials_with_rng(&mut first_rng).expect("credentials");
        let second = generate_vapid_credentials_with_rng(&mut second_rng).expect("credentials");

        // Then
        assert_eq!(first.private_key, second.private_key);
        assert_eq!(first.public_key, second.public_key);
        assert_eq!(
            decode_config(&first.public_key, URL_SAFE_NO_PAD)
                .expect("decode public key")
                .len(),
            65
        );
    }

    #[test]
    fn load_vapid_config__should_accept_generated_credentials() {
        // Given
        let mut rng = StdRng::from_seed([7u8; 32]);
        let credentials = generate_vapid_credentials_with_rng(&mut rng).expect("credentials");
        let config = config_with(
            Some(&credentials.private_key),
            Some(&credentials.public_key),
            Some("mailto:ops@example.com"),
        );

        // When
        let status = load_vapid_config(&config);

        // Then
        match status {
            VapidConfigStatus::Ready(vapid) => {
                assert_eq!(vapid.public_key, credentials.public_key);
                assert_eq!(vapid.subject, "mailto:ops@example.com");
            }
            other => panic!("expected ready config, got {other:?}"),
        }
    }

    #[test]
    fn load_vapid_config__should_distinguish_missing_and_incomplete() {
        assert!(matches!(
            load_vapid_config(&config_with(None, None, None)),
            VapidConfigStatus::Missing
        ));
        assert!(matches!(
            load_vapid_config(&config_with(None, Some("pub"), Some("  "))),
            VapidConfigStatus::Incomplete
        ));
    }

    #[test]
    fn load_vapid_config__should_reject_malformed_private_key() {
        let config = config_with(Some("not-a-key"), Some("pub"), Some("mailto:ops@example.com"));

        assert!(matches!(
            load_vapid_config(&config),
            VapidConfigStatus::Invalid(_)
        ));
    }
}
