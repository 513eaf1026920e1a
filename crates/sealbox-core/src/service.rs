//! Submission and retrieval services.
//!
//! The services are the trust boundary of the system: everything below them
//! (lifecycle, store) handles only ciphertext, and everything they return to
//! callers is either a [`SecretReference`] or one of the collapsed errors.
//!
//! # Security
//!
//! - The link key is generated here and never persisted; it travels only
//!   inside the returned reference.
//! - Retrieval collapses every decryption-path failure (wrong password,
//!   missing password, tampered or corrupt envelope) into
//!   [`SecretError::DecryptionFailed`], so an attacker probing a secret
//!   learns nothing about which factor was wrong.

use std::{fmt, str::FromStr};

use sealbox_crypto::{KEY_SIZE, SecretKey, derive_password_key, open, seal};
use sealbox_proto::{Envelope, KeySource, NONCE_SIZE, Payload, SALT_SIZE};
use tracing::debug;

use crate::{
    config::{Config, SecretPolicy},
    env::Environment,
    error::SecretError,
    lifecycle::Lifecycle,
    model::SecretId,
    store::SecretStore,
};

/// Everything a recipient needs to retrieve a secret: id plus link key.
///
/// Rendered as `<id-hex>#<key-hex>`. In a web deployment the key half rides
/// in the URL fragment, which browsers do not send to the server; the text
/// form here keeps that split explicit.
#[derive(Debug, Clone)]
pub struct SecretReference {
    /// Identifier the store knows the secret by.
    pub id: SecretId,
    /// Link key. Never leaves the sender and recipient.
    pub key: SecretKey,
}

impl fmt::Display for SecretReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.id, hex::encode(self.key.as_bytes()))
    }
}

impl FromStr for SecretReference {
    type Err = ParseReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id_part, key_part) = s.split_once('#').ok_or(ParseReferenceError)?;

        let id = id_part.parse::<SecretId>().map_err(|_| ParseReferenceError)?;

        let mut key_bytes = [0u8; KEY_SIZE];
        hex::decode_to_slice(key_part, &mut key_bytes).map_err(|_| ParseReferenceError)?;

        Ok(Self { id, key: SecretKey::from_bytes(key_bytes) })
    }
}

/// A secret reference string was not `<32 hex>#<64 hex>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("malformed secret reference")]
pub struct ParseReferenceError;

/// Accepts plaintext bundles and turns them into stored ciphertext.
#[derive(Clone)]
pub struct SubmissionService<S: SecretStore, E: Environment> {
    lifecycle: Lifecycle<S, E>,
    config: Config,
}

impl<S: SecretStore, E: Environment> SubmissionService<S, E> {
    /// Build a submission service over a lifecycle manager.
    pub fn new(lifecycle: Lifecycle<S, E>, config: Config) -> Self {
        Self { lifecycle, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Encrypt and store a payload; returns the reference the sender shares.
    ///
    /// An empty password is treated as no password. The size limit is
    /// checked against the plaintext bundle before any crypto work.
    ///
    /// # Errors
    ///
    /// - [`SecretError::SizeLimitExceeded`] if the bundle is at or over the
    ///   limit
    /// - [`SecretError::Store`] if persisting fails; nothing is retained
    pub fn submit(
        &self,
        payload: &Payload,
        password: Option<&str>,
        policy: SecretPolicy,
    ) -> Result<SecretReference, SecretError> {
        let size = payload.size();
        if size >= self.config.max_secret_size {
            return Err(SecretError::SizeLimitExceeded {
                actual: size,
                max: self.config.max_secret_size,
            });
        }

        let plaintext = payload
            .pack()
            .map_err(|e| SecretError::Internal(format!("payload encode: {e}")))?;

        let env = self.lifecycle.env().clone();

        let mut key_bytes = [0u8; KEY_SIZE];
        env.random_bytes(&mut key_bytes);
        let link_key = SecretKey::from_bytes(key_bytes);

        let password = password.filter(|p| !p.is_empty());
        let (key_source, encryption_key) = match password {
            Some(pw) => {
                let mut salt = [0u8; SALT_SIZE];
                env.random_bytes(&mut salt);
                let derived = derive_password_key(&link_key, pw, &salt)
                    .map_err(|e| SecretError::Internal(format!("key derivation: {e}")))?;
                (KeySource::Password { salt }, derived)
            },
            None => (KeySource::LinkOnly, link_key.clone()),
        };

        let mut nonce = [0u8; NONCE_SIZE];
        env.random_bytes(&mut nonce);

        let envelope =
            seal(&plaintext, &encryption_key, self.config.algorithm, key_source, nonce);
        let envelope_bytes = envelope
            .encode_to_vec()
            .map_err(|e| SecretError::Internal(format!("envelope encode: {e}")))?;

        let resolved = self.config.resolve(policy);
        let expires_in_secs =
            resolved.expires_in_secs.unwrap_or(self.config.default_expires_in_secs);

        let id = self.lifecycle.create(
            envelope_bytes,
            resolved.reads,
            resolved.slow_burn,
            expires_in_secs,
            password.is_some(),
        )?;

        debug!(
            %id,
            size,
            password_protected = password.is_some(),
            algorithm = %self.config.algorithm,
            "secret submitted"
        );

        Ok(SecretReference { id, key: link_key })
    }
}

/// Resolves references back into plaintext payloads.
#[derive(Clone)]
pub struct RetrievalService<S: SecretStore, E: Environment> {
    lifecycle: Lifecycle<S, E>,
}

impl<S: SecretStore, E: Environment> RetrievalService<S, E> {
    /// Build a retrieval service over a lifecycle manager.
    pub fn new(lifecycle: Lifecycle<S, E>) -> Self {
        Self { lifecycle }
    }

    /// Fetch, decrypt, and unpack a secret.
    ///
    /// Read accounting follows the record's own mode: an eager secret has
    /// already consumed its read by the time decryption runs, so a wrong
    /// password burns the attempt; a slow-burn secret is confirmed only
    /// after the plaintext is recovered.
    ///
    /// # Errors
    ///
    /// - [`SecretError::SecretNotFound`] for absent, expired, or exhausted
    /// - [`SecretError::DecryptionFailed`] for any key or envelope problem
    /// - [`SecretError::MalformedPayload`] if decryption succeeds but the
    ///   plaintext is not a valid bundle (the read is still consumed)
    pub fn retrieve(
        &self,
        reference: &SecretReference,
        password: Option<&str>,
    ) -> Result<Payload, SecretError> {
        let fetched = self.lifecycle.fetch(reference.id)?;

        let plaintext = decrypt_secret(&fetched.envelope, &reference.key, password)?;

        if fetched.slow_burn {
            self.lifecycle.confirm(reference.id)?;
        }

        debug!(id = %reference.id, slow_burn = fetched.slow_burn, "secret retrieved");

        Payload::unpack(&plaintext).map_err(|_| SecretError::MalformedPayload)
    }
}

/// Decode an envelope and open it with the link key plus optional password.
///
/// Every failure on this path collapses to
/// [`SecretError::DecryptionFailed`]: a malformed envelope, a missing or
/// wrong password, and a failed authentication tag are indistinguishable to
/// the caller.
pub fn decrypt_secret(
    envelope_bytes: &[u8],
    link_key: &SecretKey,
    password: Option<&str>,
) -> Result<Vec<u8>, SecretError> {
    let envelope =
        Envelope::decode(envelope_bytes).map_err(|_| SecretError::DecryptionFailed)?;

    let key = match envelope.key_source {
        KeySource::LinkOnly => link_key.clone(),
        KeySource::Password { salt } => {
            let Some(pw) = password.filter(|p| !p.is_empty()) else {
                return Err(SecretError::DecryptionFailed);
            };
            derive_password_key(link_key, pw, &salt)
                .map_err(|_| SecretError::DecryptionFailed)?
        },
    };

    open(&envelope, &key).map_err(|_| SecretError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{env::ManualEnv, model::ReadBudget, store::MemoryStore};

    fn services(
        config: Config,
    ) -> (SubmissionService<MemoryStore, ManualEnv>, RetrievalService<MemoryStore, ManualEnv>)
    {
        let lifecycle = Lifecycle::new(MemoryStore::new(), ManualEnv::at(1_000, 7));
        (SubmissionService::new(lifecycle.clone(), config), RetrievalService::new(lifecycle))
    }

    fn payload() -> Payload {
        Payload::message_only("the launch code is 0000")
    }

    #[test]
    fn submit_retrieve_round_trip() {
        let (submit, retrieve) = services(Config::default());

        let reference = submit
            .submit(&payload(), None, SecretPolicy::default())
            .expect("submit failed");

        let recovered = retrieve.retrieve(&reference, None).expect("retrieve failed");
        assert_eq!(recovered, payload());
    }

    #[test]
    fn burn_after_read_is_gone_on_second_attempt() {
        let (submit, retrieve) = services(Config::default());

        let reference = submit
            .submit(&payload(), None, SecretPolicy::default())
            .expect("submit failed");

        retrieve.retrieve(&reference, None).expect("first read failed");
        assert_eq!(
            retrieve.retrieve(&reference, None),
            Err(SecretError::SecretNotFound)
        );
    }

    #[test]
    fn password_round_trip_and_wrong_password() {
        let (submit, retrieve) = services(Config::default());

        let reference = submit
            .submit(
                &payload(),
                Some("horse battery"),
                SecretPolicy { reads: ReadBudget::Limited(5), ..SecretPolicy::default() },
            )
            .expect("submit failed");

        assert_eq!(
            retrieve.retrieve(&reference, Some("wrong")),
            Err(SecretError::DecryptionFailed)
        );
        assert_eq!(
            retrieve.retrieve(&reference, None),
            Err(SecretError::DecryptionFailed)
        );

        let recovered = retrieve
            .retrieve(&reference, Some("horse battery"))
            .expect("retrieve failed");
        assert_eq!(recovered, payload());
    }

    #[test]
    fn empty_password_means_no_password() {
        let (submit, retrieve) = services(Config::default());

        let reference = submit
            .submit(&payload(), Some(""), SecretPolicy::default())
            .expect("submit failed");

        // Stored without a password; plain retrieval works.
        let recovered = retrieve.retrieve(&reference, None).expect("retrieve failed");
        assert_eq!(recovered, payload());
    }

    #[test]
    fn size_limit_is_checked_before_any_storage() {
        let (submit, _) = services(Config { max_secret_size: 16, ..Config::default() });

        let big = Payload::message_only("x".repeat(17));
        let result = submit.submit(&big, None, SecretPolicy::default());
        assert!(matches!(
            result,
            Err(SecretError::SizeLimitExceeded { actual: 17, max: 16 })
        ));
        assert_eq!(submit.lifecycle.store().count().unwrap(), 0);
    }

    #[test]
    fn payload_at_exact_limit_is_rejected() {
        let (submit, _) = services(Config { max_secret_size: 16, ..Config::default() });

        // The limit itself is out of bounds; only strictly smaller bundles
        // are accepted.
        let at_limit = Payload::message_only("x".repeat(16));
        let result = submit.submit(&at_limit, None, SecretPolicy::default());
        assert!(matches!(
            result,
            Err(SecretError::SizeLimitExceeded { actual: 16, max: 16 })
        ));

        let under = Payload::message_only("x".repeat(15));
        assert!(submit.submit(&under, None, SecretPolicy::default()).is_ok());
    }

    #[test]
    fn reference_text_round_trip() {
        let (submit, retrieve) = services(Config::default());

        let reference = submit
            .submit(&payload(), None, SecretPolicy::default())
            .expect("submit failed");

        let text = reference.to_string();
        let parsed = text.parse::<SecretReference>().expect("parse failed");

        let recovered = retrieve.retrieve(&parsed, None).expect("retrieve failed");
        assert_eq!(recovered, payload());
    }

    #[test]
    fn reference_parse_rejects_garbage() {
        assert!("".parse::<SecretReference>().is_err());
        assert!("no-separator".parse::<SecretReference>().is_err());
        assert!("abc#def".parse::<SecretReference>().is_err());

        let id = "0".repeat(32);
        assert!(format!("{id}#tooshort").parse::<SecretReference>().is_err());
        assert!(format!("{id}#{}", "0".repeat(64)).parse::<SecretReference>().is_ok());
    }

    #[test]
    fn reference_display_redacts_nothing_but_debug_redacts_key() {
        let reference = SecretReference {
            id: SecretId::new(1),
            key: SecretKey::from_bytes([0xAB; KEY_SIZE]),
        };

        assert!(reference.to_string().contains(&"ab".repeat(KEY_SIZE)));
        assert!(!format!("{reference:?}").contains(&"ab".repeat(KEY_SIZE)));
    }

    #[test]
    fn require_burn_caps_reads_at_one() {
        let (submit, retrieve) =
            services(Config { require_burn: true, ..Config::default() });

        let reference = submit
            .submit(
                &payload(),
                None,
                SecretPolicy { reads: ReadBudget::Unlimited, ..SecretPolicy::default() },
            )
            .expect("submit failed");

        retrieve.retrieve(&reference, None).expect("first read failed");
        assert_eq!(
            retrieve.retrieve(&reference, None),
            Err(SecretError::SecretNotFound)
        );
    }

    #[test]
    fn wrong_password_burns_eager_read() {
        let (submit, retrieve) = services(Config::default());

        let reference = submit
            .submit(
                &payload(),
                Some("pw"),
                SecretPolicy { reads: ReadBudget::Limited(1), ..SecretPolicy::default() },
            )
            .expect("submit failed");

        // The fetch consumed the only read; even the right password is too
        // late now.
        assert_eq!(
            retrieve.retrieve(&reference, Some("wrong")),
            Err(SecretError::DecryptionFailed)
        );
        assert_eq!(
            retrieve.retrieve(&reference, Some("pw")),
            Err(SecretError::SecretNotFound)
        );
    }

    #[test]
    fn wrong_password_counts_against_reread_budget() {
        let (submit, retrieve) = services(Config::default());

        let reference = submit
            .submit(
                &payload(),
                Some("pw"),
                SecretPolicy { reads: ReadBudget::Limited(2), ..SecretPolicy::default() },
            )
            .expect("submit failed");

        // First attempt guesses wrong and burns one of the two reads.
        assert_eq!(
            retrieve.retrieve(&reference, Some("wrong")),
            Err(SecretError::DecryptionFailed)
        );

        // Second attempt succeeds and exhausts the budget.
        assert_eq!(retrieve.retrieve(&reference, Some("pw")).unwrap(), payload());
        assert_eq!(
            retrieve.retrieve(&reference, Some("pw")),
            Err(SecretError::SecretNotFound)
        );
    }

    #[test]
    fn slow_burn_survives_wrong_password() {
        let (submit, retrieve) = services(Config::default());

        let reference = submit
            .submit(
                &payload(),
                Some("pw"),
                SecretPolicy {
                    reads: ReadBudget::Limited(1),
                    slow_burn: true,
                    ..SecretPolicy::default()
                },
            )
            .expect("submit failed");

        for _ in 0..3 {
            assert_eq!(
                retrieve.retrieve(&reference, Some("wrong")),
                Err(SecretError::DecryptionFailed)
            );
        }

        let recovered =
            retrieve.retrieve(&reference, Some("pw")).expect("retrieve failed");
        assert_eq!(recovered, payload());

        // The successful read consumed the budget.
        assert_eq!(
            retrieve.retrieve(&reference, Some("pw")),
            Err(SecretError::SecretNotFound)
        );
    }
}
