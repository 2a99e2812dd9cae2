//! Tests for JWK (de)serialization and conversions into backend-specific keys.

use assert_matches::assert_matches;
use serde_json::json;

use jwx_compact::{
    alg::Hs256Key,
    jwk::{JsonWebKey, Jwk, JwkError, JwkSet, KeyType},
};

mod shared;

fn assert_jwk_roundtrip(jwk: &Jwk) {
    let json = serde_json::to_value(jwk).unwrap();
    let restored: Jwk = serde_json::from_value(json).unwrap();
    assert_eq!(restored, *jwk);

    let jwk_string = serde_json::to_string(jwk).unwrap();
    let restored: Jwk = serde_json::from_str(&jwk_string).unwrap();
    assert_eq!(restored, *jwk);
}

#[test]
fn symmetric_jwk_with_params() {
    let jwk: Jwk = serde_json::from_value(json!({
        "kty": "oct",
        "kid": "18ec08e1-bfa9-4d95-b205-2b4dd1d4321d",
        "use": "enc",
        "alg": "A256GCMKW",
        "k": "qC57l_uxcm7Nm3K-ct4GFjx8tM1U8CZ0NLBvdQstiS8",
    }))
    .unwrap();

    assert_eq!(jwk.key_type(), KeyType::Symmetric);
    assert_eq!(jwk.key_use(), Some("enc"));
    assert_eq!(jwk.algorithm(), Some("A256GCMKW"));
    assert_eq!(jwk.key_id(), Some("18ec08e1-bfa9-4d95-b205-2b4dd1d4321d"));
    assert_eq!(jwk.key_ops(), None);
    assert_eq!(jwk.key.symmetric_secret().unwrap().len(), 32);
    assert_jwk_roundtrip(&jwk);

    // Secrets are not leaked via `Debug`.
    let debug_output = format!("{jwk:?}");
    assert!(!debug_output.contains("qC57l"), "{debug_output}");
}

#[test]
fn jwk_builders() {
    let jwk = Jwk::symmetric([1; 16])
        .with_usage("enc")
        .with_operations(["wrapKey", "unwrapKey"])
        .with_algorithm("A128KW")
        .with_key_id("test");
    assert_eq!(
        serde_json::to_value(&jwk).unwrap(),
        json!({
            "kty": "oct",
            "k": "AQEBAQEBAQEBAQEBAQEBAQ",
            "use": "enc",
            "key_ops": ["wrapKey", "unwrapKey"],
            "alg": "A128KW",
            "kid": "test",
        })
    );
    assert_jwk_roundtrip(&jwk);
}

#[test]
fn public_part_of_key() {
    let jwk: Jwk = serde_json::from_value(json!({
        "kty": "EC",
        "kid": "peregrin.took@tuckborough.example",
        "use": "enc",
        "crv": "P-384",
        "x": "YU4rRUzdmVqmRtWOs2OpDE_T5fsNIodcG8G5FWPrTPMyxpzsSOGaQLpe2FpxBmu2",
        "y": "A8-yxCHxkfBz3hKZfI1jUYMjUhsEveZ9THuwFjH2sCNdtksRJU7D5-SkgaFL1ETP",
        "d": "iTx2pk7wW-GqJkHcEkFQb2EFyYcO7RugmaW3mRrQVAOUiPommT0IdnYK2xDlZh-j",
    }))
    .unwrap();
    assert_jwk_roundtrip(&jwk);

    let public_jwk = jwk.to_public();
    assert_matches!(&public_jwk.key, JsonWebKey::EllipticCurve { secret: None, .. });
    assert_eq!(public_jwk.params, jwk.params);
    let json = serde_json::to_value(&public_jwk).unwrap();
    assert!(json.get("d").is_none());

    // Symmetric keys are copied as is.
    let symmetric = Jwk::symmetric([2; 32]);
    assert_eq!(symmetric.to_public(), symmetric);
}

#[test]
fn key_set_serialization() {
    let keys: JwkSet = [
        Jwk::symmetric([1; 16]).with_key_id("first"),
        Jwk::symmetric([2; 16]).with_key_id("second"),
    ]
    .into_iter()
    .collect();
    let json = serde_json::to_value(&keys).unwrap();
    assert_eq!(json["keys"][1]["kid"], "second");

    let restored: JwkSet = serde_json::from_value(json).unwrap();
    assert_eq!(restored, keys);
    let ids: Vec<_> = restored.iter().filter_map(Jwk::key_id).collect();
    assert_eq!(ids, ["first", "second"]);
    assert_eq!(restored.get(1).and_then(Jwk::key_id), Some("second"));
    assert!(restored.get(2).is_none());
}

#[test]
fn unknown_key_type() {
    let result = serde_json::from_value::<Jwk>(json!({ "kty": "HSM", "k": "AQAB" }));
    assert!(result.is_err());
}

#[test]
fn hs256_incorrect_key_type() {
    let jwk = json!({
        "kty": "OKP",
        "crv": "Ed25519",
        "x": "NK0ABg2FlJUVj9UIOrh4wOlLtlV3WL70SQYXSl4Kh0c",
    });
    let jwk: JsonWebKey<'_> = serde_json::from_value(jwk).unwrap();
    let err = Hs256Key::try_from(&jwk).unwrap_err();

    assert_matches!(
        err,
        JwkError::UnexpectedKeyType {
            expected: KeyType::Symmetric,
            actual: KeyType::KeyPair,
        }
    );
}

#[cfg(feature = "rsa")]
mod rsa_jwk {
    use super::*;

    use jwx_compact::alg::{RsaPrivateKey, RsaPublicKey};

    #[test]
    fn signing_jwk() {
        let jwk = crate::shared::frodo_key();
        let private_key = RsaPrivateKey::try_from(&jwk.key).unwrap();
        let public_key = RsaPublicKey::try_from(&jwk.key).unwrap();
        assert_eq!(public_key, private_key.to_public_key());

        assert_eq!(JsonWebKey::from(&public_key), jwk.key.to_public());
        let err = RsaPrivateKey::try_from(&jwk.key.to_public()).unwrap_err();
        assert_matches!(err, JwkError::NoField(field) if field == "d");
    }

    #[test]
    fn incorrect_key_type() {
        let jwk = JsonWebKey::from(&Hs256Key::new([0; 32]));
        let err = RsaPublicKey::try_from(&jwk).unwrap_err();
        assert_matches!(
            err,
            JwkError::UnexpectedKeyType {
                expected: KeyType::Rsa,
                actual: KeyType::Symmetric,
            }
        );
    }
}

mod es256 {
    use super::*;

    use jwx_compact::{alg::Es256, Algorithm};

    type SecretKey = <Es256 as Algorithm>::SigningKey;
    type PublicKey = <Es256 as Algorithm>::VerifyingKey;

    #[test]
    fn signing_jwk() {
        // Taken from https://www.rfc-editor.org/rfc/rfc7515.html#appendix-A.3
        let jwk = json!({
            "kty": "EC",
            "crv": "P-256",
            "x": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU",
            "y": "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0",
            "d": "jpsQnnGQmL-YBIffH1136cspYG6-0iY7X1fCE9-E9LI",
        });
        let jwk: JsonWebKey<'_> = serde_json::from_value(jwk).unwrap();

        let secret_key = SecretKey::try_from(&jwk).unwrap();
        let public_key = PublicKey::try_from(&jwk).unwrap();
        assert_eq!(public_key, *secret_key.verifying_key());
        assert_eq!(JsonWebKey::from(&secret_key), jwk);

        let public_jwk = JsonWebKey::from(&public_key);
        assert_eq!(public_jwk, jwk.to_public());

        let err = SecretKey::try_from(&public_jwk).map(drop).unwrap_err();
        assert_matches!(err, JwkError::NoField(field) if field == "d");
    }

    #[test]
    fn incorrect_key_type() {
        let jwk = json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "x": "NK0ABg2FlJUVj9UIOrh4wOlLtlV3WL70SQYXSl4Kh0c",
        });
        let jwk: JsonWebKey<'_> = serde_json::from_value(jwk).unwrap();
        let err = PublicKey::try_from(&jwk).unwrap_err();

        assert_matches!(
            err,
            JwkError::UnexpectedKeyType {
                expected: KeyType::EllipticCurve,
                actual: KeyType::KeyPair,
            }
        );
    }

    #[test]
    fn incorrect_curve() {
        let jwk = json!({
            "kty": "EC",
            "crv": "P-384",
            "x": "YU4rRUzdmVqmRtWOs2OpDE_T5fsNIodcG8G5FWPrTPMyxpzsSOGaQLpe2FpxBmu2",
            "y": "A8-yxCHxkfBz3hKZfI1jUYMjUhsEveZ9THuwFjH2sCNdtksRJU7D5-SkgaFL1ETP",
        });
        let jwk: JsonWebKey<'_> = serde_json::from_value(jwk).unwrap();
        let err = PublicKey::try_from(&jwk).unwrap_err();

        assert_matches!(
            err,
            JwkError::UnexpectedValue { field, expected, actual }
                if field == "crv" && expected == "P-256" && actual == "P-384"
        );
    }

    #[test]
    fn incorrect_x_len() {
        let jwk = json!({
            "kty": "EC",
            "crv": "P-256",
            "x": "AQAB",
            "y": "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0",
        });
        let jwk: JsonWebKey<'_> = serde_json::from_value(jwk).unwrap();
        let err = PublicKey::try_from(&jwk).unwrap_err();

        assert_matches!(
            err,
            JwkError::UnexpectedLen {
                field,
                expected: 32,
                actual: 3,
            } if field == "x"
        );
    }

    #[test]
    fn point_not_on_curve() {
        let jwk = json!({
            "kty": "EC",
            "crv": "P-256",
            "x": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU",
            "y": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU",
        });
        let jwk: JsonWebKey<'_> = serde_json::from_value(jwk).unwrap();
        let err = PublicKey::try_from(&jwk).unwrap_err();

        assert_matches!(err, JwkError::MalformedField { field, .. } if field == "x");
    }

    #[test]
    fn key_mismatch() {
        let jwk = json!({
            "kty": "EC",
            "crv": "P-256",
            "x": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU",
            "y": "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0",
            "d": "bBU2NlHcGstClU_QL0sSzLFk4bqAfDx8ue4NdDOD9sg",
        });
        let jwk: JsonWebKey<'_> = serde_json::from_value(jwk).unwrap();
        let err = SecretKey::try_from(&jwk).map(drop).unwrap_err();

        assert_matches!(err, JwkError::Custom(err) if err.to_string().contains("does not match"));
    }
}

#[cfg(feature = "ed25519")]
mod ed25519 {
    use super::*;

    use jwx_compact::{alg::Ed25519, Algorithm};

    type SecretKey = <Ed25519 as Algorithm>::SigningKey;
    type PublicKey = <Ed25519 as Algorithm>::VerifyingKey;

    #[test]
    fn signing_jwk() {
        // Randomly generated
        let jwk = json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "x": "NK0ABg2FlJUVj9UIOrh4wOlLtlV3WL70SQYXSl4Kh0c",
            "d": "8fyd_fcp8v4cR2pj74QMiTxo7hcYz1jZ1FeyTgWnsGI"
        });
        let jwk: JsonWebKey<'_> = serde_json::from_value(jwk).unwrap();

        let secret_key = SecretKey::try_from(&jwk).unwrap();
        let public_key = PublicKey::try_from(&jwk).unwrap();
        assert_eq!(public_key, secret_key.verifying_key());
        assert_eq!(JsonWebKey::from(&secret_key), jwk);

        let public_jwk = JsonWebKey::from(&public_key);
        assert_eq!(public_jwk, jwk.to_public());

        let err = SecretKey::try_from(&public_jwk).map(drop).unwrap_err();
        assert_matches!(err, JwkError::NoField(field) if field == "d");
    }

    #[test]
    fn incorrect_curve() {
        let jwk = json!({
            "kty": "OKP",
            "crv": "X25519",
            "x": "NK0ABg2FlJUVj9UIOrh4wOlLtlV3WL70SQYXSl4Kh0c",
        });
        let jwk: JsonWebKey<'_> = serde_json::from_value(jwk).unwrap();
        let err = PublicKey::try_from(&jwk).unwrap_err();

        assert_matches!(
            err,
            JwkError::UnexpectedValue { field, expected, actual }
                if field == "crv" && expected == "Ed25519" && actual == "X25519"
        );
    }

    #[test]
    fn incorrect_scalar_len() {
        let jwk = json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "x": "NK0ABg2FlJUVj9UIOrh4wOlLtlV3WL70SQYXSl4Kh0c",
            "d": "AQAB",
        });
        let jwk: JsonWebKey<'_> = serde_json::from_value(jwk).unwrap();
        let err = SecretKey::try_from(&jwk).map(drop).unwrap_err();

        assert_matches!(
            err,
            JwkError::UnexpectedLen {
                field,
                expected: 32,
                actual: 3,
            } if field == "d"
        );
    }

    #[test]
    fn key_mismatch() {
        let jwk = json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "x": "NK0ABg2FlJUVj9UIOrh4wOlLtlV3WL70SQYXSl4Kh0c",
            "d": "bBU2NlHcGstClU_QL0sSzLFk4bqAfDx8ue4NdDOD9sg",
        });
        let jwk: JsonWebKey<'_> = serde_json::from_value(jwk).unwrap();
        let err = SecretKey::try_from(&jwk).map(drop).unwrap_err();

        assert_matches!(err, JwkError::Custom(_));
    }
}
