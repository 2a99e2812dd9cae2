//! Benchmarks for JWE decryption and JWS verification pipelines.

use base64ct::{Base64UrlUnpadded, Encoding};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::thread_rng;

use jwx_compact::{
    alg::{generate_ec_key, ContentEncryptionAlgorithm, Curve, KeyManagementAlgorithm},
    jwk::{Jwk, JwkSet},
    CompleteHeader, Header, Jwe, Jws, Policy, Recipient, Signature, SignatureAlgorithm,
};

const PAYLOAD: &[u8] = br#"{"sub":"1234567890","name":"John Doe","admin":true}"#;

fn policy() -> Policy {
    Policy {
        key_encryption: vec!["A128KW".to_owned(), "ECDH-ES+A128KW".to_owned()],
        content_encryption: vec!["A128GCM".to_owned(), "A128CBC-HS256".to_owned()],
        compression: vec![],
        signature: vec!["HS256".to_owned(), "ES256".to_owned()],
        ..Policy::default()
    }
}

fn encrypt(alg: &str, enc: &str, key: &Jwk) -> Jwe {
    let mut rng = thread_rng();
    let alg = KeyManagementAlgorithm::all()
        .find(|candidate| candidate.name() == alg)
        .unwrap();
    let enc = ContentEncryptionAlgorithm::ALL
        .into_iter()
        .find(|candidate| candidate.name() == enc)
        .unwrap();

    let encoded_header = Base64UrlUnpadded::encode_string(
        format!(r#"{{"enc":"{}"}}"#, enc.name()).as_bytes(),
    );
    let produced = alg
        .encrypt_cek(&key.key.to_public(), enc, &CompleteHeader::default(), &mut rng)
        .unwrap();
    let iv = enc.generate_iv(&mut rng);
    let (ciphertext, tag) = enc
        .encrypt(PAYLOAD, &produced.cek, &iv, None, &encoded_header)
        .unwrap();

    let mut recipient_header = Header::new();
    recipient_header.insert("alg".into(), alg.name().into());
    recipient_header.extend(produced.header);
    Jwe::new(encoded_header, ciphertext, iv, tag)
        .unwrap()
        .with_recipient(Recipient::new(recipient_header, produced.encrypted_key))
}

fn decryption_benches(criterion: &mut Criterion) {
    let decrypter = policy().decrypter().unwrap();
    let aes_key = Jwk::symmetric([42; 16]);
    let ec_key = Jwk::from(generate_ec_key(Curve::P256, &mut thread_rng()));

    let cases = [
        ("A128KW", "A128GCM", &aes_key),
        ("A128KW", "A128CBC-HS256", &aes_key),
        ("ECDH-ES+A128KW", "A128GCM", &ec_key),
    ];
    for (alg, enc, key) in cases {
        let jwe = encrypt(alg, enc, key);
        let keys = JwkSet::from(key.clone());
        criterion.bench_function(&format!("decryption/{alg}/{enc}"), |bencher| {
            bencher.iter_batched(
                || jwe.clone(),
                |mut jwe| assert!(decrypter.decrypt_using_key_set(&mut jwe, &keys, 0).unwrap()),
                BatchSize::SmallInput,
            );
        });
    }

    // The matching key is the last one in the set.
    let jwe = encrypt("A128KW", "A128GCM", &aes_key);
    let keys: JwkSet = (1_u8..=9)
        .map(|i| Jwk::symmetric([i; 16]))
        .chain([aes_key])
        .collect();
    criterion.bench_function("decryption/A128KW/A128GCM/10_keys", |bencher| {
        bencher.iter_batched(
            || jwe.clone(),
            |mut jwe| assert!(decrypter.decrypt_using_key_set(&mut jwe, &keys, 0).unwrap()),
            BatchSize::SmallInput,
        );
    });
}

fn verification_benches(criterion: &mut Criterion) {
    let verifier = policy().verifier().unwrap();
    let hmac_key = Jwk::symmetric(b"super_secret_key_donut_steel");
    let ec_key = Jwk::from(generate_ec_key(Curve::P256, &mut thread_rng()));
    let encoded_payload = Base64UrlUnpadded::encode_string(PAYLOAD);

    let cases = [
        (SignatureAlgorithm::Hs256, &hmac_key),
        (SignatureAlgorithm::Es256, &ec_key),
    ];
    for (algorithm, key) in cases {
        let encoded_header =
            Base64UrlUnpadded::encode_string(format!(r#"{{"alg":"{algorithm}"}}"#).as_bytes());
        let signing_input = format!("{encoded_header}.{encoded_payload}");
        let signature = algorithm.sign(&key.key, signing_input.as_bytes()).unwrap();
        let jws = Jws::from_encoded_payload(encoded_payload.clone())
            .unwrap()
            .with_signature(Signature::new(encoded_header, signature).unwrap());
        let keys = JwkSet::from(key.to_public());

        criterion.bench_function(&format!("verification/{algorithm}"), |bencher| {
            bencher.iter(|| assert!(verifier.verify_with_key_set(&jws, &keys, 0, None).unwrap()));
        });
    }
}

criterion_group!(benches, decryption_benches, verification_benches);
criterion_main!(benches);
