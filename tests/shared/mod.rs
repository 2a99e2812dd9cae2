//! Functionality shared by integration tests.

#![allow(dead_code)] // Not all helpers are used by every test crate.

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{thread_rng, RngCore};
use serde_json::{json, Value};

use jwx_compact::{
    alg::{generate_ec_key, Curve},
    compression::CompressionRegistry,
    jwk::{Jwk, SecretBytes},
    AlgorithmKind, AlgorithmRegistry, CompleteHeader, ContentEncryptionAlgorithm, Header, Jwe,
    JweDecrypter, KeyManagementAlgorithm, Recipient,
};

pub fn header(value: Value) -> Header {
    serde_json::from_value(value).unwrap()
}

pub fn decode(encoded: &str) -> Vec<u8> {
    Base64UrlUnpadded::decode_vec(encoded).unwrap()
}

/// Decrypter allowing every supported algorithm.
pub fn permissive_decrypter() -> JweDecrypter {
    JweDecrypter::new(
        AlgorithmRegistry::with_all(AlgorithmKind::KeyManagement),
        AlgorithmRegistry::with_all(AlgorithmKind::ContentEncryption),
        CompressionRegistry::new(["DEF"]).unwrap(),
    )
}

/// RSA key from RFC 7520, section 3.4.
pub fn frodo_key() -> Jwk {
    serde_json::from_value(json!({
        "kty": "RSA",
        "kid": "frodo.baggins@hobbiton.example",
        "use": "enc",
        "n": "maxhbsmBtdQ3CNrKvprUE6n9lYcregDMLYNeTAWcLj8NnPU9XIYegTHVHQjxKDSHP2l-F5jS7sppG1wgdAqZ\
              yhnWvXhYNvcM7RfgKxqNx_xAHx6f3yy7s-M9PSNCwPC2lh6UAkR4I00EhV9lrypM9Pi4lBUop9t5fS9W5UNw\
              aAllhrd-osQGPjIeI1deHTwx-ZTHu3C60Pu_LJIl6hKn9wbwaUmA4cR5Bd2pgbaY7ASgsjCUbtYJaNIHSoHX\
              prUdJZKUMAzV0WOKPfA6OPI4oypBadjvMZ4ZAj3BnXaSYsEZhaueTXvZB4eZOAjIyh2e_VOIKVMsnDrJYAVo\
              tGlvMQ",
        "e": "AQAB",
        "d": "Kn9tgoHfiTVi8uPu5b9TnwyHwG5dK6RE0uFdlpCGnJN7ZEi963R7wybQ1PLAHmpIbNTztfrheoAniRV1NCIq\
              XaW_qS461xiDTp4ntEPnqcKsyO5jMAji7-CL8vhpYYowNFvIesgMoVaPRYMYT9TW63hNM0aWs7USZ_hLg6Oe\
              1mY0vHTI3FucjSM86Nff4oIENt43r2fspgEPGRrdE6fpLc9Oaq-qeP1GFULimrRdndm-P8q8kvN3KHlNAtEg\
              rQAgTTgz80S-3VD0FgWfgnb1PNmiuPUxO8OpI9KDIfu_acc6fg14nsNaJqXe6RESvhGPH2afjHqSy_Fd2vpz\
              j85bQQ",
        "p": "2DwQmZ43FoTnQ8IkUj3BmKRf5Eh2mizZA5xEJ2MinUE3sdTYKSLtaEoekX9vbBZuWxHdVhM6UnKCJ_2iNk8Z\
              0ayLYHL0_G21aXf9-unynEpUsH7HHTklLpYAzOOx1ZgVljoxAdWNn3hiEFrjZLZGS7lOH-a3QQlDDQoJOJ2V\
              FmU",
        "q": "te8LY4-W7IyaqH1ExujjMqkTAlTeRbv0VLQnfLY2xINnrWdwiQ93_VF099aP1ESeLja2nw-6iKIe-qT7mtCP\
              ozKfVtUYfz5HrJ_XY2kfexJINb9lhZHMv5p1skZpeIS-GPHCC6gRlKo1q-idn_qxyusfWv7WAxlSVfQfk8d6\
              Et0",
        "dp": "UfYKcL_or492vVc0PzwLSplbg4L3-Z5wL48mwiswbpzOyIgd2xHTHQmjJpFAIZ8q-zf9RmgJXkDrFs9rkdx\
               PtAsL1WYdeCT5c125Fkdg317JVRDo1inX7x2Kdh8ERCreW8_4zXItuTl_KiXZNU5lvMQjWbIw2eTx1lpsflo\
               0rYU",
        "dq": "iEgcO-QfpepdH8FWd7mUFyrXdnOkXJBCogChY6YKuIHGc_p8Le9MbpFKESzEaLlN1Ehf3B6oGBl5Iz_ayUl\
               Zj2IoQZ82znoUrpa9fVYNot87ACfzIG7q9Mv7RiPAderZi03tkVXAdaBau_9vs5rS-7HMtxkVrxSUvJY14Tk\
               XlHE",
        "qi": "kC-lzZOqoFaZCr5l0tOVtREKoVqaAYhQiqIRGL-MzS4sCmRkxm5vZlXYx6RtE1n_AagjqajlkjieGlxTTTh\
               HD8Iga6foGBMaAr5uR1hGQpSc7Gl7CF1DZkBJMTQN6EshYzZfxW08mIO8M6Rzuh0beL6fG9mkDcIyPrBXx2b\
               Q_mM",
    }))
    .unwrap()
}

pub fn random_symmetric_key(len: usize) -> Jwk {
    let mut secret = vec![0; len];
    thread_rng().fill_bytes(&mut secret);
    Jwk::symmetric(secret)
}

/// Creates a recipient key suitable for `alg` used together with `enc`.
pub fn key_for(alg: KeyManagementAlgorithm, enc: ContentEncryptionAlgorithm) -> Jwk {
    match alg {
        KeyManagementAlgorithm::Direct(_) => random_symmetric_key(enc.cek_size()),
        KeyManagementAlgorithm::KeyAgreement(_) => {
            Jwk::from(generate_ec_key(Curve::P256, &mut thread_rng()))
        }
        KeyManagementAlgorithm::KeyAgreementWithKeyWrapping(_) => {
            Jwk::from(generate_ec_key(Curve::P384, &mut thread_rng()))
        }
        #[cfg(feature = "rsa")]
        KeyManagementAlgorithm::KeyEncryption(_) => frodo_key(),
        KeyManagementAlgorithm::KeyWrapping(kw) => random_symmetric_key(kw.key_len()),
        _ => unreachable!("unknown key management algorithm"),
    }
}

/// Encrypts `payload` for each recipient using a single shared CEK.
///
/// The first recipient determines the CEK; subsequent recipients must wrap it, so `dir` and
/// `ECDH-ES` may only be used for the first recipient.
pub fn encrypt(
    payload: &[u8],
    protected_header: Value,
    enc: ContentEncryptionAlgorithm,
    recipients: &[(KeyManagementAlgorithm, &Jwk)],
    aad: Option<&[u8]>,
) -> Jwe {
    let mut rng = thread_rng();
    let protected_header = header(protected_header);
    let encoded_header =
        Base64UrlUnpadded::encode_string(&serde_json::to_vec(&protected_header).unwrap());

    let mut cek: Option<SecretBytes<'static>> = None;
    let mut produced_recipients = vec![];
    for &(alg, key) in recipients {
        let mut recipient_header = header(json!({ "alg": alg.name() }));
        let complete_header = CompleteHeader::merge([&protected_header, &recipient_header]);
        let public_key = key.key.to_public();
        let (encrypted_key, params) = if let Some(cek) = &cek {
            alg.wrap_cek(&public_key, cek, &complete_header, &mut rng)
                .unwrap()
        } else {
            let produced = alg
                .encrypt_cek(&public_key, enc, &complete_header, &mut rng)
                .unwrap();
            cek = Some(produced.cek);
            (produced.encrypted_key, produced.header)
        };
        recipient_header.extend(params);
        produced_recipients.push(Recipient::new(recipient_header, encrypted_key));
    }

    let cek = cek.expect("no recipients");
    let iv = enc.generate_iv(&mut rng);
    let encoded_aad = aad.map(Base64UrlUnpadded::encode_string);
    let (ciphertext, tag) = enc
        .encrypt(payload, &cek, &iv, encoded_aad.as_deref(), &encoded_header)
        .unwrap();

    let mut jwe = Jwe::new(encoded_header, ciphertext, iv, tag).unwrap();
    if let Some(aad) = aad {
        jwe = jwe.with_aad(aad);
    }
    produced_recipients
        .into_iter()
        .fold(jwe, Jwe::with_recipient)
}
