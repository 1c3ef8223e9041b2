//! Scenario tests for transport documents.

use bytes::Bytes;
use proptest::prelude::*;
use proptest::collection::vec;
use proptest::sample::Index;
use crate::decode::decode_ber;
use crate::encode::{dcons, integer, octet_string, prim, Values};
use crate::ident::Tag;
use crate::oid::{self, ConstOid};
use crate::pkcs7::CONTENT_INFO;
use super::*;


//------------ Fixtures ------------------------------------------------------

fn algorithm(algorithm: ConstOid) -> impl Values {
    dcons(Tag::SEQUENCE, (algorithm, prim(Tag::NULL, b"")))
}

/// An EnvelopedData with a single key agreement recipient.
fn enveloped_data() -> Vec<u8> {
    dcons(Tag::SEQUENCE, (
        oid::PKCS7_ENVELOPED_DATA,
        dcons(Tag::SEQUENCE, (
            integer(2),
            dcons(Tag::SET, (
                dcons(Tag::ctx(1), (
                    integer(3),
                    dcons(Tag::SEQUENCE, ()).explicit(Tag::ctx(0)),
                    octet_string(b"ukm").explicit(Tag::ctx(1)),
                    algorithm(oid::DSTU_4145_LE),
                    dcons(Tag::SEQUENCE, (
                        dcons(Tag::SEQUENCE, (
                            dcons(Tag::SEQUENCE, ()),
                            octet_string(b"wrapped key"),
                        )),
                    )),
                )),
            )),
            dcons(Tag::SEQUENCE, (
                oid::PKCS7_DATA,
                algorithm(oid::GOST_28147_CFB),
                prim(Tag::ctx(0), b"ciphertext"),
            )),
        )).explicit(Tag::ctx(0)),
    )).to_vec()
}

/// A SignedData with attached content and a single signer.
fn signed_data(content: &[u8]) -> Vec<u8> {
    let signer = dcons(Tag::SEQUENCE, (
        integer(1),
        dcons(Tag::SEQUENCE, (dcons(Tag::SEQUENCE, ()), integer(1234))),
        algorithm(oid::GOST_34311),
        dcons(Tag::ctx(0), (
            dcons(Tag::SEQUENCE, (
                oid::PKCS9_CONTENT_TYPE,
                dcons(Tag::SET, (oid::PKCS7_DATA,)),
            )),
        )),
        algorithm(oid::DSTU_4145_LE),
        octet_string(b"signature"),
    ));
    dcons(Tag::SEQUENCE, (
        oid::PKCS7_SIGNED_DATA,
        dcons(Tag::SEQUENCE, (
            integer(1),
            dcons(Tag::SET, (algorithm(oid::GOST_34311),)),
            dcons(Tag::SEQUENCE, (
                oid::PKCS7_DATA,
                octet_string(content).explicit(Tag::ctx(0)),
            )),
            dcons(Tag::ctx(0), (dcons(Tag::SEQUENCE, ()),)),
            dcons(Tag::SET, (signer,)),
        )).explicit(Tag::ctx(0)),
    )).to_vec()
}

fn encrypted_document() -> Document {
    let mut doc = Document::new(UA1_CRYPT, enveloped_data());
    doc.headers.insert("CERT_PEM", "-----BEGIN CERTIFICATE-----");
    doc.headers.insert("RCV_NAME", "Київ");
    doc
}

/// A signed document wrapping an encrypted document.
fn nested_document() -> Bytes {
    let inner = encrypted_document().to_bytes();
    Document::new(UA1_SIGN, signed_data(&inner)).to_bytes()
}

/// Assembles a document with a raw header block.
fn raw(block: &[u8], segments: &[(&str, &[u8])]) -> Vec<u8> {
    let mut res = MAGIC.to_vec();
    res.extend_from_slice(&(block.len() as u32).to_le_bytes());
    res.extend_from_slice(block);
    for (label, body) in segments {
        res.extend_from_slice(label.as_bytes());
        res.push(0);
        res.extend_from_slice(&(body.len() as u32).to_le_bytes());
        res.extend_from_slice(body);
    }
    res
}


//------------ Tests ---------------------------------------------------------

#[test]
fn nested_unwrap_by_hand() {
    let data = nested_document();
    let outer = decode_transport(&data).unwrap();
    assert_eq!(outer.label, UA1_SIGN);

    let (info, used) = decode_ber(
        &outer.body, &CONTENT_INFO, outer.body.len()
    ).unwrap();
    assert_eq!(used, outer.body.len());
    assert_eq!(
        info.get("content").unwrap().choice().unwrap().0, "signedData"
    );
    let inner = info.get(
        "content.contentInfo.content.value"
    ).unwrap().as_bytes().unwrap();

    let inner = decode_transport(inner).unwrap();
    assert_eq!(inner.label, UA1_CRYPT);
    assert_eq!(
        inner.header("CERT_PEM"), Some("-----BEGIN CERTIFICATE-----")
    );
    assert_eq!(inner.header("RCV_NAME"), Some("Київ"));

    let info = inner.content_info().unwrap();
    let recipient = info.get("content.recipientInfos.0").unwrap();
    assert_eq!(recipient.choice().unwrap().0, "kari");
    assert_eq!(
        info.get("content.recipientInfos.0.ukm").unwrap().as_bytes(),
        Some(&b"ukm"[..])
    );
    assert_eq!(
        info.get(
            "content.encryptedContentInfo.encryptedContent"
        ).unwrap().as_bytes(),
        Some(&b"ciphertext"[..])
    );
}

#[test]
fn unwrap_all_layers() {
    let layers = unwrap_layers(nested_document(), 8).unwrap();
    assert_eq!(
        layers.iter().map(|doc| doc.label.as_str()).collect::<Vec<_>>(),
        [UA1_SIGN, UA1_CRYPT]
    );
    assert_eq!(layers[1], encrypted_document());

    let layers = unwrap_layers(nested_document(), 1).unwrap();
    assert_eq!(layers.len(), 1);

    // Signed content that isn't a transport document ends the descent.
    let data = Document::new(UA1_SIGN, signed_data(b"plain text"));
    let layers = unwrap_layers(data.to_bytes(), 8).unwrap();
    assert_eq!(layers.len(), 1);
}

#[test]
fn round_trip() {
    let mut doc = Document::new(UA1_SIGN, &b"body"[..]);
    doc.segments.push(Segment::new(CERTCRYPT, &b"certificate"[..]));
    doc.headers.insert("SUBJECT", "Тест");
    doc.headers.insert("EDRPOU", "12345678");
    let decoded = decode_transport(&doc.to_bytes()).unwrap();
    assert_eq!(decoded, doc);
}

#[test]
fn multi_line_header_round_trip() {
    let pem = "-----BEGIN CERTIFICATE-----\n\
               MIIBszCCAVmgAwIBAgIU==\n\
               -----END CERTIFICATE-----\n";
    let mut doc = Document::new(UA1_CRYPT, enveloped_data());
    doc.headers.insert("CERT_PEM", pem);
    doc.headers.insert("SUBJECT", "test");
    let decoded = decode_transport(&doc.to_bytes()).unwrap();
    assert!(decoded.warnings.is_empty());
    assert_eq!(
        decoded.headers.iter().collect::<Vec<_>>(),
        [("CERT_PEM", pem), ("SUBJECT", "test")]
    );
    assert_eq!(decoded, doc);
}

#[test]
fn primary_segment() {
    let data = raw(b"", &[
        (CERTCRYPT, &b"cert"[..]),
        (UA1_SIGN, &b"signed"[..]),
        (UA1_CRYPT, &b"crypt"[..]),
    ]);
    let doc = decode_transport(&data).unwrap();
    assert_eq!(doc.label, UA1_SIGN);
    assert_eq!(doc.body, &b"signed"[..]);
    assert_eq!(doc.segments.len(), 3);

    let data = raw(b"", &[("OTHER", &b"x"[..]), (CERTCRYPT, &b"cert"[..])]);
    assert_eq!(decode_transport(&data).unwrap().label, "OTHER");
}

#[test]
fn header_tolerance() {
    let data = raw(
        b"A=1\r\nBAD=\xff\r\nC: 3\r\n\0",
        &[(UA1_SIGN, &b"x"[..])]
    );
    let doc = TransportDecoder::new()
        .header_encoding(HeaderEncoding::Utf8)
        .decode(Bytes::from(data))
        .unwrap();
    assert_eq!(doc.header("A"), Some("1"));
    assert_eq!(doc.header("BAD"), Some("\u{FFFD}"));
    assert_eq!(doc.header("C"), Some("3"));
    assert_eq!(doc.warnings.len(), 1);
    assert_eq!(doc.warnings[0].key, "BAD");
    assert_eq!(doc.warnings[0].kind, WarningKind::InvalidEncoding);

    // Auto mode falls back to Windows-1251.
    let data = raw(b"A=1\r\nCITY=\xca\xe8\xbf\xe2", &[(UA1_SIGN, &b""[..])]);
    let doc = decode_transport(&data).unwrap();
    assert!(doc.warnings.is_empty());
    assert_eq!(doc.header("CITY"), Some("Київ"));
}

#[test]
fn repairs_are_recorded() {
    let mut data = b"\r\n".to_vec();
    data.extend_from_slice(&raw(b"A=1", &[(UA1_SIGN, &b"x"[..])]));
    data.push(0);
    data.push(0);
    let doc = decode_transport(&data).unwrap();
    assert_eq!(
        doc.repairs,
        [Quirk::LeadingPadding(2), Quirk::TrailingPadding(2)]
    );
    assert_eq!(doc.header("A"), Some("1"));
    assert_eq!(doc.body, &b"x"[..]);

    let err = TransportDecoder::new().repair(false).decode(
        Bytes::from(data)
    ).unwrap_err();
    assert!(matches!(err, DecodeError::UnrecognizedTransport { .. }));
}

#[test]
fn error_offsets_include_padding() {
    let err = decode_transport(b"  UA1_SIGN\0\x05\x00\x00\x00abc").unwrap_err();
    assert!(matches!(err, DecodeError::LengthOverrun { .. }));
    assert_eq!(err.offset().value(), 11);
}

#[test]
fn not_a_transport_document() {
    assert!(matches!(
        decode_transport(b""),
        Err(DecodeError::UnrecognizedTransport { .. })
    ));
    assert!(matches!(
        decode_transport(&enveloped_data()),
        Err(DecodeError::UnrecognizedTransport { .. })
    ));
}

proptest! {
    #[test]
    fn random_data_never_panics(data in vec(any::<u8>(), 0..512)) {
        let _ = decode_transport(&data);
        let _ = unwrap_layers(Bytes::from(data), 4);
    }

    #[test]
    fn mutated_documents_never_panic(
        idx in any::<Index>(), octet in any::<u8>(), cut in any::<Index>()
    ) {
        let mut data = nested_document().to_vec();
        let pos = idx.index(data.len());
        data[pos] = octet;
        data.truncate(cut.index(data.len() + 1));
        let _ = unwrap_layers(Bytes::from(data.clone()), 4);
        prop_assert_eq!(decode_transport(&data), decode_transport(&data));
    }

    #[test]
    fn label_round_trip(
        label in "[A-Z0-9_]{1,32}", body in vec(any::<u8>(), 0..64)
    ) {
        let doc = Document::new(label.clone(), body);
        let decoded = decode_transport(&doc.to_bytes()).unwrap();
        prop_assert_eq!(decoded.label, label);
    }
}
