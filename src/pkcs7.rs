//! Schemas for PKCS #7 and CMS structures.
//!
//! This module defines the [`Schema`]s for the structures found in the
//! body of signed and enveloped transport documents, following RFC 2315 and
//! RFC 5652. Everything the signing software puts in but we never look at,
//! e.g., certificates, names, or algorithm parameters, is captured as is.
//!
//! The entry point is [`CONTENT_INFO`]. Its content is selected by the
//! content type: `data` becomes an octet string, `signedData`,
//! `envelopedData` and `encryptedData` are decoded with their respective
//! schemas, and everything else is captured.

use crate::oid;
use crate::schema::{
    Alternative, Definition, Field, Schema, ANY, INTEGER, OCTET_STRING, OID,
};


//------------ ContentInfo ---------------------------------------------------

/// ContentInfo.
///
/// ```text
/// ContentInfo ::= SEQUENCE {
///     contentType ContentType,
///     content [0] EXPLICIT ANY DEFINED BY contentType OPTIONAL }
/// ```
pub static CONTENT_INFO: Schema = Schema::Sequence(&CONTENT_INFO_FIELDS);

static CONTENT_INFO_FIELDS: [Field; 2] = [
    Field::new("contentType", &OID),
    Field::explicit("content", 0, &CONTENT).optional(),
];

static CONTENT: Schema = Schema::DefinedBy {
    key: "contentType",
    table: &CONTENT_TYPES,
    fallback: &ANY,
};

static CONTENT_TYPES: [Definition; 4] = [
    Definition::new(oid::PKCS7_DATA, "data", &OCTET_STRING),
    Definition::new(oid::PKCS7_SIGNED_DATA, "signedData", &SIGNED_DATA),
    Definition::new(
        oid::PKCS7_ENVELOPED_DATA, "envelopedData", &ENVELOPED_DATA
    ),
    Definition::new(
        oid::PKCS7_ENCRYPTED_DATA, "encryptedData", &ENCRYPTED_DATA
    ),
];


//------------ SignedData ----------------------------------------------------

/// SignedData.
///
/// ```text
/// SignedData ::= SEQUENCE {
///     version CMSVersion,
///     digestAlgorithms SET OF AlgorithmIdentifier,
///     contentInfo ContentInfo,
///     certificates [0] IMPLICIT SET OF Certificate OPTIONAL,
///     crls [1] IMPLICIT SET OF CertificateList OPTIONAL,
///     signerInfos SET OF SignerInfo }
/// ```
pub static SIGNED_DATA: Schema = Schema::Sequence(&SIGNED_DATA_FIELDS);

static SIGNED_DATA_FIELDS: [Field; 6] = [
    Field::new("version", &INTEGER),
    Field::new("digestAlgorithms", &ALGORITHM_IDENTIFIERS),
    Field::new("contentInfo", &CONTENT_INFO),
    Field::implicit("certificates", 0, &ANY_SET).optional(),
    Field::implicit("crls", 1, &ANY_SET).optional(),
    Field::new("signerInfos", &SIGNER_INFOS),
];

static ALGORITHM_IDENTIFIERS: Schema = Schema::SetOf(&ALGORITHM_IDENTIFIER);
static ANY_SET: Schema = Schema::SetOf(&ANY);
static SIGNER_INFOS: Schema = Schema::SetOf(&SIGNER_INFO);


//------------ SignerInfo ----------------------------------------------------

/// SignerInfo.
///
/// ```text
/// SignerInfo ::= SEQUENCE {
///     version CMSVersion,
///     sid SignerIdentifier,
///     digestAlgorithm DigestAlgorithmIdentifier,
///     signedAttrs [0] IMPLICIT SignedAttributes OPTIONAL,
///     signatureAlgorithm SignatureAlgorithmIdentifier,
///     signature SignatureValue,
///     unsignedAttrs [1] IMPLICIT UnsignedAttributes OPTIONAL }
///
/// SignerIdentifier ::= CHOICE {
///     issuerAndSerialNumber IssuerAndSerialNumber,
///     subjectKeyIdentifier [0] SubjectKeyIdentifier }
/// ```
pub static SIGNER_INFO: Schema = Schema::Sequence(&SIGNER_INFO_FIELDS);

static SIGNER_INFO_FIELDS: [Field; 7] = [
    Field::new("version", &INTEGER),
    Field::new("sid", &SIGNER_IDENTIFIER),
    Field::new("digestAlgorithm", &ALGORITHM_IDENTIFIER),
    Field::implicit("signedAttrs", 0, &ATTRIBUTES).optional(),
    Field::new("signatureAlgorithm", &ALGORITHM_IDENTIFIER),
    Field::new("signature", &OCTET_STRING),
    Field::implicit("unsignedAttrs", 1, &ATTRIBUTES).optional(),
];

static SIGNER_IDENTIFIER: Schema = Schema::Choice(&SIGNER_IDENTIFIERS);

static SIGNER_IDENTIFIERS: [Alternative; 2] = [
    Alternative::new("issuerAndSerialNumber", &ISSUER_AND_SERIAL_NUMBER),
    Alternative::implicit("subjectKeyIdentifier", 0, &OCTET_STRING),
];

static ATTRIBUTES: Schema = Schema::SetOf(&ATTRIBUTE);


//------------ AlgorithmIdentifier -------------------------------------------

/// AlgorithmIdentifier.
///
/// ```text
/// AlgorithmIdentifier ::= SEQUENCE {
///     algorithm OBJECT IDENTIFIER,
///     parameters ANY DEFINED BY algorithm OPTIONAL }
/// ```
///
/// The parameters are always captured.
pub static ALGORITHM_IDENTIFIER: Schema = Schema::Sequence(
    &ALGORITHM_IDENTIFIER_FIELDS
);

static ALGORITHM_IDENTIFIER_FIELDS: [Field; 2] = [
    Field::new("algorithm", &OID),
    Field::new("parameters", &ANY).optional(),
];


//------------ Attribute -----------------------------------------------------

/// Attribute.
///
/// ```text
/// Attribute ::= SEQUENCE {
///     attrType OBJECT IDENTIFIER,
///     attrValues SET OF AttributeValue }
/// ```
pub static ATTRIBUTE: Schema = Schema::Sequence(&ATTRIBUTE_FIELDS);

static ATTRIBUTE_FIELDS: [Field; 2] = [
    Field::new("attrType", &OID),
    Field::new("attrValues", &ANY_SET),
];


//------------ IssuerAndSerialNumber -----------------------------------------

/// IssuerAndSerialNumber.
///
/// ```text
/// IssuerAndSerialNumber ::= SEQUENCE {
///     issuer Name,
///     serialNumber CertificateSerialNumber }
/// ```
pub static ISSUER_AND_SERIAL_NUMBER: Schema = Schema::Sequence(
    &ISSUER_AND_SERIAL_NUMBER_FIELDS
);

static ISSUER_AND_SERIAL_NUMBER_FIELDS: [Field; 2] = [
    Field::new("issuer", &ANY),
    Field::new("serialNumber", &INTEGER),
];


//------------ EnvelopedData -------------------------------------------------

/// EnvelopedData.
///
/// ```text
/// EnvelopedData ::= SEQUENCE {
///     version CMSVersion,
///     originatorInfo [0] IMPLICIT OriginatorInfo OPTIONAL,
///     recipientInfos RecipientInfos,
///     encryptedContentInfo EncryptedContentInfo,
///     unprotectedAttrs [1] IMPLICIT UnprotectedAttributes OPTIONAL }
///
/// OriginatorInfo ::= SEQUENCE {
///     certs [0] IMPLICIT CertificateSet OPTIONAL,
///     crls [1] IMPLICIT RevocationInfoChoices OPTIONAL }
/// ```
pub static ENVELOPED_DATA: Schema = Schema::Sequence(&ENVELOPED_DATA_FIELDS);

static ENVELOPED_DATA_FIELDS: [Field; 5] = [
    Field::new("version", &INTEGER),
    Field::implicit("originatorInfo", 0, &ORIGINATOR_INFO).optional(),
    Field::new("recipientInfos", &RECIPIENT_INFOS),
    Field::new("encryptedContentInfo", &ENCRYPTED_CONTENT_INFO),
    Field::implicit("unprotectedAttrs", 1, &ATTRIBUTES).optional(),
];

static ORIGINATOR_INFO: Schema = Schema::Sequence(&ORIGINATOR_INFO_FIELDS);

static ORIGINATOR_INFO_FIELDS: [Field; 2] = [
    Field::implicit("certs", 0, &ANY_SET).optional(),
    Field::implicit("crls", 1, &ANY_SET).optional(),
];

static RECIPIENT_INFOS: Schema = Schema::SetOf(&RECIPIENT_INFO);


//------------ RecipientInfo -------------------------------------------------

/// RecipientInfo.
///
/// ```text
/// RecipientInfo ::= CHOICE {
///     ktri KeyTransRecipientInfo,
///     kari [1] KeyAgreeRecipientInfo,
///     kekri [2] KEKRecipientInfo,
///     pwri [3] PasswordRecipientInfo,
///     ori [4] OtherRecipientInfo }
///
/// KeyTransRecipientInfo ::= SEQUENCE {
///     version CMSVersion,
///     rid RecipientIdentifier,
///     keyEncryptionAlgorithm KeyEncryptionAlgorithmIdentifier,
///     encryptedKey EncryptedKey }
/// ```
///
/// Only key transport and key agreement are decoded, the other
/// alternatives are captured.
pub static RECIPIENT_INFO: Schema = Schema::Choice(&RECIPIENT_INFO_CHOICES);

static RECIPIENT_INFO_CHOICES: [Alternative; 5] = [
    Alternative::new("ktri", &KEY_TRANS_RECIPIENT_INFO),
    Alternative::implicit("kari", 1, &KEY_AGREE_RECIPIENT_INFO),
    Alternative::implicit("kekri", 2, &ANY),
    Alternative::implicit("pwri", 3, &ANY),
    Alternative::implicit("ori", 4, &ANY),
];

static KEY_TRANS_RECIPIENT_INFO: Schema = Schema::Sequence(
    &KEY_TRANS_RECIPIENT_INFO_FIELDS
);

static KEY_TRANS_RECIPIENT_INFO_FIELDS: [Field; 4] = [
    Field::new("version", &INTEGER),
    Field::new("rid", &ANY),
    Field::new("keyEncryptionAlgorithm", &ALGORITHM_IDENTIFIER),
    Field::new("encryptedKey", &OCTET_STRING),
];


//------------ KeyAgreeRecipientInfo -----------------------------------------

/// KeyAgreeRecipientInfo.
///
/// This is what DSTU 4145 enveloped documents use.
///
/// ```text
/// KeyAgreeRecipientInfo ::= SEQUENCE {
///     version CMSVersion,
///     originator [0] EXPLICIT OriginatorIdentifierOrKey,
///     ukm [1] EXPLICIT UserKeyingMaterial OPTIONAL,
///     keyEncryptionAlgorithm KeyEncryptionAlgorithmIdentifier,
///     recipientEncryptedKeys RecipientEncryptedKeys }
///
/// RecipientEncryptedKey ::= SEQUENCE {
///     rid KeyAgreeRecipientIdentifier,
///     encryptedKey EncryptedKey }
/// ```
pub static KEY_AGREE_RECIPIENT_INFO: Schema = Schema::Sequence(
    &KEY_AGREE_RECIPIENT_INFO_FIELDS
);

static KEY_AGREE_RECIPIENT_INFO_FIELDS: [Field; 5] = [
    Field::new("version", &INTEGER),
    Field::explicit("originator", 0, &ANY),
    Field::explicit("ukm", 1, &OCTET_STRING).optional(),
    Field::new("keyEncryptionAlgorithm", &ALGORITHM_IDENTIFIER),
    Field::new("recipientEncryptedKeys", &RECIPIENT_ENCRYPTED_KEYS),
];

static RECIPIENT_ENCRYPTED_KEYS: Schema = Schema::SequenceOf(
    &RECIPIENT_ENCRYPTED_KEY
);

static RECIPIENT_ENCRYPTED_KEY: Schema = Schema::Sequence(
    &RECIPIENT_ENCRYPTED_KEY_FIELDS
);

static RECIPIENT_ENCRYPTED_KEY_FIELDS: [Field; 2] = [
    Field::new("rid", &ANY),
    Field::new("encryptedKey", &OCTET_STRING),
];


//------------ EncryptedContentInfo ------------------------------------------

/// EncryptedContentInfo.
///
/// ```text
/// EncryptedContentInfo ::= SEQUENCE {
///     contentType ContentType,
///     contentEncryptionAlgorithm ContentEncryptionAlgorithmIdentifier,
///     encryptedContent [0] IMPLICIT EncryptedContent OPTIONAL }
/// ```
pub static ENCRYPTED_CONTENT_INFO: Schema = Schema::Sequence(
    &ENCRYPTED_CONTENT_INFO_FIELDS
);

static ENCRYPTED_CONTENT_INFO_FIELDS: [Field; 3] = [
    Field::new("contentType", &OID),
    Field::new("contentEncryptionAlgorithm", &ALGORITHM_IDENTIFIER),
    Field::implicit("encryptedContent", 0, &OCTET_STRING).optional(),
];


//------------ EncryptedData -------------------------------------------------

/// EncryptedData.
///
/// ```text
/// EncryptedData ::= SEQUENCE {
///     version CMSVersion,
///     encryptedContentInfo EncryptedContentInfo,
///     unprotectedAttrs [1] IMPLICIT UnprotectedAttributes OPTIONAL }
/// ```
pub static ENCRYPTED_DATA: Schema = Schema::Sequence(&ENCRYPTED_DATA_FIELDS);

static ENCRYPTED_DATA_FIELDS: [Field; 3] = [
    Field::new("version", &INTEGER),
    Field::new("encryptedContentInfo", &ENCRYPTED_CONTENT_INFO),
    Field::implicit("unprotectedAttrs", 1, &ATTRIBUTES).optional(),
];
