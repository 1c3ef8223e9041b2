#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use zozol::{decode_transport, unwrap_layers, TransportDecoder};

fuzz_target!(|data: &[u8]| {
    let first = decode_transport(data);
    assert_eq!(first, decode_transport(data));

    if let Ok(doc) = first {
        // Whatever decodes must survive a round trip.
        let again = decode_transport(&doc.to_bytes()).unwrap();
        assert_eq!(again.label, doc.label);
        assert_eq!(again.body, doc.body);
        let _ = doc.signed_content();
    }

    let _ = TransportDecoder::new().repair(false).decode(
        Bytes::copy_from_slice(data)
    );
    let _ = unwrap_layers(Bytes::copy_from_slice(data), 8);
});
