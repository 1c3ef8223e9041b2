#![no_main]

use libfuzzer_sys::fuzz_target;
use zozol::{decode_ber, BerDecoder, Mode};
use zozol::pkcs7::CONTENT_INFO;
use zozol::schema::ANY;

fuzz_target!(|data: &[u8]| {
    if let Ok((node, used)) = decode_ber(data, &CONTENT_INFO, data.len()) {
        assert!(used <= data.len());
        let _ = format!("{:?}", node);
        let _ = node.get("content.contentInfo.content.value");
    }
    for mode in [Mode::Ber, Mode::Cer, Mode::Der] {
        let _ = BerDecoder::new(mode).decode(&CONTENT_INFO, data);
        let _ = BerDecoder::new(mode).decode(&ANY, data);
    }
});
