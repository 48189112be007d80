#![no_main]
use libfuzzer_sys::fuzz_target;
use rtpjpeg::receiver::{Receiver, ReceiverOptions};

fuzz_target!(|data: &[u8]| {
    let mut data = data;
    let mut receiver: Box<Receiver<8, 512, 4096>> = Box::new(Receiver::new(
        ReceiverOptions::default().ssrc(Some(0)),
    ));
    let mut timestamp = 0u32;
    let mut sequence_number: u16 = 0;
    loop {
        let (hdr, rest) = match data.split_first() {
            Some(r) => r,
            None => return,
        };
        let (jitter, rest) = match rest.split_first() {
            Some(r) => r,
            None => return,
        };
        let ts_change = (hdr & 0b001) != 0;
        let mark = (hdr & 0b010) != 0;
        let loss = (hdr & 0b100) != 0;
        let len = usize::from(hdr >> 3) * 8;
        if rest.len() < len {
            return;
        }
        let (payload, rest) = rest.split_at(len);
        data = rest;
        if loss {
            sequence_number = sequence_number.wrapping_add(1);
        }
        if ts_change {
            timestamp = timestamp.wrapping_add(3000);
        }
        let pkt = rtpjpeg::rtp::RawPacketBuilder {
            sequence_number: sequence_number.wrapping_add(*jitter as i8 as u16),
            timestamp,
            payload_type: rtpjpeg::rtp::PAYLOAD_TYPE_JPEG,
            ssrc: 0,
            mark,
        }
        .build(payload.iter().copied())
        .unwrap();
        let r = receiver.push(&pkt, |f| {
            assert!(f.jfif_header_len() < f.data().len());
            assert_eq!(&f.data()[..2], &[0xff, 0xd8]);
        });
        if r.is_err() {
            return;
        }
        sequence_number = sequence_number.wrapping_add(1);
    }
});
