//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

use bytes::BytesMut;
use proptest::prelude::*;
use telehub_telnetcodec::TelnetEvent;
use telehub_telnetcodec::TelnetCodec;
use tokio_util::codec::{Decoder, Encoder};

proptest! {
    /// Any run of application bytes, free of negotiation commands, survives
    /// an encode/decode round-trip with its ordering and values intact.
    #[test]
    fn arbitrary_bytes_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let mut codec = TelnetCodec::new();
        let mut wire = BytesMut::new();
        Encoder::<&[u8]>::encode(&mut codec, &bytes[..], &mut wire).unwrap();

        let mut decoded = Vec::new();
        while let Some(event) = codec.decode(&mut wire).unwrap() {
            match event {
                TelnetEvent::Data(byte) => decoded.push(byte),
                other => panic!("unexpected event {other:?}"),
            }
        }
        prop_assert_eq!(decoded, bytes);
    }
}
