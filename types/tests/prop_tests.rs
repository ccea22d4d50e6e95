//! Property tests for the textual and binary codecs.

use chrysos_types::{Account, Amount, BlockHash};
use proptest::prelude::*;

proptest! {
    #[test]
    fn account_encoding_round_trips(bytes in prop::array::uniform32(any::<u8>())) {
        let account = Account::new(bytes);
        let text = account.encode();
        prop_assert_eq!(Account::decode(&text).unwrap(), account);
    }

    #[test]
    fn account_encoding_is_fixed_width(bytes in prop::array::uniform32(any::<u8>())) {
        let text = Account::new(bytes).encode();
        prop_assert_eq!(text.len(), 64);
        prop_assert!(text.starts_with("chr_"));
    }

    #[test]
    fn block_hash_hex_round_trips(bytes in prop::array::uniform32(any::<u8>())) {
        let hash = BlockHash::new(bytes);
        prop_assert_eq!(hash.to_string().parse::<BlockHash>().unwrap(), hash);
    }

    #[test]
    fn amount_bytes_round_trip(value in any::<u128>()) {
        let amount = Amount::raw(value);
        prop_assert_eq!(Amount::from_be_bytes(amount.to_be_bytes()), amount);
    }
}
