//! Share token properties over generated reports.

use proptest::prelude::*;
use secview::report::{BinaryReport, BinaryType, PathEntry, Properties, SecurityProperty};
use secview::share::{share_url, token_from_url, ShareCodec};

fn binary_type() -> impl Strategy<Value = BinaryType> {
    prop_oneof![
        Just(BinaryType::Elf32),
        Just(BinaryType::Elf64),
        Just(BinaryType::PE32),
        Just(BinaryType::PE64),
        Just(BinaryType::MachO32),
        Just(BinaryType::MachO64),
        Just(BinaryType::Unknown),
    ]
}

fn path_entry() -> impl Strategy<Value = PathEntry> {
    prop_oneof![
        Just(PathEntry::from("None")),
        "[a-z/$]{1,20}".prop_map(|p| PathEntry::from(p.as_str())),
    ]
}

fn property() -> impl Strategy<Value = SecurityProperty> {
    prop_oneof![
        any::<bool>().prop_map(SecurityProperty::Bool),
        any::<u64>().prop_map(SecurityProperty::Count),
        (-1.0e9f64..1.0e9).prop_map(SecurityProperty::Number),
        "\\PC{0,24}".prop_map(SecurityProperty::Enum),
        prop::collection::vec(path_entry(), 0..4)
            .prop_map(|paths| SecurityProperty::Paths { paths }),
        prop::collection::vec("[a-z.0-9]{1,16}", 0..6).prop_map(SecurityProperty::Libraries),
    ]
}

fn report() -> impl Strategy<Value = BinaryReport> {
    (
        proptest::option::of("[0-9]\\.[0-9]\\.[0-9]"),
        "\\PC{0,32}",
        binary_type(),
        prop::collection::vec(("[a-z_]{1,16}", property()), 0..12),
    )
        .prop_map(|(version, filename, binary_type, props)| BinaryReport {
            version,
            filename,
            binary_type,
            properties: props.into_iter().collect::<Properties>(),
        })
}

proptest! {
    #[test]
    fn test_round_trip(report in report()) {
        let codec = ShareCodec::default();
        let token = codec.encode(&report).unwrap();
        prop_assert_eq!(codec.decode(token.as_str()).unwrap(), report);
    }

    #[test]
    fn test_round_trip_through_url(report in report()) {
        let codec = ShareCodec::default();
        let token = codec.encode(&report).unwrap();
        let url = share_url("https://checksec.example/?page=1#stale", &token);
        let extracted = token_from_url(&url).unwrap();
        prop_assert_eq!(extracted, token.as_str());
        prop_assert_eq!(codec.decode(extracted).unwrap(), report);
    }

    #[test]
    fn test_arbitrary_text_never_panics(text in "\\PC{0,200}") {
        let _ = ShareCodec::default().decode(&text);
    }

    #[test]
    fn test_flipped_character_is_rejected(report in report(), pos in any::<prop::sample::Index>()) {
        let codec = ShareCodec::default();
        let token = codec.encode(&report).unwrap().into_string();
        let mut chars: Vec<char> = token.chars().collect();
        let i = pos.index(chars.len());
        chars[i] = if chars[i] == 'A' { 'B' } else { 'A' };
        let corrupted: String = chars.into_iter().collect();

        // A flipped character either fails to decode or, if it survives
        // zlib's own checksum, cannot yield a different report.
        if let Ok(decoded) = codec.decode(&corrupted) {
            prop_assert_eq!(decoded, report);
        }
    }
}
