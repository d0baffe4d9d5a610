//! Resolve the fanout encoding through the zarrs plugin registry,
//! as a host array would when reading persisted metadata.

use zarrs::array::{ChunkKeyEncoding, ChunkKeyEncodingTraits};
use zarrs::metadata::v3::MetadataV3;

use zarrs_fanout::FanoutChunkKeyEncoding;
use zarrs_fanout::chunk_key_encoding::FanoutChunkKeyEncodingConfiguration;

fn from_json(json: &str) -> ChunkKeyEncoding {
    env_logger::try_init().ok();
    let metadata: MetadataV3 = serde_json::from_str(json).expect("metadata should parse");
    ChunkKeyEncoding::from_metadata(&metadata).expect("fanout encoding should be registered")
}

#[test]
fn resolves_configured_encoding() {
    let encoding = from_json(r#"{"name": "fanout", "configuration": {"max_children": 1000}}"#);
    assert_eq!(encoding.encode(&[]).as_str(), "c");
    assert_eq!(encoding.encode(&[12]).as_str(), "c/0/012");
    assert_eq!(
        encoding.encode(&[1234, 5, 67890]).as_str(),
        "c/1/001/234/0/005/1/067/890"
    );
}

#[test]
fn resolves_default_encoding() {
    let encoding = from_json(r#"{"name": "fanout"}"#);
    assert_eq!(encoding.encode(&[999]).as_str(), "c/0/999");
    assert_eq!(encoding.encode(&[1000]).as_str(), "c/1/001/000");
}

#[test]
fn resolves_aliased_name() {
    let encoding = from_json(r#"{"name": "zarrs.fanout", "configuration": {"max_children": 100}}"#);
    assert_eq!(encoding.encode(&[123]).as_str(), "c/1/01/23");
}

#[test]
fn metadata_round_trip_reproduces_keys() {
    env_logger::try_init().ok();
    // Metadata written with an unnormalized value must reconstruct an
    // encoder that produces the same keys as the original.
    let original = FanoutChunkKeyEncoding::new(54321).expect("valid max_children");
    let metadata = MetadataV3::new_with_serializable_configuration(
        "fanout".to_string(),
        &FanoutChunkKeyEncodingConfiguration {
            max_children: original.max_children(),
        },
    )
    .expect("configuration should serialize");
    let restored = ChunkKeyEncoding::from_metadata(&metadata).expect("should resolve");
    for indices in [vec![], vec![0], vec![7, 54321], vec![9123432435, 12]] {
        assert_eq!(
            restored.encode(&indices).as_str(),
            original.encode(&indices).as_str()
        );
    }
}
