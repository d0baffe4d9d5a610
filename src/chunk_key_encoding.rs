use std::fmt::Write;

use serde::{Deserialize, Serialize};
use zarrs::{
    array::{
        ChunkKeyEncoding, ChunkKeyEncodingTraits,
        chunk_key_encoding::{self as cke, api::ChunkKeyEncodingPlugin},
    },
    plugin::PluginConfigurationInvalidError,
};

/// Smallest permitted fanout base.
///
/// Below this, one digit group distinguishes too few children per level
/// for the encoding to meaningfully bound directory size.
pub const MIN_MAX_CHILDREN: u64 = 100;

/// Fanout base used when the metadata carries no `max_children`.
pub const DEFAULT_MAX_CHILDREN: u64 = 1000;

zarrs::plugin::impl_extension_aliases!(FanoutChunkKeyEncoding, v3: "fanout", ["fanout", "zarrs.fanout"]);
inventory::submit! {
    ChunkKeyEncodingPlugin::new::<FanoutChunkKeyEncoding>()
}

/// Wire form of the `fanout` chunk key encoding configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Copy)]
pub struct FanoutChunkKeyEncodingConfiguration {
    /// Upper bound on the number of distinct children per directory level.
    #[serde(default = "default_max_children")]
    pub max_children: u64,
}

fn default_max_children() -> u64 {
    DEFAULT_MAX_CHILDREN
}

impl Default for FanoutChunkKeyEncodingConfiguration {
    fn default() -> Self {
        Self {
            max_children: DEFAULT_MAX_CHILDREN,
        }
    }
}

/// A chunk key encoding which expands each chunk grid index into
/// fixed-width decimal groups, base `max_children`.
///
/// A literal index like `1234567` would put millions of siblings in one
/// directory on stores that group keys by prefix. Instead each index is
/// written as base-`max_children` "digits" (`001/234/567` for the default
/// base of 1000), so no prefix level ever fans out to more than
/// `max_children` children. Each dimension is preceded by an unpadded
/// depth marker, the group count minus one, so a consumer knows how many
/// groups follow without look-ahead.
///
/// Keys start with the literal segment `c`; a zero-dimensional coordinate
/// encodes to just `c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanoutChunkKeyEncoding {
    /// The fanout base; always an exact power of 10, at least [`MIN_MAX_CHILDREN`].
    max_children: u64,
    /// Decimal characters per digit group, `log10(max_children)`.
    digit_width: usize,
}

impl Default for FanoutChunkKeyEncoding {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHILDREN).expect("default max_children should be valid")
    }
}

impl FanoutChunkKeyEncoding {
    /// Create an encoding with the given fanout bound.
    ///
    /// Fails if `max_children` is below [`MIN_MAX_CHILDREN`].
    /// A value which is not an exact power of 10 is floored to the
    /// nearest power of 10 below it (1234 becomes 1000); this logs a
    /// warning but is not an error. Check [`max_children`](Self::max_children)
    /// on the result if the exact value matters.
    pub fn new(max_children: u64) -> crate::Result<Self> {
        if max_children < MIN_MAX_CHILDREN {
            return Err(crate::Error::MaxChildrenTooSmall(max_children));
        }
        let floored = 10u64.pow(max_children.ilog10());
        if floored != max_children {
            log::warn!("max_children {max_children} is not a power of 10; using {floored}");
        }
        Ok(Self {
            max_children: floored,
            // width of max_children - 1; max_children is a power of 10
            digit_width: floored.ilog10() as usize,
        })
    }

    pub fn new_with_configuration(
        configuration: &FanoutChunkKeyEncodingConfiguration,
    ) -> Result<Self, zarrs::plugin::PluginCreateError> {
        Self::new(configuration.max_children).map_err(|e| {
            zarrs::plugin::PluginCreateError::ConfigurationInvalid(
                PluginConfigurationInvalidError::new(e.to_string()),
            )
        })
    }

    /// The normalized fanout bound.
    pub fn max_children(&self) -> u64 {
        self.max_children
    }

    /// Decimal characters per digit group.
    pub fn digit_width(&self) -> usize {
        self.digit_width
    }

    /// Expand one chunk grid index into base-`max_children` digit groups,
    /// most significant first. Index 0 is one all-zero group, never zero groups.
    fn fanout_index(&self, mut index: u64) -> Vec<String> {
        if index == 0 {
            return vec!["0".repeat(self.digit_width)];
        }
        let mut groups = Vec::new();
        while index > 0 {
            groups.push(format!(
                "{:0width$}",
                index % self.max_children,
                width = self.digit_width
            ));
            index /= self.max_children;
        }
        groups.reverse();
        groups
    }
}

impl ChunkKeyEncodingTraits for FanoutChunkKeyEncoding {
    fn create(
        metadata: &zarrs::metadata::v3::MetadataV3,
    ) -> Result<cke::api::ChunkKeyEncoding, zarrs::plugin::PluginCreateError>
    where
        Self: Sized,
    {
        match metadata.name() {
            "fanout" | "zarrs.fanout" => {}
            _ => {
                return Err(zarrs::plugin::PluginCreateError::NameInvalid {
                    name: metadata.name().into(),
                });
            }
        }
        let encoding = if metadata.configuration_is_none_or_empty() {
            Self::default()
        } else {
            let configuration: FanoutChunkKeyEncodingConfiguration =
                metadata.to_typed_configuration()?;
            Self::new_with_configuration(&configuration)?
        };
        Ok(ChunkKeyEncoding::new(encoding))
    }

    fn configuration(&self) -> zarrs::metadata::Configuration {
        let config = FanoutChunkKeyEncodingConfiguration {
            max_children: self.max_children,
        };
        let val =
            serde_json::to_value(config).expect("fanout configuration should be serializable");
        let serde_json::Value::Object(map) = val else {
            panic!("fanout configuration should serialize to a JSON object");
        };
        map.into()
    }

    fn encode(&self, chunk_grid_indices: &[u64]) -> zarrs::storage::StoreKey {
        let mut s = String::from("c");
        for &index in chunk_grid_indices {
            let groups = self.fanout_index(index);
            // the depth marker is a single digit for any u64 index, even at base 100
            s.reserve(2 + groups.len() * (self.digit_width + 1));
            s.write_fmt(format_args!("/{}", groups.len() - 1)).unwrap();
            for group in &groups {
                s.push('/');
                s.push_str(group);
            }
        }
        zarrs::storage::StoreKey::new(s).expect("chunk key should be valid")
    }
}
