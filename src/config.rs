//! Host-supplied configuration, `spec.md` §6 "Latch configuration".
//!
//! Deserializable with `serde` so a host can ship project configuration
//! as JSON/TOML alongside the blueprint it decodes, the way the teacher's
//! `missingno` bin crate configures itself via `serde`+`clap` rather than
//! a hand-rolled parser.

use serde::{Deserialize, Serialize};

/// Geometry for one [`crate::latch::LatchInterface`], supplied by the
/// host before calling [`crate::preprocess::preprocess`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatchConfig {
    pub pos: (usize, usize),
    pub stride: (i32, i32),
    pub size: (usize, usize),
    pub num_bits: usize,
}

/// Top-level configuration for one project: whether to permute group ids
/// for cache locality, the size of the VMem buffer, and the two latch
/// banks that back it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub use_gorder: bool,
    pub vmem_size: usize,
    pub vm_addr: LatchConfig,
    pub vm_data: LatchConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let config = ProjectConfig {
            use_gorder: true,
            vmem_size: 256,
            vm_addr: LatchConfig {
                pos: (0, 0),
                stride: (1, 0),
                size: (1, 8),
                num_bits: 8,
            },
            vm_data: LatchConfig {
                pos: (0, 1),
                stride: (1, 0),
                size: (1, 8),
                num_bits: 8,
            },
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ProjectConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn use_gorder_defaults_to_false() {
        let json = r#"{"vmem_size":4,"vm_addr":{"pos":[0,0],"stride":[1,0],"size":[1,1],"num_bits":1},"vm_data":{"pos":[0,0],"stride":[1,0],"size":[1,1],"num_bits":1}}"#;
        let config: ProjectConfig = serde_json::from_str(json).unwrap();
        assert!(!config.use_gorder);
    }
}
