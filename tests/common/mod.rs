//! Shared helpers for the integration suites, mirroring the teacher's own
//! `tests/game_boy/common/mod.rs` (one helper module, reused by every
//! suite file rather than duplicated per file).

use vcb_core::{Image, Ink, LatchConfig, Pixel, ProjectConfig};

/// Builds an [`Image`] from a row-major list of `(ink, meta)` pairs.
pub fn image(width: usize, height: usize, cells: &[(Ink, u16)]) -> Image {
    assert_eq!(cells.len(), width * height);
    Image {
        width,
        height,
        pixels: cells
            .iter()
            .map(|&(ink, meta)| Pixel { ink, meta })
            .collect(),
    }
}

/// A [`ProjectConfig`] with no VMem overlay, for scenarios that don't
/// touch latches.
pub fn config_without_vmem() -> ProjectConfig {
    let no_bits = LatchConfig {
        pos: (0, 0),
        stride: (0, 0),
        size: (1, 1),
        num_bits: 0,
    };
    ProjectConfig {
        use_gorder: false,
        vmem_size: 1,
        vm_addr: no_bits,
        vm_data: no_bits,
    }
}
