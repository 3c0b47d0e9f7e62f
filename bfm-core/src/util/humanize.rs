//! src/util/humanize.rs

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;

/// Size class shown in the listing: whole bytes below 1 KiB, otherwise one
/// decimal in the largest binary unit up to GiB.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn size_class(size: u64) -> String {
    let size_f: f64 = size as f64;

    if size_f < KIB {
        format!("{size} B")
    } else if size_f < MIB {
        format!("{:.1} KiB", size_f / KIB)
    } else if size_f < GIB {
        format!("{:.1} MiB", size_f / MIB)
    } else {
        format!("{:.1} GiB", size_f / GIB)
    }
}
